use std::collections::HashMap;

use crate::domain::{LemmaId, Sentence};

use super::scoring::{Scored, ScoringContext};

fn appearance_counts(selected: &[Scored], acquiring: &[LemmaId]) -> HashMap<LemmaId, u32> {
    let mut counts: HashMap<LemmaId, u32> = acquiring.iter().map(|id| (*id, 0)).collect();
    for item in selected {
        for lemma_id in &item.covered {
            if let Some(count) = counts.get_mut(lemma_id) {
                *count += 1;
            }
        }
    }
    counts
}

/// Tops up acquiring-lemma exposure to the target appearance count,
/// progressing 2 → 3 → 4 so every acquiring lemma reaches a count before any
/// reaches the next (spec §4.4 "Acquisition Repetition"). Bounded by
/// `overflow` extra slots beyond the session's nominal `limit`.
pub fn add_repetitions(
    ctx: &ScoringContext<'_>,
    mut selected: Vec<Scored>,
    candidates: &[Sentence],
    acquiring: &[LemmaId],
    cap: usize,
    overflow: usize,
) -> Vec<Scored> {
    if acquiring.is_empty() {
        return selected;
    }

    let mut used: std::collections::HashSet<i64> = selected.iter().map(|s| s.sentence.id).collect();
    let mut extra_used = 0usize;

    for target in 2..=cap {
        for lemma_id in acquiring {
            let due_set: std::collections::HashSet<LemmaId> = std::iter::once(*lemma_id).collect();
            loop {
                if extra_used >= overflow {
                    return selected;
                }
                let counts = appearance_counts(&selected, acquiring);
                if counts.get(lemma_id).copied().unwrap_or(0) >= target as u32 {
                    break;
                }
                let mut best: Option<Scored> = None;
                for sentence in candidates {
                    if used.contains(&sentence.id) {
                        continue;
                    }
                    let Some(scored) = ctx.score(sentence, &due_set) else { continue };
                    if !scored.covered.contains(lemma_id) {
                        continue;
                    }
                    best = Some(match best {
                        None => scored,
                        Some(current) if scored.score > current.score => scored,
                        Some(current) => current,
                    });
                }
                let Some(winner) = best else { break };
                used.insert(winner.sentence.id);
                selected.push(winner);
                extra_used += 1;
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{AcquisitionFields, Box3, KnowledgeState, Lemma, MemoryState, Token};

    fn lemma(id: LemmaId) -> Lemma {
        Lemma { id, surface: format!("w{id}"), gloss: "g".into(), part_of_speech: "NOUN".into(), frequency_rank: 1, root_id: None, canonical_id: None, thematic_tag: None, is_function_word: false }
    }

    fn acquiring_state(id: LemmaId) -> MemoryState {
        let mut s = MemoryState::new_encountered(id, "x");
        s.knowledge_state = KnowledgeState::Acquiring;
        s.acquisition = Some(AcquisitionFields { box_num: Box3::new(1), next_due_at: chrono::Utc::now(), entered_acquiring_at: chrono::Utc::now() });
        s
    }

    fn sentence(id: i64, lemma_id: LemmaId) -> Sentence {
        Sentence {
            id,
            arabic: "s".into(),
            translation: "t".into(),
            transliteration: None,
            tokens: vec![Token { surface: "x".into(), lemma_id: Some(lemma_id) }],
            target_lemma_id: Some(lemma_id),
            times_shown: 0,
            last_shown_at: None,
            last_comprehension: HashMap::new(),
            is_active: true,
            max_word_count: 10,
            audio_url: None,
            grammar_features: vec![],
        }
    }

    #[test]
    fn tops_up_to_two_before_going_further() {
        let lemmas: HashMap<LemmaId, Lemma> = vec![(1, lemma(1))].into_iter().collect();
        let states: HashMap<LemmaId, MemoryState> = vec![(1, acquiring_state(1))].into_iter().collect();
        let config = Config::default();
        let grammar_exposure = HashMap::new();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };
        let candidates: Vec<Sentence> = (1..=4).map(|i| sentence(i, 1)).collect();
        let initial = vec![crate::session::scoring::Scored { sentence: candidates[0].clone(), covered: vec![1], score: 1.0 }];
        let topped = add_repetitions(&ctx, initial, &candidates, &[1], config.acquisition_repetition_cap, config.acquisition_repetition_overflow);
        assert!(topped.len() >= 2);
    }

    #[test]
    fn tops_up_all_the_way_to_the_cap_given_enough_candidates() {
        let lemmas: HashMap<LemmaId, Lemma> = vec![(1, lemma(1))].into_iter().collect();
        let states: HashMap<LemmaId, MemoryState> = vec![(1, acquiring_state(1))].into_iter().collect();
        let config = Config::default();
        let grammar_exposure = HashMap::new();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };
        let candidates: Vec<Sentence> = (1..=10).map(|i| sentence(i, 1)).collect();
        let initial = vec![crate::session::scoring::Scored { sentence: candidates[0].clone(), covered: vec![1], score: 1.0 }];
        let topped = add_repetitions(
            &ctx,
            initial,
            &candidates,
            &[1],
            config.acquisition_repetition_cap,
            config.acquisition_repetition_overflow,
        );
        let counts = appearance_counts(&topped, &[1]);
        assert_eq!(counts[&1], config.acquisition_repetition_cap as u32);
    }
}
