use std::collections::HashSet;

use crate::domain::{LemmaId, Sentence};

use super::scoring::{Scored, ScoringContext};

/// Greedy set cover over due lemmas (spec §4.4 "Greedy Set Cover", Testable
/// Property 8). Re-scores every remaining candidate each round since
/// `covered` shrinks as lemmas get satisfied; ties break by lower
/// `times_shown`, then by id, so the result is stable across identical
/// inputs.
pub fn greedy_cover(ctx: &ScoringContext<'_>, candidates: &[Sentence], due_lemma_ids: &[LemmaId], limit: usize) -> Vec<Scored> {
    let mut remaining: HashSet<LemmaId> = due_lemma_ids.iter().copied().collect();
    let mut selected = Vec::new();
    let mut used_sentence_ids = HashSet::new();

    while !remaining.is_empty() && selected.len() < limit {
        let mut best: Option<Scored> = None;
        for sentence in candidates {
            if used_sentence_ids.contains(&sentence.id) {
                continue;
            }
            let Some(scored) = ctx.score(sentence, &remaining) else {
                continue;
            };
            best = Some(match best {
                None => scored,
                Some(current) => pick_better(current, scored),
            });
        }

        let Some(winner) = best else { break };
        for lemma_id in &winner.covered {
            remaining.remove(lemma_id);
        }
        used_sentence_ids.insert(winner.sentence.id);
        selected.push(winner);
    }

    selected
}

fn pick_better(a: Scored, b: Scored) -> Scored {
    if b.score > a.score {
        return b;
    }
    if b.score < a.score {
        return a;
    }
    if b.sentence.times_shown < a.sentence.times_shown {
        return b;
    }
    if b.sentence.times_shown > a.sentence.times_shown {
        return a;
    }
    if b.sentence.id < a.sentence.id {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{KnowledgeState, Lemma, MemoryState, Token};
    use std::collections::HashMap;

    fn lemma(id: LemmaId) -> Lemma {
        Lemma { id, surface: format!("w{id}"), gloss: "g".into(), part_of_speech: "NOUN".into(), frequency_rank: 1, root_id: None, canonical_id: None, thematic_tag: None, is_function_word: false }
    }

    fn acquiring_state(id: LemmaId) -> MemoryState {
        let mut s = MemoryState::new_encountered(id, "x");
        s.knowledge_state = KnowledgeState::Acquiring;
        s.acquisition = Some(crate::domain::AcquisitionFields {
            box_num: crate::domain::Box3::new(1),
            next_due_at: chrono::Utc::now(),
            entered_acquiring_at: chrono::Utc::now(),
        });
        s
    }

    fn sentence(id: i64, lemma_ids: &[LemmaId]) -> Sentence {
        Sentence {
            id,
            arabic: "s".into(),
            translation: "t".into(),
            transliteration: None,
            tokens: lemma_ids.iter().map(|l| Token { surface: "x".into(), lemma_id: Some(*l) }).collect(),
            target_lemma_id: lemma_ids.first().copied(),
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
    fn greedy_cover_picks_the_sentence_covering_both_due_lemmas() {
        let lemmas: HashMap<LemmaId, Lemma> = vec![(1, lemma(1)), (2, lemma(2))].into_iter().collect();
        let states: HashMap<LemmaId, MemoryState> = vec![(1, acquiring_state(1)), (2, acquiring_state(2))].into_iter().collect();
        let config = Config::default();
        let grammar_exposure = HashMap::new();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };
        let candidates = vec![sentence(1, &[1]), sentence(2, &[1, 2])];
        let selected = greedy_cover(&ctx, &candidates, &[1, 2], 5);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].sentence.id, 2);
    }
}
