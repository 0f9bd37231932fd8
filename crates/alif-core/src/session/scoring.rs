use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::domain::{GrammarExposure, GrammarFeatureId, KnowledgeState, Lemma, LemmaId, MemoryState, Sentence};

/// Everything the Score stage needs about the learner's state, bundled so
/// the builder can load it once per session build (spec §4.4 "Score").
pub struct ScoringContext<'a> {
    pub lemmas: &'a HashMap<LemmaId, Lemma>,
    pub memory_states: &'a HashMap<LemmaId, MemoryState>,
    pub grammar_exposure: &'a HashMap<GrammarFeatureId, GrammarExposure>,
    pub config: &'a Config,
}

/// A scored candidate, carrying enough to re-score after the due set shrinks
/// during greedy cover (spec §4.4 "Greedy Set Cover").
#[derive(Debug, Clone)]
pub struct Scored {
    pub sentence: Sentence,
    pub covered: Vec<LemmaId>,
    pub score: f64,
}

impl<'a> ScoringContext<'a> {
    fn canonical_of(&self, lemma_id: LemmaId) -> LemmaId {
        crate::domain::resolve_canonical(lemma_id, |id| self.lemmas.get(&id).and_then(|l| l.canonical_id))
    }

    fn is_function_word(&self, canonical_id: LemmaId) -> bool {
        self.lemmas.get(&canonical_id).map(|l| l.is_function_word).unwrap_or(false)
    }

    fn knowledge_state_of(&self, canonical_id: LemmaId) -> KnowledgeState {
        self.memory_states
            .get(&canonical_id)
            .map(|s| s.knowledge_state)
            .unwrap_or(KnowledgeState::Encountered)
    }

    /// Content-word canonical lemma ids for a sentence: resolved, deduped,
    /// function words excluded.
    fn content_canonicals(&self, sentence: &Sentence) -> Vec<LemmaId> {
        let mut seen = HashSet::new();
        sentence
            .content_lemma_ids()
            .map(|id| self.canonical_of(id))
            .filter(|id| !self.is_function_word(*id))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Scores `sentence` against the current `due_remaining` set, or `None`
    /// if it fails the comprehensibility gate (spec §4.4 "Score").
    pub fn score(&self, sentence: &Sentence, due_remaining: &HashSet<LemmaId>) -> Option<Scored> {
        let content = self.content_canonicals(sentence);
        if content.is_empty() {
            return None;
        }

        let comprehensible_states = [
            KnowledgeState::Known,
            KnowledgeState::Learning,
            KnowledgeState::Lapsed,
            KnowledgeState::Acquiring,
            KnowledgeState::Encountered,
        ];
        let comprehensible = content
            .iter()
            .filter(|id| comprehensible_states.contains(&self.knowledge_state_of(**id)))
            .count();
        let comprehensibility = comprehensible as f64 / content.len() as f64;
        if comprehensibility < self.config.comprehensibility_threshold {
            return None;
        }

        let covered: Vec<LemmaId> = content.iter().copied().filter(|id| due_remaining.contains(id)).collect();
        if covered.is_empty() {
            return None;
        }

        let weakest = covered
            .iter()
            .map(|id| self.memory_states.get(id).map(|s| s.pseudo_stability_days()).unwrap_or(0.0))
            .fold(f64::INFINITY, f64::min);

        let scaffold: Vec<LemmaId> = content
            .iter()
            .copied()
            .filter(|id| !covered.contains(id))
            .filter(|id| matches!(self.knowledge_state_of(*id), KnowledgeState::Known | KnowledgeState::Learning))
            .collect();
        let scaffold_stabilities: Vec<f64> = scaffold
            .iter()
            .filter_map(|id| self.memory_states.get(id).and_then(|s| s.card.map(|c| c.stability)))
            .collect();
        let scaffold_avg = if scaffold_stabilities.is_empty() {
            0.0
        } else {
            scaffold_stabilities.iter().sum::<f64>() / scaffold_stabilities.len() as f64
        };

        let dmq = if weakest < 0.5 {
            if scaffold_avg >= 1.0 { 1.0 } else { 0.3 }
        } else if weakest <= 3.0 {
            if scaffold_avg > weakest { 1.0 } else { 0.5 }
        } else {
            1.0
        };

        let grammar_fit_terms: Vec<f64> = sentence
            .grammar_features
            .iter()
            .map(|feature_id| {
                self.grammar_exposure
                    .get(feature_id)
                    .map(|e| e.fit_factor())
                    .unwrap_or(0.8)
            })
            .collect();
        let grammar_fit = geometric_mean(&grammar_fit_terms);

        let diversity = 1.0 / (1.0 + sentence.times_shown as f64);

        let freshness_terms: Vec<f64> = scaffold
            .iter()
            .map(|id| {
                let times_seen = self.memory_states.get(id).map(|s| s.times_seen).unwrap_or(0);
                (1.0_f64).min(self.config.freshness_baseline / (times_seen.max(1) as f64))
            })
            .collect();
        let scaffold_freshness = geometric_mean(&freshness_terms).max(0.3);

        let score = (covered.len() as f64).powf(1.5) * dmq * grammar_fit * diversity * scaffold_freshness;

        Some(Scored { sentence: sentence.clone(), covered, score })
    }
}

fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let product: f64 = values.iter().product();
    product.powf(1.0 / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Box3, LongTermCard, FsrsPhase, Token};
    use chrono::Utc;

    fn lemma(id: LemmaId, function_word: bool) -> Lemma {
        Lemma {
            id,
            surface: format!("w{id}"),
            gloss: "g".into(),
            part_of_speech: "NOUN".into(),
            frequency_rank: 1,
            root_id: None,
            canonical_id: None,
            thematic_tag: None,
            is_function_word: function_word,
        }
    }

    fn sentence(id: i64, lemma_ids: &[LemmaId]) -> Sentence {
        Sentence {
            id,
            arabic: "...".into(),
            translation: "...".into(),
            transliteration: None,
            tokens: lemma_ids.iter().map(|l| Token { surface: "x".into(), lemma_id: Some(*l) }).collect(),
            target_lemma_id: lemma_ids.first().copied(),
            times_shown: 0,
            last_shown_at: None,
            last_comprehension: std::collections::HashMap::new(),
            is_active: true,
            max_word_count: 10,
            audio_url: None,
            grammar_features: vec![],
        }
    }

    #[test]
    fn comprehensibility_gate_rejects_low_fraction() {
        let lemmas: HashMap<LemmaId, Lemma> = (1..=5).map(|i| (i, lemma(i, false))).collect();
        let mut states = HashMap::new();
        states.insert(1, {
            let mut s = MemoryState::new_encountered(1, "x");
            s.knowledge_state = KnowledgeState::Known;
            s.card = Some(LongTermCard { stability: 10.0, difficulty: 3.0, due_at: Utc::now(), last_reviewed_at: Utc::now(), fsrs_phase: FsrsPhase::Review });
            s
        });
        states.insert(2, {
            let mut s = MemoryState::new_encountered(2, "x");
            s.knowledge_state = KnowledgeState::Suspended;
            s
        });
        states.insert(3, {
            let mut s = MemoryState::new_encountered(3, "x");
            s.knowledge_state = KnowledgeState::Suspended;
            s
        });
        let config = Config::default();
        let grammar_exposure = HashMap::new();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };
        let sent = sentence(1, &[1, 2, 3]);
        let mut due = HashSet::new();
        due.insert(1);
        assert!(ctx.score(&sent, &due).is_none());
    }

    #[test]
    fn covered_counts_only_due_set_members() {
        let lemmas: HashMap<LemmaId, Lemma> = (1..=2).map(|i| (i, lemma(i, false))).collect();
        let mut states = HashMap::new();
        states.insert(1, {
            let mut s = MemoryState::new_encountered(1, "x");
            s.knowledge_state = KnowledgeState::Acquiring;
            s.acquisition = Some(crate::domain::AcquisitionFields { box_num: Box3::new(1), next_due_at: Utc::now(), entered_acquiring_at: Utc::now() });
            s
        });
        let config = Config::default();
        let grammar_exposure = HashMap::new();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };
        let sent = sentence(1, &[1, 2]);
        let mut due = HashSet::new();
        due.insert(1);
        let scored = ctx.score(&sent, &due).unwrap();
        assert_eq!(scored.covered, vec![1]);
    }
}
