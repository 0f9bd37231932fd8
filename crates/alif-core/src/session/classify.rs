use chrono::{DateTime, Utc};

use crate::domain::{LemmaId, MemoryState};

/// Per-lemma classification result (spec §4.4 "Classify"). Memory states
/// are only ever created for canonical, non-function lemmas (spec §3
/// invariants), so no extra lemma-repository lookup is needed here to
/// exclude function words or variants — that exclusion already happened
/// at write time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified {
    pub lemma_id: LemmaId,
    pub is_acquiring: bool,
    pub is_due: bool,
    pub pseudo_stability_days: f64,
}

/// Classifies every non-suspended memory state by due-ness and attaches
/// the pseudo-stability used by downstream scoring (spec §4.4 Classify).
pub fn classify(states: &[MemoryState], now: DateTime<Utc>) -> Vec<Classified> {
    states
        .iter()
        .map(|state| Classified {
            lemma_id: state.lemma_id,
            is_acquiring: state.acquisition.is_some(),
            is_due: state.is_due(now),
            pseudo_stability_days: state.pseudo_stability_days(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AcquisitionFields, Box3, KnowledgeState};
    use chrono::Duration;

    #[test]
    fn acquiring_due_flag_follows_next_due_at() {
        let now = Utc::now();
        let mut state = MemoryState::new_encountered(1, "import");
        state.knowledge_state = KnowledgeState::Acquiring;
        state.acquisition = Some(AcquisitionFields {
            box_num: Box3::new(1),
            next_due_at: now - Duration::hours(1),
            entered_acquiring_at: now - Duration::hours(5),
        });
        let classified = classify(&[state], now);
        assert!(classified[0].is_due);
        assert!(classified[0].is_acquiring);
        assert_eq!(classified[0].pseudo_stability_days, 0.1);
    }
}
