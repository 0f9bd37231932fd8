use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lemma::LemmaId;

/// The tag of a `MemoryState` (spec §3).
///
/// This is a tagged record, not an inheritance hierarchy (spec §9): the
/// fields that make sense for a given tag are carried as `Option`s on
/// `MemoryState` and validated against the tag at construction and at
/// every transition, rather than split into per-state subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeState {
    Encountered,
    Acquiring,
    Learning,
    Known,
    Lapsed,
    Suspended,
}

impl KnowledgeState {
    pub fn is_long_term(self) -> bool {
        matches!(self, Self::Learning | Self::Known | Self::Lapsed)
    }
}

/// One of the three Leitner boxes of the acquisition phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Box3(u8);

impl Box3 {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub fn new(value: u8) -> Self {
        debug_assert!((Self::MIN..=Self::MAX).contains(&value), "box out of range: {value}");
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        Self::new((self.0 + 1).min(Self::MAX))
    }
}

/// Short-term acquisition-phase fields (spec §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionFields {
    pub box_num: Box3,
    pub next_due_at: DateTime<Utc>,
    pub entered_acquiring_at: DateTime<Utc>,
}

/// The library-reported FSRS phase for a card, independent of our own
/// `KnowledgeState` tag (spec §4.2 state mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsrsPhase {
    Learning,
    Review,
    Relearning,
}

/// Long-term memory card (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongTermCard {
    /// Days of 90%-retention durability.
    pub stability: f64,
    /// FSRS difficulty, bounded [1, 10].
    pub difficulty: f64,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
    pub fsrs_phase: FsrsPhase,
}

/// Per-surface-form counters attached to the canonical memory state
/// (spec §3, Glossary "Variant stats").
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantStat {
    pub seen: u32,
    pub missed: u32,
    pub confused: u32,
}

/// One record per canonical, non-function lemma, created lazily on first
/// encounter (spec §3). Exactly one of `acquisition` / `card` is present,
/// governed by `knowledge_state`; `validate_tag_invariant` enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub lemma_id: LemmaId,
    pub knowledge_state: KnowledgeState,
    pub times_seen: u32,
    pub times_correct: u32,
    pub source: String,
    pub variant_stats: HashMap<LemmaId, VariantStat>,
    pub entered_acquiring_at: Option<DateTime<Utc>>,
    pub graduated_at: Option<DateTime<Utc>>,
    pub leech_suspended_at: Option<DateTime<Utc>>,
    pub leech_count: u32,
    pub acquisition: Option<AcquisitionFields>,
    pub card: Option<LongTermCard>,
}

impl MemoryState {
    /// A brand-new, not-yet-introduced memory state for `lemma_id`.
    pub fn new_encountered(lemma_id: LemmaId, source: impl Into<String>) -> Self {
        Self {
            lemma_id,
            knowledge_state: KnowledgeState::Encountered,
            times_seen: 0,
            times_correct: 0,
            source: source.into(),
            variant_stats: HashMap::new(),
            entered_acquiring_at: None,
            graduated_at: None,
            leech_suspended_at: None,
            leech_count: 0,
            acquisition: None,
            card: None,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.times_seen == 0 {
            0.0
        } else {
            self.times_correct as f64 / self.times_seen as f64
        }
    }

    /// Validates the tag invariant from spec §3: `encountered` carries
    /// neither box nor card; `acquiring` carries box, not card; long-term
    /// states carry card, not box.
    #[must_use]
    pub fn validate_tag_invariant(&self) -> bool {
        match self.knowledge_state {
            KnowledgeState::Encountered => self.acquisition.is_none() && self.card.is_none(),
            KnowledgeState::Acquiring => self.acquisition.is_some() && self.card.is_none(),
            KnowledgeState::Learning | KnowledgeState::Known | KnowledgeState::Lapsed => {
                self.acquisition.is_none() && self.card.is_some()
            }
            KnowledgeState::Suspended => self.card.is_none() || self.acquisition.is_none(),
        }
    }

    /// Pseudo-stability used for downstream session scoring (spec §4.4
    /// Classify stage): acquiring lemmas don't have a real `stability`, so
    /// box depth stands in for it.
    pub fn pseudo_stability_days(&self) -> f64 {
        if let Some(card) = &self.card {
            return card.stability;
        }
        match self.acquisition.map(|a| a.box_num.value()) {
            Some(1) => 0.1,
            Some(2) => 0.5,
            Some(3) => 2.0,
            _ => 0.0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if let Some(acq) = &self.acquisition {
            return acq.next_due_at <= now;
        }
        if let Some(card) = &self.card {
            return card.due_at <= now;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn encountered_has_no_box_or_card() {
        let state = MemoryState::new_encountered(1, "import");
        assert!(state.validate_tag_invariant());
    }

    #[test]
    fn pseudo_stability_ordering_matches_box_depth() {
        let mut state = MemoryState::new_encountered(1, "import");
        state.knowledge_state = KnowledgeState::Acquiring;
        let now = Utc::now();
        for (box_num, expected) in [(1, 0.1), (2, 0.5), (3, 2.0)] {
            state.acquisition = Some(AcquisitionFields {
                box_num: Box3::new(box_num),
                next_due_at: now + Duration::hours(1),
                entered_acquiring_at: now,
            });
            assert_eq!(state.pseudo_stability_days(), expected);
        }
    }

    #[test]
    fn accuracy_is_zero_with_no_reviews() {
        let state = MemoryState::new_encountered(1, "import");
        assert_eq!(state.accuracy(), 0.0);
    }
}
