use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LemmaId, Sentence};

/// Coarse difficulty hint derived from the weakest target lemma's maturity
/// (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyHint {
    Simple,
    Beginner,
    Intermediate,
}

/// Outbound constraints handed to the generator (spec §6 "Generator
/// contract").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConstraints {
    pub max_words: u32,
    pub difficulty_hint: DifficultyHint,
    pub known_vocab_sample: Vec<LemmaId>,
    pub rejected_words: Vec<String>,
    pub avoid_proper_nouns: bool,
}

/// The scheduler's only dependency on content generation (spec §2 item 9,
/// §4.8). A real implementation calls out to an LLM and TTS pipeline and
/// runs a cross-model quality review; both are out of scope here (spec
/// §1) and are represented only by this typed boundary.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SentenceGenerator: Send + Sync {
    /// Generates zero or more sentences covering `targets`, each already
    /// validated against `constraints` per spec §4.8: every content word
    /// maps into `known_vocab ∪ targets ∪ encountered`, at least one
    /// target lemma is present, and the cross-model quality gate passed.
    /// An unavailable quality reviewer must fail closed (reject), not
    /// return an empty-but-successful result silently swallowing the
    /// distinction — callers treat an `Err` and an empty `Ok(vec![])`
    /// identically (spec §7 "Generator failure"), so either is acceptable,
    /// but a real adapter should log the distinction.
    async fn generate(
        &self,
        targets: Vec<LemmaId>,
        constraints: GenerationConstraints,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Sentence>>;
}

/// Derives `{max_words, difficulty_hint}` from the weakest target lemma's
/// maturity (spec §4.8).
pub fn difficulty_for_maturity(
    age: chrono::Duration,
    times_seen: u32,
) -> (u32, DifficultyHint) {
    if age < chrono::Duration::hours(2) && times_seen < 3 {
        (7, DifficultyHint::Simple)
    } else if age < chrono::Duration::days(1) {
        (9, DifficultyHint::Simple)
    } else if age < chrono::Duration::days(7) {
        (11, DifficultyHint::Beginner)
    } else {
        (14, DifficultyHint::Intermediate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maturity_bands_match_spec_table() {
        assert_eq!(
            difficulty_for_maturity(chrono::Duration::minutes(30), 1),
            (7, DifficultyHint::Simple)
        );
        assert_eq!(
            difficulty_for_maturity(chrono::Duration::hours(12), 5),
            (9, DifficultyHint::Simple)
        );
        assert_eq!(
            difficulty_for_maturity(chrono::Duration::days(3), 20),
            (11, DifficultyHint::Beginner)
        );
        assert_eq!(
            difficulty_for_maturity(chrono::Duration::days(30), 50),
            (14, DifficultyHint::Intermediate)
        );
    }
}
