use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grammar::GrammarFeatureId;
use super::lemma::LemmaId;

pub type SentenceId = i64;

/// Aggregate comprehension signal reported on review submission (spec §3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comprehension {
    Understood,
    Partial,
    GrammarConfused,
    NoIdea,
}

impl Comprehension {
    /// Recency cooldown applied by the sentence pool (spec §4.3).
    pub fn cooldown(self) -> chrono::Duration {
        match self {
            Comprehension::Understood => chrono::Duration::days(7),
            Comprehension::Partial => chrono::Duration::days(2),
            Comprehension::GrammarConfused => chrono::Duration::days(1),
            Comprehension::NoIdea => chrono::Duration::hours(4),
        }
    }
}

/// Cooldown for a sentence never shown in a mode, or whose last_comprehension
/// is null (spec §4.3: "null → 7 d").
pub fn null_comprehension_cooldown() -> chrono::Duration {
    chrono::Duration::days(7)
}

/// Mode a session or sentence-shown event applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Reading,
    Listening,
}

/// One ordered token of a sentence (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    /// None for unmatched tokens (e.g. punctuation, unrecognized surface forms).
    pub lemma_id: Option<LemmaId>,
}

/// A persisted sentence (spec §3). Retired sentences set `is_active = false`
/// but remain referenceable by prior review logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
    pub arabic: String,
    pub translation: String,
    pub transliteration: Option<String>,
    pub tokens: Vec<Token>,
    pub target_lemma_id: Option<LemmaId>,
    pub times_shown: u32,
    pub last_shown_at: Option<DateTime<Utc>>,
    /// Per-mode last comprehension signal, keyed by mode.
    pub last_comprehension: std::collections::HashMap<Mode, Comprehension>,
    pub is_active: bool,
    pub max_word_count: u32,
    pub audio_url: Option<String>,
    pub grammar_features: Vec<GrammarFeatureId>,
}

impl Sentence {
    /// Content-word lemma ids: tokens with a mapped lemma, independent of
    /// function-word status (callers filter function words separately via
    /// the lemma repository, since that status lives on the `Lemma`, not
    /// the token).
    pub fn content_lemma_ids(&self) -> impl Iterator<Item = LemmaId> + '_ {
        self.tokens.iter().filter_map(|t| t.lemma_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldowns_match_spec_table() {
        assert_eq!(Comprehension::Understood.cooldown(), chrono::Duration::days(7));
        assert_eq!(Comprehension::Partial.cooldown(), chrono::Duration::days(2));
        assert_eq!(Comprehension::GrammarConfused.cooldown(), chrono::Duration::days(1));
        assert_eq!(Comprehension::NoIdea.cooldown(), chrono::Duration::hours(4));
    }
}
