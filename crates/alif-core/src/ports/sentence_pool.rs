use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Comprehension, LemmaId, Mode, Sentence, SentenceId, SentenceReviewLog};

/// Active sentences with their token→lemma mapping and per-mode shown
/// history (spec §2 item 3, §4.3).
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SentencePool: Send + Sync {
    /// Active sentences with at least one token that *resolves* (through
    /// the canonical-variant graph) to a lemma in `lemma_ids`, already
    /// filtered by the comprehension-aware recency rule for `mode` at
    /// `now` (spec §4.3). `lemma_ids` must already be canonical; a token
    /// whose own `lemma_id` is a variant surface form still counts as
    /// covering its canonical due lemma.
    async fn active_sentences_covering(
        &self,
        lemma_ids: Vec<LemmaId>,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Sentence>>;

    async fn get_sentence(&self, sentence_id: SentenceId) -> anyhow::Result<Option<Sentence>>;

    /// Records that a sentence was shown in `mode`, updating
    /// `times_shown`, `last_shown_at` and the per-mode `last_comprehension`
    /// (spec §4.3, §4.5).
    async fn record_shown(
        &self,
        sentence_id: SentenceId,
        mode: Mode,
        comprehension: Comprehension,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Reverts the effect of `record_shown`, used by review undo (spec
    /// §4.5).
    async fn revert_shown(
        &self,
        sentence_id: SentenceId,
        mode: Mode,
        prior_comprehension: Option<Comprehension>,
    ) -> anyhow::Result<()>;

    /// Persists a newly generated, validated sentence for reuse (spec
    /// §4.4 On-Demand Generation, §4.8).
    async fn insert_sentence(&self, sentence: Sentence) -> anyhow::Result<SentenceId>;

    async fn retire(&self, sentence_id: SentenceId) -> anyhow::Result<()>;

    /// Appends a per-submission sentence review log entry (spec §3
    /// "Sentence Review Log"). Append-only: unlike `review_logs`, undo does
    /// not purge these rows, since the entry carries no `client_review_id`
    /// to key a deletion on.
    async fn log_review(&self, log: SentenceReviewLog) -> anyhow::Result<()>;
}
