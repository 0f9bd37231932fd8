use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{GrammarExposure, GrammarFeatureId, LemmaId, MemoryState, ReviewGrade, ReviewLog};

/// A single word's outcome from a submitted review, written atomically
/// alongside its review log entry (spec §4.5).
#[derive(Debug, Clone)]
pub struct ReviewWrite {
    pub new_state: MemoryState,
    pub log: ReviewLog,
}

/// Per-lemma learning state plus the write path for a whole review
/// submission (spec §2 item 2, §4.5, §4.6). Mirrors the shape of
/// `save_review_atomic` in this codebase's existing user-state repository:
/// one call bundles every write a submission produces so it commits or
/// rolls back as a unit (spec §5, §7 "Transactional failure").
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait MemoryStore: Send + Sync {
    async fn get_memory_state(&self, lemma_id: LemmaId) -> anyhow::Result<Option<MemoryState>>;

    async fn get_memory_states(&self, lemma_ids: Vec<LemmaId>) -> anyhow::Result<Vec<MemoryState>>;

    /// All memory states not currently `suspended`, for the Classify stage
    /// (spec §4.4).
    async fn get_all_non_suspended(&self) -> anyhow::Result<Vec<MemoryState>>;

    /// All currently `suspended` states whose reintroduction cooldown has
    /// elapsed, for the Leech Manager's background scan (spec §4.6).
    async fn get_suspended_past_cooldown(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<MemoryState>>;

    /// Writes a single state outside of a review submission (e.g.
    /// auto-introduction starting a new acquisition state, or the leech
    /// reintroduction scan).
    async fn save_memory_state(&self, state: &MemoryState) -> anyhow::Result<()>;

    async fn save_memory_states(&self, states: Vec<MemoryState>) -> anyhow::Result<()>;

    /// Looks up a previously applied submission by its idempotency key
    /// (spec §4.5 "Idempotency"). Returns the review logs written for that
    /// submission, if any.
    async fn get_review_logs_for_client_id(
        &self,
        client_review_id: &str,
    ) -> anyhow::Result<Vec<ReviewLog>>;

    /// Last `limit` word-ratings across all lemmas, most recent first, for
    /// the Auto-Introduction accuracy window (spec §4.4, last 20 ratings).
    async fn recent_ratings(&self, limit: usize) -> anyhow::Result<Vec<ReviewGrade>>;

    /// Word-ratings of 1 ("Again") on sibling lemmas of `lemma_ids` within
    /// `since`, for the Root Interference Guard (spec §4.7).
    async fn lemmas_rated_again_since(
        &self,
        lemma_ids: Vec<LemmaId>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<LemmaId>>;

    async fn get_grammar_exposure(
        &self,
        feature_id: GrammarFeatureId,
    ) -> anyhow::Result<Option<GrammarExposure>>;

    /// Atomically applies every write a single review submission produces:
    /// the per-word memory writes and their review logs, plus the
    /// resulting grammar exposure updates. `client_review_id` is the
    /// submission's idempotency key, unique per `ReviewLog` set (spec §6).
    async fn save_review_atomic(
        &self,
        client_review_id: &str,
        writes: Vec<ReviewWrite>,
        grammar_updates: Vec<GrammarExposure>,
    ) -> anyhow::Result<()>;

    /// Reverts a previously applied submission: restores each word's
    /// pre-review snapshot and removes its review-log entries (spec §4.5
    /// "Undo"). No-op if the submission was never applied.
    async fn undo_submission(&self, client_review_id: &str) -> anyhow::Result<()>;
}
