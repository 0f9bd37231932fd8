use chrono::{DateTime, Utc};

use crate::domain::{LemmaId, Mode, Sentence};
use crate::ports::SentencePool;

/// Pulls active, recency-eligible sentences covering any due lemma from the
/// pool (spec §4.4 "Candidate Fetch"). The recency filter itself lives in
/// the pool adapter (spec §4.3); this stage is a thin typed wrapper so the
/// builder's pipeline reads as one stage per spec paragraph.
pub async fn fetch_candidates(
    pool: &dyn SentencePool,
    due_lemma_ids: &[LemmaId],
    mode: Mode,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Sentence>> {
    if due_lemma_ids.is_empty() {
        return Ok(Vec::new());
    }
    pool.active_sentences_covering(due_lemma_ids.to_vec(), mode, now).await
}
