use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::domain::LemmaId;
use crate::ports::{LemmaRepository, MemoryStore};

/// Defers auto-introduction of a lemma if any sibling sharing its root took
/// a rating-1 review within the interference window (spec §4.7).
pub struct RootInterferenceGuard<'a> {
    lemma_repository: &'a dyn LemmaRepository,
    memory_store: &'a dyn MemoryStore,
    window: Duration,
}

impl<'a> RootInterferenceGuard<'a> {
    pub fn new(lemma_repository: &'a dyn LemmaRepository, memory_store: &'a dyn MemoryStore, config: &Config) -> Self {
        Self {
            lemma_repository,
            memory_store,
            window: Duration::days(config.root_interference_window_days),
        }
    }

    /// True if `lemma_id` should be deferred this call.
    pub async fn should_defer(&self, lemma_id: LemmaId, root_id: Option<i64>, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let Some(root_id) = root_id else {
            return Ok(false);
        };
        let siblings = self.lemma_repository.siblings_by_root(root_id).await?;
        let sibling_ids: Vec<LemmaId> = siblings.into_iter().map(|l| l.id).filter(|id| *id != lemma_id).collect();
        if sibling_ids.is_empty() {
            return Ok(false);
        }
        let since = now - self.window;
        let flagged = self.memory_store.lemmas_rated_again_since(sibling_ids, since).await?;
        Ok(!flagged.is_empty())
    }
}
