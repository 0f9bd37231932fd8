use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::Config;
use crate::domain::{AcquisitionFields, Box3, KnowledgeState, MemoryState};
use crate::ports::MemoryStore;

/// Auto-suspension and graduated reintroduction for chronically-missed
/// words (spec §4.6).
pub struct LeechManager<'a> {
    config: &'a Config,
}

impl<'a> LeechManager<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Applies the leech check to a just-updated state. Called only for
    /// words rated ≤ 2 this submission (spec §4.5 step "After all words").
    /// Returns the state unchanged if the leech threshold isn't met.
    pub fn maybe_suspend(&self, state: &MemoryState, now: DateTime<Utc>) -> MemoryState {
        if state.times_seen < self.config.leech_min_seen || state.accuracy() >= self.config.leech_max_accuracy {
            return state.clone();
        }
        let mut suspended = state.clone();
        suspended.knowledge_state = KnowledgeState::Suspended;
        suspended.leech_suspended_at = Some(now);
        suspended.leech_count += 1;
        suspended
    }

    /// Reintroduction cooldown for a lemma about to be suspended for the
    /// `leech_count`-th time (1-indexed; spec §4.6: 1st → 3 d, 2nd → 7 d,
    /// 3rd+ → 14 d).
    pub fn cooldown_for(&self, leech_count: u32) -> chrono::Duration {
        let index = leech_count.saturating_sub(1).min(2) as usize;
        chrono::Duration::days(self.config.leech_cooldown_days[index])
    }

    /// Background scan: reintroduces suspended lemmas whose cooldown has
    /// elapsed back into acquisition box 1, preserving `times_seen` /
    /// `times_correct` so cumulative accuracy must genuinely improve to
    /// graduate again (spec §4.6).
    #[instrument(skip(self, memory_store))]
    pub async fn scan(&self, memory_store: &dyn MemoryStore, now: DateTime<Utc>) -> anyhow::Result<Vec<MemoryState>> {
        let due_for_reintro = memory_store.get_suspended_past_cooldown(now).await?;
        let mut reintroduced = Vec::with_capacity(due_for_reintro.len());
        for state in due_for_reintro {
            let mut next = state.clone();
            next.knowledge_state = KnowledgeState::Acquiring;
            next.acquisition = Some(AcquisitionFields {
                box_num: Box3::new(1),
                next_due_at: now,
                entered_acquiring_at: now,
            });
            next.card = None;
            next.leech_suspended_at = None;
            memory_store.save_memory_state(&next).await?;
            info!(lemma_id = next.lemma_id, leech_count = next.leech_count, "reintroduced leeched lemma");
            reintroduced.push(next);
        }
        Ok(reintroduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockMemoryStore;

    fn seen_state(times_seen: u32, times_correct: u32) -> MemoryState {
        let mut s = MemoryState::new_encountered(1, "x");
        s.knowledge_state = KnowledgeState::Learning;
        s.times_seen = times_seen;
        s.times_correct = times_correct;
        s
    }

    #[test]
    fn suspends_once_threshold_crossed() {
        let config = Config::default();
        let manager = LeechManager::new(&config);
        let state = seen_state(5, 2);
        let now = Utc::now();
        let suspended = manager.maybe_suspend(&state, now);
        assert_eq!(suspended.knowledge_state, KnowledgeState::Suspended);
        assert_eq!(suspended.leech_count, 1);
        assert_eq!(suspended.leech_suspended_at, Some(now));
    }

    #[test]
    fn no_suspension_above_accuracy_threshold() {
        let config = Config::default();
        let manager = LeechManager::new(&config);
        let state = seen_state(5, 4);
        let result = manager.maybe_suspend(&state, Utc::now());
        assert_eq!(result.knowledge_state, KnowledgeState::Learning);
    }

    #[test]
    fn cooldown_escalates_with_leech_count() {
        let config = Config::default();
        let manager = LeechManager::new(&config);
        assert_eq!(manager.cooldown_for(1), chrono::Duration::days(3));
        assert_eq!(manager.cooldown_for(2), chrono::Duration::days(7));
        assert_eq!(manager.cooldown_for(3), chrono::Duration::days(14));
        assert_eq!(manager.cooldown_for(9), chrono::Duration::days(14));
    }

    #[tokio::test]
    async fn scan_reintroduces_into_box_one() {
        let mut memory_store = MockMemoryStore::new();
        memory_store.expect_get_suspended_past_cooldown().returning(|_| {
            let mut s = seen_state(5, 2);
            s.knowledge_state = KnowledgeState::Suspended;
            s.leech_count = 1;
            s.leech_suspended_at = Some(Utc::now());
            Ok(vec![s])
        });
        memory_store.expect_save_memory_state().returning(|_| Ok(()));
        let config = Config::default();
        let manager = LeechManager::new(&config);
        let reintroduced = manager.scan(&memory_store, Utc::now()).await.unwrap();
        assert_eq!(reintroduced.len(), 1);
        assert_eq!(reintroduced[0].knowledge_state, KnowledgeState::Acquiring);
        assert_eq!(reintroduced[0].times_seen, 5);
    }
}
