use chrono::{DateTime, Utc};

use crate::acquisition::AcquisitionScheduler;
use crate::config::Config;
use crate::domain::{Lemma, LemmaId, Mode, MemoryState, ReviewGrade};
use crate::ports::{LemmaRepository, MemoryStore};

use super::root_interference::RootInterferenceGuard;

/// Current acquisition occupancy, used to cap auto-introduction (spec §4.4).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcquisitionOccupancy {
    pub acquiring_count: usize,
    pub box1_count: usize,
}

/// Result of an auto-introduction pass: lemmas actually started, plus the
/// ones skipped by the interference guard (surfaced as `intro_candidates`
/// in the final response, spec §4.4 Response Assembly).
#[derive(Debug, Default)]
pub struct AutoIntroOutcome {
    pub introduced: Vec<MemoryState>,
    pub deferred: Vec<Lemma>,
}

/// Maps the learner's last-20 accuracy to a budget, runs the interference
/// guard, and starts acquisition for the top-frequency eligible lemmas
/// (spec §4.4 "Auto-Introduction").
pub struct AutoIntroStage<'a> {
    lemma_repository: &'a dyn LemmaRepository,
    memory_store: &'a dyn MemoryStore,
    config: &'a Config,
}

impl<'a> AutoIntroStage<'a> {
    pub fn new(lemma_repository: &'a dyn LemmaRepository, memory_store: &'a dyn MemoryStore, config: &'a Config) -> Self {
        Self { lemma_repository, memory_store, config }
    }

    /// `relaxed` switches to the fill-phase caps (50 / 15) per spec §4.4.
    pub async fn run(
        &self,
        mode: Mode,
        occupancy: AcquisitionOccupancy,
        now: DateTime<Utc>,
        relaxed: bool,
    ) -> anyhow::Result<AutoIntroOutcome> {
        let mut outcome = AutoIntroOutcome::default();
        if mode == Mode::Listening && !self.config.listening_auto_intro {
            return Ok(outcome);
        }

        let (max_acquiring, max_box1) = if relaxed {
            (self.config.max_acquiring_relaxed, self.config.max_box1_relaxed)
        } else {
            (self.config.max_acquiring, self.config.max_box1)
        };
        if occupancy.acquiring_count >= max_acquiring || occupancy.box1_count >= max_box1 {
            return Ok(outcome);
        }

        let recent = self.memory_store.recent_ratings(20).await?;
        let accuracy = if recent.len() < 10 {
            None
        } else {
            let correct = recent.iter().filter(|r| r.is_success()).count();
            Some(correct as f64 / recent.len() as f64)
        };
        let budget = match accuracy {
            Some(acc) => self.config.auto_intro_bands.budget_for_accuracy(acc),
            None => self.config.auto_intro_bands.default_budget_when_sparse,
        };
        let budget = budget.min(self.config.auto_intro_ceiling);
        let room = (max_acquiring - occupancy.acquiring_count).min(max_box1 - occupancy.box1_count);
        let budget = budget.min(room);
        if budget == 0 {
            return Ok(outcome);
        }

        let guard = RootInterferenceGuard::new(self.lemma_repository, self.memory_store, self.config);
        let scheduler = AcquisitionScheduler::new(self.config);

        let candidates = self.lemma_repository.lemmas_by_frequency(budget * 4 + 10).await?;
        for lemma in candidates {
            if outcome.introduced.len() >= budget {
                break;
            }
            if self.memory_store.get_memory_state(lemma.id).await?.is_some() {
                continue;
            }
            if guard.should_defer(lemma.id, lemma.root_id, now).await? {
                outcome.deferred.push(lemma);
                continue;
            }
            let encountered = MemoryState::new_encountered(lemma.id, "auto_intro");
            let started = scheduler.enter(encountered, now, true);
            outcome.introduced.push(started);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockLemmaRepository, MockMemoryStore};

    fn lemma(id: LemmaId, rank: u32) -> Lemma {
        Lemma {
            id,
            surface: format!("w{id}"),
            gloss: "gloss".into(),
            part_of_speech: "NOUN".into(),
            frequency_rank: rank,
            root_id: None,
            canonical_id: None,
            thematic_tag: None,
            is_function_word: false,
        }
    }

    #[tokio::test]
    async fn sparse_history_uses_default_budget() {
        let mut lemma_repo = MockLemmaRepository::new();
        lemma_repo
            .expect_lemmas_by_frequency()
            .returning(|n| Ok((0..n as i64).map(|i| lemma(i + 1, i as u32)).collect()));
        let mut memory_store = MockMemoryStore::new();
        memory_store.expect_recent_ratings().returning(|_| Ok(vec![]));
        memory_store.expect_get_memory_state().returning(|_| Ok(None));
        memory_store.expect_lemmas_rated_again_since().returning(|_, _| Ok(vec![]));
        let config = Config::default();
        let stage = AutoIntroStage::new(&lemma_repo, &memory_store, &config);
        let outcome = stage
            .run(Mode::Reading, AcquisitionOccupancy::default(), Utc::now(), false)
            .await
            .unwrap();
        assert_eq!(outcome.introduced.len(), config.auto_intro_bands.default_budget_when_sparse);
    }

    #[tokio::test]
    async fn listening_mode_never_introduces_by_default() {
        let lemma_repo = MockLemmaRepository::new();
        let memory_store = MockMemoryStore::new();
        let config = Config::default();
        let stage = AutoIntroStage::new(&lemma_repo, &memory_store, &config);
        let outcome = stage
            .run(Mode::Listening, AcquisitionOccupancy::default(), Utc::now(), false)
            .await
            .unwrap();
        assert!(outcome.introduced.is_empty());
    }

    #[tokio::test]
    async fn zero_accuracy_band_introduces_nothing() {
        let lemma_repo = MockLemmaRepository::new();
        let mut memory_store = MockMemoryStore::new();
        memory_store
            .expect_recent_ratings()
            .returning(|_| Ok(vec![ReviewGrade::Again; 15]));
        let config = Config::default();
        let stage = AutoIntroStage::new(&lemma_repo, &memory_store, &config);
        let outcome = stage
            .run(Mode::Reading, AcquisitionOccupancy::default(), Utc::now(), false)
            .await
            .unwrap();
        assert!(outcome.introduced.is_empty());
    }
}
