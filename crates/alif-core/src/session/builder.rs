use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use crate::config::Config;
use crate::domain::{GrammarFeatureId, Lemma, LemmaId, MemoryState, Mode};
use crate::ports::{difficulty_for_maturity, GenerationConstraints, LemmaRepository, MemoryStore, SentenceGenerator, SentencePool};

use super::auto_intro::{AcquisitionOccupancy, AutoIntroStage};
use super::candidates::fetch_candidates;
use super::classify::classify;
use super::cohort::{build_cohort, due_lemma_ids};
use super::cover::greedy_cover;
use super::ordering::order_session;
use super::repetition::add_repetitions;
use super::response::{assemble, BuildSessionResponse, IntroCandidate};
use super::scoring::ScoringContext;

/// A session request (spec §6 "Session request").
#[derive(Debug, Clone, Copy)]
pub struct BuildSessionRequest {
    pub mode: Mode,
    pub limit: usize,
    pub now: DateTime<Utc>,
}

impl Default for BuildSessionRequest {
    fn default() -> Self {
        Self { mode: Mode::Reading, limit: 10, now: Utc::now() }
    }
}

/// Orchestrates the full session-build pipeline (spec §4.4): Classify →
/// Cohort → Auto-Introduce → Candidate Fetch → Score+Cover → Acquisition
/// Repetition → Order → On-Demand Generation → Fill Phase → Response
/// Assembly.
pub struct SessionBuilder {
    lemma_repository: Arc<dyn LemmaRepository>,
    memory_store: Arc<dyn MemoryStore>,
    sentence_pool: Arc<dyn SentencePool>,
    sentence_generator: Arc<dyn SentenceGenerator>,
    config: Config,
}

impl SessionBuilder {
    pub fn new(
        lemma_repository: Arc<dyn LemmaRepository>,
        memory_store: Arc<dyn MemoryStore>,
        sentence_pool: Arc<dyn SentencePool>,
        sentence_generator: Arc<dyn SentenceGenerator>,
        config: Config,
    ) -> Self {
        Self { lemma_repository, memory_store, sentence_pool, sentence_generator, config }
    }

    #[instrument(skip(self), fields(mode = ?request.mode, limit = request.limit))]
    pub async fn build(&self, request: BuildSessionRequest) -> anyhow::Result<BuildSessionResponse> {
        let all_states = self.memory_store.get_all_non_suspended().await?;
        let mut states: HashMap<LemmaId, MemoryState> = all_states.into_iter().map(|s| (s.lemma_id, s)).collect();

        let classified = classify(&states.values().cloned().collect::<Vec<_>>(), request.now);
        let cohort = build_cohort(&classified, self.config.max_cohort);
        let mut due: HashSet<LemmaId> = due_lemma_ids(&cohort).into_iter().collect();

        let mut intro_candidates = Vec::new();
        self.auto_introduce(request.mode, request.now, false, &mut states, &mut due, &mut intro_candidates).await?;

        let mut candidates = fetch_candidates(self.sentence_pool.as_ref(), &due.iter().copied().collect::<Vec<_>>(), request.mode, request.now).await?;

        let (lemmas, mut grammar_exposure) = self.load_context(&candidates, &due).await?;

        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &self.config };
        let due_vec: Vec<LemmaId> = due.iter().copied().collect();
        let mut selected = greedy_cover(&ctx, &candidates, &due_vec, request.limit);

        let acquiring: Vec<LemmaId> = due_vec.iter().copied().filter(|id| states.get(id).map(|s| s.acquisition.is_some()).unwrap_or(false)).collect();
        selected = add_repetitions(&ctx, selected, &candidates, &acquiring, self.config.acquisition_repetition_cap, self.config.acquisition_repetition_overflow);

        let mut on_demand_ids = HashSet::new();
        self.generate_on_demand(&ctx, &mut selected, &due, &mut candidates, &mut on_demand_ids, request.now).await;

        if selected.len() < request.limit {
            self.auto_introduce(request.mode, request.now, true, &mut states, &mut due, &mut intro_candidates).await?;
            let fill_due: Vec<LemmaId> = due.iter().copied().filter(|id| !selected.iter().any(|s| s.covered.contains(id))).collect();
            if !fill_due.is_empty() {
                let more = fetch_candidates(self.sentence_pool.as_ref(), &fill_due, request.mode, request.now).await?;
                candidates.extend(more.iter().cloned());
                let (more_lemmas, more_exposure) = self.load_context(&candidates, &due).await?;
                let ctx2 = ScoringContext { lemmas: &more_lemmas, memory_states: &states, grammar_exposure: &more_exposure, config: &self.config };
                let added = greedy_cover(&ctx2, &candidates, &fill_due, request.limit.saturating_sub(selected.len()));
                selected.extend(added);
                grammar_exposure = more_exposure;
                self.generate_on_demand(&ScoringContext { lemmas: &more_lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &self.config }, &mut selected, &due, &mut candidates, &mut on_demand_ids, request.now).await;
            }
        }

        let ordered = order_session(selected, &states);
        let (final_lemmas, _) = self.load_context(&candidates, &due).await?;
        let items = assemble(ordered, &due, &final_lemmas, &states, &on_demand_ids);

        Ok(BuildSessionResponse { items, intro_candidates })
    }

    async fn auto_introduce(
        &self,
        mode: Mode,
        now: DateTime<Utc>,
        relaxed: bool,
        states: &mut HashMap<LemmaId, MemoryState>,
        due: &mut HashSet<LemmaId>,
        intro_candidates: &mut Vec<IntroCandidate>,
    ) -> anyhow::Result<()> {
        let acquiring_count = states.values().filter(|s| s.acquisition.is_some()).count();
        let box1_count = states.values().filter(|s| s.acquisition.map(|a| a.box_num.value() == 1).unwrap_or(false)).count();
        let occupancy = AcquisitionOccupancy { acquiring_count, box1_count };

        let stage = AutoIntroStage::new(self.lemma_repository.as_ref(), self.memory_store.as_ref(), &self.config);
        let outcome = stage.run(mode, occupancy, now, relaxed).await?;

        if !outcome.introduced.is_empty() {
            self.memory_store.save_memory_states(outcome.introduced.clone()).await?;
        }
        for state in outcome.introduced {
            due.insert(state.lemma_id);
            states.insert(state.lemma_id, state);
        }
        for lemma in outcome.deferred {
            intro_candidates.push(IntroCandidate { lemma_id: lemma.id, gloss: lemma.gloss });
        }
        Ok(())
    }

    async fn load_context(
        &self,
        candidates: &[crate::domain::Sentence],
        due: &HashSet<LemmaId>,
    ) -> anyhow::Result<(HashMap<LemmaId, Lemma>, HashMap<GrammarFeatureId, crate::domain::GrammarExposure>)> {
        let mut lemma_ids: HashSet<LemmaId> = due.iter().copied().collect();
        for sentence in candidates {
            lemma_ids.extend(sentence.content_lemma_ids());
        }
        let fetched = self.lemma_repository.get_lemmas(lemma_ids.into_iter().collect()).await?;
        let mut lemmas: HashMap<LemmaId, Lemma> = fetched.into_iter().map(|l| (l.id, l)).collect();
        // Pull in canonical parents for variants so resolve_canonical terminates.
        let parent_ids: Vec<LemmaId> = lemmas.values().filter_map(|l| l.canonical_id).filter(|id| !lemmas.contains_key(id)).collect();
        if !parent_ids.is_empty() {
            for lemma in self.lemma_repository.get_lemmas(parent_ids).await? {
                lemmas.insert(lemma.id, lemma);
            }
        }

        let mut feature_ids: HashSet<GrammarFeatureId> = HashSet::new();
        for sentence in candidates {
            feature_ids.extend(sentence.grammar_features.iter().copied());
        }
        let mut grammar_exposure = HashMap::new();
        for feature_id in feature_ids {
            if let Some(exposure) = self.memory_store.get_grammar_exposure(feature_id).await? {
                grammar_exposure.insert(feature_id, exposure);
            }
        }

        Ok((lemmas, grammar_exposure))
    }

    async fn generate_on_demand(
        &self,
        ctx: &ScoringContext<'_>,
        selected: &mut Vec<super::scoring::Scored>,
        due: &HashSet<LemmaId>,
        candidates: &mut Vec<crate::domain::Sentence>,
        on_demand_ids: &mut HashSet<i64>,
        now: DateTime<Utc>,
    ) {
        let uncovered: Vec<LemmaId> = due.iter().copied().filter(|id| !selected.iter().any(|s| s.covered.contains(id))).collect();
        if uncovered.is_empty() {
            return;
        }
        let targets: Vec<LemmaId> = uncovered.into_iter().take(self.config.max_on_demand_per_session).collect();

        let (weakest_age, weakest_times_seen) = targets
            .iter()
            .map(|id| {
                let state = ctx.memory_states.get(id);
                let entered = state.and_then(|s| s.entered_acquiring_at.or(s.graduated_at));
                let age = entered.map(|t| now - t).unwrap_or_else(chrono::Duration::zero);
                (age, state.map(|s| s.times_seen).unwrap_or(0))
            })
            .min_by_key(|(age, _)| *age)
            .unwrap_or_else(|| (chrono::Duration::zero(), 0));
        let (max_words, difficulty_hint) = difficulty_for_maturity(weakest_age, weakest_times_seen);

        let constraints = GenerationConstraints {
            max_words,
            difficulty_hint,
            known_vocab_sample: ctx.memory_states.keys().copied().take(50).collect(),
            rejected_words: Vec::new(),
            avoid_proper_nouns: true,
        };

        let generated = match self.sentence_generator.generate(targets, constraints, now).await {
            Ok(sentences) => sentences,
            Err(error) => {
                warn!(%error, "on-demand sentence generation failed");
                return;
            }
        };

        let remaining: HashSet<LemmaId> = due.iter().copied().filter(|id| !selected.iter().any(|s| s.covered.contains(id))).collect();
        for mut sentence in generated {
            let Some(mut scored) = ctx.score(&sentence, &remaining) else { continue };
            let Ok(persisted_id) = self.sentence_pool.insert_sentence(sentence.clone()).await else {
                continue;
            };
            sentence.id = persisted_id;
            scored.sentence.id = persisted_id;
            on_demand_ids.insert(persisted_id);
            candidates.push(sentence);
            selected.push(scored);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KnowledgeState;
    use crate::ports::{DifficultyHint, MockLemmaRepository, MockMemoryStore, MockSentenceGenerator, MockSentencePool};

    fn builder_with_generator(generator: MockSentenceGenerator) -> SessionBuilder {
        SessionBuilder::new(
            Arc::new(MockLemmaRepository::new()),
            Arc::new(MockMemoryStore::new()),
            Arc::new(MockSentencePool::new()),
            Arc::new(generator),
            Config::default(),
        )
    }

    #[tokio::test]
    async fn on_demand_derives_constraints_from_the_weakest_target_maturity() {
        let now = Utc::now();
        let lemma_id = 1;
        let mut state = MemoryState::new_encountered(lemma_id, "x");
        state.knowledge_state = KnowledgeState::Acquiring;
        state.times_seen = 20;
        state.entered_acquiring_at = Some(now - chrono::Duration::days(10));

        let mut states = HashMap::new();
        states.insert(lemma_id, state);
        let lemmas = HashMap::new();
        let grammar_exposure = HashMap::new();
        let config = Config::default();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };

        let mut generator = MockSentenceGenerator::new();
        generator
            .expect_generate()
            .withf(|_targets: &Vec<LemmaId>, constraints: &GenerationConstraints, _now: &DateTime<Utc>| {
                constraints.max_words == 14 && constraints.difficulty_hint == DifficultyHint::Intermediate
            })
            .returning(|_, _, _| Ok(vec![]));

        let builder = builder_with_generator(generator);
        let mut selected = Vec::new();
        let due: HashSet<LemmaId> = std::iter::once(lemma_id).collect();
        let mut candidates = Vec::new();
        let mut on_demand_ids = HashSet::new();
        builder.generate_on_demand(&ctx, &mut selected, &due, &mut candidates, &mut on_demand_ids, now).await;
    }

    #[tokio::test]
    async fn on_demand_uses_simple_band_for_a_freshly_introduced_target() {
        let now = Utc::now();
        let lemma_id = 1;
        let mut state = MemoryState::new_encountered(lemma_id, "x");
        state.knowledge_state = KnowledgeState::Acquiring;
        state.times_seen = 0;
        state.entered_acquiring_at = Some(now);

        let mut states = HashMap::new();
        states.insert(lemma_id, state);
        let lemmas = HashMap::new();
        let grammar_exposure = HashMap::new();
        let config = Config::default();
        let ctx = ScoringContext { lemmas: &lemmas, memory_states: &states, grammar_exposure: &grammar_exposure, config: &config };

        let mut generator = MockSentenceGenerator::new();
        generator
            .expect_generate()
            .withf(|_targets: &Vec<LemmaId>, constraints: &GenerationConstraints, _now: &DateTime<Utc>| {
                constraints.max_words == 7 && constraints.difficulty_hint == DifficultyHint::Simple
            })
            .returning(|_, _, _| Ok(vec![]));

        let builder = builder_with_generator(generator);
        let mut selected = Vec::new();
        let due: HashSet<LemmaId> = std::iter::once(lemma_id).collect();
        let mut candidates = Vec::new();
        let mut on_demand_ids = HashSet::new();
        builder.generate_on_demand(&ctx, &mut selected, &due, &mut candidates, &mut on_demand_ids, now).await;
    }
}
