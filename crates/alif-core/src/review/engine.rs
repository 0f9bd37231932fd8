use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::acquisition::{AcquisitionOutcome, AcquisitionScheduler};
use crate::config::Config;
use crate::domain::{
    Comprehension, CreditType, GrammarExposure, GrammarFeatureId, KnowledgeState, Lemma, LemmaId, MemoryState,
    Mode, ReviewGrade, ReviewLog, ReviewLogId, SchedulerError, SentenceId, SentenceReviewLog, SessionId,
};
use crate::long_term::LongTermScheduler;
use crate::ports::{LemmaRepository, MemoryStore, ReviewWrite, SentencePool};

use super::leech::LeechManager;

/// Inbound review submission (spec §6 "Review submission").
#[derive(Debug, Clone)]
pub struct SubmitReviewRequest {
    pub client_review_id: String,
    pub session_id: SessionId,
    pub sentence_id: SentenceId,
    pub mode: Mode,
    pub comprehension_signal: Comprehension,
    pub missed_lemma_ids: Vec<LemmaId>,
    pub confused_lemma_ids: Vec<LemmaId>,
    pub response_ms: u32,
}

/// Per-word outcome (spec §6 "per-word results keyed by lemma id").
#[derive(Debug, Clone)]
pub struct WordResult {
    pub lemma_id: LemmaId,
    pub rating: ReviewGrade,
    pub new_state: MemoryState,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitReviewResponse {
    pub results: Vec<WordResult>,
    pub review_log_ids: Vec<ReviewLogId>,
}

/// Per-word routing, memory updates and cross-cutting invariants on review
/// submission (spec §4.5).
pub struct ReviewSubmissionEngine {
    lemma_repository: Arc<dyn LemmaRepository>,
    memory_store: Arc<dyn MemoryStore>,
    sentence_pool: Arc<dyn SentencePool>,
    config: Config,
}

impl ReviewSubmissionEngine {
    pub fn new(
        lemma_repository: Arc<dyn LemmaRepository>,
        memory_store: Arc<dyn MemoryStore>,
        sentence_pool: Arc<dyn SentencePool>,
        config: Config,
    ) -> Self {
        Self { lemma_repository, memory_store, sentence_pool, config }
    }

    #[instrument(skip(self, request), fields(session_id = request.session_id, sentence_id = request.sentence_id, client_review_id = %request.client_review_id))]
    pub async fn submit(&self, request: SubmitReviewRequest, now: DateTime<Utc>) -> anyhow::Result<SubmitReviewResponse> {
        let existing = self.memory_store.get_review_logs_for_client_id(&request.client_review_id).await?;
        if !existing.is_empty() {
            return self.replay(existing).await;
        }

        let sentence = self
            .sentence_pool
            .get_sentence(request.sentence_id)
            .await?
            .ok_or_else(|| SchedulerError::Validation(format!("unknown sentence id {}", request.sentence_id)))?;

        let token_lemma_ids: Vec<LemmaId> = sentence.content_lemma_ids().collect();
        let lemmas = self.lemma_repository.get_lemmas(token_lemma_ids.clone()).await?;
        let mut lemma_index: HashMap<LemmaId, Lemma> = lemmas.into_iter().map(|l| (l.id, l)).collect();
        let missing_parents: Vec<LemmaId> = lemma_index
            .values()
            .filter_map(|l| l.canonical_id)
            .filter(|id| !lemma_index.contains_key(id))
            .collect();
        for lemma in self.lemma_repository.get_lemmas(missing_parents).await? {
            lemma_index.insert(lemma.id, lemma);
        }
        let canonical_of = |id: LemmaId| crate::domain::resolve_canonical(id, |i| lemma_index.get(&i).and_then(|l| l.canonical_id));

        let missed_canonical: HashSet<LemmaId> = request.missed_lemma_ids.iter().map(|id| canonical_of(*id)).collect();
        let confused_canonical: HashSet<LemmaId> = request.confused_lemma_ids.iter().map(|id| canonical_of(*id)).collect();

        // group raw token lemma ids by their canonical target, so variant
        // redirects can be tallied into variant_stats (spec §3, §4.5 step 6).
        let mut variants_by_canonical: HashMap<LemmaId, Vec<LemmaId>> = HashMap::new();
        let mut canonical_order: Vec<LemmaId> = Vec::new();
        for raw_id in token_lemma_ids {
            let Some(lemma) = lemma_index.get(&raw_id) else { continue };
            if lemma.is_function_word {
                continue;
            }
            let canonical = canonical_of(raw_id);
            if !variants_by_canonical.contains_key(&canonical) {
                canonical_order.push(canonical);
            }
            variants_by_canonical.entry(canonical).or_default().push(raw_id);
        }

        let canonical_ids: Vec<LemmaId> = canonical_order.clone();
        let prior_states = self.memory_store.get_memory_states(canonical_ids.clone()).await?;
        let mut prior_by_id: HashMap<LemmaId, MemoryState> = prior_states.into_iter().map(|s| (s.lemma_id, s)).collect();

        let acquisition_scheduler = AcquisitionScheduler::new(&self.config);
        let long_term_scheduler = LongTermScheduler::new(&self.config);
        let leech_manager = LeechManager::new(&self.config);

        let mut writes = Vec::new();
        let mut results = Vec::new();

        for canonical in canonical_order {
            let Some(prior) = prior_by_id.remove(&canonical) else { continue };
            if prior.knowledge_state == KnowledgeState::Suspended || prior.knowledge_state == KnowledgeState::Encountered {
                continue;
            }

            let rating = rate_word(request.comprehension_signal, missed_canonical.contains(&canonical), confused_canonical.contains(&canonical));

            let mut next_state = match routing_target(prior.knowledge_state) {
                RoutingTarget::Acquisition => match acquisition_scheduler.review(&prior, rating, now) {
                    AcquisitionOutcome::Continue(s) => s,
                    AcquisitionOutcome::Graduate(graduated) => long_term_scheduler.bootstrap_from_graduation(graduated, now)?,
                },
                RoutingTarget::LongTerm => long_term_scheduler.update(&prior, rating, now)?,
            };

            if rating.is_failure() {
                next_state = leech_manager.maybe_suspend(&next_state, now);
            }

            for variant_id in variants_by_canonical.get(&canonical).into_iter().flatten() {
                if *variant_id == canonical {
                    continue;
                }
                let stat = next_state.variant_stats.entry(*variant_id).or_default();
                stat.seen += 1;
                if missed_canonical.contains(&canonical) {
                    stat.missed += 1;
                } else if confused_canonical.contains(&canonical) {
                    stat.confused += 1;
                }
            }

            let credit_type = if sentence.target_lemma_id.map(canonical_of) == Some(canonical) {
                CreditType::Primary
            } else {
                CreditType::Collateral
            };

            let log = ReviewLog {
                id: 0,
                client_review_id: request.client_review_id.clone(),
                lemma_id: canonical,
                rating,
                sentence_id: request.sentence_id,
                session_id: request.session_id,
                timestamp: now,
                response_ms: request.response_ms,
                credit_type,
                pre_review_snapshot: prior,
            };

            results.push(WordResult { lemma_id: canonical, rating, new_state: next_state.clone() });
            writes.push(ReviewWrite { new_state: next_state, log });
        }

        let grammar_updates = self.update_grammar_exposure(&sentence.grammar_features, request.comprehension_signal, now).await?;

        self.memory_store.save_review_atomic(&request.client_review_id, writes, grammar_updates).await?;
        self.sentence_pool.record_shown(request.sentence_id, request.mode, request.comprehension_signal, now).await?;
        self.sentence_pool
            .log_review(SentenceReviewLog {
                sentence_id: request.sentence_id,
                session_id: request.session_id,
                mode: request.mode,
                comprehension: request.comprehension_signal,
                response_ms: request.response_ms,
                timestamp: now,
            })
            .await?;

        let review_log_ids = (0..results.len() as i64).collect();
        Ok(SubmitReviewResponse { results, review_log_ids })
    }

    /// Reverts a previously applied submission (spec §4.5 "Undo").
    /// `prior_comprehension` is the sentence's per-mode comprehension value
    /// before this submission, which the caller is responsible for having
    /// retained (the scheduler's own ports expose no history query for it).
    #[instrument(skip(self))]
    pub async fn undo(
        &self,
        client_review_id: &str,
        sentence_id: SentenceId,
        mode: Mode,
        prior_comprehension: Option<Comprehension>,
    ) -> anyhow::Result<()> {
        self.memory_store.undo_submission(client_review_id).await?;
        self.sentence_pool.revert_shown(sentence_id, mode, prior_comprehension).await?;
        Ok(())
    }

    async fn replay(&self, logs: Vec<ReviewLog>) -> anyhow::Result<SubmitReviewResponse> {
        let lemma_ids: Vec<LemmaId> = logs.iter().map(|l| l.lemma_id).collect();
        let states = self.memory_store.get_memory_states(lemma_ids).await?;
        let by_id: HashMap<LemmaId, MemoryState> = states.into_iter().map(|s| (s.lemma_id, s)).collect();
        let results = logs
            .iter()
            .filter_map(|log| {
                by_id.get(&log.lemma_id).map(|state| WordResult {
                    lemma_id: log.lemma_id,
                    rating: log.rating,
                    new_state: state.clone(),
                })
            })
            .collect();
        let review_log_ids = logs.iter().map(|l| l.id).collect();
        Ok(SubmitReviewResponse { results, review_log_ids })
    }

    async fn update_grammar_exposure(
        &self,
        feature_ids: &[GrammarFeatureId],
        comprehension: Comprehension,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<GrammarExposure>> {
        let correct = matches!(comprehension, Comprehension::Understood | Comprehension::GrammarConfused);
        let mut updated = Vec::with_capacity(feature_ids.len());
        for feature_id in feature_ids {
            let mut exposure = self
                .memory_store
                .get_grammar_exposure(*feature_id)
                .await?
                .unwrap_or_else(|| GrammarExposure::new(*feature_id));
            exposure.record(correct, now);
            updated.push(exposure);
        }
        Ok(updated)
    }
}

/// Which scheduler a word's rating routes to, keyed off its prior
/// knowledge state (spec §4.1 Acquisition, §4.2 Long-Term).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingTarget {
    Acquisition,
    LongTerm,
}

fn routing_target(state: KnowledgeState) -> RoutingTarget {
    match state {
        KnowledgeState::Acquiring => RoutingTarget::Acquisition,
        KnowledgeState::Learning | KnowledgeState::Known | KnowledgeState::Lapsed => RoutingTarget::LongTerm,
        KnowledgeState::Suspended | KnowledgeState::Encountered => {
            unreachable!("suspended/encountered words are filtered out before routing")
        }
    }
}

/// Per-word rating from the aggregate comprehension signal and marks
/// (spec §4.5 step 3).
fn rate_word(signal: Comprehension, missed: bool, confused: bool) -> ReviewGrade {
    match signal {
        Comprehension::Understood => ReviewGrade::Good,
        Comprehension::GrammarConfused => ReviewGrade::Good,
        Comprehension::NoIdea => ReviewGrade::Again,
        Comprehension::Partial => {
            if missed {
                ReviewGrade::Again
            } else if confused {
                ReviewGrade::Hard
            } else {
                ReviewGrade::Good
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn understood_rates_everyone_good() {
        assert_eq!(rate_word(Comprehension::Understood, true, true), ReviewGrade::Good);
    }

    #[test]
    fn partial_applies_marks() {
        assert_eq!(rate_word(Comprehension::Partial, true, false), ReviewGrade::Again);
        assert_eq!(rate_word(Comprehension::Partial, false, true), ReviewGrade::Hard);
        assert_eq!(rate_word(Comprehension::Partial, false, false), ReviewGrade::Good);
    }

    #[test]
    fn no_idea_rates_everyone_again() {
        assert_eq!(rate_word(Comprehension::NoIdea, false, false), ReviewGrade::Again);
    }

    #[test]
    fn grammar_confused_still_credits_vocabulary() {
        assert_eq!(rate_word(Comprehension::GrammarConfused, false, false), ReviewGrade::Good);
    }

    #[rstest]
    #[case(KnowledgeState::Acquiring, RoutingTarget::Acquisition)]
    #[case(KnowledgeState::Learning, RoutingTarget::LongTerm)]
    #[case(KnowledgeState::Known, RoutingTarget::LongTerm)]
    #[case(KnowledgeState::Lapsed, RoutingTarget::LongTerm)]
    fn routes_each_knowledge_state_to_its_scheduler(#[case] state: KnowledgeState, #[case] expected: RoutingTarget) {
        assert_eq!(routing_target(state), expected);
    }
}
