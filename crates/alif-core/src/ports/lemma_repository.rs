use async_trait::async_trait;

use crate::domain::{GrammarFeature, GrammarFeatureId, Lemma, LemmaId, Root, RootId};

/// Read-only lookups over lemmas, the canonical-variant graph, roots and
/// grammar features (spec §2 item 1, §6 "Variant graph & lemma
/// repository"). The scheduler never mutates lemmas through this port.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait LemmaRepository: Send + Sync {
    async fn get_lemma(&self, lemma_id: LemmaId) -> anyhow::Result<Option<Lemma>>;

    async fn get_lemmas(&self, lemma_ids: Vec<LemmaId>) -> anyhow::Result<Vec<Lemma>>;

    /// Every lemma that is immediately eligible for introduction (non
    /// function-word, canonical), ordered by ascending frequency rank
    /// (most common first), used by Auto-Introduction (spec §4.4).
    async fn lemmas_by_frequency(&self, limit: usize) -> anyhow::Result<Vec<Lemma>>;

    /// Sibling lemmas sharing `root_id`, used by the Root Interference
    /// Guard (spec §4.7).
    async fn siblings_by_root(&self, root_id: RootId) -> anyhow::Result<Vec<Lemma>>;

    async fn get_root(&self, root_id: RootId) -> anyhow::Result<Option<Root>>;

    async fn get_grammar_feature(
        &self,
        feature_id: GrammarFeatureId,
    ) -> anyhow::Result<Option<GrammarFeature>>;
}
