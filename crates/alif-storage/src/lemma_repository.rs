use alif_core::domain::{GrammarFeature, GrammarFeatureId, Lemma, LemmaId, Root, RootId};
use alif_core::ports::LemmaRepository;
use async_trait::async_trait;

use crate::models::{GrammarFeatureRow, LemmaRow, RootRow};
use crate::SqliteStore;

#[async_trait]
impl LemmaRepository for SqliteStore {
    async fn get_lemma(&self, lemma_id: LemmaId) -> anyhow::Result<Option<Lemma>> {
        let row = sqlx::query_as::<_, LemmaRow>("SELECT * FROM lemmas WHERE id = ?")
            .bind(lemma_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lemma::from))
    }

    async fn get_lemmas(&self, lemma_ids: Vec<LemmaId>) -> anyhow::Result<Vec<Lemma>> {
        let mut out = Vec::with_capacity(lemma_ids.len());
        for chunk in lemma_ids.chunks(500) {
            let placeholders = std::iter::repeat("?").take(chunk.len()).collect::<Vec<_>>().join(",");
            let sql = format!("SELECT * FROM lemmas WHERE id IN ({placeholders})");
            let mut query = sqlx::query_as::<_, LemmaRow>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            let rows = query.fetch_all(&self.pool).await?;
            out.extend(rows.into_iter().map(Lemma::from));
        }
        Ok(out)
    }

    async fn lemmas_by_frequency(&self, limit: usize) -> anyhow::Result<Vec<Lemma>> {
        let rows = sqlx::query_as::<_, LemmaRow>(
            "SELECT * FROM lemmas \
             WHERE is_function_word = 0 AND canonical_id IS NULL \
             ORDER BY frequency_rank ASC \
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Lemma::from).collect())
    }

    async fn siblings_by_root(&self, root_id: RootId) -> anyhow::Result<Vec<Lemma>> {
        let rows = sqlx::query_as::<_, LemmaRow>("SELECT * FROM lemmas WHERE root_id = ?")
            .bind(root_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Lemma::from).collect())
    }

    async fn get_root(&self, root_id: RootId) -> anyhow::Result<Option<Root>> {
        let row = sqlx::query_as::<_, RootRow>("SELECT * FROM roots WHERE id = ?")
            .bind(root_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Root::from))
    }

    async fn get_grammar_feature(
        &self,
        feature_id: GrammarFeatureId,
    ) -> anyhow::Result<Option<GrammarFeature>> {
        let row = sqlx::query_as::<_, GrammarFeatureRow>("SELECT * FROM grammar_features WHERE id = ?")
            .bind(feature_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(GrammarFeature::from))
    }
}
