use alif_core::domain::{null_comprehension_cooldown, Comprehension, LemmaId, Mode, Sentence, SentenceId, SentenceReviewLog};
use alif_core::ports::SentencePool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    comprehension_to_str, mode_to_str, ComprehensionRow, SentenceRow, TokenRow,
};
use crate::SqliteStore;

fn is_eligible(sentence: &Sentence, mode: Mode, now: DateTime<Utc>) -> bool {
    let Some(last_shown_at) = sentence.last_shown_at else {
        return true;
    };
    let cooldown = match sentence.last_comprehension.get(&mode) {
        Some(comprehension) => comprehension.cooldown(),
        None => null_comprehension_cooldown(),
    };
    now - last_shown_at >= cooldown
}

impl SqliteStore {
    async fn load_sentence(&self, row: SentenceRow) -> anyhow::Result<Sentence> {
        let tokens = sqlx::query_as::<_, TokenRow>(
            "SELECT sentence_id, position, surface, lemma_id FROM sentence_tokens WHERE sentence_id = ?",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let grammar_features: Vec<(i64,)> = sqlx::query_as(
            "SELECT feature_id FROM sentence_grammar_features WHERE sentence_id = ?",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let comprehension = sqlx::query_as::<_, ComprehensionRow>(
            "SELECT sentence_id, mode, last_comprehension FROM sentence_comprehension WHERE sentence_id = ?",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(crate::models::assemble_sentence(
            row,
            tokens,
            grammar_features.into_iter().map(|(id,)| id).collect(),
            comprehension,
        )?)
    }
}

#[async_trait]
impl SentencePool for SqliteStore {
    async fn active_sentences_covering(
        &self,
        lemma_ids: Vec<LemmaId>,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Sentence>> {
        // Token lemma ids are surface-form ids and may legitimately be
        // variants of a canonical due lemma (spec §4.3), so a token's
        // lemma_id is resolved up the `lemmas.canonical_id` chain to its
        // root before matching against the (already-canonical) due set.
        let mut candidate_ids: Vec<i64> = Vec::new();
        for chunk in lemma_ids.chunks(500) {
            let placeholders = std::iter::repeat("?").take(chunk.len()).collect::<Vec<_>>().join(",");
            let sql = format!(
                "WITH RECURSIVE canonical_of(lemma_id, root_id) AS ( \
                     SELECT id, id FROM lemmas WHERE canonical_id IS NULL \
                     UNION ALL \
                     SELECT l.id, c.root_id FROM lemmas l JOIN canonical_of c ON l.canonical_id = c.lemma_id \
                 ) \
                 SELECT DISTINCT s.id FROM sentences s \
                 JOIN sentence_tokens t ON t.sentence_id = s.id \
                 JOIN canonical_of c ON c.lemma_id = t.lemma_id \
                 WHERE s.is_active = 1 AND c.root_id IN ({placeholders})"
            );
            let mut query = sqlx::query_as::<_, (i64,)>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            let rows = query.fetch_all(&self.pool).await?;
            candidate_ids.extend(rows.into_iter().map(|(id,)| id));
        }

        let mut sentences = Vec::with_capacity(candidate_ids.len());
        for id in candidate_ids {
            let Some(row) = sqlx::query_as::<_, SentenceRow>("SELECT * FROM sentences WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            else {
                continue;
            };
            let sentence = self.load_sentence(row).await?;
            if is_eligible(&sentence, mode, now) {
                sentences.push(sentence);
            }
        }
        Ok(sentences)
    }

    async fn get_sentence(&self, sentence_id: SentenceId) -> anyhow::Result<Option<Sentence>> {
        let Some(row) = sqlx::query_as::<_, SentenceRow>("SELECT * FROM sentences WHERE id = ?")
            .bind(sentence_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(self.load_sentence(row).await?))
    }

    async fn record_shown(
        &self,
        sentence_id: SentenceId,
        mode: Mode,
        comprehension: Comprehension,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE sentences SET times_shown = times_shown + 1, last_shown_at = ? WHERE id = ?")
            .bind(now.timestamp_millis())
            .bind(sentence_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO sentence_comprehension (sentence_id, mode, last_comprehension) \
             VALUES (?, ?, ?) \
             ON CONFLICT(sentence_id, mode) DO UPDATE SET last_comprehension = excluded.last_comprehension",
        )
        .bind(sentence_id)
        .bind(mode_to_str(mode))
        .bind(comprehension_to_str(comprehension))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn revert_shown(
        &self,
        sentence_id: SentenceId,
        mode: Mode,
        prior_comprehension: Option<Comprehension>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE sentences SET times_shown = MAX(times_shown - 1, 0) WHERE id = ?",
        )
        .bind(sentence_id)
        .execute(&mut *tx)
        .await?;
        match prior_comprehension {
            Some(comprehension) => {
                sqlx::query(
                    "INSERT INTO sentence_comprehension (sentence_id, mode, last_comprehension) \
                     VALUES (?, ?, ?) \
                     ON CONFLICT(sentence_id, mode) DO UPDATE SET last_comprehension = excluded.last_comprehension",
                )
                .bind(sentence_id)
                .bind(mode_to_str(mode))
                .bind(comprehension_to_str(comprehension))
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM sentence_comprehension WHERE sentence_id = ? AND mode = ?")
                    .bind(sentence_id)
                    .bind(mode_to_str(mode))
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert_sentence(&self, sentence: Sentence) -> anyhow::Result<SentenceId> {
        let mut tx = self.pool.begin().await?;
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO sentences \
             (arabic, translation, transliteration, target_lemma_id, times_shown, last_shown_at, is_active, max_word_count, audio_url) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(&sentence.arabic)
        .bind(&sentence.translation)
        .bind(&sentence.transliteration)
        .bind(sentence.target_lemma_id)
        .bind(sentence.times_shown as i64)
        .bind(sentence.last_shown_at.map(|t| t.timestamp_millis()))
        .bind(sentence.is_active as i64)
        .bind(sentence.max_word_count as i64)
        .bind(&sentence.audio_url)
        .fetch_one(&mut *tx)
        .await?;
        let sentence_id = id.0;

        for (position, token) in sentence.tokens.iter().enumerate() {
            sqlx::query(
                "INSERT INTO sentence_tokens (sentence_id, position, surface, lemma_id) VALUES (?, ?, ?, ?)",
            )
            .bind(sentence_id)
            .bind(position as i64)
            .bind(&token.surface)
            .bind(token.lemma_id)
            .execute(&mut *tx)
            .await?;
        }

        for feature_id in &sentence.grammar_features {
            sqlx::query(
                "INSERT INTO sentence_grammar_features (sentence_id, feature_id) VALUES (?, ?)",
            )
            .bind(sentence_id)
            .bind(feature_id)
            .execute(&mut *tx)
            .await?;
        }

        for (mode, comprehension) in &sentence.last_comprehension {
            sqlx::query(
                "INSERT INTO sentence_comprehension (sentence_id, mode, last_comprehension) VALUES (?, ?, ?)",
            )
            .bind(sentence_id)
            .bind(mode_to_str(*mode))
            .bind(comprehension_to_str(*comprehension))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(sentence_id)
    }

    async fn retire(&self, sentence_id: SentenceId) -> anyhow::Result<()> {
        sqlx::query("UPDATE sentences SET is_active = 0 WHERE id = ?")
            .bind(sentence_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn log_review(&self, log: SentenceReviewLog) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sentence_review_logs \
             (sentence_id, session_id, mode, comprehension_signal, response_ms, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(log.sentence_id)
        .bind(log.session_id)
        .bind(mode_to_str(log.mode))
        .bind(comprehension_to_str(log.comprehension))
        .bind(log.response_ms as i64)
        .bind(log.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
