use alif_core::domain::{GrammarExposure, GrammarFeatureId, LemmaId, MemoryState, ReviewGrade, ReviewLog};
use alif_core::ports::{MemoryStore, ReviewWrite};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};

use crate::models::{
    grammar_exposure_to_row, memory_state_to_columns, rating_to_i64, GrammarExposureRow,
    MemoryStateRow, ReviewLogRow,
};
use crate::SqliteStore;

/// Reintroduction cooldown schedule, days by 1-indexed `leech_count`.
/// Mirrors `Config::leech_cooldown_days`'s default (spec §4.6); kept in
/// sync manually since the port exposes no config to this query.
const LEECH_COOLDOWN_DAYS: [i64; 3] = [3, 7, 14];

async fn save_memory_state_in_tx(tx: &mut Transaction<'_, Sqlite>, state: &MemoryState) -> anyhow::Result<()> {
    let columns = memory_state_to_columns(state)?;
    sqlx::query(
        "INSERT INTO memory_states \
         (lemma_id, knowledge_state, times_seen, times_correct, source, variant_stats, \
          entered_acquiring_at, graduated_at, leech_suspended_at, leech_count, \
          box_num, next_due_at, stability, difficulty, due_at, last_reviewed_at, fsrs_phase) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(lemma_id) DO UPDATE SET \
            knowledge_state = excluded.knowledge_state, \
            times_seen = excluded.times_seen, \
            times_correct = excluded.times_correct, \
            source = excluded.source, \
            variant_stats = excluded.variant_stats, \
            entered_acquiring_at = excluded.entered_acquiring_at, \
            graduated_at = excluded.graduated_at, \
            leech_suspended_at = excluded.leech_suspended_at, \
            leech_count = excluded.leech_count, \
            box_num = excluded.box_num, \
            next_due_at = excluded.next_due_at, \
            stability = excluded.stability, \
            difficulty = excluded.difficulty, \
            due_at = excluded.due_at, \
            last_reviewed_at = excluded.last_reviewed_at, \
            fsrs_phase = excluded.fsrs_phase",
    )
    .bind(state.lemma_id)
    .bind(&columns.knowledge_state)
    .bind(state.times_seen as i64)
    .bind(state.times_correct as i64)
    .bind(&state.source)
    .bind(&columns.variant_stats)
    .bind(columns.entered_acquiring_at)
    .bind(columns.graduated_at)
    .bind(columns.leech_suspended_at)
    .bind(state.leech_count as i64)
    .bind(columns.box_num)
    .bind(columns.next_due_at)
    .bind(columns.stability)
    .bind(columns.difficulty)
    .bind(columns.due_at)
    .bind(columns.last_reviewed_at)
    .bind(&columns.fsrs_phase)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn save_review_log_in_tx(tx: &mut Transaction<'_, Sqlite>, client_review_id: &str, log: &ReviewLog) -> anyhow::Result<()> {
    let pre_review_snapshot = serde_json::to_string(&log.pre_review_snapshot)?;
    sqlx::query(
        "INSERT INTO review_logs \
         (client_review_id, lemma_id, rating, sentence_id, session_id, timestamp, response_ms, credit_type, pre_review_snapshot) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(client_review_id)
    .bind(log.lemma_id)
    .bind(rating_to_i64(log.rating))
    .bind(log.sentence_id)
    .bind(log.session_id)
    .bind(log.timestamp.timestamp_millis())
    .bind(log.response_ms as i64)
    .bind(crate::models::credit_type_to_str(log.credit_type))
    .bind(pre_review_snapshot)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn save_grammar_exposure_in_tx(tx: &mut Transaction<'_, Sqlite>, exposure: &GrammarExposure) -> anyhow::Result<()> {
    let row = grammar_exposure_to_row(exposure);
    sqlx::query(
        "INSERT INTO grammar_exposure (feature_id, times_seen, times_correct, comfort, last_seen_at) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(feature_id) DO UPDATE SET \
            times_seen = excluded.times_seen, \
            times_correct = excluded.times_correct, \
            comfort = excluded.comfort, \
            last_seen_at = excluded.last_seen_at",
    )
    .bind(row.feature_id)
    .bind(row.times_seen)
    .bind(row.times_correct)
    .bind(row.comfort)
    .bind(row.last_seen_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl MemoryStore for SqliteStore {
    async fn get_memory_state(&self, lemma_id: LemmaId) -> anyhow::Result<Option<MemoryState>> {
        let row = sqlx::query_as::<_, MemoryStateRow>("SELECT * FROM memory_states WHERE lemma_id = ?")
            .bind(lemma_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_domain()).transpose()?)
    }

    async fn get_memory_states(&self, lemma_ids: Vec<LemmaId>) -> anyhow::Result<Vec<MemoryState>> {
        let mut out = Vec::with_capacity(lemma_ids.len());
        for chunk in lemma_ids.chunks(500) {
            let placeholders = std::iter::repeat("?").take(chunk.len()).collect::<Vec<_>>().join(",");
            let sql = format!("SELECT * FROM memory_states WHERE lemma_id IN ({placeholders})");
            let mut query = sqlx::query_as::<_, MemoryStateRow>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            let rows = query.fetch_all(&self.pool).await?;
            for row in rows {
                out.push(row.into_domain()?);
            }
        }
        Ok(out)
    }

    async fn get_all_non_suspended(&self) -> anyhow::Result<Vec<MemoryState>> {
        let rows = sqlx::query_as::<_, MemoryStateRow>(
            "SELECT * FROM memory_states WHERE knowledge_state != 'suspended'",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.into_domain().map_err(Into::into)).collect()
    }

    async fn get_suspended_past_cooldown(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<MemoryState>> {
        let rows = sqlx::query_as::<_, MemoryStateRow>(
            "SELECT * FROM memory_states WHERE knowledge_state = 'suspended' AND leech_suspended_at IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::new();
        for row in rows {
            let state = row.into_domain()?;
            let Some(suspended_at) = state.leech_suspended_at else { continue };
            let index = state.leech_count.saturating_sub(1).min(2) as usize;
            let cooldown = chrono::Duration::days(LEECH_COOLDOWN_DAYS[index]);
            if now - suspended_at >= cooldown {
                out.push(state);
            }
        }
        Ok(out)
    }

    async fn save_memory_state(&self, state: &MemoryState) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        save_memory_state_in_tx(&mut tx, state).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_memory_states(&self, states: Vec<MemoryState>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for state in &states {
            save_memory_state_in_tx(&mut tx, state).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_review_logs_for_client_id(&self, client_review_id: &str) -> anyhow::Result<Vec<ReviewLog>> {
        let rows = sqlx::query_as::<_, ReviewLogRow>("SELECT * FROM review_logs WHERE client_review_id = ?")
            .bind(client_review_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.into_domain().map_err(Into::into)).collect()
    }

    async fn recent_ratings(&self, limit: usize) -> anyhow::Result<Vec<ReviewGrade>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT rating FROM review_logs ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(rating,)| ReviewGrade::try_from(rating as u8).map_err(Into::into))
            .collect()
    }

    async fn lemmas_rated_again_since(
        &self,
        lemma_ids: Vec<LemmaId>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<LemmaId>> {
        let mut out = Vec::new();
        for chunk in lemma_ids.chunks(500) {
            let placeholders = std::iter::repeat("?").take(chunk.len()).collect::<Vec<_>>().join(",");
            let sql = format!(
                "SELECT DISTINCT lemma_id FROM review_logs \
                 WHERE rating = 1 AND timestamp >= ? AND lemma_id IN ({placeholders})"
            );
            let mut query = sqlx::query_as::<_, (i64,)>(&sql).bind(since.timestamp_millis());
            for id in chunk {
                query = query.bind(id);
            }
            let rows = query.fetch_all(&self.pool).await?;
            out.extend(rows.into_iter().map(|(id,)| id));
        }
        Ok(out)
    }

    async fn get_grammar_exposure(&self, feature_id: GrammarFeatureId) -> anyhow::Result<Option<GrammarExposure>> {
        let row = sqlx::query_as::<_, GrammarExposureRow>(
            "SELECT * FROM grammar_exposure WHERE feature_id = ?",
        )
        .bind(feature_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(GrammarExposure::from))
    }

    async fn save_review_atomic(
        &self,
        client_review_id: &str,
        writes: Vec<ReviewWrite>,
        grammar_updates: Vec<GrammarExposure>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for write in &writes {
            save_memory_state_in_tx(&mut tx, &write.new_state).await?;
            save_review_log_in_tx(&mut tx, client_review_id, &write.log).await?;
        }
        for exposure in &grammar_updates {
            save_grammar_exposure_in_tx(&mut tx, exposure).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn undo_submission(&self, client_review_id: &str) -> anyhow::Result<()> {
        let logs = sqlx::query_as::<_, ReviewLogRow>("SELECT * FROM review_logs WHERE client_review_id = ?")
            .bind(client_review_id)
            .fetch_all(&self.pool)
            .await?;
        if logs.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for row in logs {
            let log = row.into_domain()?;
            save_memory_state_in_tx(&mut tx, &log.pre_review_snapshot).await?;
        }
        sqlx::query("DELETE FROM review_logs WHERE client_review_id = ?")
            .bind(client_review_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LEECH_COOLDOWN_DAYS;

    #[test]
    fn cooldown_schedule_matches_spec_table() {
        assert_eq!(LEECH_COOLDOWN_DAYS, [3, 7, 14]);
    }
}
