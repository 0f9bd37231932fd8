use std::sync::Arc;

use alif_core::domain::Mode;
use alif_core::ports::{LemmaRepository, MemoryStore, SentenceGenerator, SentencePool};
use alif_core::{BuildSessionRequest, Config, SessionBuilder};
use anyhow::Result;
use chrono::Utc;
use colored::*;

/// A `SentenceGenerator` that never produces anything. The real on-demand
/// generator is an LLM/TTS adapter out of scope for this CLI (spec §1,
/// §4.8); this stub lets `SessionBuilder::build` run end-to-end against a
/// local database with no network dependency.
pub struct NullGenerator;

#[async_trait::async_trait]
impl SentenceGenerator for NullGenerator {
    async fn generate(
        &self,
        _targets: Vec<i64>,
        _constraints: alif_core::ports::GenerationConstraints,
        _now: chrono::DateTime<Utc>,
    ) -> anyhow::Result<Vec<alif_core::domain::Sentence>> {
        Ok(Vec::new())
    }
}

pub async fn build_session(db_path: &str, mode: &str, limit: usize) -> Result<()> {
    let store = Arc::new(alif_storage::SqliteStore::connect(db_path).await?);
    let mode = match mode {
        "reading" => Mode::Reading,
        "listening" => Mode::Listening,
        other => anyhow::bail!("unknown mode '{other}', expected 'reading' or 'listening'"),
    };

    let builder = SessionBuilder::new(
        store.clone() as Arc<dyn LemmaRepository>,
        store.clone() as Arc<dyn MemoryStore>,
        store.clone() as Arc<dyn SentencePool>,
        Arc::new(NullGenerator),
        Config::default(),
    );

    let response = builder
        .build(BuildSessionRequest { mode, limit, now: Utc::now() })
        .await?;

    println!("{}", format!("built session: {} items", response.items.len()).bright_cyan().bold());
    for item in &response.items {
        println!(
            "  {} {} — {}",
            format!("#{}", item.sentence_id).dimmed(),
            item.arabic,
            item.translation
        );
    }
    if !response.intro_candidates.is_empty() {
        println!();
        println!("{}", "deferred introduction candidates:".yellow());
        for candidate in &response.intro_candidates {
            println!("  {} ({})", candidate.lemma_id, candidate.gloss);
        }
    }
    Ok(())
}
