use std::sync::Arc;

use alif_core::domain::{Comprehension, Mode};
use alif_core::ports::{LemmaRepository, MemoryStore, SentencePool};
use alif_core::{Config, ReviewSubmissionEngine, SubmitReviewRequest};
use anyhow::Result;
use chrono::Utc;
use colored::*;

fn parse_comprehension(signal: &str) -> Result<Comprehension> {
    Ok(match signal {
        "understood" => Comprehension::Understood,
        "partial" => Comprehension::Partial,
        "grammar_confused" => Comprehension::GrammarConfused,
        "no_idea" => Comprehension::NoIdea,
        other => anyhow::bail!("unknown comprehension signal '{other}'"),
    })
}

fn parse_mode(mode: &str) -> Result<Mode> {
    Ok(match mode {
        "reading" => Mode::Reading,
        "listening" => Mode::Listening,
        other => anyhow::bail!("unknown mode '{other}'"),
    })
}

#[allow(clippy::too_many_arguments)]
pub async fn submit_review(
    db_path: &str,
    client_review_id: &str,
    session_id: i64,
    sentence_id: i64,
    mode: &str,
    comprehension_signal: &str,
    missed_lemma_ids: Vec<i64>,
    confused_lemma_ids: Vec<i64>,
    response_ms: u32,
) -> Result<()> {
    let store = Arc::new(alif_storage::SqliteStore::connect(db_path).await?);
    let engine = ReviewSubmissionEngine::new(
        store.clone() as Arc<dyn LemmaRepository>,
        store.clone() as Arc<dyn MemoryStore>,
        store.clone() as Arc<dyn SentencePool>,
        Config::default(),
    );

    let request = SubmitReviewRequest {
        client_review_id: client_review_id.to_string(),
        session_id,
        sentence_id,
        mode: parse_mode(mode)?,
        comprehension_signal: parse_comprehension(comprehension_signal)?,
        missed_lemma_ids,
        confused_lemma_ids,
        response_ms,
    };

    let response = engine.submit(request, Utc::now()).await?;
    println!("{}", "submitted review".bright_cyan().bold());
    for result in &response.results {
        println!(
            "  lemma {} → {:?} (state: {:?})",
            result.lemma_id, result.rating, result.new_state.knowledge_state
        );
    }
    Ok(())
}

pub async fn undo_review(
    db_path: &str,
    client_review_id: &str,
    sentence_id: i64,
    mode: &str,
    prior_comprehension: Option<String>,
) -> Result<()> {
    let store = Arc::new(alif_storage::SqliteStore::connect(db_path).await?);
    let engine = ReviewSubmissionEngine::new(
        store.clone() as Arc<dyn LemmaRepository>,
        store.clone() as Arc<dyn MemoryStore>,
        store.clone() as Arc<dyn SentencePool>,
        Config::default(),
    );

    let prior = prior_comprehension.map(|s| parse_comprehension(&s)).transpose()?;
    engine.undo(client_review_id, sentence_id, parse_mode(mode)?, prior).await?;
    println!("{}", format!("undid submission {client_review_id}").yellow());
    Ok(())
}
