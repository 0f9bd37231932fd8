use anyhow::Result;
use clap::{Parser, Subcommand};

mod review;
mod seed;
mod session;

/// Alif CLI — development and testing tool for the sentence scheduler.
#[derive(Parser)]
#[command(name = "alif")]
#[command(about = "Alif CLI tool for testing and development", long_about = None)]
struct Cli {
    /// Path to the SQLite database file (created if absent).
    #[arg(short, long, default_value = "alif.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a learning session from the current scheduler state.
    BuildSession {
        /// "reading" or "listening"
        #[arg(long, default_value = "reading")]
        mode: String,
        /// Maximum number of items to return.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Submit a review for a shown sentence.
    SubmitReview {
        /// Idempotency key for this submission.
        #[arg(long)]
        client_review_id: String,
        #[arg(long)]
        session_id: i64,
        #[arg(long)]
        sentence_id: i64,
        /// "reading" or "listening"
        #[arg(long, default_value = "reading")]
        mode: String,
        /// "understood" | "partial" | "grammar_confused" | "no_idea"
        #[arg(long)]
        comprehension: String,
        /// Lemma ids the learner missed, comma-separated.
        #[arg(long, value_delimiter = ',')]
        missed: Vec<i64>,
        /// Lemma ids the learner found grammar-confusing, comma-separated.
        #[arg(long, value_delimiter = ',')]
        confused: Vec<i64>,
        #[arg(long, default_value_t = 3000)]
        response_ms: u32,
    },
    /// Revert a previously submitted review.
    UndoReview {
        #[arg(long)]
        client_review_id: String,
        #[arg(long)]
        sentence_id: i64,
        #[arg(long, default_value = "reading")]
        mode: String,
        /// The sentence's comprehension signal for this mode before the
        /// submission being undone, if any.
        #[arg(long)]
        prior_comprehension: Option<String>,
    },
    /// Populate a fresh database with a small demo vocabulary and sentence.
    SeedDemo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildSession { mode, limit } => {
            session::build_session(&cli.db, &mode, limit).await?;
        }
        Commands::SubmitReview {
            client_review_id,
            session_id,
            sentence_id,
            mode,
            comprehension,
            missed,
            confused,
            response_ms,
        } => {
            review::submit_review(
                &cli.db,
                &client_review_id,
                session_id,
                sentence_id,
                &mode,
                &comprehension,
                missed,
                confused,
                response_ms,
            )
            .await?;
        }
        Commands::UndoReview { client_review_id, sentence_id, mode, prior_comprehension } => {
            review::undo_review(&cli.db, &client_review_id, sentence_id, &mode, prior_comprehension).await?;
        }
        Commands::SeedDemo => {
            seed::seed_demo(&cli.db).await?;
        }
    }

    Ok(())
}
