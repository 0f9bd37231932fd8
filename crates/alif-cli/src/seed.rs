use alif_core::domain::{Sentence, Token};
use alif_core::ports::SentencePool;
use anyhow::Result;
use colored::*;

/// Seeds a small hand-built vocabulary and sentence pool for manual CLI
/// exercising (`build-session` / `submit-review` against a fresh database).
/// Lemmas and roots bypass `LemmaRepository` (a read-only port, spec §6)
/// and are written directly — the same way a real import pipeline, out of
/// scope here, would populate them.
pub async fn seed_demo(db_path: &str) -> Result<()> {
    let store = alif_storage::SqliteStore::connect(db_path).await?;
    let pool = store.pool();

    sqlx::query("INSERT OR IGNORE INTO roots (id, skeleton) VALUES (1, 'ktb')")
        .execute(pool)
        .await?;

    // كتاب "book" (canonical), كتابه "his book" (variant), مدرسة "school",
    // الولد "the boy" (already known), في "in" (function word).
    let lemmas = [
        (1_i64, "كتاب", "book", "NOUN", 50_i64, Some(1_i64), None::<i64>, false),
        (2, "كتابه", "his book", "NOUN", 400, Some(1), Some(1), false),
        (3, "مدرسة", "school", "NOUN", 80, None, None, false),
        (4, "الولد", "the boy", "NOUN", 20, None, None, false),
        (5, "في", "in", "PREP", 3, None, None, true),
    ];
    for (id, surface, gloss, pos, freq, root_id, canonical_id, is_function_word) in lemmas {
        sqlx::query(
            "INSERT OR IGNORE INTO lemmas \
             (id, surface, gloss, part_of_speech, frequency_rank, root_id, canonical_id, is_function_word) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(surface)
        .bind(gloss)
        .bind(pos)
        .bind(freq)
        .bind(root_id)
        .bind(canonical_id)
        .bind(is_function_word as i64)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        "INSERT OR IGNORE INTO memory_states \
         (lemma_id, knowledge_state, times_seen, times_correct, source, box_num, next_due_at, entered_acquiring_at) \
         VALUES (3, 'acquiring', 0, 0, 'seed-demo', 1, 0, 0)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "INSERT OR IGNORE INTO memory_states \
         (lemma_id, knowledge_state, times_seen, times_correct, source, stability, difficulty, due_at, last_reviewed_at, fsrs_phase) \
         VALUES (4, 'known', 6, 5, 'seed-demo', 12.0, 4.0, 0, 0, 'review')",
    )
    .execute(pool)
    .await?;

    let sentence = Sentence {
        id: 0,
        arabic: "ذهبَ الولدُ إلى المدرسةِ".to_string(),
        translation: "The boy went to the school".to_string(),
        transliteration: None,
        tokens: vec![
            Token { surface: "ذهبَ".to_string(), lemma_id: None },
            Token { surface: "الولدُ".to_string(), lemma_id: Some(4) },
            Token { surface: "إلى".to_string(), lemma_id: Some(5) },
            Token { surface: "المدرسةِ".to_string(), lemma_id: Some(3) },
        ],
        target_lemma_id: Some(3),
        times_shown: 0,
        last_shown_at: None,
        last_comprehension: std::collections::HashMap::new(),
        is_active: true,
        max_word_count: 4,
        audio_url: None,
        grammar_features: Vec::new(),
    };
    let sentence_id = store.insert_sentence(sentence).await?;

    println!("{}", "seeded demo vocabulary and sentence pool".bright_green().bold());
    println!("  lemmas: 1 (كتاب), 2 (كتابه, variant of 1), 3 (مدرسة, acquiring), 4 (الولد, known), 5 (في, function word)");
    println!("  sentence #{sentence_id}: ذهبَ الولدُ إلى المدرسةِ");
    Ok(())
}
