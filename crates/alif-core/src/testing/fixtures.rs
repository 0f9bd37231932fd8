//! Reusable fixtures for scheduler tests.
//!
//! Provides small, hand-built lemma/sentence/memory-state graphs so
//! individual test modules don't each reinvent a toy vocabulary.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    AcquisitionFields, Box3, FsrsPhase, KnowledgeState, Lemma, LemmaId, LongTermCard, MemoryState,
    Mode, Sentence, Token,
};

/// A canonical content lemma: "كتاب" (book), frequency rank 50.
pub fn canonical_lemma(id: LemmaId) -> Lemma {
    Lemma {
        id,
        surface: "كتاب".to_string(),
        gloss: "book".to_string(),
        part_of_speech: "NOUN".to_string(),
        frequency_rank: 50,
        root_id: Some(1),
        canonical_id: None,
        thematic_tag: None,
        is_function_word: false,
    }
}

/// A variant of `canonical_id`, e.g. a plural or construct-state surface form.
pub fn variant_lemma(id: LemmaId, canonical_id: LemmaId) -> Lemma {
    Lemma {
        id,
        surface: "كتب".to_string(),
        gloss: "books".to_string(),
        part_of_speech: "NOUN".to_string(),
        frequency_rank: 120,
        root_id: Some(1),
        canonical_id: Some(canonical_id),
        thematic_tag: None,
        is_function_word: false,
    }
}

/// A function word, e.g. "في" (in) — never acquires memory state of its own.
pub fn function_word_lemma(id: LemmaId) -> Lemma {
    Lemma {
        id,
        surface: "في".to_string(),
        gloss: "in".to_string(),
        part_of_speech: "PREP".to_string(),
        frequency_rank: 3,
        root_id: None,
        canonical_id: None,
        thematic_tag: None,
        is_function_word: true,
    }
}

/// A lemma newly entered into acquisition box 1, due immediately.
pub fn acquiring_state(lemma_id: LemmaId, now: DateTime<Utc>) -> MemoryState {
    let mut state = MemoryState::new_encountered(lemma_id, "auto_intro");
    state.knowledge_state = KnowledgeState::Acquiring;
    state.entered_acquiring_at = Some(now);
    state.acquisition = Some(AcquisitionFields {
        box_num: Box3::new(1),
        next_due_at: now,
        entered_acquiring_at: now,
    });
    state
}

/// A mature long-term card: several days of stability, currently due.
pub fn long_term_state(lemma_id: LemmaId, now: DateTime<Utc>, stability_days: f64) -> MemoryState {
    let mut state = MemoryState::new_encountered(lemma_id, "import");
    state.knowledge_state = KnowledgeState::Known;
    state.times_seen = 12;
    state.times_correct = 10;
    state.graduated_at = Some(now - Duration::days(30));
    state.card = Some(LongTermCard {
        stability: stability_days,
        difficulty: 5.0,
        due_at: now - Duration::hours(1),
        last_reviewed_at: now - Duration::days(1),
        fsrs_phase: FsrsPhase::Review,
    });
    state
}

/// A sentence built from a flat list of `(surface, lemma_id)` tokens.
pub fn sentence_with_tokens(id: i64, tokens: &[(&str, Option<LemmaId>)]) -> Sentence {
    Sentence {
        id,
        arabic: tokens.iter().map(|(s, _)| *s).collect::<Vec<_>>().join(" "),
        translation: "a translation".to_string(),
        transliteration: None,
        tokens: tokens
            .iter()
            .map(|(s, lemma_id)| Token { surface: s.to_string(), lemma_id: *lemma_id })
            .collect(),
        target_lemma_id: tokens.iter().find_map(|(_, id)| *id),
        times_shown: 0,
        last_shown_at: None,
        last_comprehension: HashMap::new(),
        is_active: true,
        max_word_count: tokens.len() as u32,
        audio_url: None,
        grammar_features: Vec::new(),
    }
}

/// A freshly-generated reading sentence, never shown.
pub fn fresh_sentence(id: i64, lemma_ids: &[LemmaId]) -> Sentence {
    let tokens: Vec<(&str, Option<LemmaId>)> = lemma_ids.iter().map(|_| ("كتاب", lemma_ids.first().copied())).collect();
    let mut sentence = sentence_with_tokens(id, &tokens);
    sentence.tokens = lemma_ids
        .iter()
        .map(|id| Token { surface: "كتاب".to_string(), lemma_id: Some(*id) })
        .collect();
    sentence.target_lemma_id = lemma_ids.first().copied();
    sentence.max_word_count = sentence.tokens.len() as u32;
    sentence
}

/// Marks a sentence as already shown in `mode` some time ago.
pub fn shown_sentence(mut sentence: Sentence, mode: Mode, comprehension: crate::domain::Comprehension, when: DateTime<Utc>) -> Sentence {
    sentence.times_shown += 1;
    sentence.last_shown_at = Some(when);
    sentence.last_comprehension.insert(mode, comprehension);
    sentence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_and_variant_link_correctly() {
        let canonical = canonical_lemma(1);
        let variant = variant_lemma(2, 1);
        assert!(canonical.is_canonical());
        assert!(variant.is_variant());
        assert_eq!(variant.canonical_id, Some(canonical.id));
    }

    #[test]
    fn acquiring_state_is_due_immediately() {
        let now = Utc::now();
        let state = acquiring_state(1, now);
        assert!(state.is_due(now));
        assert!(state.validate_tag_invariant());
    }

    #[test]
    fn long_term_state_carries_a_card_not_a_box() {
        let now = Utc::now();
        let state = long_term_state(1, now, 8.0);
        assert!(state.is_due(now));
        assert!(state.validate_tag_invariant());
        assert_eq!(state.pseudo_stability_days(), 8.0);
    }
}
