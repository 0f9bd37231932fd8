use std::collections::{HashMap, HashSet};

use crate::domain::{GrammarFeatureId, Lemma, LemmaId, MemoryState, SentenceId};

use super::scoring::Scored;

/// One token's descriptor in an assembled session card (spec §4.4
/// "Response Assembly").
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDescriptor {
    pub surface: String,
    pub lemma_id: Option<LemmaId>,
    pub gloss: Option<String>,
    pub stability: Option<f64>,
    pub is_due: bool,
    pub is_function_word: bool,
}

/// One card in the built session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionItem {
    pub sentence_id: SentenceId,
    pub arabic: String,
    pub translation: String,
    pub transliteration: Option<String>,
    pub audio_url: Option<String>,
    pub primary_lemma_id: Option<LemmaId>,
    pub primary_gloss: Option<String>,
    pub tokens: Vec<TokenDescriptor>,
    pub grammar_features: Vec<GrammarFeatureId>,
    pub is_on_demand: bool,
}

/// A suggestion surfaced to the UI, not inserted as a card (spec §4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct IntroCandidate {
    pub lemma_id: LemmaId,
    pub gloss: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSessionResponse {
    pub items: Vec<SessionItem>,
    pub intro_candidates: Vec<IntroCandidate>,
}

/// Builds response cards for the selected, ordered items (spec §4.4
/// "Response Assembly"). `on_demand_ids` marks sentences minted during this
/// build so `is_on_demand` is accurate.
pub fn assemble(
    ordered: Vec<Scored>,
    due_lemma_ids: &HashSet<LemmaId>,
    lemmas: &HashMap<LemmaId, Lemma>,
    memory_states: &HashMap<LemmaId, MemoryState>,
    on_demand_ids: &HashSet<i64>,
) -> Vec<SessionItem> {
    ordered
        .into_iter()
        .map(|scored| {
            let sentence = scored.sentence;
            let canonical_of = |id: LemmaId| crate::domain::resolve_canonical(id, |i| lemmas.get(&i).and_then(|l| l.canonical_id));

            let tokens: Vec<TokenDescriptor> = sentence
                .tokens
                .iter()
                .map(|token| {
                    let canonical = token.lemma_id.map(canonical_of);
                    let lemma = canonical.and_then(|id| lemmas.get(&id));
                    let state = canonical.and_then(|id| memory_states.get(&id));
                    TokenDescriptor {
                        surface: token.surface.clone(),
                        lemma_id: canonical,
                        gloss: lemma.map(|l| l.gloss.clone()),
                        stability: state.map(|s| s.pseudo_stability_days()),
                        is_due: canonical.map(|id| due_lemma_ids.contains(&id)).unwrap_or(false),
                        is_function_word: lemma.map(|l| l.is_function_word).unwrap_or(false),
                    }
                })
                .collect();

            let primary_lemma_id = sentence
                .target_lemma_id
                .map(canonical_of)
                .filter(|id| due_lemma_ids.contains(id))
                .or_else(|| scored.covered.first().copied())
                .or_else(|| tokens.iter().find_map(|t| t.lemma_id));
            let primary_gloss = primary_lemma_id.and_then(|id| lemmas.get(&id)).map(|l| l.gloss.clone());

            SessionItem {
                sentence_id: sentence.id,
                arabic: sentence.arabic,
                translation: sentence.translation,
                transliteration: sentence.transliteration,
                audio_url: sentence.audio_url,
                primary_lemma_id,
                primary_gloss,
                tokens,
                grammar_features: sentence.grammar_features,
                is_on_demand: on_demand_ids.contains(&sentence.id),
            }
        })
        .collect()
}
