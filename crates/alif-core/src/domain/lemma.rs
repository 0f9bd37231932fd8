use serde::{Deserialize, Serialize};

pub type LemmaId = i64;
pub type RootId = i64;

/// Stable identity for a dictionary word (spec §3).
///
/// Lemmas are immutable from the scheduler's perspective; they are owned
/// and mutated only by the import pipeline, which is out of scope here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lemma {
    pub id: LemmaId,
    pub surface: String,
    pub gloss: String,
    pub part_of_speech: String,
    /// Lower rank = more common.
    pub frequency_rank: u32,
    pub root_id: Option<RootId>,
    /// If present, this lemma is a variant and never owns memory state.
    pub canonical_id: Option<LemmaId>,
    pub thematic_tag: Option<String>,
    pub is_function_word: bool,
}

impl Lemma {
    pub fn is_variant(&self) -> bool {
        self.canonical_id.is_some()
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical_id.is_none()
    }
}

/// Grouping of lemmas by shared consonantal skeleton (spec §3).
/// Not a scheduling unit; used only by Learn-mode ranking and the
/// Root Interference Guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub id: RootId,
    pub skeleton: String,
}

/// Resolves a lemma id to its canonical lemma id given a lookup function.
///
/// The variant-of relation is a forest (spec §3): a canonical lemma has no
/// parent, so this terminates in at most one hop for well-formed data. We
/// still walk until a fixed point to stay correct if the lookup is ever fed
/// a chain by mistake, rather than assuming the single-hop invariant holds.
pub fn resolve_canonical<F>(lemma_id: LemmaId, canonical_of: F) -> LemmaId
where
    F: Fn(LemmaId) -> Option<LemmaId>,
{
    let mut current = lemma_id;
    let mut seen = std::collections::HashSet::new();
    while let Some(parent) = canonical_of(current) {
        if !seen.insert(current) {
            break; // defensive: cycle in malformed data, stop rather than loop
        }
        current = parent;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_canonical_single_hop() {
        let parent_of = |id: LemmaId| if id == 2 { Some(1) } else { None };
        assert_eq!(resolve_canonical(2, parent_of), 1);
        assert_eq!(resolve_canonical(1, parent_of), 1);
    }

    #[test]
    fn lemma_variant_flags() {
        let canonical = Lemma {
            id: 1,
            surface: "كتاب".into(),
            gloss: "book".into(),
            part_of_speech: "NOUN".into(),
            frequency_rank: 10,
            root_id: Some(5),
            canonical_id: None,
            thematic_tag: None,
            is_function_word: false,
        };
        let variant = Lemma {
            canonical_id: Some(1),
            id: 2,
            ..canonical.clone()
        };
        assert!(canonical.is_canonical());
        assert!(variant.is_variant());
    }
}
