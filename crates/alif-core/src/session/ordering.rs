use std::collections::HashMap;

use crate::domain::{LemmaId, MemoryState};

use super::scoring::Scored;

fn min_covered_stability(item: &Scored, states: &HashMap<LemmaId, MemoryState>) -> f64 {
    item.covered
        .iter()
        .map(|id| states.get(id).map(|s| s.pseudo_stability_days()).unwrap_or(0.0))
        .fold(f64::INFINITY, f64::min)
}

/// Easy-bookends ordering (spec §4.4 "Ordering", Testable Property 9):
/// the easiest sentence (highest min-covered-stability) leads, the
/// second-easiest closes, the single hardest sits at the center, and the
/// rest descend in difficulty outward from the center.
pub fn order_session(items: Vec<Scored>, states: &HashMap<LemmaId, MemoryState>) -> Vec<Scored> {
    let n = items.len();
    if n <= 2 {
        return items;
    }

    let mut by_stability: Vec<(f64, Scored)> = items
        .into_iter()
        .map(|item| (min_covered_stability(&item, states), item))
        .collect();
    by_stability.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let easiest = by_stability.remove(0).1;
    let second_easiest = by_stability.remove(0).1;
    let middle: Vec<Scored> = by_stability.into_iter().map(|(_, item)| item).collect();

    let mid_len = middle.len();
    let center = mid_len / 2;
    let mut position_order: Vec<usize> = (0..mid_len).collect();
    position_order.sort_by_key(|&i| (i as isize - center as isize).abs());

    let mut slots: Vec<Option<Scored>> = (0..mid_len).map(|_| None).collect();
    let mut remaining: Vec<Scored> = middle;
    for &pos in &position_order {
        // hardest (lowest stability) first, pulled from the tail of `remaining`.
        if let Some(item) = remaining.pop() {
            slots[pos] = Some(item);
        }
    }

    let mut ordered = Vec::with_capacity(mid_len + 2);
    ordered.push(easiest);
    ordered.extend(slots.into_iter().map(|s| s.expect("every middle slot filled")));
    ordered.push(second_easiest);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Box3, FsrsPhase, KnowledgeState, LongTermCard, Sentence, Token};
    use chrono::Utc;

    fn state_with_stability(id: LemmaId, stability: f64) -> MemoryState {
        let mut s = MemoryState::new_encountered(id, "x");
        s.knowledge_state = KnowledgeState::Known;
        s.card = Some(LongTermCard { stability, difficulty: 3.0, due_at: Utc::now(), last_reviewed_at: Utc::now(), fsrs_phase: FsrsPhase::Review });
        s
    }

    fn scored(id: i64, lemma_id: LemmaId, score: f64) -> Scored {
        Scored {
            sentence: Sentence {
                id,
                arabic: "s".into(),
                translation: "t".into(),
                transliteration: None,
                tokens: vec![Token { surface: "x".into(), lemma_id: Some(lemma_id) }],
                target_lemma_id: Some(lemma_id),
                times_shown: 0,
                last_shown_at: None,
                last_comprehension: std::collections::HashMap::new(),
                is_active: true,
                max_word_count: 10,
                audio_url: None,
                grammar_features: vec![],
            },
            covered: vec![lemma_id],
            score,
        }
    }

    #[test]
    fn bookends_are_the_two_highest_stability_items() {
        let mut states = HashMap::new();
        let values = [10.0, 1.0, 5.0, 0.5, 8.0];
        for (i, v) in values.iter().enumerate() {
            states.insert(i as LemmaId + 1, state_with_stability(i as LemmaId + 1, *v));
        }
        let items: Vec<Scored> = values.iter().enumerate().map(|(i, _)| scored(i as i64 + 1, i as LemmaId + 1, 1.0)).collect();
        let ordered = order_session(items, &states);
        let first_stability = min_covered_stability(&ordered[0], &states);
        let last_stability = min_covered_stability(&ordered[ordered.len() - 1], &states);
        assert_eq!(first_stability, 10.0);
        assert_eq!(last_stability, 8.0);
        let center_stability = min_covered_stability(&ordered[ordered.len() / 2], &states);
        assert_eq!(center_stability, 0.5);
    }
}
