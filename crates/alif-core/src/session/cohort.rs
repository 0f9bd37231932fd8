use super::classify::Classified;
use crate::domain::LemmaId;

/// The ≤100-lemma focus cohort (spec §4.4 "Focus Cohort Filter", Testable
/// Property 7). Acquiring lemmas are admitted unconditionally, regardless of
/// due-ness, so they can never be stranded by the cap; long-term due lemmas
/// fill whatever slots remain, lowest stability first.
pub fn build_cohort(classified: &[Classified], max_cohort: usize) -> Vec<Classified> {
    let mut acquiring: Vec<Classified> = classified.iter().copied().filter(|c| c.is_acquiring).collect();

    let mut long_term_due: Vec<Classified> = classified
        .iter()
        .copied()
        .filter(|c| c.is_due && !c.is_acquiring)
        .collect();
    long_term_due.sort_by(|a, b| {
        a.pseudo_stability_days
            .partial_cmp(&b.pseudo_stability_days)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.lemma_id.cmp(&b.lemma_id))
    });

    let remaining = max_cohort.saturating_sub(acquiring.len());
    acquiring.extend(long_term_due.into_iter().take(remaining));
    acquiring
}

/// The due lemma ids within the cohort, the set every downstream stage
/// (candidate fetch, scoring, cover) treats as "what needs coverage".
pub fn due_lemma_ids(cohort: &[Classified]) -> Vec<LemmaId> {
    cohort.iter().filter(|c| c.is_due).map(|c| c.lemma_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: LemmaId, acquiring: bool, due: bool, stability: f64) -> Classified {
        Classified {
            lemma_id: id,
            is_acquiring: acquiring,
            is_due: due,
            pseudo_stability_days: stability,
        }
    }

    #[test]
    fn acquiring_lemmas_always_survive_the_cap() {
        let mut classified: Vec<Classified> = (0..40).map(|i| member(i, true, false, 0.1)).collect();
        classified.extend((40..200).map(|i| member(i, false, true, i as f64)));
        let cohort = build_cohort(&classified, 100);
        assert!((0..40).all(|i| cohort.iter().any(|c| c.lemma_id == i)));
    }

    #[test]
    fn long_term_fill_prefers_lowest_stability() {
        let mut classified = vec![member(1, true, true, 0.1)];
        classified.push(member(2, false, true, 5.0));
        classified.push(member(3, false, true, 1.0));
        let cohort = build_cohort(&classified, 2);
        assert!(cohort.iter().any(|c| c.lemma_id == 3));
        assert!(!cohort.iter().any(|c| c.lemma_id == 2));
    }
}
