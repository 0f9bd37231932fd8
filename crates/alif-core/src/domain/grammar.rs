use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type GrammarFeatureId = i64;

/// A named grammar feature a sentence can be tagged with (e.g. "idafa",
/// "jussive mood"). Immutable content metadata, like `Lemma`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarFeature {
    pub id: GrammarFeatureId,
    pub name: String,
}

/// Per-learner exposure counters for a grammar feature (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrammarExposure {
    pub feature_id: GrammarFeatureId,
    pub times_seen: u32,
    pub times_correct: u32,
    pub comfort: f64,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl GrammarExposure {
    pub fn new(feature_id: GrammarFeatureId) -> Self {
        Self {
            feature_id,
            times_seen: 0,
            times_correct: 0,
            comfort: 0.0,
            last_seen_at: None,
        }
    }

    /// Comfort level used by the Score stage's `grammar_fit` term (spec
    /// §4.4, §4.5): `min(0.6, log2(seen+1)/log2(31)) + min(0.4,
    /// correct/seen * 0.4)`, decayed by `0.5^(days_since_last_seen/30)`.
    pub fn record(&mut self, correct: bool, now: DateTime<Utc>) {
        self.times_seen += 1;
        if correct {
            self.times_correct += 1;
        }

        let seen_term = (0.6_f64).min((self.times_seen as f64 + 1.0).log2() / (31.0_f64).log2());
        let correct_term = if self.times_seen > 0 {
            (0.4_f64).min((self.times_correct as f64 / self.times_seen as f64) * 0.4)
        } else {
            0.0
        };
        let raw = seen_term + correct_term;

        let decay = match self.last_seen_at {
            Some(prior) => {
                let days = (now - prior).num_seconds() as f64 / 86_400.0;
                0.5_f64.powf(days / 30.0)
            }
            None => 1.0,
        };

        self.comfort = raw * decay;
        self.last_seen_at = Some(now);
    }

    /// Categorical comfort bucket used by the Score stage's `grammar_fit`
    /// term (spec §4.4): unseen → 0.8, low comfort → 1.0, high comfort → 1.1.
    pub fn fit_factor(&self) -> f64 {
        if self.times_seen == 0 {
            0.8
        } else if self.comfort >= 0.7 {
            1.1
        } else {
            1.0
        }
    }
}
