//! Runtime-tunable parameters for the scheduler (spec §6).
//!
//! Mirrors the `#[serde(default = "fn_name")]` + free-function-default
//! idiom used for simulation configuration elsewhere in this codebase, so
//! a deployment can override a handful of fields in YAML/JSON without
//! restating the rest.
use serde::{Deserialize, Serialize};

use crate::domain::SchedulerError;

fn default_target_retention() -> f32 {
    0.90
}
fn default_max_cohort() -> usize {
    100
}
fn default_max_acquiring() -> usize {
    30
}
fn default_max_acquiring_relaxed() -> usize {
    50
}
fn default_max_box1() -> usize {
    8
}
fn default_max_box1_relaxed() -> usize {
    15
}
fn default_auto_intro_ceiling() -> usize {
    10
}
fn default_comprehensibility_threshold() -> f64 {
    0.60
}
fn default_freshness_baseline() -> f64 {
    8.0
}
fn default_max_on_demand_per_session() -> usize {
    10
}
fn default_max_on_demand_fanout() -> usize {
    8
}
fn default_generation_retry_budget() -> u32 {
    7
}
fn default_acquisition_repetition_cap() -> usize {
    4
}
fn default_acquisition_repetition_overflow() -> usize {
    15
}
fn default_stability_floor_days() -> f64 {
    1.0
}
fn default_leech_min_seen() -> u32 {
    5
}
fn default_leech_max_accuracy() -> f64 {
    0.50
}
fn default_leech_cooldown_days() -> [i64; 3] {
    [3, 7, 14]
}
fn default_graduation_min_seen() -> u32 {
    5
}
fn default_graduation_min_accuracy() -> f64 {
    0.60
}
fn default_graduation_min_span_days() -> i64 {
    2
}
fn default_listening_auto_intro() -> bool {
    false
}
fn default_root_interference_window_days() -> i64 {
    7
}

/// Accuracy-band → auto-introduction-budget mapping (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoIntroBands {
    pub low_threshold: f64,
    pub mid_threshold: f64,
    pub high_threshold: f64,
    pub low_budget: usize,
    pub mid_budget: usize,
    pub high_budget: usize,
    pub max_budget: usize,
    pub default_budget_when_sparse: usize,
}

impl Default for AutoIntroBands {
    fn default() -> Self {
        Self {
            low_threshold: 0.70,
            mid_threshold: 0.85,
            high_threshold: 0.92,
            low_budget: 0,
            mid_budget: 4,
            high_budget: 7,
            max_budget: 10,
            default_budget_when_sparse: 4,
        }
    }
}

impl AutoIntroBands {
    /// Maps a recent-accuracy fraction to an introduction budget (spec §4.4).
    pub fn budget_for_accuracy(&self, accuracy: f64) -> usize {
        if accuracy < self.low_threshold {
            self.low_budget
        } else if accuracy < self.mid_threshold {
            self.mid_budget
        } else if accuracy < self.high_threshold {
            self.high_budget
        } else {
            self.max_budget
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target_retention")]
    pub target_retention: f32,

    #[serde(default = "default_max_cohort")]
    pub max_cohort: usize,
    #[serde(default = "default_max_acquiring")]
    pub max_acquiring: usize,
    #[serde(default = "default_max_acquiring_relaxed")]
    pub max_acquiring_relaxed: usize,
    #[serde(default = "default_max_box1")]
    pub max_box1: usize,
    #[serde(default = "default_max_box1_relaxed")]
    pub max_box1_relaxed: usize,

    #[serde(default = "default_auto_intro_ceiling")]
    pub auto_intro_ceiling: usize,
    #[serde(default)]
    pub auto_intro_bands: AutoIntroBands,
    #[serde(default = "default_listening_auto_intro")]
    pub listening_auto_intro: bool,
    #[serde(default = "default_root_interference_window_days")]
    pub root_interference_window_days: i64,

    #[serde(default = "default_comprehensibility_threshold")]
    pub comprehensibility_threshold: f64,
    #[serde(default = "default_freshness_baseline")]
    pub freshness_baseline: f64,

    #[serde(default = "default_max_on_demand_per_session")]
    pub max_on_demand_per_session: usize,
    #[serde(default = "default_max_on_demand_fanout")]
    pub max_on_demand_fanout: usize,
    #[serde(default = "default_generation_retry_budget")]
    pub generation_retry_budget: u32,

    #[serde(default = "default_acquisition_repetition_cap")]
    pub acquisition_repetition_cap: usize,
    #[serde(default = "default_acquisition_repetition_overflow")]
    pub acquisition_repetition_overflow: usize,

    #[serde(default = "default_stability_floor_days")]
    pub stability_floor_days: f64,

    #[serde(default = "default_leech_min_seen")]
    pub leech_min_seen: u32,
    #[serde(default = "default_leech_max_accuracy")]
    pub leech_max_accuracy: f64,
    #[serde(default = "default_leech_cooldown_days")]
    pub leech_cooldown_days: [i64; 3],

    #[serde(default = "default_graduation_min_seen")]
    pub graduation_min_seen: u32,
    #[serde(default = "default_graduation_min_accuracy")]
    pub graduation_min_accuracy: f64,
    #[serde(default = "default_graduation_min_span_days")]
    pub graduation_min_span_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_retention: default_target_retention(),
            max_cohort: default_max_cohort(),
            max_acquiring: default_max_acquiring(),
            max_acquiring_relaxed: default_max_acquiring_relaxed(),
            max_box1: default_max_box1(),
            max_box1_relaxed: default_max_box1_relaxed(),
            auto_intro_ceiling: default_auto_intro_ceiling(),
            auto_intro_bands: AutoIntroBands::default(),
            listening_auto_intro: default_listening_auto_intro(),
            root_interference_window_days: default_root_interference_window_days(),
            comprehensibility_threshold: default_comprehensibility_threshold(),
            freshness_baseline: default_freshness_baseline(),
            max_on_demand_per_session: default_max_on_demand_per_session(),
            max_on_demand_fanout: default_max_on_demand_fanout(),
            generation_retry_budget: default_generation_retry_budget(),
            acquisition_repetition_cap: default_acquisition_repetition_cap(),
            acquisition_repetition_overflow: default_acquisition_repetition_overflow(),
            stability_floor_days: default_stability_floor_days(),
            leech_min_seen: default_leech_min_seen(),
            leech_max_accuracy: default_leech_max_accuracy(),
            leech_cooldown_days: default_leech_cooldown_days(),
            graduation_min_seen: default_graduation_min_seen(),
            graduation_min_accuracy: default_graduation_min_accuracy(),
            graduation_min_span_days: default_graduation_min_span_days(),
        }
    }
}

impl Config {
    /// Range/consistency checks, in the spirit of `SessionMixConfig::validate`.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(0.0..=1.0).contains(&self.target_retention) {
            return Err(SchedulerError::Validation(format!(
                "target_retention out of range: {}",
                self.target_retention
            )));
        }
        if !(0.0..=1.0).contains(&self.comprehensibility_threshold) {
            return Err(SchedulerError::Validation(
                "comprehensibility_threshold out of range".into(),
            ));
        }
        if self.max_acquiring > self.max_acquiring_relaxed {
            return Err(SchedulerError::Validation(
                "max_acquiring must not exceed max_acquiring_relaxed".into(),
            ));
        }
        if self.max_box1 > self.max_box1_relaxed {
            return Err(SchedulerError::Validation(
                "max_box1 must not exceed max_box1_relaxed".into(),
            ));
        }
        if self.leech_cooldown_days.iter().any(|d| *d <= 0) {
            return Err(SchedulerError::Validation(
                "leech_cooldown_days entries must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn load_yaml(text: &str) -> Result<Self, SchedulerError> {
        serde_yaml::from_str(text)
            .map_err(|e| SchedulerError::Validation(format!("invalid config yaml: {e}")))
    }

    pub fn to_yaml(&self) -> Result<String, SchedulerError> {
        serde_yaml::to_string(self)
            .map_err(|e| SchedulerError::Validation(format!("config serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn auto_intro_bands_match_spec_table() {
        let bands = AutoIntroBands::default();
        assert_eq!(bands.budget_for_accuracy(0.5), 0);
        assert_eq!(bands.budget_for_accuracy(0.75), 4);
        assert_eq!(bands.budget_for_accuracy(0.90), 7);
        assert_eq!(bands.budget_for_accuracy(0.95), 10);
    }

    #[test]
    fn yaml_round_trip() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        let reloaded = Config::load_yaml(&yaml).unwrap();
        assert_eq!(reloaded.max_cohort, config.max_cohort);
    }

    #[test]
    fn rejects_inverted_relaxed_caps() {
        let mut config = Config::default();
        config.max_acquiring_relaxed = 1;
        config.max_acquiring = 30;
        assert!(config.validate().is_err());
    }
}
