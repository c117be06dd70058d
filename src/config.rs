//! Planner configuration.
//!
//! Loads settings from config.json at startup. Holds the recognition
//! thresholds, the value-region geometry, the advisor weights, and chart
//! styling.
//! Every field has a default so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::advisor::ScoringPolicy;
use crate::export::ChartConfig;
use crate::model::{PriorityWeights, MAX_STAT_VALUE};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<PlannerConfig> = OnceLock::new();

/// Where the numeric readout sits relative to a matched stat label.
///
/// All values are fractions of the label template's width or height. They
/// are tuned for one UI skin at one resolution; new templates usually need
/// new offsets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueRegion {
    /// Gap between the label's bottom edge and the region top (x label height)
    pub top_gap: f64,
    /// Region height before trimming (x label height)
    pub height: f64,
    /// Left edge offset from the label's left edge (x label width)
    pub left_inset: f64,
    /// Right edge inset from the label's right edge (x label width)
    pub right_inset: f64,
    /// Fraction of the region height trimmed from the bottom
    pub bottom_trim: f64,
}

impl Default for ValueRegion {
    fn default() -> Self {
        Self {
            top_gap: 0.1,
            height: 1.5,
            left_inset: 0.45,
            right_inset: 0.05,
            bottom_trim: 0.3,
        }
    }
}

/// Stat reader settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Minimum correlation for a stat label match (below = scan fails)
    pub label_threshold: f32,
    /// Minimum correlation for a digit candidate
    pub digit_threshold: f32,
    /// Digit candidates closer than this (px, horizontal) are the same glyph
    pub dedup_distance_px: u32,
    /// Largest plausible stat value
    pub max_value: u32,
    /// Value region geometry
    pub value_region: ValueRegion,
    /// Write an annotated copy of every scanned image
    pub debug_image: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            label_threshold: 0.4,
            digit_threshold: 0.6,
            dedup_distance_px: 10,
            max_value: MAX_STAT_VALUE,
            value_region: ValueRegion::default(),
            debug_image: false,
        }
    }
}

/// Training advisor settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Scoring strategy used for recommendations
    pub policy: ScoringPolicy,
    /// Multiplier per priority level
    pub priority_weights: PriorityWeights,
    /// Weight bonus for the stat named in the last race feedback
    pub feedback_weight: f64,
    /// Weight bonus per recorded race loss attributed to a stat
    pub loss_reason_weight: f64,
    /// Weighted-gap policy: progress below this gets the catch-up boost
    pub catchup_threshold: f64,
    /// Weighted-gap policy: weight multiplier for lagging stats
    pub catchup_boost: f64,
    /// Weighted-gap policy: progress above this is penalized
    pub overshoot_threshold: f64,
    /// Weighted-gap policy: penalty slope past the overshoot threshold
    pub overshoot_penalty_scale: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            priority_weights: PriorityWeights::default(),
            feedback_weight: 2.0,
            loss_reason_weight: 0.3,
            catchup_threshold: 0.6,
            catchup_boost: 1.6,
            overshoot_threshold: 0.85,
            overshoot_penalty_scale: 3.0,
        }
    }
}

/// Complete planner configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub recognition: RecognitionConfig,
    pub advisor: AdvisorConfig,
    pub chart: ChartConfig,
}

/// Path of config.json next to the executable.
pub fn config_path() -> PathBuf {
    crate::paths::get_exe_dir().join("config.json")
}

/// Loads configuration from `path`, or returns defaults.
pub fn load_config_from(path: &Path) -> PlannerConfig {
    crate::log(&format!("Looking for config at: {}", path.display()));

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    PlannerConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config_from(&config_path()));
}

/// Returns the global configuration, falling back to defaults if
/// `init_config()` was never called.
pub fn get_config() -> &'static PlannerConfig {
    CONFIG.get_or_init(PlannerConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_tuned_values() {
        let config = PlannerConfig::default();
        assert!((config.recognition.label_threshold - 0.4).abs() < 1e-6);
        assert!((config.recognition.digit_threshold - 0.6).abs() < 1e-6);
        assert_eq!(config.recognition.dedup_distance_px, 10);
        assert_eq!(config.recognition.max_value, 1200);
        assert_eq!(config.advisor.policy, ScoringPolicy::RmsDeviation);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"recognition": {"label_threshold": 0.5, "value_region": {"height": 2.0}},
                "advisor": {"policy": "weighted_gap"}}"#,
        )
        .unwrap();

        let config = load_config_from(&path);
        assert!((config.recognition.label_threshold - 0.5).abs() < 1e-6);
        assert!((config.recognition.digit_threshold - 0.6).abs() < 1e-6);
        assert!((config.recognition.value_region.height - 2.0).abs() < 1e-6);
        assert!((config.recognition.value_region.left_inset - 0.45).abs() < 1e-6);
        assert_eq!(config.advisor.policy, ScoringPolicy::WeightedGap);
        assert!((config.advisor.feedback_weight - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.recognition.dedup_distance_px, 10);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.json"));
        assert_eq!(config.recognition.max_value, MAX_STAT_VALUE);
    }
}
