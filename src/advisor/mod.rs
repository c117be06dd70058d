//! Training advisor: ranks the five "train <stat>" actions.
//!
//! Scoring is pure. Everything the advisor knows (current stats, targets,
//! priorities, race feedback, learned gain history) is passed in by the
//! caller; nothing is read from disk here.

mod rms;
mod weighted_gap;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AdvisorConfig;
use crate::model::{
    ActionGainStats, IdealStats, LossReasonTally, Priorities, Stat, StatMap, StatSnapshot,
};

/// How candidate actions are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Minimize the weighted RMS distance to the ideal after applying each
    /// action's historical average gain. Lowest score wins.
    #[default]
    RmsDeviation,
    /// Maximize `(1 - progress) * weight` on the trained stat alone, with
    /// catch-up and overshoot adjustments. Highest score wins.
    WeightedGap,
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringPolicy::RmsDeviation => f.write_str("rms_deviation"),
            ScoringPolicy::WeightedGap => f.write_str("weighted_gap"),
        }
    }
}

/// Everything the advisor looks at.
#[derive(Debug, Clone, Copy)]
pub struct AdvisorInput<'a> {
    pub current: &'a StatSnapshot,
    pub ideal: &'a IdealStats,
    pub priorities: &'a Priorities,
    /// Stat named by the last lost optional race, if any.
    pub last_feedback: Option<Stat>,
    pub action_gains: &'a ActionGainStats,
    pub loss_reasons: &'a LossReasonTally,
    pub loss_reason_weight: f64,
}

/// Weight components for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WeightBreakdown {
    pub priority: f64,
    /// Catch-up / overshoot multiplier applied to the priority (1.0 if none).
    pub adjustment: f64,
    pub feedback: f64,
    pub loss_reason: f64,
    pub total: f64,
    /// Relative gap used in the score (sign depends on the policy).
    pub gap: f64,
}

/// The advisor's pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub action: Stat,
    pub score: f64,
    pub policy: ScoringPolicy,
    pub explanation: String,
    /// Weights as applied for the chosen action.
    pub weights: StatMap<WeightBreakdown>,
    /// Score of every candidate action.
    pub scores: StatMap<f64>,
}

/// Rank the five training actions and return the best one.
pub fn suggest_action(input: &AdvisorInput, config: &AdvisorConfig) -> Suggestion {
    match config.policy {
        ScoringPolicy::RmsDeviation => rms::suggest(input, config),
        ScoringPolicy::WeightedGap => weighted_gap::suggest(input, config),
    }
}

/// Additive bonus from race feedback and recorded losses.
fn bonuses(input: &AdvisorInput, config: &AdvisorConfig, stat: Stat) -> (f64, f64) {
    let feedback = if input.last_feedback == Some(stat) {
        config.feedback_weight
    } else {
        0.0
    };
    let loss = input.loss_reason_weight * input.loss_reasons.count(stat) as f64;
    (feedback, loss)
}

/// `value / ideal`, or `None` when the target is zero.
fn ratio(value: f64, ideal: u32) -> Option<f64> {
    (ideal > 0).then(|| value / ideal as f64)
}
