//! Learned per-trainee analytics: observed training gains and race-loss reasons.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::stat::{self, Stat, StatMap, StatSnapshot};

/// Running totals for one training action ("train <stat>").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGain {
    /// Times the action was taken and followed by a scan.
    #[serde(default)]
    pub count: u32,
    /// Cumulative observed gain per stat.
    #[serde(default, deserialize_with = "stat::sparse")]
    pub gains: StatMap<u64>,
}

impl ActionGain {
    /// Add one observation. Drops are recorded as zero gain.
    pub fn record(&mut self, before: &StatSnapshot, after: &StatSnapshot) {
        self.count += 1;
        for stat in Stat::ALL {
            self.gains[stat] += after[stat].saturating_sub(before[stat]) as u64;
        }
    }

    /// Mean gain per stat, or `None` before the first observation.
    pub fn average(&self) -> Option<StatMap<f64>> {
        if self.count == 0 {
            return None;
        }
        let count = self.count as f64;
        Some(self.gains.map(|_, &total| total as f64 / count))
    }
}

/// Observed gains for every action taken so far, keyed by the trained stat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionGainStats(BTreeMap<Stat, ActionGain>);

impl ActionGainStats {
    pub fn get(&self, action: Stat) -> Option<&ActionGain> {
        self.0.get(&action)
    }

    pub fn record(&mut self, action: Stat, before: &StatSnapshot, after: &StatSnapshot) {
        self.0.entry(action).or_default().record(before, after);
    }

    /// Historical average gain vector for `action`, if any history exists.
    pub fn average_gain(&self, action: Stat) -> Option<StatMap<f64>> {
        self.get(action).and_then(ActionGain::average)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, &ActionGain)> {
        self.0.iter().map(|(stat, gain)| (*stat, gain))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|g| g.count == 0)
    }
}

/// How many mandatory race losses were attributed to each stat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LossReasonTally(BTreeMap<Stat, u32>);

impl LossReasonTally {
    pub fn record(&mut self, stat: Stat) {
        *self.0.entry(stat).or_insert(0) += 1;
    }

    pub fn count(&self, stat: Stat) -> u32 {
        self.0.get(&stat).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, u32)> + '_ {
        self.0.iter().map(|(stat, count)| (*stat, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&c| c == 0)
    }
}

/// Everything learned about one trainee across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAnalytics {
    #[serde(default)]
    pub loss_reasons: LossReasonTally,
    #[serde(default)]
    pub action_stats: ActionGainStats,
}

impl ProfileAnalytics {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
