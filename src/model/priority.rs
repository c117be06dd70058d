//! User-set per-stat priority levels.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::stat::{Stat, StatMap};

/// Five-level priority scale. Multipliers come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

/// Priority per stat; missing entries are `Normal`.
pub type Priorities = StatMap<Priority>;

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Highest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Lowest => "Lowest",
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Highest => "Highest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow!(
                    "unknown priority '{}' (expected Lowest, Low, Normal, High or Highest)",
                    wanted
                )
            })
    }
}

/// Numeric multiplier for each level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub lowest: f64,
    pub low: f64,
    pub normal: f64,
    pub high: f64,
    pub highest: f64,
    /// Global scale applied on top of every level.
    pub scale: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            lowest: 0.5,
            low: 0.8,
            normal: 1.0,
            high: 1.3,
            highest: 1.7,
            scale: 1.0,
        }
    }
}

impl PriorityWeights {
    pub fn multiplier(&self, priority: Priority) -> f64 {
        let base = match priority {
            Priority::Lowest => self.lowest,
            Priority::Low => self.low,
            Priority::Normal => self.normal,
            Priority::High => self.high,
            Priority::Highest => self.highest,
        };
        base * self.scale
    }
}

/// Parse `stat=Level` pairs into a full priority map (unspecified stats stay `Normal`).
pub fn parse_priorities(pairs: &[String]) -> Result<Priorities> {
    let mut priorities = Priorities::default();
    for pair in pairs {
        let (stat, level) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected STAT=LEVEL, got '{}'", pair))?;
        priorities[stat.parse::<Stat>()?] = level.parse::<Priority>()?;
    }
    Ok(priorities)
}
