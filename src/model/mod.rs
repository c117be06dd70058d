//! Core value types shared by the reader, advisor, run state, and stores.

pub mod analytics;
pub mod priority;
pub mod stat;

pub use analytics::{ActionGainStats, LossReasonTally, ProfileAnalytics};
pub use priority::{parse_priorities, Priorities, Priority, PriorityWeights};
pub use stat::{
    parse_snapshot, parse_stat_values, IdealStats, Stat, StatMap, StatSnapshot, MAX_STAT_VALUE,
};
