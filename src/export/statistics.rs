//! Per-stat statistics over a run's history.
//!
//! Per-turn gain is the difference between consecutive confirmed snapshots,
//! so it can be negative when a stat dropped.

use serde::Serialize;

use crate::model::{IdealStats, Stat, StatSnapshot};

/// Statistics for one stat across the run.
#[derive(Debug, Clone, Serialize)]
pub struct StatStats {
    pub stat: Stat,
    /// First confirmed value
    pub start: u32,
    /// Last confirmed value
    #[serde(rename = "final")]
    pub final_value: u32,
    /// Target value
    pub ideal: u32,
    /// final / ideal (0 when the ideal is 0)
    pub completion: f64,
    /// final - start
    pub total_gain: i64,
    /// Mean per-turn gain
    pub mean_gain: f64,
    /// Median per-turn gain
    pub median_gain: f64,
    /// Smallest per-turn gain
    pub min_gain: i64,
    /// Largest per-turn gain
    pub max_gain: i64,
    /// Standard deviation of per-turn gain (population)
    pub std_dev: f64,
}

/// Statistics for every stat in canonical order.
pub fn calculate_run_stats(history: &[StatSnapshot], ideal: &IdealStats) -> Vec<StatStats> {
    Stat::ALL
        .into_iter()
        .map(|stat| {
            let values: Vec<u32> = history.iter().map(|s| s[stat]).collect();
            calculate_stat_stats(stat, &values, ideal[stat])
        })
        .collect()
}

fn calculate_stat_stats(stat: Stat, values: &[u32], ideal: u32) -> StatStats {
    let start = values.first().copied().unwrap_or(0);
    let final_value = values.last().copied().unwrap_or(0);
    let completion = if ideal > 0 {
        final_value as f64 / ideal as f64
    } else {
        0.0
    };

    let gains: Vec<i64> = values
        .windows(2)
        .map(|w| w[1] as i64 - w[0] as i64)
        .collect();

    let mut sorted = gains.clone();
    sorted.sort();

    let (mean_gain, std_dev) = mean_and_std_dev(&gains);

    StatStats {
        stat,
        start,
        final_value,
        ideal,
        completion,
        total_gain: final_value as i64 - start as i64,
        mean_gain,
        median_gain: calculate_median(&sorted),
        min_gain: sorted.first().copied().unwrap_or(0),
        max_gain: sorted.last().copied().unwrap_or(0),
        std_dev,
    }
}

/// Mean and population standard deviation; zeros for no data.
fn mean_and_std_dev(values: &[i64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<i64>() as f64 / count;
    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / count;
    (mean, variance.sqrt())
}

/// Calculate median from sorted values.
fn calculate_median(sorted: &[i64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        let mid = n / 2;
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[n / 2] as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatMap;

    fn history() -> Vec<StatSnapshot> {
        vec![
            StatMap::new([100, 200, 50, 0, 10]),
            StatMap::new([110, 200, 60, 0, 10]),
            StatMap::new([130, 195, 60, 0, 10]),
            StatMap::new([160, 195, 90, 0, 10]),
        ]
    }

    #[test]
    fn test_speed_stats() {
        let stats = calculate_run_stats(&history(), &StatMap::new([320, 400, 100, 0, 10]));
        let speed = &stats[0];
        assert_eq!(speed.stat, Stat::Speed);
        assert_eq!(speed.start, 100);
        assert_eq!(speed.final_value, 160);
        assert_eq!(speed.total_gain, 60);
        assert!((speed.completion - 0.5).abs() < 1e-9);
        // gains 10, 20, 30
        assert!((speed.mean_gain - 20.0).abs() < 1e-9);
        assert!((speed.median_gain - 20.0).abs() < 1e-9);
        assert_eq!(speed.min_gain, 10);
        assert_eq!(speed.max_gain, 30);
        assert!((speed.std_dev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_drops_are_negative_gains() {
        let stats = calculate_run_stats(&history(), &StatMap::new([1; 5]));
        let stamina = &stats[1];
        assert_eq!(stamina.min_gain, -5);
        assert_eq!(stamina.total_gain, -5);
    }

    #[test]
    fn test_zero_ideal_has_zero_completion() {
        let stats = calculate_run_stats(&history(), &StatMap::new([320, 400, 100, 0, 10]));
        assert_eq!(stats[3].completion, 0.0);
        assert!((stats[4].completion - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_even() {
        // power gains 10, 0, 30
        let stats = calculate_run_stats(&history(), &StatMap::new([1; 5]));
        assert!((stats[2].median_gain - 10.0).abs() < 1e-9);
        assert!((calculate_median(&[1, 2, 3, 4]) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_snapshot() {
        let stats = calculate_run_stats(&history()[..1], &StatMap::new([1; 5]));
        assert_eq!(stats[0].total_gain, 0);
        assert_eq!(stats[0].mean_gain, 0.0);
        assert_eq!(stats[0].std_dev, 0.0);
    }

    #[test]
    fn test_empty_history() {
        let stats = calculate_run_stats(&[], &StatMap::new([1; 5]));
        assert_eq!(stats.len(), 5);
        assert_eq!(stats[0].final_value, 0);
    }
}
