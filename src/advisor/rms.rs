use super::{bonuses, ratio, AdvisorInput, ScoringPolicy, Suggestion, WeightBreakdown};
use crate::config::AdvisorConfig;
use crate::model::{Stat, StatMap};

/// Scores closer than this are treated as equal; the earlier stat wins.
const TIE_EPSILON: f64 = 1e-12;

pub(super) fn suggest(input: &AdvisorInput, config: &AdvisorConfig) -> Suggestion {
    let base = StatMap::from_fn(|stat| {
        let priority = config.priority_weights.multiplier(input.priorities[stat]);
        let (feedback, loss_reason) = bonuses(input, config, stat);
        WeightBreakdown {
            priority,
            adjustment: 1.0,
            feedback,
            loss_reason,
            total: priority + feedback + loss_reason,
            gap: 0.0,
        }
    });

    let projections = StatMap::from_fn(|action| project(input, action));
    let scores = projections.map(|_, projected| {
        let total: f64 = Stat::ALL
            .into_iter()
            .map(|s| {
                let gap = ratio(projected[s], input.ideal[s]).map_or(0.0, |r| r - 1.0);
                base[s].total * gap * gap
            })
            .sum();
        total.sqrt()
    });

    let mut best = Stat::Speed;
    for stat in Stat::ALL.into_iter().skip(1) {
        if scores[stat] < scores[best] - TIE_EPSILON {
            best = stat;
        }
    }

    let projected = &projections[best];
    let weights = base.map(|stat, w| WeightBreakdown {
        gap: ratio(projected[stat], input.ideal[stat]).map_or(0.0, |r| r - 1.0),
        ..*w
    });

    let history = match input.action_gains.get(best) {
        Some(gain) if gain.count > 0 => format!("{} recorded turns", gain.count),
        _ => "no history, assuming +1".to_string(),
    };
    let explanation = format!(
        "Training {} leaves the stats closest to ideal (weighted RMS deviation {:.3}; {})",
        best.label(),
        scores[best],
        history
    );

    Suggestion {
        action: best,
        score: scores[best],
        policy: ScoringPolicy::RmsDeviation,
        explanation,
        weights,
        scores,
    }
}

/// Current stats after applying the action's expected gain.
fn project(input: &AdvisorInput, action: Stat) -> StatMap<f64> {
    let gain = input
        .action_gains
        .average_gain(action)
        .unwrap_or_else(|| StatMap::from_fn(|s| if s == action { 1.0 } else { 0.0 }));
    StatMap::from_fn(|s| input.current[s] as f64 + gain[s])
}
