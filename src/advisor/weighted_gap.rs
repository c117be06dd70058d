use super::{bonuses, ratio, AdvisorInput, ScoringPolicy, Suggestion, WeightBreakdown};
use crate::config::AdvisorConfig;
use crate::model::{Stat, StatMap};

pub(super) fn suggest(input: &AdvisorInput, config: &AdvisorConfig) -> Suggestion {
    let mut notes: StatMap<Vec<String>> = StatMap::default();
    let weights = StatMap::from_fn(|stat| {
        let progress = ratio(input.current[stat] as f64, input.ideal[stat]).unwrap_or(1.0);
        let priority = config.priority_weights.multiplier(input.priorities[stat]);
        let mut adjustment = 1.0;

        if progress < config.catchup_threshold {
            adjustment *= config.catchup_boost;
            notes[stat].push("catch-up".to_string());
        }
        if progress > config.overshoot_threshold {
            let penalty = 1.0
                + config.overshoot_penalty_scale * (progress / config.overshoot_threshold - 1.0);
            adjustment /= penalty;
            notes[stat].push(format!("overshoot {:.2}x", penalty));
        }

        let (feedback, loss_reason) = bonuses(input, config, stat);
        if feedback > 0.0 {
            notes[stat].push("feedback".to_string());
        }
        if loss_reason > 0.0 {
            notes[stat].push("loss history".to_string());
        }

        WeightBreakdown {
            priority,
            adjustment,
            feedback,
            loss_reason,
            total: priority * adjustment + feedback + loss_reason,
            gap: 1.0 - progress,
        }
    });

    let scores = weights.map(|_, w| w.gap * w.total);

    let mut best = Stat::Speed;
    for stat in Stat::ALL.into_iter().skip(1) {
        if scores[stat] > scores[best] {
            best = stat;
        }
    }

    let detail = if notes[best].is_empty() {
        String::new()
    } else {
        format!("; {}", notes[best].join(", "))
    };
    let explanation = format!(
        "{} has the largest weighted gap to ideal ({:.3}; priority {}{})",
        best.label(),
        scores[best],
        input.priorities[best],
        detail
    );

    Suggestion {
        action: best,
        score: scores[best],
        policy: ScoringPolicy::WeightedGap,
        explanation,
        weights,
        scores,
    }
}
