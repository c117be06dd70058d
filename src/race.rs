//! Race stage sequencing: qualifying rounds, then a three-stage knockout.

use std::fmt;

/// The race a run is heading toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStage {
    /// Qualifying round, numbered from 1.
    Round(u32),
    QuarterFinal,
    SemiFinal,
    Final,
    /// All races done.
    End,
}

impl RaceStage {
    /// Optional races are only offered during qualifying rounds.
    pub fn allows_optional_race(self) -> bool {
        matches!(self, RaceStage::Round(_))
    }

    pub fn is_end(self) -> bool {
        self == RaceStage::End
    }
}

impl fmt::Display for RaceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceStage::Round(n) => write!(f, "Round {}", n),
            RaceStage::QuarterFinal => f.write_str("Quarter-Final"),
            RaceStage::SemiFinal => f.write_str("Semi-Final"),
            RaceStage::Final => f.write_str("Final"),
            RaceStage::End => f.write_str("End"),
        }
    }
}

/// Stage of the next race after `rounds_done` completed races.
pub fn stage_for(rounds_done: u32, total_rounds: u32) -> RaceStage {
    if rounds_done < total_rounds {
        return RaceStage::Round(rounds_done + 1);
    }
    match rounds_done - total_rounds {
        0 => RaceStage::QuarterFinal,
        1 => RaceStage::SemiFinal,
        2 => RaceStage::Final,
        _ => RaceStage::End,
    }
}

/// True when an optional race may be entered instead of training.
pub fn is_optional_race_eligible(rounds_done: u32, total_rounds: u32, turns_left: u32) -> bool {
    turns_left > 0 && stage_for(rounds_done, total_rounds).allows_optional_race()
}
