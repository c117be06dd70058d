//! Run state machine.
//!
//! A run cycles through: Scan → Confirm → Action, with a mandatory race when
//! the turn counter runs out. Each event either moves the run forward or is
//! rejected without touching the state. Side effects on the profile store
//! and the saved-run file are returned as [`RunEffect`]s for the caller to
//! apply.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::stat::{self, Stat, StatSnapshot};
use crate::model::{IdealStats, Priorities};
use crate::race::{self, RaceStage};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Lost,
}

/// Run phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunPhase {
    /// Waiting for a screenshot or manual entry
    #[default]
    AwaitingScan,
    /// Scan done, values need confirming
    AwaitingConfirm,
    /// Stats confirmed, waiting for train / recover / race
    AwaitingAction,
    /// Waiting for the outcome of a race
    AwaitingRaceResult { mandatory: bool },
    /// Mandatory race lost, waiting for the stat blamed for it
    AwaitingLossReason,
    /// Run over
    RunEnded { outcome: RunOutcome },
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::AwaitingScan => write!(f, "Awaiting scan"),
            RunPhase::AwaitingConfirm => write!(f, "Awaiting confirmation"),
            RunPhase::AwaitingAction => write!(f, "Awaiting action"),
            RunPhase::AwaitingRaceResult { mandatory: true } => {
                write!(f, "Awaiting mandatory race result")
            }
            RunPhase::AwaitingRaceResult { mandatory: false } => {
                write!(f, "Awaiting optional race result")
            }
            RunPhase::AwaitingLossReason => write!(f, "Awaiting loss reason"),
            RunPhase::RunEnded { outcome: RunOutcome::Completed } => write!(f, "Run completed"),
            RunPhase::RunEnded { outcome: RunOutcome::Lost } => write!(f, "Run lost"),
        }
    }
}

/// User input driving the run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Screenshot read. `None` means recognition failed and values will be
    /// entered by hand.
    Scanned(Option<StatSnapshot>),
    Confirmed(StatSnapshot),
    Trained(Stat),
    Recovered,
    OptionalRace,
    RaceResult {
        won: bool,
        feedback: Option<Stat>,
        /// Turns until the next race, required after a passed mandatory race
        /// unless the run is over.
        next_turns: Option<u32>,
    },
    LossReason(Option<Stat>),
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Scanned(_) => write!(f, "scan"),
            RunEvent::Confirmed(_) => write!(f, "confirm"),
            RunEvent::Trained(stat) => write!(f, "train {}", stat),
            RunEvent::Recovered => write!(f, "recover"),
            RunEvent::OptionalRace => write!(f, "optional race"),
            RunEvent::RaceResult { .. } => write!(f, "race result"),
            RunEvent::LossReason(_) => write!(f, "loss reason"),
        }
    }
}

/// Persistence work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEffect {
    /// Add an observed gain to the profile's history for `action`.
    RecordActionGain {
        action: Stat,
        before: StatSnapshot,
        after: StatSnapshot,
    },
    /// Attribute a mandatory race loss to `stat`.
    RecordLossReason(Stat),
    /// Delete the saved run file.
    ClearSavedRun,
}

/// One in-progress run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub profile_index: usize,
    pub ideal_stats: IdealStats,
    #[serde(default, deserialize_with = "stat::sparse")]
    pub current_stats: StatSnapshot,
    /// Confirmed snapshots, oldest first.
    #[serde(default)]
    pub history: Vec<StatSnapshot>,
    #[serde(default)]
    pub feedback_stat: Option<Stat>,
    pub total_rounds: u32,
    pub rounds_done: u32,
    pub turns_left: u32,
    pub turn: u32,
    #[serde(default, deserialize_with = "stat::sparse")]
    pub stat_priorities: Priorities,
    #[serde(default)]
    pub phase: RunPhase,
    /// Training action awaiting gain attribution by the next scan.
    #[serde(default)]
    pub last_action: Option<Stat>,
    #[serde(default)]
    pub pending_scan: Option<StatSnapshot>,
}

impl RunState {
    /// Start a run at turn 1, awaiting the first scan.
    pub fn new(
        profile_index: usize,
        ideal_stats: IdealStats,
        stat_priorities: Priorities,
        total_rounds: u32,
        turns_until_race: u32,
    ) -> Result<Self> {
        if turns_until_race < 1 {
            bail!("turns until the first race must be at least 1");
        }
        Ok(Self {
            profile_index,
            ideal_stats,
            current_stats: StatSnapshot::default(),
            history: Vec::new(),
            feedback_stat: None,
            total_rounds,
            rounds_done: 0,
            turns_left: turns_until_race,
            turn: 1,
            stat_priorities,
            phase: RunPhase::AwaitingScan,
            last_action: None,
            pending_scan: None,
        })
    }

    pub fn stage(&self) -> RaceStage {
        race::stage_for(self.rounds_done, self.total_rounds)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RunPhase::RunEnded { .. })
    }

    pub fn optional_race_available(&self) -> bool {
        self.phase == RunPhase::AwaitingAction
            && race::is_optional_race_eligible(self.rounds_done, self.total_rounds, self.turns_left)
    }

    /// Apply `event`. On error the state is left exactly as it was.
    pub fn apply(&mut self, event: RunEvent) -> Result<Vec<RunEffect>> {
        let mut next = self.clone();
        let effects = next.transition(event)?;
        *self = next;
        Ok(effects)
    }

    fn transition(&mut self, event: RunEvent) -> Result<Vec<RunEffect>> {
        let mut effects = Vec::new();

        match (self.phase, event) {
            (RunPhase::AwaitingScan, RunEvent::Scanned(scan)) => {
                self.pending_scan = scan;
                self.phase = RunPhase::AwaitingConfirm;
            }

            (RunPhase::AwaitingConfirm, RunEvent::Confirmed(snapshot)) => {
                // Gains are attributed to the confirmed values, scanned or typed.
                if let (Some(action), Some(before)) = (self.last_action.take(), self.history.last()) {
                    effects.push(RunEffect::RecordActionGain {
                        action,
                        before: *before,
                        after: snapshot,
                    });
                }
                self.current_stats = snapshot;
                self.history.push(snapshot);
                self.pending_scan = None;
                self.phase = RunPhase::AwaitingAction;
            }

            (RunPhase::AwaitingAction, RunEvent::Trained(stat)) => {
                self.last_action = Some(stat);
                self.advance_turn();
            }

            (RunPhase::AwaitingAction, RunEvent::Recovered) => {
                self.last_action = None;
                self.advance_turn();
            }

            (RunPhase::AwaitingAction, RunEvent::OptionalRace) => {
                if !self.optional_race_available() {
                    bail!(
                        "no optional race available at {} with {} turns left",
                        self.stage(),
                        self.turns_left
                    );
                }
                self.last_action = None;
                self.phase = RunPhase::AwaitingRaceResult { mandatory: false };
            }

            (
                RunPhase::AwaitingRaceResult { mandatory: false },
                RunEvent::RaceResult { won, feedback, .. },
            ) => {
                if !won && feedback.is_some() {
                    self.feedback_stat = feedback;
                }
                self.phase = RunPhase::AwaitingScan;
            }

            (
                RunPhase::AwaitingRaceResult { mandatory: true },
                RunEvent::RaceResult {
                    won: true,
                    feedback,
                    next_turns,
                },
            ) => {
                self.feedback_stat = feedback;
                self.last_action = None;
                self.rounds_done += 1;
                if self.stage().is_end() {
                    self.phase = RunPhase::RunEnded {
                        outcome: RunOutcome::Completed,
                    };
                    effects.push(RunEffect::ClearSavedRun);
                } else {
                    let turns = match next_turns {
                        Some(t) if t >= 1 => t,
                        _ => bail!(
                            "turns until {} must be at least 1",
                            self.stage()
                        ),
                    };
                    self.turns_left = turns;
                    self.turn = 1;
                    self.phase = RunPhase::AwaitingScan;
                }
            }

            (RunPhase::AwaitingRaceResult { mandatory: true }, RunEvent::RaceResult { won: false, .. }) => {
                self.phase = RunPhase::AwaitingLossReason;
            }

            (RunPhase::AwaitingLossReason, RunEvent::LossReason(stat)) => {
                if let Some(stat) = stat {
                    effects.push(RunEffect::RecordLossReason(stat));
                }
                effects.push(RunEffect::ClearSavedRun);
                self.phase = RunPhase::RunEnded {
                    outcome: RunOutcome::Lost,
                };
            }

            (phase, event) => bail!("cannot {} while {}", event, phase),
        }

        Ok(effects)
    }

    fn advance_turn(&mut self) {
        self.turns_left = self.turns_left.saturating_sub(1);
        if self.turns_left < 1 {
            self.phase = RunPhase::AwaitingRaceResult { mandatory: true };
        } else {
            self.turn += 1;
            self.phase = RunPhase::AwaitingScan;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatMap;

    fn snap(v: u32) -> StatSnapshot {
        StatMap::new([v; 5])
    }

    fn new_run(total_rounds: u32, turns: u32) -> RunState {
        RunState::new(0, snap(600), Priorities::default(), total_rounds, turns).unwrap()
    }

    fn scan_and_confirm(run: &mut RunState, v: u32) -> Vec<RunEffect> {
        assert!(run.apply(RunEvent::Scanned(Some(snap(v)))).unwrap().is_empty());
        run.apply(RunEvent::Confirmed(snap(v))).unwrap()
    }

    fn pass(next_turns: Option<u32>) -> RunEvent {
        RunEvent::RaceResult {
            won: true,
            feedback: None,
            next_turns,
        }
    }

    #[test]
    fn test_new_requires_turns() {
        assert!(RunState::new(0, snap(600), Priorities::default(), 3, 0).is_err());
        let run = new_run(3, 2);
        assert_eq!(run.turn, 1);
        assert_eq!(run.phase, RunPhase::AwaitingScan);
        assert_eq!(run.stage(), RaceStage::Round(1));
    }

    #[test]
    fn test_happy_path_to_completion() {
        let mut run = new_run(1, 2);

        // Round 1: two turns
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Trained(Stat::Speed)).unwrap();
        assert_eq!(run.turn, 2);
        assert_eq!(run.turns_left, 1);
        let effects = scan_and_confirm(&mut run, 110);
        assert_eq!(
            effects,
            vec![RunEffect::RecordActionGain {
                action: Stat::Speed,
                before: snap(100),
                after: snap(110),
            }]
        );
        run.apply(RunEvent::Recovered).unwrap();
        assert_eq!(run.phase, RunPhase::AwaitingRaceResult { mandatory: true });

        run.apply(pass(Some(1))).unwrap();
        assert_eq!(run.stage(), RaceStage::QuarterFinal);
        assert_eq!(run.turn, 1);

        for expected in [RaceStage::SemiFinal, RaceStage::Final] {
            scan_and_confirm(&mut run, 120);
            run.apply(RunEvent::Recovered).unwrap();
            run.apply(pass(Some(1))).unwrap();
            assert_eq!(run.stage(), expected);
        }

        scan_and_confirm(&mut run, 130);
        run.apply(RunEvent::Recovered).unwrap();
        let effects = run.apply(pass(None)).unwrap();
        assert_eq!(effects, vec![RunEffect::ClearSavedRun]);
        assert_eq!(
            run.phase,
            RunPhase::RunEnded {
                outcome: RunOutcome::Completed
            }
        );
        assert_eq!(run.rounds_done, 4);
        assert_eq!(run.history.len(), 5);
    }

    #[test]
    fn test_mandatory_loss_records_reason() {
        let mut run = new_run(3, 1);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Trained(Stat::Power)).unwrap();
        run.apply(RunEvent::RaceResult {
            won: false,
            feedback: None,
            next_turns: None,
        })
        .unwrap();
        assert_eq!(run.phase, RunPhase::AwaitingLossReason);

        let effects = run.apply(RunEvent::LossReason(Some(Stat::Guts))).unwrap();
        assert_eq!(
            effects,
            vec![RunEffect::RecordLossReason(Stat::Guts), RunEffect::ClearSavedRun]
        );
        assert!(run.is_finished());
    }

    #[test]
    fn test_loss_without_reason() {
        let mut run = new_run(3, 1);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Recovered).unwrap();
        run.apply(RunEvent::RaceResult {
            won: false,
            feedback: None,
            next_turns: None,
        })
        .unwrap();
        let effects = run.apply(RunEvent::LossReason(None)).unwrap();
        assert_eq!(effects, vec![RunEffect::ClearSavedRun]);
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut run = new_run(3, 2);
        let before = run.clone();
        let err = run.apply(RunEvent::Trained(Stat::Wit)).unwrap_err();
        assert!(err.to_string().contains("train wit"));
        assert!(err.to_string().contains("Awaiting scan"));
        assert_eq!(run, before);

        let mut ended = new_run(3, 1);
        scan_and_confirm(&mut ended, 100);
        ended.apply(RunEvent::Recovered).unwrap();
        ended.apply(RunEvent::RaceResult { won: false, feedback: None, next_turns: None }).unwrap();
        ended.apply(RunEvent::LossReason(None)).unwrap();
        let snapshot = ended.clone();
        assert!(ended.apply(RunEvent::Scanned(None)).is_err());
        assert_eq!(ended, snapshot);
    }

    #[test]
    fn test_mandatory_pass_needs_next_turns() {
        let mut run = new_run(3, 1);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Recovered).unwrap();
        let before = run.clone();

        assert!(run.apply(pass(None)).is_err());
        assert!(run.apply(pass(Some(0))).is_err());
        assert_eq!(run, before);

        run.apply(pass(Some(4))).unwrap();
        assert_eq!(run.turns_left, 4);
        assert_eq!(run.rounds_done, 1);
    }

    #[test]
    fn test_optional_race_feedback() {
        let mut run = new_run(3, 3);
        scan_and_confirm(&mut run, 100);
        assert!(run.optional_race_available());
        run.apply(RunEvent::OptionalRace).unwrap();
        run.apply(RunEvent::RaceResult {
            won: false,
            feedback: Some(Stat::Stamina),
            next_turns: None,
        })
        .unwrap();

        assert_eq!(run.feedback_stat, Some(Stat::Stamina));
        assert_eq!(run.phase, RunPhase::AwaitingScan);
        assert_eq!(run.turns_left, 3);
        assert_eq!(run.turn, 1);
    }

    #[test]
    fn test_optional_race_win_keeps_feedback() {
        let mut run = new_run(3, 3);
        run.feedback_stat = Some(Stat::Wit);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::OptionalRace).unwrap();
        run.apply(pass(None)).unwrap();
        assert_eq!(run.feedback_stat, Some(Stat::Wit));
    }

    #[test]
    fn test_no_optional_race_in_knockout() {
        let mut run = new_run(0, 2);
        scan_and_confirm(&mut run, 100);
        assert!(!run.optional_race_available());
        assert!(run.apply(RunEvent::OptionalRace).is_err());
    }

    #[test]
    fn test_failed_scan_then_manual_entry() {
        let mut run = new_run(3, 3);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Trained(Stat::Speed)).unwrap();

        let effects = run.apply(RunEvent::Scanned(None)).unwrap();
        assert!(effects.is_empty());
        assert_eq!(run.pending_scan, None);

        let effects = run.apply(RunEvent::Confirmed(snap(105))).unwrap();
        assert_eq!(
            effects,
            vec![RunEffect::RecordActionGain {
                action: Stat::Speed,
                before: snap(100),
                after: snap(105),
            }]
        );
        assert_eq!(run.current_stats, snap(105));
        assert_eq!(run.last_action, None);
    }

    #[test]
    fn test_first_confirm_records_nothing() {
        let mut run = new_run(3, 3);
        run.last_action = Some(Stat::Speed);
        let effects = scan_and_confirm(&mut run, 100);
        assert!(effects.is_empty());
        assert_eq!(run.last_action, None);
    }

    #[test]
    fn test_optional_race_gains_not_credited_to_training() {
        let mut run = new_run(3, 3);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Trained(Stat::Speed)).unwrap();
        run.apply(RunEvent::Scanned(None)).unwrap();
        let trained = StatMap::new([110, 100, 100, 100, 100]);
        assert_eq!(run.apply(RunEvent::Confirmed(trained)).unwrap().len(), 1);

        run.apply(RunEvent::OptionalRace).unwrap();
        run.apply(pass(None)).unwrap();
        let after_race = StatMap::new([110, 100, 140, 100, 100]);
        run.apply(RunEvent::Scanned(Some(after_race))).unwrap();
        let effects = run.apply(RunEvent::Confirmed(after_race)).unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_mandatory_race_drops_pending_action() {
        let mut run = new_run(3, 1);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Trained(Stat::Guts)).unwrap();
        run.apply(pass(Some(2))).unwrap();
        assert_eq!(run.last_action, None);
        assert!(scan_and_confirm(&mut run, 150).is_empty());
    }

    #[test]
    fn test_recovery_turn_records_nothing() {
        let mut run = new_run(3, 3);
        scan_and_confirm(&mut run, 100);
        run.apply(RunEvent::Trained(Stat::Wit)).unwrap();
        assert_eq!(scan_and_confirm(&mut run, 110).len(), 1);
        run.apply(RunEvent::Recovered).unwrap();
        assert!(scan_and_confirm(&mut run, 120).is_empty());
    }

    #[test]
    fn test_json_without_new_fields_loads() {
        let json = r#"{
            "profile_index": 1,
            "ideal_stats": {"speed": 600, "stamina": 600, "power": 600, "guts": 600, "wit": 600},
            "current_stats": {"speed": 1, "stamina": 2, "power": 3, "guts": 4, "wit": 5},
            "history": [{"speed": 1, "stamina": 2, "power": 3, "guts": 4, "wit": 5}],
            "feedback_stat": null,
            "total_rounds": 3,
            "rounds_done": 1,
            "turns_left": 4,
            "turn": 2,
            "stat_priorities": {"speed": "High"}
        }"#;
        let run: RunState = serde_json::from_str(json).unwrap();
        assert_eq!(run.phase, RunPhase::AwaitingScan);
        assert_eq!(run.stat_priorities[Stat::Speed], crate::model::Priority::High);
        assert_eq!(run.stat_priorities[Stat::Wit], crate::model::Priority::Normal);
        assert_eq!(run.stage(), RaceStage::Round(2));
    }

    #[test]
    fn test_phase_json_shape() {
        let phase = RunPhase::AwaitingRaceResult { mandatory: true };
        let json = serde_json::to_string(&phase).unwrap();
        assert_eq!(json, r#"{"state":"awaiting_race_result","mandatory":true}"#);
        let back: RunPhase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phase);
    }
}
