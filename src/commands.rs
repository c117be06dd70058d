//! Command handlers: wire the reader, advisor, run state machine, and stores.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::advisor::{self, AdvisorInput, Suggestion};
use crate::config::PlannerConfig;
use crate::export::{self, ExportOptions, RunRecord};
use crate::model::{parse_priorities, parse_snapshot, parse_stat_values, Stat};
use crate::profile::{Profile, ProfileStore};
use crate::recognition::{StatReader, TemplateSet};
use crate::run::{RunEffect, RunEvent, RunPhase, RunState, RunStore};
use crate::{ExportArgs, ProfileCommand, RaceOutcomeArg, RunCommand, SuggestArgs, TemplateArgs};

pub struct App {
    config: &'static PlannerConfig,
    profiles: ProfileStore,
    runs: RunStore,
    exports_dir: PathBuf,
    /// Files written automatically when a run ends.
    end_export: ExportOptions,
}

impl App {
    pub fn new(config: &'static PlannerConfig) -> Self {
        Self {
            config,
            profiles: ProfileStore::open_default(),
            runs: RunStore::open_default(),
            exports_dir: crate::paths::get_exports_dir(),
            end_export: ExportOptions::default(),
        }
    }

    pub fn scan(&self, path: &Path, debug: bool, templates: &TemplateArgs) -> Result<()> {
        let reader = self.reader(debug, templates)?;
        let img = image::open(path)
            .with_context(|| format!("Failed to open screenshot: {}", path.display()))?;

        match reader.read_stats(&img) {
            Some(snapshot) => {
                println!("{}", snapshot);
                Ok(())
            }
            None => bail!("scan failed: stats could not be read from {}", path.display()),
        }
    }

    pub fn suggest(&self, args: &SuggestArgs) -> Result<()> {
        let current = parse_snapshot(&args.current)?;
        let profile = args.profile.map(|i| self.profiles.get(i)).transpose()?;
        let ideal = match (&args.ideal, &profile) {
            (Some(text), _) => parse_stat_values(text)?,
            (None, Some(p)) => p.ideal_stats,
            (None, None) => bail!("--ideal is required without --profile"),
        };
        let priorities = parse_priorities(&args.priorities)?;
        let analytics = profile.map(|p| p.analytics).unwrap_or_default();

        let mut advisor_config = self.config.advisor.clone();
        if let Some(policy) = args.policy {
            advisor_config.policy = policy.into();
        }

        let input = AdvisorInput {
            current: &current,
            ideal: &ideal,
            priorities: &priorities,
            last_feedback: args.feedback,
            action_gains: &analytics.action_stats,
            loss_reasons: &analytics.loss_reasons,
            loss_reason_weight: advisor_config.loss_reason_weight,
        };
        print_suggestion(&advisor::suggest_action(&input, &advisor_config));
        Ok(())
    }

    pub fn profile(&self, cmd: ProfileCommand) -> Result<()> {
        match cmd {
            ProfileCommand::Add { name, ideal, photo } => {
                let ideal = parse_stat_values(&ideal)?;
                let index = self.profiles.add(&name, ideal, photo.as_deref())?;
                println!("Added profile {}: {}", index, name.trim());
            }
            ProfileCommand::List => {
                let profiles = self.profiles.load()?;
                if profiles.is_empty() {
                    println!("No profiles. Add one with `profile add`.");
                }
                for (i, p) in profiles.iter().enumerate() {
                    println!("{:>3}  {:<20} {}", i, p.name, p.ideal_stats);
                }
            }
            ProfileCommand::Show { index } => {
                let profile = self.profiles.get(index)?;
                self.print_profile(&profile);
            }
            ProfileCommand::ClearAnalytics { index } => {
                self.profiles.clear_analytics(index)?;
                println!("Cleared analytics for profile {}", index);
            }
        }
        Ok(())
    }

    pub fn run(&self, cmd: RunCommand) -> Result<()> {
        match cmd {
            RunCommand::Start {
                profile,
                rounds,
                turns,
                priorities,
                force,
            } => {
                if !force && self.runs.load()?.is_some_and(|r| !r.is_finished()) {
                    bail!("a run is already in progress (use --force to replace it)");
                }
                let p = self.profiles.get(profile)?;
                let priorities = parse_priorities(&priorities)?;
                let run = RunState::new(profile, p.ideal_stats, priorities, rounds, turns)?;
                self.runs.save(&run)?;
                println!(
                    "Started run for {}: {} in {} turns",
                    p.name,
                    run.stage(),
                    turns
                );
                Ok(())
            }
            RunCommand::Status => {
                let run = self.active_run()?;
                self.print_status(&run)
            }
            RunCommand::Scan {
                image,
                debug,
                templates,
            } => {
                let scanned = match image {
                    Some(path) => {
                        let reader = self.reader(debug, &templates)?;
                        let img = image::open(&path).with_context(|| {
                            format!("Failed to open screenshot: {}", path.display())
                        })?;
                        let outcome = reader.read_detailed(&img);
                        match (&outcome.snapshot, &outcome.failure) {
                            (Some(s), _) => println!("Scanned: {}", s),
                            (None, Some(f)) => println!("Scan failed ({}). Enter stats with `run confirm \"...\"`.", f),
                            (None, None) => println!("Scan failed. Enter stats with `run confirm \"...\"`."),
                        }
                        outcome.snapshot
                    }
                    None => {
                        println!("Manual entry: confirm with `run confirm \"speed=.. stamina=.. ...\"`.");
                        None
                    }
                };
                self.step(RunEvent::Scanned(scanned))
            }
            RunCommand::Confirm { stats } => {
                let snapshot = match stats {
                    Some(text) => parse_snapshot(&text)?,
                    None => self
                        .active_run()?
                        .pending_scan
                        .ok_or_else(|| anyhow!("no scanned stats to confirm; pass them explicitly"))?,
                };
                self.step(RunEvent::Confirmed(snapshot))
            }
            RunCommand::Train { stat } => {
                let stat = match stat {
                    Some(stat) => stat,
                    None => {
                        let run = self.active_run()?;
                        if run.phase != RunPhase::AwaitingAction {
                            bail!("cannot train while {}", run.phase);
                        }
                        let suggestion = self.suggest_for(&run)?;
                        println!("{}", suggestion.explanation);
                        suggestion.action
                    }
                };
                self.step(RunEvent::Trained(stat))
            }
            RunCommand::Recover => self.step(RunEvent::Recovered),
            RunCommand::Race => self.step(RunEvent::OptionalRace),
            RunCommand::Result {
                outcome,
                feedback,
                next_turns,
            } => self.step(RunEvent::RaceResult {
                won: outcome == RaceOutcomeArg::Won,
                feedback,
                next_turns,
            }),
            RunCommand::LossReason { stat } => self.step(RunEvent::LossReason(stat)),
            RunCommand::Abandon => {
                if self.runs.clear()? {
                    println!("Run deleted.");
                } else {
                    println!("No run in progress.");
                }
                Ok(())
            }
        }
    }

    pub fn export(&self, args: &ExportArgs) -> Result<()> {
        let run = self.active_run()?;
        let profile = self.profiles.get(run.profile_index)?;
        let options = ExportOptions {
            csv: !args.no_csv,
            graph: !args.no_graph,
            summary: !args.no_summary,
        };
        let dir = args
            .out
            .clone()
            .unwrap_or_else(|| self.default_export_dir(&profile.name));
        for path in self.export_run(&run, &profile, &dir, options)? {
            println!("Wrote {}", path.display());
        }
        Ok(())
    }

    /// Apply one event to the saved run, persist it, then carry out its effects.
    ///
    /// The run is saved before any profile write so a failed save leaves
    /// both files as they were and the event can be retried.
    fn step(&self, event: RunEvent) -> Result<()> {
        let mut run = self.active_run()?;
        let effects = run.apply(event)?;
        self.runs.save(&run)?;

        let mut clear = false;
        for effect in effects {
            match effect {
                RunEffect::RecordActionGain {
                    action,
                    before,
                    after,
                } => self
                    .profiles
                    .record_action_gain(run.profile_index, action, &before, &after)?,
                RunEffect::RecordLossReason(stat) => {
                    self.profiles.record_loss_reason(run.profile_index, stat)?
                }
                RunEffect::ClearSavedRun => clear = true,
            }
        }

        if clear {
            println!("{}", run.phase);
            let profile = self.profiles.get(run.profile_index)?;
            let dir = self.default_export_dir(&profile.name);
            match self.export_run(&run, &profile, &dir, self.end_export) {
                Ok(paths) => {
                    for path in paths {
                        println!("Wrote {}", path.display());
                    }
                    self.runs.clear()?;
                }
                Err(e) => {
                    // The finished run stays saved so the export can be retried.
                    println!(
                        "Export failed: {:#}. Run kept; retry with `export` or delete with `run abandon`.",
                        e
                    );
                }
            }
            return Ok(());
        }

        self.print_status(&run)
    }

    fn export_run(
        &self,
        run: &RunState,
        profile: &Profile,
        dir: &Path,
        options: ExportOptions,
    ) -> Result<Vec<PathBuf>> {
        let photo = self.profiles.photo_path(profile);
        let record = RunRecord {
            trainee: &profile.name,
            photo: photo.as_deref(),
            ideal: &run.ideal_stats,
            history: &run.history,
        };
        export::export_run(&record, dir, options, &self.config.chart)
    }

    fn default_export_dir(&self, trainee: &str) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.exports_dir.join(format!("{}_{}", trainee, stamp))
    }

    fn active_run(&self) -> Result<RunState> {
        self.runs
            .load()?
            .ok_or_else(|| anyhow!("no run in progress (start one with `run start`)"))
    }

    fn reader(&self, debug: bool, templates: &TemplateArgs) -> Result<StatReader> {
        let set = TemplateSet::load(
            &templates
                .label_templates
                .clone()
                .unwrap_or_else(crate::paths::get_label_template_dir),
            &templates
                .digit_templates
                .clone()
                .unwrap_or_else(crate::paths::get_digit_template_dir),
        )?;
        let reader = StatReader::new(set, self.config.recognition.clone());
        if debug || self.config.recognition.debug_image {
            Ok(reader.with_debug_dir(crate::paths::get_debug_dir()))
        } else {
            Ok(reader)
        }
    }

    fn suggest_for(&self, run: &RunState) -> Result<Suggestion> {
        let profile = self.profiles.get(run.profile_index)?;
        let input = AdvisorInput {
            current: &run.current_stats,
            ideal: &run.ideal_stats,
            priorities: &run.stat_priorities,
            last_feedback: run.feedback_stat,
            action_gains: &profile.analytics.action_stats,
            loss_reasons: &profile.analytics.loss_reasons,
            loss_reason_weight: self.config.advisor.loss_reason_weight,
        };
        Ok(advisor::suggest_action(&input, &self.config.advisor))
    }

    fn print_status(&self, run: &RunState) -> Result<()> {
        println!("Phase:      {}", run.phase);
        println!("Next race:  {}", run.stage());
        println!("Turn:       {} ({} turns left until the race)", run.turn, run.turns_left);
        if let Some(stat) = run.feedback_stat {
            println!("Feedback:   {}", stat.label());
        }
        if !run.history.is_empty() {
            println!("Current:    {}", run.current_stats);
        }
        println!("Ideal:      {}", run.ideal_stats);
        if let Some(scan) = &run.pending_scan {
            println!("Scanned:    {} (confirm with `run confirm`)", scan);
        }

        match run.phase {
            RunPhase::AwaitingAction => {
                print_suggestion(&self.suggest_for(run)?);
                if run.optional_race_available() {
                    println!("An optional race is available (`run race`).");
                }
            }
            RunPhase::AwaitingRaceResult { mandatory: true } => {
                println!("Race day: {}. Report with `run result won|lost`.", run.stage());
            }
            RunPhase::AwaitingLossReason => {
                println!("Which stat lost the race? `run loss-reason <stat>` (or omit to skip).");
            }
            _ => {}
        }
        Ok(())
    }

    fn print_profile(&self, profile: &Profile) {
        println!("Name:   {}", profile.name);
        println!("Ideal:  {}", profile.ideal_stats);
        if let Some(photo) = self.profiles.photo_path(profile) {
            println!("Photo:  {}", photo.display());
        }

        let analytics = &profile.analytics;
        if analytics.loss_reasons.is_empty() && analytics.action_stats.is_empty() {
            println!("No analytics recorded yet.");
            return;
        }
        if !analytics.loss_reasons.is_empty() {
            println!("Race losses by stat:");
            for (stat, count) in analytics.loss_reasons.iter() {
                println!("  {:<8} {}", stat.label(), count);
            }
        }
        println!("Average gain per training action:");
        for (action, gain) in analytics.action_stats.iter() {
            if let Some(avg) = gain.average() {
                let parts: Vec<String> = Stat::ALL
                    .iter()
                    .map(|&s| format!("{} {:+.1}", s.label(), avg[s]))
                    .collect();
                println!("  {:<8} x{:<4} {}", action.label(), gain.count, parts.join(", "));
            }
        }
    }
}

fn print_suggestion(suggestion: &Suggestion) {
    println!("Suggested: train {}", suggestion.action.label());
    println!("  {}", suggestion.explanation);
    println!("  {:<8} {:>8} {:>8} {:>8} {:>8}", "Stat", "Score", "Weight", "Gap", "Extra");
    for (stat, w) in suggestion.weights.iter() {
        println!(
            "  {:<8} {:>8.3} {:>8.2} {:>+8.3} {:>8.2}",
            stat.label(),
            suggestion.scores[stat],
            w.total,
            w.gap,
            w.feedback + w.loss_reason
        );
    }
}
