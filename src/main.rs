//! Stat Planner
//!
//! Reads trainee stats off game screenshots by template matching and
//! recommends the next training action. Trainee profiles and the active run
//! are kept as JSON files in the data directory.

mod advisor;
mod commands;
mod config;
mod export;
mod model;
mod paths;
mod profile;
mod race;
mod recognition;
mod run;
mod storage;

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::advisor::ScoringPolicy;
use crate::model::Stat;

/// Logs a message to stderr and the log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("stat_planner.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Screenshot stat reader and training planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read the five stats from a screenshot
    Scan(ScanArgs),
    /// Recommend a training action for given stats
    Suggest(SuggestArgs),
    /// Show the race stage after a number of completed races
    Stage {
        /// Races already completed
        rounds_done: u32,
        /// Qualifying rounds before the knockout stages
        total_rounds: u32,
    },
    /// Manage trainee profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Drive the active run
    #[command(subcommand)]
    Run(RunCommand),
    /// Export the active run's history (CSV, chart, summary)
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Screenshot to read
    image: PathBuf,
    /// Write debug_template_boxes.png to the debug directory
    #[arg(long)]
    debug: bool,
    #[command(flatten)]
    templates: TemplateArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct TemplateArgs {
    /// Stat label template directory (default: resources/templates next to the executable)
    #[arg(long)]
    label_templates: Option<PathBuf>,
    /// Digit template directory (default: resources/digits next to the executable)
    #[arg(long)]
    digit_templates: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SuggestArgs {
    /// Current stats: "speed=400 stamina=300 ..." or five numbers
    #[arg(long)]
    current: String,
    /// Ideal stats; defaults to the profile's when --profile is given
    #[arg(long)]
    ideal: Option<String>,
    /// Use this profile's ideal stats and learned analytics
    #[arg(long)]
    profile: Option<usize>,
    /// Priority per stat, e.g. --priority speed=High
    #[arg(long = "priority")]
    priorities: Vec<String>,
    /// Stat named by the last lost optional race
    #[arg(long)]
    feedback: Option<Stat>,
    /// Scoring policy (default from config.json)
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PolicyArg {
    RmsDeviation,
    WeightedGap,
}

impl From<PolicyArg> for ScoringPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::RmsDeviation => ScoringPolicy::RmsDeviation,
            PolicyArg::WeightedGap => ScoringPolicy::WeightedGap,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Add a trainee profile
    Add {
        name: String,
        /// Ideal stats: "speed=1100 stamina=600 ..." or five numbers
        #[arg(long)]
        ideal: String,
        /// Photo to copy into the profile photo directory
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// List all profiles
    List,
    /// Show a profile with its learned analytics
    Show { index: usize },
    /// Reset a profile's learned gains and loss reasons
    ClearAnalytics { index: usize },
}

#[derive(Subcommand, Debug)]
enum RunCommand {
    /// Start a new run for a profile
    Start {
        /// Profile index (see `profile list`)
        #[arg(long)]
        profile: usize,
        /// Qualifying rounds before the knockout stages
        #[arg(long)]
        rounds: u32,
        /// Turns until the first race
        #[arg(long)]
        turns: u32,
        /// Priority per stat, e.g. --priority speed=High
        #[arg(long = "priority")]
        priorities: Vec<String>,
        /// Replace an existing saved run
        #[arg(long)]
        force: bool,
    },
    /// Show the active run and, when an action is due, the recommendation
    Status,
    /// Read stats from a screenshot, or skip to manual entry without one
    Scan {
        image: Option<PathBuf>,
        #[arg(long)]
        debug: bool,
        #[command(flatten)]
        templates: TemplateArgs,
    },
    /// Confirm stats: the scanned values, or values given here
    Confirm {
        /// "speed=400 stamina=300 ..." or five numbers
        stats: Option<String>,
    },
    /// Train a stat (default: the recommended one)
    Train { stat: Option<Stat> },
    /// Take a recovery turn
    Recover,
    /// Enter an optional race instead of training
    Race,
    /// Report a race result
    Result {
        #[arg(value_enum)]
        outcome: RaceOutcomeArg,
        /// Stat the game suggested focusing on
        #[arg(long)]
        feedback: Option<Stat>,
        /// Turns until the next race (after a passed mandatory race)
        #[arg(long)]
        next_turns: Option<u32>,
    },
    /// Name the stat blamed for a lost mandatory race
    LossReason { stat: Option<Stat> },
    /// Delete the saved run
    Abandon,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RaceOutcomeArg {
    Won,
    Lost,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output directory (default: exports/<trainee>_<timestamp> in the data directory)
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    no_csv: bool,
    #[arg(long)]
    no_graph: bool,
    #[arg(long)]
    no_summary: bool,
}

fn main() {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log(&format!("Error: {:#}", e));
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    paths::ensure_directories()?;
    config::init_config();

    let app = commands::App::new(config::get_config());
    match cli.command {
        Command::Scan(args) => app.scan(&args.image, args.debug, &args.templates),
        Command::Suggest(args) => app.suggest(&args),
        Command::Stage {
            rounds_done,
            total_rounds,
        } => {
            println!("{}", race::stage_for(rounds_done, total_rounds));
            Ok(())
        }
        Command::Profile(cmd) => app.profile(cmd),
        Command::Run(cmd) => app.run(cmd),
        Command::Export(args) => app.export(&args),
    }
}
