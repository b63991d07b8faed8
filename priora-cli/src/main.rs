use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use priora_core::{analyze, detect_cycles, resolve_dependencies, suggest, today_in, Strategy};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod input;
mod render;
mod state;

use config::Config;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PRIORA_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "priora", version = VERSION, about = "Rank tasks by urgency, importance, effort and dependencies")]
struct Cli {
    /// Config file (default: $PRIORA_HOME/config.toml or ~/.priora/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr (PRIORA_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// JSON task array or {"tasks": [...]} envelope; "-" or omitted reads stdin
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Weighting strategy: smart, fastest, impact, deadline (unknown = smart)
    #[arg(long)]
    strategy: Option<String>,

    /// Score as of this date instead of today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank every task in a batch (rejects batches with dependency cycles)
    Analyze {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Show the top tasks with the reasons they were picked
    Suggest {
        #[command(flatten)]
        batch: BatchArgs,

        /// How many suggestions to show (default from config, 3)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Report dependency cycles in a batch
    Cycles {
        /// JSON task array or {"tasks": [...]} envelope; "-" or omitted reads stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Count business days in [START, END) using the configured holidays
    BusinessDays { start: NaiveDate, end: NaiveDate },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PRIORA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_flag = cli.config.as_deref();

    match cli.command {
        Command::Analyze { batch } => {
            let cfg = config::load_config(config_flag)?;
            run_analyze(&cfg, batch)?;
        }

        Command::Suggest { batch, limit } => {
            let cfg = config::load_config(config_flag)?;
            run_suggest(&cfg, batch, limit)?;
        }

        Command::Cycles { input, json } => {
            let cfg = config::load_config(config_flag)?;
            run_cycles(&cfg, input.as_deref(), json)?;
        }

        Command::BusinessDays { start, end } => {
            let cfg = config::load_config(config_flag)?;
            let n = cfg.holiday_calendar()?.business_days_between(start, end);
            println!("{n}");
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                config::init_config(config_flag)?;
            }
            ConfigCommand::Show => {
                let cfg = config::load_config(config_flag)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => {
                println!("{}", config::config_path(config_flag)?.display());
            }
        },
    }

    Ok(())
}

/// Today as seen from the configured zone, unless overridden.
fn resolve_today(cfg: &Config, explicit: Option<NaiveDate>) -> Result<NaiveDate> {
    match explicit {
        Some(d) => Ok(d),
        None => Ok(today_in(cfg.timezone()?)),
    }
}

/// Strategy precedence: flag, then payload envelope, then config.
fn pick_strategy(flag: Option<&str>, payload: Option<Strategy>, cfg: &Config) -> Strategy {
    let Some(name) = flag else {
        return payload.unwrap_or(cfg.scoring.strategy);
    };
    let strategy = Strategy::parse_lenient(name);
    if !strategy.as_str().eq_ignore_ascii_case(name.trim()) {
        tracing::warn!(
            "unknown strategy '{name}' (expected one of: {}), using {strategy}",
            Strategy::names()
        );
    }
    strategy
}

fn run_analyze(cfg: &Config, args: BatchArgs) -> Result<()> {
    let today = resolve_today(cfg, args.today)?;
    let batch = input::load_batch(args.input.as_deref(), cfg.limits.max_batch_size)?;

    let mut options = cfg.analyze_options()?;
    options.strategy = pick_strategy(args.strategy.as_deref(), batch.strategy, cfg);
    if let Some(w) = batch.weights {
        options.weights = w;
    }

    let analysis = analyze(batch.tasks, &options, today)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render::analysis_text(&analysis));
    }
    Ok(())
}

fn run_suggest(cfg: &Config, args: BatchArgs, limit: Option<usize>) -> Result<()> {
    let today = resolve_today(cfg, args.today)?;
    let batch = input::load_batch(args.input.as_deref(), cfg.limits.max_batch_size)?;

    let mut options = cfg.analyze_options()?;
    options.strategy = pick_strategy(args.strategy.as_deref(), batch.strategy, cfg);
    if let Some(w) = batch.weights {
        options.weights = w;
    }
    if let Some(n) = limit {
        options.suggestion_limit = n;
    }

    let picks = suggest(batch.tasks, &options, today)?;
    if args.json {
        let body = serde_json::json!({ "suggestions": picks });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render::suggestions_text(&picks));
    }
    Ok(())
}

fn run_cycles(cfg: &Config, path: Option<&Path>, json: bool) -> Result<()> {
    let mut batch = input::load_batch(path, cfg.limits.max_batch_size)?;
    resolve_dependencies(&mut batch.tasks);
    let cycles = detect_cycles(&batch.tasks);
    if json {
        let body = serde_json::json!({ "cycles": cycles });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render::cycles_text(&cycles));
    }
    Ok(())
}
