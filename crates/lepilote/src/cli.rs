// CLI Interface
//
// This module provides the command-line interface for LePilote.

use crate::collab::{LogNotifier, PlanSwitcher, SystemMonitor};
use crate::config::PiloteConfig;
use crate::control::ControlLoop;
use crate::ledger::UsageLedger;
use crate::monitor::PsutilMonitor;
use crate::switcher::CommandSwitcher;
use anyhow::{bail, Context, Result as AnyhowResult};
use chrono::Local;
use clap::{Parser, Subcommand};
use lemoteur::PolicyEngine;
use lemotif::{FileBackend, PatternStore, Profile};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Time the CPU collector needs between creation and its first reading
const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(500);

/// LePilote - Adaptive Power Profile Daemon
#[derive(Parser, Debug)]
#[command(name = "lepilote")]
#[command(author = "LePilote Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pick power profiles from system state and learned preferences", long_about = None)]
#[command(subcommand_required = false)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(global = true, long = "config", short = 'c')]
    pub config_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the control loop until interrupted
    Run {
        /// Only log recommendations, never switch automatically
        #[arg(long = "manual")]
        manual: bool,
    },

    /// Observe the system once and print the recommendation
    Recommend {
        /// Print the snapshot and recommendation as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Switch to a profile and remember the choice
    Choose {
        /// Profile to activate (high_performance, balanced, power_saver)
        #[arg(value_name = "PROFILE")]
        profile: Profile,
    },

    /// Show learned pattern and usage statistics
    Stats {
        /// Print the statistics as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long = "write-default")]
        write_default: bool,
    },
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> AnyhowResult<()> {
        init_logging(self.verbose);

        let config_path = self.config_path;
        let command = self.command.unwrap_or(Commands::Run { manual: false });

        if let Commands::Config { write_default } = command {
            return cmd_config(config_path, write_default);
        }

        let config = PiloteConfig::load(config_path.as_deref())?;
        match command {
            Commands::Run { manual } => cmd_run(config, manual).await,
            Commands::Recommend { json } => cmd_recommend(config, json).await,
            Commands::Choose { profile } => cmd_choose(config, profile).await,
            Commands::Stats { json } => cmd_stats(config, json),
            Commands::Config { .. } => Ok(()),
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn open_engine(config: &PiloteConfig) -> PolicyEngine {
    let backend = FileBackend::new(config.patterns_path());
    let store = PatternStore::with_capacity(backend, config.storage.max_exemplars);
    PolicyEngine::with_catalog(Arc::new(store), config.catalog())
}

fn build_loop(
    config: &PiloteConfig,
) -> AnyhowResult<ControlLoop<PsutilMonitor, CommandSwitcher, LogNotifier>> {
    let monitor =
        PsutilMonitor::from_config(&config.monitor).context("Failed to start system monitor")?;
    let switcher =
        CommandSwitcher::from_config(&config.plans).context("Invalid plan configuration")?;

    Ok(ControlLoop::new(
        open_engine(config),
        monitor,
        switcher,
        LogNotifier,
        config.control.clone(),
    ))
}

/// Run command implementation
async fn cmd_run(config: PiloteConfig, manual: bool) -> AnyhowResult<()> {
    let mut control = build_loop(&config)?;
    if manual {
        control.set_auto_switch(false);
    }

    let ledger_path = config.ledger_path();
    match UsageLedger::open(&ledger_path) {
        Ok(ledger) => control = control.with_ledger(ledger),
        Err(e) => warn!("Usage ledger unavailable at {:?}: {}", ledger_path, e),
    }

    info!(
        "Loaded {} exemplars from {:?}",
        control.engine().store().len(),
        config.patterns_path()
    );

    control
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

/// Recommend command implementation
async fn cmd_recommend(config: PiloteConfig, json: bool) -> AnyhowResult<()> {
    let engine = open_engine(&config);
    let mut monitor =
        PsutilMonitor::from_config(&config.monitor).context("Failed to start system monitor")?;
    let mut switcher =
        CommandSwitcher::from_config(&config.plans).context("Invalid plan configuration")?;

    tokio::time::sleep(CPU_SAMPLE_WINDOW).await;
    let snapshot = monitor.snapshot().context("Failed to observe the system")?;
    let recommendation = engine.recommend(&snapshot);

    if json {
        let report = serde_json::json!({
            "snapshot": snapshot,
            "recommendation": recommendation,
            "would_switch": recommendation.confidence >= config.control.confidence_threshold,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nSystem state:");
    println!("  CPU: {:.1}%", snapshot.cpu_percent);
    println!("  Memory: {:.1}%", snapshot.memory_percent);
    match snapshot.battery_percent {
        Some(battery) => println!(
            "  Battery: {}% ({})",
            battery,
            if snapshot.is_charging { "charging" } else { "discharging" }
        ),
        None => println!("  Battery: none"),
    }

    match switcher.active_plan() {
        Ok(Some(active)) => println!("  Active plan: {}", active.profile),
        Ok(None) => println!("  Active plan: not a known profile"),
        Err(e) => println!("  Active plan: unknown ({})", e),
    }

    println!("\nRecommendation: {}", recommendation.recommended_plan);
    println!("  Confidence: {:.0}%", recommendation.confidence * 100.0);
    println!("  Reason: {}", recommendation.reason);
    println!(
        "  Would switch automatically: {}",
        recommendation.confidence >= config.control.confidence_threshold
    );

    Ok(())
}

/// Choose command implementation
async fn cmd_choose(config: PiloteConfig, profile: Profile) -> AnyhowResult<()> {
    let mut control = build_loop(&config)?;
    tokio::time::sleep(CPU_SAMPLE_WINDOW).await;

    let report = control.record_user_choice(profile);

    match report.recorded {
        Some(outcome) if outcome.persisted => println!("Choice recorded for future recommendations"),
        Some(_) => println!("Choice recorded in memory only, saving patterns failed"),
        None => println!("Choice not recorded, the system could not be observed"),
    }

    report
        .switch
        .with_context(|| format!("Failed to switch to {}", profile))?;
    println!("Switched to {}", profile);

    Ok(())
}

/// Stats command implementation
fn cmd_stats(config: PiloteConfig, json: bool) -> AnyhowResult<()> {
    let engine = open_engine(&config);
    let stats = engine.store().stats();

    let ledger = UsageLedger::open(config.ledger_path()).context("Failed to open usage ledger")?;
    let today = ledger
        .day(Local::now().date_naive())
        .context("Failed to read today's usage")?;

    if json {
        let report = serde_json::json!({
            "patterns": stats,
            "capacity": engine.store().capacity(),
            "today": today,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nLearned patterns: {} / {}", stats.total, engine.store().capacity());
    for profile in Profile::ALL {
        let count = stats.distribution.get(&profile).copied().unwrap_or(0);
        println!("  {}: {}", profile, count);
    }

    println!("\nToday ({}):", today.date);
    println!("  Total: {} min", today.total_minutes);
    for profile in Profile::ALL {
        println!("  {}: {} min", profile, today.minutes(profile));
    }

    Ok(())
}

/// Config command implementation
fn cmd_config(config_path: Option<PathBuf>, write_default: bool) -> AnyhowResult<()> {
    let path = config_path.unwrap_or_else(PiloteConfig::default_path);

    if write_default {
        if path.exists() {
            bail!("Config file already exists: {:?}", path);
        }
        PiloteConfig::default().save(&path)?;
        println!("Wrote default configuration to {:?}", path);
        return Ok(());
    }

    let config = PiloteConfig::load(Some(&path))?;
    let rendered = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    println!("# {}", path.display());
    println!("{}", rendered);

    Ok(())
}
