//! lepilote - Control Loop and System Integration
//!
//! *Le Pilote* (The Pilot) - Observes the machine, asks the policy engine, and applies power profiles

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Command-line interface.
pub mod cli;
/// Monitor, switcher, and notifier interfaces.
pub mod collab;
/// TOML configuration.
pub mod config;
/// Periodic observe/recommend/apply loop.
pub mod control;
/// Error types.
pub mod errors;
/// Per-day usage minutes in SQLite.
pub mod ledger;
/// psutil and sysfs backed system monitor.
pub mod monitor;
/// Profile token table and command-based switcher.
pub mod switcher;

pub use collab::{ActivePlan, LogNotifier, Notifier, PlanSwitcher, SystemMonitor};
pub use config::{ConfigError, ControlConfig, PiloteConfig};
pub use control::{ControlLoop, LoopState, SkipReason, TickOutcome, UserChoiceReport};
pub use errors::{PiloteError, Result};
pub use ledger::{DailyUsage, UsageLedger};
pub use monitor::{read_battery, BatteryReading, PsutilMonitor};
pub use switcher::{CommandSwitcher, PlanTokenMap};
