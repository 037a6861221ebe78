// System Monitor
//
// CPU, memory, and foreground process names through psutil; battery through the
// power_supply sysfs class.

use crate::collab::SystemMonitor;
use crate::config::MonitorConfig;
use crate::errors::{PiloteError, Result};
use lemotif::{Snapshot, UNKNOWN_APP};
use psutil::cpu::CpuPercentCollector;
use psutil::process::Process;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

/// Default location of power supply information on Linux
pub const DEFAULT_POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Battery state as read from the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReading {
    /// Charge percentage, `None` without a battery
    pub percent: Option<u8>,

    /// Whether the machine is on AC power
    pub charging: bool,
}

impl BatteryReading {
    /// A machine without a battery is treated as always plugged in
    pub const DESKTOP: BatteryReading = BatteryReading {
        percent: None,
        charging: true,
    };
}

/// Read the first `BAT*` entry under `root`
///
/// Missing or unreadable entries yield [`BatteryReading::DESKTOP`].
pub fn read_battery(root: &Path) -> BatteryReading {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return BatteryReading::DESKTOP,
    };

    let mut batteries: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
        .map(|entry| entry.path())
        .collect();
    batteries.sort();

    let Some(battery) = batteries.first() else {
        return BatteryReading::DESKTOP;
    };

    let percent = fs::read_to_string(battery.join("capacity"))
        .ok()
        .and_then(|raw| raw.trim().parse::<u8>().ok())
        .map(|p| p.min(100));

    let charging = fs::read_to_string(battery.join("status"))
        .map(|raw| !raw.trim().eq_ignore_ascii_case("discharging"))
        .unwrap_or(true);

    BatteryReading { percent, charging }
}

/// Resolve the foreground application through `argv`
///
/// The command prints either a process id, resolved to its name through
/// psutil, or a process name (a path keeps only its last component).
/// Returns `None` when the command is empty, fails, or prints nothing usable.
pub fn read_foreground_app(argv: &[String]) -> Option<String> {
    let (program, args) = argv.split_first()?;

    let output = match Command::new(program).args(args).output() {
        Ok(output) => output,
        Err(e) => {
            trace!("Foreground command {} unavailable: {}", program, e);
            return None;
        }
    };
    if !output.status.success() {
        trace!("Foreground command {} exited with {}", program, output.status);
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;

    if let Ok(pid) = line.parse::<u32>() {
        return match Process::new(pid).and_then(|process| process.name()) {
            Ok(name) => Some(name),
            Err(e) => {
                debug!("Foreground process {} vanished: {}", pid, e);
                None
            }
        };
    }

    line.rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Monitor backed by the `psutil` crate
pub struct PsutilMonitor {
    cpu: CpuPercentCollector,
    power_supply_dir: PathBuf,
    foreground_command: Vec<String>,
}

impl PsutilMonitor {
    /// Create a monitor with the default sources
    pub fn new() -> Result<Self> {
        Self::from_config(&MonitorConfig::default())
    }

    /// Create a monitor from the `[monitor]` configuration section
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let cpu = CpuPercentCollector::new()
            .map_err(|e| PiloteError::monitor(format!("CPU collector unavailable: {}", e)))?;

        Ok(Self {
            cpu,
            power_supply_dir: config.power_supply_dir.clone(),
            foreground_command: config.foreground_command.clone(),
        })
    }

    /// Read battery data from `dir`
    pub fn with_power_supply_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.power_supply_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Resolve the foreground application with `argv`; empty disables lookup
    pub fn with_foreground_command(mut self, argv: Vec<String>) -> Self {
        self.foreground_command = argv;
        self
    }
}

impl SystemMonitor for PsutilMonitor {
    fn snapshot(&mut self) -> Result<Snapshot> {
        let cpu = self
            .cpu
            .cpu_percent()
            .map_err(|e| PiloteError::monitor(format!("Failed to read CPU usage: {}", e)))?;

        let memory = psutil::memory::virtual_memory()
            .map_err(|e| PiloteError::monitor(format!("Failed to read memory usage: {}", e)))?;

        let battery = read_battery(&self.power_supply_dir);
        let app = read_foreground_app(&self.foreground_command);

        debug!(
            "Observed cpu={:.1}% mem={:.1}% battery={:?} charging={} app={:?}",
            cpu,
            memory.percent(),
            battery.percent,
            battery.charging,
            app
        );

        Ok(Snapshot::new(
            f64::from(cpu),
            f64::from(memory.percent()),
            battery.percent,
            battery.charging,
            app.as_deref().unwrap_or(UNKNOWN_APP),
        ))
    }
}
