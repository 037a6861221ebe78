// Observation and Profile Types
//
// *Les Types* (The Types) - Snapshots, profiles, exemplars, and recommendations

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// App name used when the foreground process cannot be determined
pub const UNKNOWN_APP: &str = "unknown";

/// One of the fixed power profiles the engine can recommend
///
/// Ordering follows declaration order and is used to break ties
/// deterministically wherever profiles are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Maximum performance, highest power draw
    HighPerformance,
    /// Default balanced policy
    Balanced,
    /// Minimum power draw
    PowerSaver,
}

impl Profile {
    /// All profiles in declaration order
    pub const ALL: [Profile; 3] = [Profile::HighPerformance, Profile::Balanced, Profile::PowerSaver];

    /// Stable snake_case identifier, as used in configuration and on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::HighPerformance => "high_performance",
            Profile::Balanced => "balanced",
            Profile::PowerSaver => "power_saver",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Profile::HighPerformance => "High performance",
            Profile::Balanced => "Balanced",
            Profile::PowerSaver => "Power saver",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a profile name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown power profile: {0}")]
pub struct ParseProfileError(pub String);

impl FromStr for Profile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "high_performance" | "highperformance" | "high" | "performance" => {
                Ok(Profile::HighPerformance)
            }
            "balanced" | "balance" => Ok(Profile::Balanced),
            "power_saver" | "powersaver" | "saver" | "eco" => Ok(Profile::PowerSaver),
            _ => Err(ParseProfileError(s.to_string())),
        }
    }
}

/// Immutable observation of the machine at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Local hour of day (0..=23)
    pub hour: u8,

    /// Day of week, 0 = Monday (0..=6)
    pub day_of_week: u8,

    /// CPU utilization percentage (0.0..=100.0)
    pub cpu_percent: f64,

    /// Memory utilization percentage (0.0..=100.0)
    pub memory_percent: f64,

    /// Battery charge percentage, `None` on machines without a battery
    pub battery_percent: Option<u8>,

    /// Whether the machine is on AC power
    pub is_charging: bool,

    /// Lowercased foreground process name
    pub active_app: String,

    /// When the observation was taken
    pub taken_at: DateTime<Local>,
}

impl Snapshot {
    /// Build a snapshot taken now
    pub fn new(
        cpu_percent: f64,
        memory_percent: f64,
        battery_percent: Option<u8>,
        is_charging: bool,
        active_app: &str,
    ) -> Self {
        Self::at(
            Local::now(),
            cpu_percent,
            memory_percent,
            battery_percent,
            is_charging,
            active_app,
        )
    }

    /// Build a snapshot for an explicit instant
    ///
    /// Hour and day of week are derived from `taken_at`. Percentages are
    /// clamped into range and the app name is normalized.
    pub fn at(
        taken_at: DateTime<Local>,
        cpu_percent: f64,
        memory_percent: f64,
        battery_percent: Option<u8>,
        is_charging: bool,
        active_app: &str,
    ) -> Self {
        Self {
            hour: taken_at.hour() as u8,
            day_of_week: taken_at.weekday().num_days_from_monday() as u8,
            cpu_percent: clamp_percent(cpu_percent),
            memory_percent: clamp_percent(memory_percent),
            battery_percent: battery_percent.map(|b| b.min(100)),
            is_charging,
            active_app: normalize_app(active_app),
            taken_at,
        }
    }
}

/// Lowercase and trim a process name; empty names become [`UNKNOWN_APP`]
pub fn normalize_app(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        UNKNOWN_APP.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// A stored (context, chosen profile) pair from an explicit user choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    /// Local hour of day when the choice was made
    pub hour: u8,

    /// Day of week, 0 = Monday
    pub day_of_week: u8,

    /// CPU utilization at the time of the choice
    pub cpu_percent: f64,

    /// Memory utilization at the time of the choice
    pub memory_percent: f64,

    /// AC power state at the time of the choice
    pub is_charging: bool,

    /// Lowercased foreground process name
    pub active_app: String,

    /// Profile the user picked
    pub chosen_plan: Profile,

    /// When the exemplar was recorded
    pub recorded_at: DateTime<Utc>,
}

impl Exemplar {
    /// Capture the context of `snapshot` together with the chosen profile
    pub fn from_snapshot(snapshot: &Snapshot, chosen_plan: Profile) -> Self {
        Self {
            hour: snapshot.hour,
            day_of_week: snapshot.day_of_week,
            cpu_percent: snapshot.cpu_percent,
            memory_percent: snapshot.memory_percent,
            is_charging: snapshot.is_charging,
            active_app: snapshot.active_app.clone(),
            chosen_plan,
            recorded_at: snapshot.taken_at.with_timezone(&Utc),
        }
    }
}

/// Which rule of the cascade produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Low battery while discharging
    LowBattery,
    /// Heavy foreground application
    HeavyApp,
    /// Light foreground application
    LightApp,
    /// High CPU load
    HighCpu,
    /// Low CPU load
    LowCpu,
}

/// Where a recommendation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// A deterministic cascade rule
    Rule(RuleKind),
    /// Similarity voting over stored exemplars
    Patterns,
    /// Fixed fallback when nothing else applies
    Default,
}

/// Recommended profile with a confidence score and justification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Profile to switch to
    pub recommended_plan: Profile,

    /// Self-reported certainty (0.0..=1.0)
    pub confidence: f64,

    /// Human-readable justification
    pub reason: String,

    /// Path that produced the recommendation
    pub source: RecommendationSource,
}

impl Recommendation {
    /// Create a recommendation; confidence is clamped to 0.0..=1.0
    pub fn new(
        recommended_plan: Profile,
        confidence: f64,
        reason: impl Into<String>,
        source: RecommendationSource,
    ) -> Self {
        Self {
            recommended_plan,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            source,
        }
    }
}
