// Usage Ledger
//
// *Le Registre* (The Ledger) - Daily minutes spent in each power profile

use crate::errors::{PiloteError, Result};
use chrono::NaiveDate;
use lemotif::Profile;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minutes accumulated on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Calendar day
    pub date: NaiveDate,

    /// Minutes observed in any profile
    pub total_minutes: u32,

    /// Minutes in high performance
    pub high_performance_minutes: u32,

    /// Minutes in balanced
    pub balanced_minutes: u32,

    /// Minutes in power saver
    pub power_saver_minutes: u32,
}

impl DailyUsage {
    /// A day with nothing recorded
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_minutes: 0,
            high_performance_minutes: 0,
            balanced_minutes: 0,
            power_saver_minutes: 0,
        }
    }

    /// Minutes spent in `profile`
    pub fn minutes(&self, profile: Profile) -> u32 {
        match profile {
            Profile::HighPerformance => self.high_performance_minutes,
            Profile::Balanced => self.balanced_minutes,
            Profile::PowerSaver => self.power_saver_minutes,
        }
    }
}

/// One statement per profile; column names never come from runtime data.
fn add_minutes_sql(profile: Profile) -> &'static str {
    match profile {
        Profile::HighPerformance => {
            "INSERT INTO daily_usage (date, total_minutes, high_performance_minutes)
             VALUES (?1, ?2, ?2)
             ON CONFLICT(date) DO UPDATE SET
                 total_minutes = total_minutes + excluded.total_minutes,
                 high_performance_minutes = high_performance_minutes + excluded.high_performance_minutes"
        }
        Profile::Balanced => {
            "INSERT INTO daily_usage (date, total_minutes, balanced_minutes)
             VALUES (?1, ?2, ?2)
             ON CONFLICT(date) DO UPDATE SET
                 total_minutes = total_minutes + excluded.total_minutes,
                 balanced_minutes = balanced_minutes + excluded.balanced_minutes"
        }
        Profile::PowerSaver => {
            "INSERT INTO daily_usage (date, total_minutes, power_saver_minutes)
             VALUES (?1, ?2, ?2)
             ON CONFLICT(date) DO UPDATE SET
                 total_minutes = total_minutes + excluded.total_minutes,
                 power_saver_minutes = power_saver_minutes + excluded.power_saver_minutes"
        }
    }
}

/// SQLite-backed per-day usage counters
pub struct UsageLedger {
    conn: Connection,
}

impl UsageLedger {
    /// Open (or create) the ledger at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    PiloteError::io("Failed to create ledger directory", Some(parent.into()), e)
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// Ledger that lives only for this process
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let ledger = Self { conn };
        ledger.initialize_schema()?;
        Ok(ledger)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS daily_usage (
                date TEXT PRIMARY KEY,
                total_minutes INTEGER NOT NULL DEFAULT 0,
                high_performance_minutes INTEGER NOT NULL DEFAULT 0,
                balanced_minutes INTEGER NOT NULL DEFAULT 0,
                power_saver_minutes INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        Ok(())
    }

    /// Credit `minutes` to `profile` on `date`
    pub fn add_minutes(&self, date: NaiveDate, profile: Profile, minutes: u32) -> Result<()> {
        if minutes == 0 {
            return Ok(());
        }
        let day = date.format(DATE_FORMAT).to_string();
        self.conn
            .execute(add_minutes_sql(profile), params![day, minutes])?;
        Ok(())
    }

    /// Counters for `date`, zeros when nothing was recorded
    pub fn day(&self, date: NaiveDate) -> Result<DailyUsage> {
        let day = date.format(DATE_FORMAT).to_string();
        let row = self
            .conn
            .query_row(
                "SELECT total_minutes, high_performance_minutes, balanced_minutes, power_saver_minutes
                 FROM daily_usage WHERE date = ?1",
                params![day],
                |row| {
                    Ok(DailyUsage {
                        date,
                        total_minutes: row.get(0)?,
                        high_performance_minutes: row.get(1)?,
                        balanced_minutes: row.get(2)?,
                        power_saver_minutes: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(row.unwrap_or_else(|| DailyUsage::empty(date)))
    }
}

impl std::fmt::Debug for UsageLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageLedger")
            .field("path", &self.conn.path())
            .finish()
    }
}
