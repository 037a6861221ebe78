// Plan Switcher
//
// *L'Aiguillage* (The Switch) - Profile tokens and the external command that applies them

use crate::collab::{ActivePlan, PlanSwitcher};
use crate::config::{ConfigError, PlansConfig, TOKEN_PLACEHOLDER};
use crate::errors::{PiloteError, Result};
use lemotif::Profile;
use std::process::Command;
use tracing::{debug, info};

/// Explicit, bidirectional mapping between profiles and OS tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTokenMap {
    tokens: [(Profile, String); 3],
}

impl PlanTokenMap {
    /// Build the table; tokens must be non-empty and distinct
    pub fn new(
        high_performance: impl Into<String>,
        balanced: impl Into<String>,
        power_saver: impl Into<String>,
    ) -> std::result::Result<Self, ConfigError> {
        let tokens = [
            (Profile::HighPerformance, high_performance.into().trim().to_string()),
            (Profile::Balanced, balanced.into().trim().to_string()),
            (Profile::PowerSaver, power_saver.into().trim().to_string()),
        ];

        for (profile, token) in &tokens {
            if token.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "empty token for profile {}",
                    profile.as_str()
                )));
            }
        }
        for (i, (_, a)) in tokens.iter().enumerate() {
            for (_, b) in tokens.iter().skip(i + 1) {
                if a.eq_ignore_ascii_case(b) {
                    return Err(ConfigError::Invalid(format!("duplicate plan token {}", a)));
                }
            }
        }

        Ok(Self { tokens })
    }

    /// Token for `profile`
    pub fn token(&self, profile: Profile) -> &str {
        self.tokens
            .iter()
            .find(|(p, _)| *p == profile)
            .map(|(_, t)| t.as_str())
            .unwrap_or_default()
    }

    /// Profile for an exact token (case-insensitive)
    pub fn profile(&self, token: &str) -> Option<Profile> {
        let token = token.trim();
        self.tokens
            .iter()
            .find(|(_, t)| t.eq_ignore_ascii_case(token))
            .map(|(p, _)| *p)
    }

    /// Profile whose token appears earliest in command output
    pub fn find_in(&self, output: &str) -> Option<(Profile, &str)> {
        let haystack = output.to_lowercase();
        self.tokens
            .iter()
            .filter_map(|(p, t)| haystack.find(&t.to_lowercase()).map(|pos| (pos, *p, t.as_str())))
            .min_by_key(|(pos, _, _)| *pos)
            .map(|(_, p, t)| (p, t))
    }
}

/// Switcher running external commands (powercfg by default)
///
/// Remembers the last profile it applied or observed. Every request still
/// runs the set command.
#[derive(Debug, Clone)]
pub struct CommandSwitcher {
    tokens: PlanTokenMap,
    set_command: Vec<String>,
    query_command: Vec<String>,
    current: Option<Profile>,
}

impl CommandSwitcher {
    /// Build from the `[plans]` configuration section
    pub fn from_config(plans: &PlansConfig) -> Result<Self> {
        Ok(Self::new(
            plans.token_map()?,
            plans.set_command.clone(),
            plans.query_command.clone(),
        ))
    }

    /// Build from explicit parts
    pub fn new(tokens: PlanTokenMap, set_command: Vec<String>, query_command: Vec<String>) -> Self {
        Self {
            tokens,
            set_command,
            query_command,
            current: None,
        }
    }

    /// Token table
    pub fn tokens(&self) -> &PlanTokenMap {
        &self.tokens
    }

    /// Last profile known to be active
    pub fn cached_plan(&self) -> Option<Profile> {
        self.current
    }

    fn set_argv(&self, profile: Profile) -> Vec<String> {
        let token = self.tokens.token(profile);
        self.set_command
            .iter()
            .map(|arg| arg.replace(TOKEN_PLACEHOLDER, token))
            .collect()
    }
}

fn run(argv: &[String]) -> Result<String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| PiloteError::from(ConfigError::Invalid("empty command".into())))?;

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| PiloteError::switch(format!("failed to run {}: {}", program, e), None))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PiloteError::switch(
            format!("{} failed: {}", program, stderr.trim()),
            output.status.code(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl PlanSwitcher for CommandSwitcher {
    fn active_plan(&mut self) -> Result<Option<ActivePlan>> {
        let stdout = run(&self.query_command)?;
        let found = self.tokens.find_in(&stdout).map(|(profile, token)| ActivePlan {
            profile,
            token: token.to_string(),
        });

        self.current = found.as_ref().map(|plan| plan.profile);
        Ok(found)
    }

    fn set_active_plan(&mut self, profile: Profile) -> Result<()> {
        debug!("Applying plan {} (cached: {:?})", profile.as_str(), self.current);
        run(&self.set_argv(profile))?;
        self.current = Some(profile);
        info!("Power plan changed: {}", profile);
        Ok(())
    }
}
