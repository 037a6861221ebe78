// Collaborator Interfaces
//
// *Les Collaborateurs* (The Collaborators) - What the control loop needs from the OS layer

use crate::errors::Result;
use lemotif::{Profile, Snapshot};
use tracing::info;

/// Source of system observations
pub trait SystemMonitor: Send {
    /// Observe the machine now
    fn snapshot(&mut self) -> Result<Snapshot>;
}

/// The profile currently active at the OS level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePlan {
    /// Symbolic profile
    pub profile: Profile,

    /// Opaque OS token for the profile
    pub token: String,
}

/// Applies and reports the active power profile
pub trait PlanSwitcher: Send {
    /// Currently active profile, `None` when the OS reports a plan outside
    /// the known profiles
    fn active_plan(&mut self) -> Result<Option<ActivePlan>>;

    /// Activate `profile`
    fn set_active_plan(&mut self, profile: Profile) -> Result<()>;
}

/// Delivers user-facing notifications
pub trait Notifier: Send {
    /// Show a notification
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, "{}", body);
    }
}
