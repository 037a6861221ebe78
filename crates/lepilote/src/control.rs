// Control Loop
//
// *La Boucle* (The Loop) - Observe, recommend, and apply power profiles with hysteresis

use crate::collab::{Notifier, PlanSwitcher, SystemMonitor};
use crate::config::ControlConfig;
use crate::errors::PiloteError;
use crate::ledger::UsageLedger;
use chrono::{Local, NaiveDate};
use lemoteur::PolicyEngine;
use lemotif::{AppendOutcome, Exemplar, Profile, Recommendation, Snapshot};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

/// Control loop states
///
/// Every tick walks `Idle → Observing → Recommending → (Applying | Skipping) → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next tick
    Idle,
    /// Pulling a snapshot from the monitor
    Observing,
    /// Asking the policy engine
    Recommending,
    /// Requesting an automatic plan switch
    Applying,
    /// Leaving the current plan in place this tick
    Skipping,
}

/// Why a tick left the plan alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Automatic mode is off
    AutoDisabled,
    /// The recommended plan is already active
    AlreadyActive,
    /// Confidence is below the threshold
    LowConfidence,
    /// The previous automatic switch was too recent
    CoolingDown,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No snapshot could be taken; the loop continues
    MonitorFailed {
        /// Monitor error message
        error: String,
    },
    /// The recommendation was not applied
    Skipped {
        /// What the engine recommended
        recommendation: Recommendation,
        /// Why it was not applied
        reason: SkipReason,
    },
    /// The recommended plan was applied
    Switched {
        /// What the engine recommended
        recommendation: Recommendation,
        /// Plan active before the switch, if known
        previous: Option<Profile>,
    },
    /// Applying the recommended plan failed; the loop continues
    SwitchFailed {
        /// What the engine recommended
        recommendation: Recommendation,
        /// Switch error message
        error: String,
    },
}

impl TickOutcome {
    /// Recommendation produced during the tick, if the monitor succeeded
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            TickOutcome::MonitorFailed { .. } => None,
            TickOutcome::Skipped { recommendation, .. }
            | TickOutcome::Switched { recommendation, .. }
            | TickOutcome::SwitchFailed { recommendation, .. } => Some(recommendation),
        }
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::MonitorFailed { error } => write!(f, "observation failed: {}", error),
            TickOutcome::Skipped {
                recommendation,
                reason,
            } => write!(
                f,
                "kept plan ({:?}), recommended {} at {:.2}",
                reason,
                recommendation.recommended_plan.as_str(),
                recommendation.confidence
            ),
            TickOutcome::Switched {
                recommendation,
                previous,
            } => write!(
                f,
                "switched {} -> {}",
                previous.map(|p| p.as_str()).unwrap_or("unknown"),
                recommendation.recommended_plan.as_str()
            ),
            TickOutcome::SwitchFailed {
                recommendation,
                error,
            } => write!(
                f,
                "switch to {} failed: {}",
                recommendation.recommended_plan.as_str(),
                error
            ),
        }
    }
}

/// Result of an explicit user profile change
#[derive(Debug)]
pub struct UserChoiceReport {
    /// Profile the user picked
    pub plan: Profile,

    /// Outcome of the plan switch
    pub switch: Result<(), PiloteError>,

    /// Store outcome, `None` when no snapshot was available to learn from
    pub recorded: Option<AppendOutcome>,
}

/// Periodic driver tying the monitor, the engine, and the switcher together
pub struct ControlLoop<M, S, N> {
    engine: PolicyEngine,
    monitor: M,
    switcher: S,
    notifier: N,
    ledger: Option<UsageLedger>,
    settings: ControlConfig,
    state: LoopState,
    transitions: Vec<LoopState>,
    last_auto_switch: Option<Instant>,
    last_snapshot: Option<Snapshot>,
    last_usage_credit: Option<Instant>,
    usage_carry: Duration,
}

impl<M, S, N> ControlLoop<M, S, N>
where
    M: SystemMonitor,
    S: PlanSwitcher,
    N: Notifier,
{
    /// Create a loop; usage is not recorded until a ledger is attached
    pub fn new(
        engine: PolicyEngine,
        monitor: M,
        switcher: S,
        notifier: N,
        settings: ControlConfig,
    ) -> Self {
        Self {
            engine,
            monitor,
            switcher,
            notifier,
            ledger: None,
            settings,
            state: LoopState::Idle,
            transitions: Vec::new(),
            last_auto_switch: None,
            last_snapshot: None,
            last_usage_credit: None,
            usage_carry: Duration::ZERO,
        }
    }

    /// Attach a usage ledger for per-day profile minutes
    pub fn with_ledger(mut self, ledger: UsageLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Policy engine
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// Plan switcher
    pub fn switcher(&self) -> &S {
        &self.switcher
    }

    /// Monitor
    pub fn monitor_mut(&mut self) -> &mut M {
        &mut self.monitor
    }

    /// Notifier
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Usage ledger, if attached
    pub fn ledger(&self) -> Option<&UsageLedger> {
        self.ledger.as_ref()
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// States visited during the most recent tick
    pub fn last_transitions(&self) -> &[LoopState] {
        &self.transitions
    }

    /// Most recent successful snapshot
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    /// Whether recommendations are applied automatically
    pub fn auto_switch(&self) -> bool {
        self.settings.auto_switch
    }

    /// Turn automatic mode on or off
    pub fn set_auto_switch(&mut self, enabled: bool) {
        info!("Automatic switching {}", if enabled { "enabled" } else { "disabled" });
        self.settings.auto_switch = enabled;
    }

    fn enter(&mut self, next: LoopState) {
        trace!("Control loop: {:?} -> {:?}", self.state, next);
        self.state = next;
        if next != LoopState::Idle {
            self.transitions.push(next);
        }
    }

    /// Run one observation cycle at time `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.transitions.clear();
        let outcome = self.run_tick(now);
        self.enter(LoopState::Idle);
        outcome
    }

    fn run_tick(&mut self, now: Instant) -> TickOutcome {
        self.enter(LoopState::Observing);
        let snapshot = match self.monitor.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping tick, monitor failed: {}", e);
                return TickOutcome::MonitorFailed {
                    error: e.to_string(),
                };
            }
        };

        self.enter(LoopState::Recommending);
        let recommendation = self.engine.recommend(&snapshot);
        self.last_snapshot = Some(snapshot);

        let active = match self.switcher.active_plan() {
            Ok(plan) => plan.map(|p| p.profile),
            Err(e) => {
                warn!("Could not determine the active plan: {}", e);
                None
            }
        };

        debug!(
            "Recommendation: {} ({:.2}) - {}; active: {:?}",
            recommendation.recommended_plan.as_str(),
            recommendation.confidence,
            recommendation.reason,
            active.map(|p| p.as_str())
        );

        if let Some(reason) = self.skip_reason(&recommendation, active, now) {
            self.enter(LoopState::Skipping);
            debug!("Not switching: {:?}", reason);
            return TickOutcome::Skipped {
                recommendation,
                reason,
            };
        }

        self.enter(LoopState::Applying);
        let plan = recommendation.recommended_plan;
        match self.switcher.set_active_plan(plan) {
            Ok(()) => {
                self.last_auto_switch = Some(now);
                info!(
                    "Automatic switch to {} ({:.2}): {}",
                    plan.as_str(),
                    recommendation.confidence,
                    recommendation.reason
                );
                self.notifier.notify(
                    "Automatic optimization",
                    &format!("Switched to {}\n{}", plan, recommendation.reason),
                );
                TickOutcome::Switched {
                    recommendation,
                    previous: active,
                }
            }
            Err(e) => {
                error!("Automatic switch to {} failed: {}", plan.as_str(), e);
                if !e.is_recoverable() {
                    error!("Plan switching is misconfigured, disabling automatic mode");
                    self.settings.auto_switch = false;
                }
                TickOutcome::SwitchFailed {
                    recommendation,
                    error: e.to_string(),
                }
            }
        }
    }

    fn skip_reason(
        &self,
        recommendation: &Recommendation,
        active: Option<Profile>,
        now: Instant,
    ) -> Option<SkipReason> {
        if !self.settings.auto_switch {
            return Some(SkipReason::AutoDisabled);
        }
        if active == Some(recommendation.recommended_plan) {
            return Some(SkipReason::AlreadyActive);
        }
        if recommendation.confidence < self.settings.confidence_threshold {
            return Some(SkipReason::LowConfidence);
        }
        if let Some(last) = self.last_auto_switch {
            if now.saturating_duration_since(last) < self.settings.min_switch_interval() {
                return Some(SkipReason::CoolingDown);
            }
        }
        None
    }

    /// Apply a profile the user picked and learn from it
    ///
    /// The engine is not consulted. The exemplar is recorded even when the
    /// switch command fails, since it captures the user's preference.
    pub fn record_user_choice(&mut self, plan: Profile) -> UserChoiceReport {
        info!("User selected plan: {}", plan.as_str());

        let switch = self.switcher.set_active_plan(plan);
        match &switch {
            Ok(()) => self
                .notifier
                .notify("Power plan changed", &format!("Switched to {}", plan)),
            Err(e) => error!("Switching to {} failed: {}", plan.as_str(), e),
        }

        let snapshot = match self.monitor.snapshot() {
            Ok(snapshot) => {
                self.last_snapshot = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(e) => {
                warn!("Monitor failed while recording choice, using last snapshot: {}", e);
                self.last_snapshot.clone()
            }
        };

        let recorded = match snapshot {
            Some(snapshot) => {
                let outcome = self
                    .engine
                    .store()
                    .append(Exemplar::from_snapshot(&snapshot, plan));
                Some(outcome)
            }
            None => {
                warn!("No snapshot available, choice not recorded");
                None
            }
        };

        UserChoiceReport {
            plan,
            switch,
            recorded,
        }
    }

    /// Credit elapsed whole minutes to the active plan on `date`
    ///
    /// The first call credits one usage interval. Sub-minute remainders carry
    /// over to the next call.
    pub fn accumulate_usage(&mut self, now: Instant, date: NaiveDate) -> Option<(Profile, u32)> {
        let elapsed = match self.last_usage_credit {
            Some(previous) => now.saturating_duration_since(previous) + self.usage_carry,
            None => self.settings.usage_interval(),
        };
        self.last_usage_credit = Some(now);

        let minutes = elapsed.as_secs() / 60;
        self.usage_carry = elapsed.saturating_sub(Duration::from_secs(minutes * 60));
        let minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
        if minutes == 0 {
            return None;
        }

        let ledger = self.ledger.as_ref()?;

        let profile = match self.switcher.active_plan() {
            Ok(Some(plan)) => plan.profile,
            Ok(None) => {
                debug!("Active plan is not a known profile, usage not recorded");
                return None;
            }
            Err(e) => {
                warn!("Could not determine the active plan for usage: {}", e);
                return None;
            }
        };

        match ledger.add_minutes(date, profile, minutes) {
            Ok(()) => Some((profile, minutes)),
            Err(e) => {
                error!("Failed to record usage: {}", e);
                None
            }
        }
    }

    /// Drive ticks and usage accumulation until `shutdown` completes
    ///
    /// The first observation happens immediately; usage is first credited
    /// after one full usage interval.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticks = tokio::time::interval(self.settings.tick_interval());
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut usage = tokio::time::interval(self.settings.usage_interval());
        usage.set_missed_tick_behavior(MissedTickBehavior::Delay);
        usage.tick().await;

        info!(
            "Control loop started (tick {}s, usage {}s, cooldown {}s, auto {})",
            self.settings.tick_interval_secs,
            self.settings.usage_interval_secs,
            self.settings.min_switch_interval_secs,
            self.settings.auto_switch
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticks.tick() => {
                    let outcome = self.tick(Instant::now());
                    debug!("Tick: {}", outcome);
                }
                _ = usage.tick() => {
                    self.accumulate_usage(Instant::now(), Local::now().date_naive());
                }
            }
        }

        info!("Control loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::ActivePlan;
    use crate::config::ConfigError;
    use chrono::TimeZone;
    use lemotif::{MemoryBackend, PatternStore, RecommendationSource, RuleKind};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn snapshot(cpu: f64, battery: Option<u8>, charging: bool) -> Snapshot {
        let at = Local.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).single().unwrap();
        Snapshot::at(at, cpu, 40.0, battery, charging, "unknown")
    }

    fn busy() -> Snapshot {
        snapshot(85.0, None, true)
    }

    fn lukewarm() -> Snapshot {
        snapshot(50.0, None, true)
    }

    fn draining() -> Snapshot {
        snapshot(50.0, Some(10), false)
    }

    /// Replays queued snapshots (`None` fails), then repeats the fallback
    struct ScriptedMonitor {
        queue: VecDeque<Option<Snapshot>>,
        fallback: Option<Snapshot>,
    }

    impl ScriptedMonitor {
        fn steady(snapshot: Snapshot) -> Self {
            Self {
                queue: VecDeque::new(),
                fallback: Some(snapshot),
            }
        }

        fn broken() -> Self {
            Self {
                queue: VecDeque::new(),
                fallback: None,
            }
        }
    }

    impl SystemMonitor for ScriptedMonitor {
        fn snapshot(&mut self) -> crate::errors::Result<Snapshot> {
            let next = self.queue.pop_front().unwrap_or_else(|| self.fallback.clone());
            next.ok_or_else(|| PiloteError::monitor("sensor unavailable"))
        }
    }

    #[derive(Default)]
    struct FakeSwitcher {
        active: Option<Profile>,
        failing: bool,
        misconfigured: bool,
        applied: Vec<Profile>,
    }

    impl FakeSwitcher {
        fn on(profile: Profile) -> Self {
            Self {
                active: Some(profile),
                ..Self::default()
            }
        }
    }

    impl PlanSwitcher for FakeSwitcher {
        fn active_plan(&mut self) -> crate::errors::Result<Option<ActivePlan>> {
            Ok(self.active.map(|profile| ActivePlan {
                profile,
                token: profile.as_str().to_string(),
            }))
        }

        fn set_active_plan(&mut self, profile: Profile) -> crate::errors::Result<()> {
            if self.misconfigured {
                return Err(ConfigError::Invalid("empty command".into()).into());
            }
            if self.failing {
                return Err(PiloteError::switch("access denied", Some(1)));
            }
            self.active = Some(profile);
            self.applied.push(profile);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    type TestLoop = ControlLoop<ScriptedMonitor, FakeSwitcher, RecordingNotifier>;

    fn control(monitor: ScriptedMonitor, switcher: FakeSwitcher) -> TestLoop {
        let store = Arc::new(PatternStore::open(MemoryBackend::new()));
        ControlLoop::new(
            PolicyEngine::new(store),
            monitor,
            switcher,
            RecordingNotifier::default(),
            ControlConfig::default(),
        )
    }

    #[test]
    fn test_confident_recommendation_is_applied() {
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));

        let outcome = control.tick(Instant::now());
        match &outcome {
            TickOutcome::Switched {
                recommendation,
                previous,
            } => {
                assert_eq!(recommendation.recommended_plan, Profile::HighPerformance);
                assert_eq!(recommendation.source, RecommendationSource::Rule(RuleKind::HighCpu));
                assert_eq!(*previous, Some(Profile::Balanced));
            }
            other => panic!("expected a switch, got {:?}", other),
        }
        assert_eq!(control.switcher().applied, vec![Profile::HighPerformance]);
        assert_eq!(control.notifier().count(), 1);
        assert_eq!(
            control.last_transitions(),
            &[LoopState::Observing, LoopState::Recommending, LoopState::Applying]
        );
        assert_eq!(control.state(), LoopState::Idle);
    }

    #[test]
    fn test_already_active_plan_is_left_alone() {
        let mut control = control(
            ScriptedMonitor::steady(busy()),
            FakeSwitcher::on(Profile::HighPerformance),
        );

        let outcome = control.tick(Instant::now());
        assert!(matches!(
            outcome,
            TickOutcome::Skipped {
                reason: SkipReason::AlreadyActive,
                ..
            }
        ));
        assert!(control.switcher().applied.is_empty());
        assert_eq!(
            control.last_transitions(),
            &[LoopState::Observing, LoopState::Recommending, LoopState::Skipping]
        );
    }

    #[test]
    fn test_low_confidence_is_not_applied() {
        let mut control = control(
            ScriptedMonitor::steady(lukewarm()),
            FakeSwitcher::on(Profile::PowerSaver),
        );

        let outcome = control.tick(Instant::now());
        let recommendation = outcome.recommendation().expect("recommendation").clone();
        assert_eq!(recommendation.source, RecommendationSource::Default);
        assert!(matches!(
            outcome,
            TickOutcome::Skipped {
                reason: SkipReason::LowConfidence,
                ..
            }
        ));
        assert_eq!(control.notifier().count(), 0);
    }

    #[test]
    fn test_cooldown_between_automatic_switches() {
        let mut monitor = ScriptedMonitor::steady(draining());
        monitor.queue.push_back(Some(busy()));
        let mut control = control(monitor, FakeSwitcher::on(Profile::Balanced));

        let start = Instant::now();
        assert!(matches!(control.tick(start), TickOutcome::Switched { .. }));

        let outcome = control.tick(start + Duration::from_secs(30));
        assert!(matches!(
            outcome,
            TickOutcome::Skipped {
                reason: SkipReason::CoolingDown,
                ..
            }
        ));

        let outcome = control.tick(start + Duration::from_secs(60));
        assert!(matches!(outcome, TickOutcome::Switched { .. }));
        assert_eq!(
            control.switcher().applied,
            vec![Profile::HighPerformance, Profile::PowerSaver]
        );
    }

    #[test]
    fn test_auto_disabled_only_recommends() {
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));
        control.set_auto_switch(false);
        assert!(!control.auto_switch());

        let outcome = control.tick(Instant::now());
        assert!(matches!(
            outcome,
            TickOutcome::Skipped {
                reason: SkipReason::AutoDisabled,
                ..
            }
        ));
        assert_eq!(
            outcome.recommendation().map(|r| r.recommended_plan),
            Some(Profile::HighPerformance)
        );
        assert!(control.switcher().applied.is_empty());
    }

    #[test]
    fn test_monitor_failure_skips_one_tick() {
        let mut monitor = ScriptedMonitor::steady(busy());
        monitor.queue.push_back(None);
        let mut control = control(monitor, FakeSwitcher::on(Profile::Balanced));

        let outcome = control.tick(Instant::now());
        assert!(matches!(outcome, TickOutcome::MonitorFailed { .. }));
        assert!(outcome.recommendation().is_none());
        assert_eq!(control.last_transitions(), &[LoopState::Observing]);
        assert_eq!(control.state(), LoopState::Idle);

        assert!(matches!(control.tick(Instant::now()), TickOutcome::Switched { .. }));
    }

    #[test]
    fn test_failed_switch_does_not_arm_cooldown() {
        let mut switcher = FakeSwitcher::on(Profile::Balanced);
        switcher.failing = true;
        let mut control = control(ScriptedMonitor::steady(busy()), switcher);

        let start = Instant::now();
        assert!(matches!(control.tick(start), TickOutcome::SwitchFailed { .. }));

        control.switcher.failing = false;
        let outcome = control.tick(start + Duration::from_secs(1));
        assert!(matches!(outcome, TickOutcome::Switched { .. }));
    }

    #[test]
    fn test_misconfigured_switcher_disables_automatic_mode() {
        let mut switcher = FakeSwitcher::on(Profile::Balanced);
        switcher.misconfigured = true;
        let mut control = control(ScriptedMonitor::steady(busy()), switcher);

        let start = Instant::now();
        match control.tick(start) {
            TickOutcome::SwitchFailed { error, .. } => assert!(error.contains("empty command")),
            other => panic!("expected a failed switch, got {:?}", other),
        }
        assert!(!control.auto_switch());

        let outcome = control.tick(start + Duration::from_secs(120));
        assert!(matches!(
            outcome,
            TickOutcome::Skipped {
                reason: SkipReason::AutoDisabled,
                ..
            }
        ));
    }

    #[test]
    fn test_automatic_switch_is_not_learned() {
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));
        control.tick(Instant::now());
        assert!(control.engine().store().is_empty());
    }

    #[test]
    fn test_user_choice_is_applied_and_learned() {
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));

        let report = control.record_user_choice(Profile::PowerSaver);
        assert!(report.switch.is_ok());
        assert!(report.recorded.expect("recorded").persisted);
        assert_eq!(control.switcher().applied, vec![Profile::PowerSaver]);

        let stored = control.engine().store().all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].chosen_plan, Profile::PowerSaver);
        assert_eq!(stored[0].cpu_percent, 85.0);
        assert_eq!(stored[0].hour, 10);
    }

    #[test]
    fn test_user_choice_learned_even_if_switch_fails() {
        let mut switcher = FakeSwitcher::on(Profile::Balanced);
        switcher.failing = true;
        let mut control = control(ScriptedMonitor::steady(busy()), switcher);

        let report = control.record_user_choice(Profile::HighPerformance);
        assert!(report.switch.is_err());
        assert!(report.recorded.is_some());
        assert_eq!(control.engine().store().len(), 1);
        assert_eq!(control.notifier().count(), 0);
    }

    #[test]
    fn test_user_choice_falls_back_to_last_snapshot() {
        let mut monitor = ScriptedMonitor::broken();
        monitor.queue.push_back(Some(draining()));
        let mut control = control(monitor, FakeSwitcher::on(Profile::PowerSaver));

        control.tick(Instant::now());
        let report = control.record_user_choice(Profile::Balanced);

        assert!(report.recorded.is_some());
        let stored = control.engine().store().all();
        assert_eq!(stored[0].chosen_plan, Profile::Balanced);
        assert!(!stored[0].is_charging);
    }

    #[test]
    fn test_user_choice_without_any_snapshot_is_not_learned() {
        let mut control = control(ScriptedMonitor::broken(), FakeSwitcher::on(Profile::Balanced));

        let report = control.record_user_choice(Profile::PowerSaver);
        assert!(report.switch.is_ok());
        assert!(report.recorded.is_none());
        assert!(control.engine().store().is_empty());
    }

    #[test]
    fn test_user_choice_does_not_arm_cooldown() {
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));

        control.record_user_choice(Profile::PowerSaver);
        let outcome = control.tick(Instant::now());
        assert!(matches!(outcome, TickOutcome::Switched { .. }));
        assert_eq!(control.switcher().active, Some(Profile::HighPerformance));
    }

    #[test]
    fn test_usage_minutes_are_credited_with_carry() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced))
            .with_ledger(UsageLedger::open_in_memory().unwrap());

        let start = Instant::now();
        assert_eq!(control.accumulate_usage(start, date), Some((Profile::Balanced, 1)));
        assert_eq!(
            control.accumulate_usage(start + Duration::from_secs(90), date),
            Some((Profile::Balanced, 1))
        );
        assert_eq!(
            control.accumulate_usage(start + Duration::from_secs(120), date),
            Some((Profile::Balanced, 1))
        );
        assert_eq!(control.accumulate_usage(start + Duration::from_secs(130), date), None);

        let usage = control.ledger().unwrap().day(date).unwrap();
        assert_eq!(usage.total_minutes, 3);
        assert_eq!(usage.balanced_minutes, 3);
    }

    #[test]
    fn test_usage_needs_ledger_and_known_plan() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let mut without_ledger =
            control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));
        assert_eq!(without_ledger.accumulate_usage(Instant::now(), date), None);

        let mut unknown_plan = control(ScriptedMonitor::steady(busy()), FakeSwitcher::default())
            .with_ledger(UsageLedger::open_in_memory().unwrap());
        assert_eq!(unknown_plan.accumulate_usage(Instant::now(), date), None);
        assert_eq!(unknown_plan.ledger().unwrap().day(date).unwrap().total_minutes, 0);
    }

    #[tokio::test]
    async fn test_run_ticks_immediately_and_stops_on_shutdown() {
        let mut control = control(ScriptedMonitor::steady(busy()), FakeSwitcher::on(Profile::Balanced));

        control
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(control.switcher().applied, vec![Profile::HighPerformance]);
        assert_eq!(control.state(), LoopState::Idle);
    }
}
