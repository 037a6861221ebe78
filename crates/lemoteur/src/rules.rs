// Rule Cascade
//
// *La Cascade* (The Cascade) - Ordered, short-circuiting power rules

use crate::catalog::AppCatalog;
use lemotif::{Profile, Recommendation, RecommendationSource, RuleKind, Snapshot};

/// Highest battery percentage that still counts as low
pub const LOW_BATTERY_MAX: u8 = 19;

/// CPU load above which the machine counts as busy
pub const HIGH_CPU_THRESHOLD: f64 = 70.0;

/// CPU load below which the machine counts as idle
pub const LOW_CPU_THRESHOLD: f64 = 20.0;

/// Evaluation order; the first rule that fires wins
pub const RULE_ORDER: [RuleKind; 5] = [
    RuleKind::LowBattery,
    RuleKind::HeavyApp,
    RuleKind::LightApp,
    RuleKind::HighCpu,
    RuleKind::LowCpu,
];

/// Deterministic rules evaluated strictly in [`RULE_ORDER`]
#[derive(Debug, Clone, Default)]
pub struct RuleCascade {
    catalog: AppCatalog,
}

impl RuleCascade {
    /// Cascade using the given application catalog
    pub fn new(catalog: AppCatalog) -> Self {
        Self { catalog }
    }

    /// Application catalog used by the app rules
    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// Return the first matching rule's recommendation, or `None` to defer
    pub fn evaluate(&self, snapshot: &Snapshot) -> Option<Recommendation> {
        RULE_ORDER
            .iter()
            .find_map(|rule| self.apply(*rule, snapshot))
    }

    /// Evaluate a single rule in isolation
    pub fn apply(&self, rule: RuleKind, snapshot: &Snapshot) -> Option<Recommendation> {
        let charging = snapshot.is_charging;
        let app = snapshot.active_app.as_str();

        let (plan, confidence, reason) = match rule {
            RuleKind::LowBattery => {
                let battery = snapshot.battery_percent?;
                if battery > LOW_BATTERY_MAX || charging {
                    return None;
                }
                (
                    Profile::PowerSaver,
                    0.95,
                    format!("Battery at {}% and discharging, saving power", battery),
                )
            }
            RuleKind::HeavyApp => {
                if !self.catalog.is_heavy(app) {
                    return None;
                }
                if charging {
                    (
                        Profile::HighPerformance,
                        0.90,
                        format!("{} is a heavy application and AC power is connected", app),
                    )
                } else {
                    (
                        Profile::Balanced,
                        0.85,
                        format!("{} is a heavy application, sparing the battery", app),
                    )
                }
            }
            RuleKind::LightApp => {
                if !self.catalog.is_light(app) {
                    return None;
                }
                if charging {
                    (
                        Profile::Balanced,
                        0.85,
                        format!("{} is a light application", app),
                    )
                } else {
                    (
                        Profile::PowerSaver,
                        0.80,
                        format!("{} is a light application on battery", app),
                    )
                }
            }
            RuleKind::HighCpu => {
                if snapshot.cpu_percent <= HIGH_CPU_THRESHOLD {
                    return None;
                }
                let plan = if charging {
                    Profile::HighPerformance
                } else {
                    Profile::Balanced
                };
                (
                    plan,
                    0.85,
                    format!("CPU load is high at {:.0}%", snapshot.cpu_percent),
                )
            }
            RuleKind::LowCpu => {
                if snapshot.cpu_percent >= LOW_CPU_THRESHOLD {
                    return None;
                }
                let plan = if charging {
                    Profile::Balanced
                } else {
                    Profile::PowerSaver
                };
                (
                    plan,
                    0.75,
                    format!("CPU load is low at {:.0}%", snapshot.cpu_percent),
                )
            }
        };

        Some(Recommendation::new(
            plan,
            confidence,
            reason,
            RecommendationSource::Rule(rule),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use rstest::rstest;

    fn snap(cpu: f64, battery: Option<u8>, charging: bool, app: &str) -> Snapshot {
        let at = Local.with_ymd_and_hms(2024, 1, 3, 14, 0, 0).unwrap();
        Snapshot::at(at, cpu, 50.0, battery, charging, app)
    }

    fn fired(snapshot: &Snapshot) -> Option<(Profile, f64, RecommendationSource)> {
        RuleCascade::default()
            .evaluate(snapshot)
            .map(|r| (r.recommended_plan, r.confidence, r.source))
    }

    #[rstest]
    #[case(Some(19), false, Some(Profile::PowerSaver))]
    #[case(Some(0), false, Some(Profile::PowerSaver))]
    #[case(Some(20), false, None)]
    #[case(Some(10), true, None)]
    #[case(None, false, None)]
    fn test_low_battery_boundary(
        #[case] battery: Option<u8>,
        #[case] charging: bool,
        #[case] expected: Option<Profile>,
    ) {
        let cascade = RuleCascade::default();
        let rec = cascade.apply(RuleKind::LowBattery, &snap(45.0, battery, charging, "x.exe"));
        assert_eq!(rec.as_ref().map(|r| r.recommended_plan), expected);
        if let Some(rec) = rec {
            assert_eq!(rec.confidence, 0.95);
            assert!(rec.reason.contains(&format!("{}%", battery.unwrap_or_default())));
        }
    }

    #[rstest]
    #[case(true, Profile::HighPerformance, 0.90)]
    #[case(false, Profile::Balanced, 0.85)]
    fn test_heavy_app(#[case] charging: bool, #[case] plan: Profile, #[case] confidence: f64) {
        let rec = RuleCascade::default()
            .evaluate(&snap(45.0, Some(80), charging, "Blender.exe"))
            .expect("heavy rule should fire");
        assert_eq!(rec.recommended_plan, plan);
        assert_eq!(rec.confidence, confidence);
        assert!(rec.reason.contains("blender.exe"));
    }

    #[rstest]
    #[case(true, Profile::Balanced, 0.85)]
    #[case(false, Profile::PowerSaver, 0.80)]
    fn test_light_app(#[case] charging: bool, #[case] plan: Profile, #[case] confidence: f64) {
        let rec = RuleCascade::default()
            .evaluate(&snap(90.0, Some(80), charging, "vlc.exe"))
            .expect("light rule should fire");
        assert_eq!(rec.recommended_plan, plan);
        assert_eq!(rec.confidence, confidence);
        assert_eq!(rec.source, RecommendationSource::Rule(RuleKind::LightApp));
    }

    #[rstest]
    #[case(70.1, true, Some((Profile::HighPerformance, 0.85)))]
    #[case(95.0, false, Some((Profile::Balanced, 0.85)))]
    #[case(70.0, true, None)]
    #[case(20.0, true, None)]
    #[case(19.9, true, Some((Profile::Balanced, 0.75)))]
    #[case(5.0, false, Some((Profile::PowerSaver, 0.75)))]
    fn test_cpu_thresholds(
        #[case] cpu: f64,
        #[case] charging: bool,
        #[case] expected: Option<(Profile, f64)>,
    ) {
        let got = fired(&snap(cpu, Some(80), charging, "code.exe")).map(|(p, c, _)| (p, c));
        assert_eq!(got, expected);
    }

    #[test]
    fn test_battery_rule_precedes_heavy_app() {
        let (plan, confidence, source) =
            fired(&snap(95.0, Some(12), false, "steam.exe")).expect("rule fires");
        assert_eq!(plan, Profile::PowerSaver);
        assert_eq!(confidence, 0.95);
        assert_eq!(source, RecommendationSource::Rule(RuleKind::LowBattery));
    }

    #[test]
    fn test_app_rules_precede_cpu_rules() {
        let (_, _, source) = fired(&snap(5.0, Some(80), true, "devenv.exe")).expect("rule fires");
        assert_eq!(source, RecommendationSource::Rule(RuleKind::HeavyApp));
    }

    #[test]
    fn test_defers_in_the_middle_band() {
        assert!(fired(&snap(45.0, Some(80), true, "chrome.exe")).is_none());
    }
}
