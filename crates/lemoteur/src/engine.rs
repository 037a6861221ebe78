// Policy Engine
//
// *Le Moteur* (The Engine) - Rules first, learned patterns second, a safe default last

use crate::catalog::AppCatalog;
use crate::rules::RuleCascade;
use crate::similarity::SimilarityMatcher;
use lemotif::{PatternStore, Profile, Recommendation, RecommendationSource, Snapshot};
use std::sync::Arc;
use tracing::trace;

/// Minimum stored exemplars before pattern matching is attempted
pub const MIN_EXEMPLARS_FOR_MATCHING: usize = 10;

/// Confidence of the fallback recommendation
pub const DEFAULT_CONFIDENCE: f64 = 0.50;

/// Single entry point turning a snapshot into a recommendation
///
/// `recommend` only reads the shared store, so one engine can serve the
/// control loop and any number of other readers at once.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    cascade: RuleCascade,
    matcher: SimilarityMatcher,
    store: Arc<PatternStore>,
}

impl PolicyEngine {
    /// Engine with the default application catalog
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self::with_catalog(store, AppCatalog::default())
    }

    /// Engine with a custom application catalog
    pub fn with_catalog(store: Arc<PatternStore>, catalog: AppCatalog) -> Self {
        Self {
            cascade: RuleCascade::new(catalog),
            matcher: SimilarityMatcher::new(),
            store,
        }
    }

    /// Shared pattern store
    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Rule cascade in use
    pub fn cascade(&self) -> &RuleCascade {
        &self.cascade
    }

    /// Recommend a profile for `snapshot`
    ///
    /// Cascade rules always win; stored exemplars are consulted only when no
    /// rule fires and at least [`MIN_EXEMPLARS_FOR_MATCHING`] are stored.
    pub fn recommend(&self, snapshot: &Snapshot) -> Recommendation {
        if let Some(rec) = self.cascade.evaluate(snapshot) {
            trace!("Rule recommendation: {:?}", rec);
            return rec;
        }

        let from_patterns = self.store.with_exemplars(|exemplars| {
            if exemplars.len() < MIN_EXEMPLARS_FOR_MATCHING {
                None
            } else {
                self.matcher.match_exemplars(snapshot, exemplars)
            }
        });
        if let Some(rec) = from_patterns {
            trace!("Pattern recommendation: {:?}", rec);
            return rec;
        }

        Recommendation::new(
            Profile::Balanced,
            DEFAULT_CONFIDENCE,
            "Insufficient data, using the balanced default",
            RecommendationSource::Default,
        )
    }
}
