//! lemoteur - Power Policy Engine
//!
//! *Le Moteur* (The Engine) - Rule cascade, similarity matching, and recommendation

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Heavy/light application catalog.
pub mod catalog;
/// Policy engine combining rules and patterns.
pub mod engine;
/// Ordered rule cascade.
pub mod rules;
/// Similarity scoring and voting over exemplars.
pub mod similarity;

pub use catalog::{AppCatalog, AppCategory, DEFAULT_HEAVY_APPS, DEFAULT_LIGHT_APPS};
pub use engine::{PolicyEngine, DEFAULT_CONFIDENCE, MIN_EXEMPLARS_FOR_MATCHING};
pub use rules::{RuleCascade, HIGH_CPU_THRESHOLD, LOW_BATTERY_MAX, LOW_CPU_THRESHOLD, RULE_ORDER};
pub use similarity::{SimilarityMatcher, SimilarityScore, MAX_PATTERN_CONFIDENCE};
