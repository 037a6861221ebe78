//! lemotif - Observations and Learned Patterns
//!
//! *Le Motif* (The Pattern) - Snapshots, power profiles, and the bounded exemplar store

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Durable storage backends for the exemplar blob.
pub mod backend;
/// Versioned serialization of exemplars.
pub mod codec;
/// Store error types.
pub mod error;
/// Bounded, write-through exemplar store.
pub mod store;
/// Snapshot, profile, exemplar, and recommendation types.
pub mod types;

pub use backend::{FileBackend, MemoryBackend, PatternBackend, DEFAULT_PATTERNS_FILE};
pub use codec::{decode_exemplars, encode_exemplars, FORMAT_VERSION};
pub use error::{Result as StoreResult, StoreError};
pub use store::{AppendOutcome, PatternStats, PatternStore, DEFAULT_CAPACITY};
pub use types::{
    normalize_app, Exemplar, ParseProfileError, Profile, Recommendation, RecommendationSource,
    RuleKind, Snapshot, UNKNOWN_APP,
};
