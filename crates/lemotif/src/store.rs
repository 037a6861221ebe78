// Pattern Store
//
// *Le Magasin* (The Store) - Bounded, write-through list of user-choice exemplars

use crate::backend::PatternBackend;
use crate::codec::{decode_exemplars, encode_exemplars};
use crate::error::Result;
use crate::types::{Exemplar, Profile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Maximum number of exemplars retained by default
pub const DEFAULT_CAPACITY: usize = 1000;

/// Summary of the stored exemplars
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStats {
    /// Number of stored exemplars
    pub total: usize,

    /// How many exemplars chose each profile
    pub distribution: BTreeMap<Profile, usize>,
}

/// What happened during an [`PatternStore::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Number of oldest exemplars dropped to respect the capacity
    pub evicted: usize,

    /// Whether the write-through to the backend succeeded
    pub persisted: bool,
}

/// Durable, bounded, insertion-ordered exemplar list
///
/// Readers share a read lock; `append` takes the write lock and persists
/// before releasing it, so the persisted blob always matches memory order.
pub struct PatternStore {
    exemplars: RwLock<VecDeque<Exemplar>>,
    backend: Box<dyn PatternBackend>,
    capacity: usize,
}

impl PatternStore {
    /// Open a store with the default capacity, loading whatever the backend holds
    pub fn open(backend: impl PatternBackend + 'static) -> Self {
        Self::with_capacity(backend, DEFAULT_CAPACITY)
    }

    /// Open a store with an explicit capacity
    ///
    /// Missing, corrupt, or version-mismatched data yields an empty store.
    pub fn with_capacity(backend: impl PatternBackend + 'static, capacity: usize) -> Self {
        let store = Self {
            exemplars: RwLock::new(VecDeque::new()),
            backend: Box::new(backend),
            capacity: capacity.max(1),
        };
        store.load();
        store
    }

    /// Reload exemplars from the backend, replacing the in-memory list
    ///
    /// Never fails: unreadable data is logged and leaves the store empty.
    pub fn load(&self) {
        let loaded = match self.read_backend() {
            Ok(exemplars) => exemplars,
            Err(e) if e.is_data_error() => {
                warn!(
                    "Discarding unreadable pattern data at {}: {}",
                    self.backend.describe(),
                    e
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Failed to load patterns from {}: {}",
                    self.backend.describe(),
                    e
                );
                Vec::new()
            }
        };

        let mut exemplars: VecDeque<Exemplar> = loaded.into();
        let overflow = exemplars.len().saturating_sub(self.capacity);
        if overflow > 0 {
            exemplars.drain(..overflow);
        }

        info!("Loaded {} patterns", exemplars.len());
        *self.write_guard() = exemplars;
    }

    fn read_backend(&self) -> Result<Vec<Exemplar>> {
        match self.backend.load_blob()? {
            Some(blob) => decode_exemplars(&blob),
            None => Ok(Vec::new()),
        }
    }

    /// Append an exemplar, evicting the oldest beyond capacity, then persist
    ///
    /// A failed persist is logged; the in-memory append is kept either way.
    pub fn append(&self, exemplar: Exemplar) -> AppendOutcome {
        let mut exemplars = self.write_guard();
        exemplars.push_back(exemplar);

        let mut evicted = 0;
        while exemplars.len() > self.capacity {
            exemplars.pop_front();
            evicted += 1;
        }

        let persisted = match self.persist(exemplars.make_contiguous()) {
            Ok(()) => {
                debug!("Persisted {} patterns", exemplars.len());
                true
            }
            Err(e) => {
                error!(
                    "Failed to persist patterns to {}: {}",
                    self.backend.describe(),
                    e
                );
                false
            }
        };

        AppendOutcome { evicted, persisted }
    }

    fn persist(&self, exemplars: &[Exemplar]) -> Result<()> {
        let blob = encode_exemplars(exemplars)?;
        self.backend.persist_blob(&blob)
    }

    /// Ordered copy of all exemplars, oldest first
    pub fn all(&self) -> Vec<Exemplar> {
        self.read_guard().iter().cloned().collect()
    }

    /// Run `f` over the exemplars without copying them
    pub fn with_exemplars<R>(&self, f: impl FnOnce(&[Exemplar]) -> R) -> R {
        let guard = self.read_guard();
        let (front, back) = guard.as_slices();
        if back.is_empty() {
            f(front)
        } else {
            let joined: Vec<Exemplar> = guard.iter().cloned().collect();
            f(&joined)
        }
    }

    /// Number of stored exemplars
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    /// Whether the store holds no exemplars
    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Maximum number of exemplars retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count and per-profile distribution
    pub fn stats(&self) -> PatternStats {
        let guard = self.read_guard();
        let mut distribution = BTreeMap::new();
        for exemplar in guard.iter() {
            *distribution.entry(exemplar.chosen_plan).or_insert(0) += 1;
        }
        PatternStats {
            total: guard.len(),
            distribution,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, VecDeque<Exemplar>> {
        self.exemplars.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, VecDeque<Exemplar>> {
        self.exemplars.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PatternStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("backend", &self.backend.describe())
            .finish()
    }
}
