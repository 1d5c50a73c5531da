use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::process::dataset::Dataset;

/// The publishable unit: both derived datasets, the year they are sorted by,
/// and when the refresh that produced them finished. Never mutated after
/// publication; a newer snapshot replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub absolute: Dataset,
    pub per_capita: Dataset,
    pub reference_year: String,
    /// `None` marks the pre-first-refresh placeholder.
    pub last_update: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Served until the first refresh succeeds, so readers can render a
    /// loading state instead of an error.
    pub fn uninitialized() -> Self {
        Snapshot {
            absolute: Dataset::empty(),
            per_capita: Dataset::empty(),
            reference_year: String::new(),
            last_update: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.last_update.is_some()
    }
}

/// Single-writer, many-reader holder for the current snapshot.
///
/// The lock guards nothing but the `Arc` itself: `get` clones the pointer,
/// `publish` swaps it. Neither critical section does any computation, so
/// readers are never held up by an in-flight refresh, and a reader always
/// sees one complete snapshot, old or new.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore {
            current: RwLock::new(Arc::new(Snapshot::uninitialized())),
        }
    }

    pub fn get(&self) -> Arc<Snapshot> {
        self.current.read().unwrap().clone()
    }

    pub fn publish(&self, snapshot: Snapshot) {
        *self.current.write().unwrap() = Arc::new(snapshot);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
