//! Per-collection presentation state: the last fetched page plus
//! loading and error flags.
//!
//! Mutations keep the snapshot coherent: an update replaces the cached item,
//! a delete evicts it and a create marks the snapshot stale because the new
//! row's page position is unknown. The next list replaces everything.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;
use uuid::Uuid;

use domain::Record;

struct Snapshot<T> {
    items: Vec<T>,
    error: Option<String>,
    stale: bool,
}

pub struct CollectionState<T> {
    in_flight: AtomicUsize,
    snapshot: RwLock<Snapshot<T>>,
}

/// Marks one operation as in flight until dropped.
pub struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T: Record + Clone> CollectionState<T> {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            snapshot: RwLock::new(Snapshot {
                items: Vec::new(),
                error: None,
                stale: false,
            }),
        }
    }

    /// Start an operation: clears the last error and raises `loading`.
    pub async fn begin(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.snapshot.write().await.error = None;
        InFlight {
            counter: &self.in_flight,
        }
    }

    pub async fn fail(&self, message: impl Into<String>) {
        self.snapshot.write().await.error = Some(message.into());
    }

    pub async fn replace(&self, items: Vec<T>) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.items = items;
        snapshot.stale = false;
    }

    /// Replace the cached item with the same id; items not on the page are ignored.
    pub async fn upsert(&self, item: &T) {
        let mut snapshot = self.snapshot.write().await;
        if let Some(slot) = snapshot.items.iter_mut().find(|i| i.id() == item.id()) {
            *slot = item.clone();
        }
    }

    pub async fn evict(&self, id: Uuid) {
        self.snapshot.write().await.items.retain(|i| i.id() != id);
    }

    pub async fn mark_stale(&self) {
        self.snapshot.write().await.stale = true;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub async fn items(&self) -> Vec<T> {
        self.snapshot.read().await.items.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.snapshot.read().await.error.clone()
    }

    pub async fn is_stale(&self) -> bool {
        self.snapshot.read().await.stale
    }
}

impl<T: Record + Clone> Default for CollectionState<T> {
    fn default() -> Self {
        Self::new()
    }
}
