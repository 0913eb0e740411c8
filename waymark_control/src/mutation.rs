// World-mutation notification channel.
//
// The host calls `MutationRegistry::notify` synchronously at the moment a
// voxel changes. Any number of observers may be registered; each receives
// every event delivered while it is registered.
//
// Dispatch iterates a snapshot of the observer list taken when `notify`
// starts, and re-checks registration right before each call. This makes it
// safe for a callback to register or remove observers (itself included)
// while an event is being delivered:
// - an observer removed mid-dispatch is not called afterwards,
// - an observer added mid-dispatch first sees the next event,
// - no observer is called twice for one event, and none is skipped.
// A nested `notify` issued from inside a callback skips any observer that
// is still running.
//
// `register_scoped` returns an `ObserverGuard` that removes the observer
// when dropped, so an operation's observer is gone on every exit path,
// including early `?` returns and panics.
//
// The registry is a cheap `Clone` handle (shared `Arc`) so guards and
// callbacks can hold their own copy. It is `Send + Sync`: with the threaded
// scheduler, observers are registered from the script thread and notified
// from the host thread, never at the same time.

use crate::block::BlockKind;
use crate::types::VoxelCoord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// One voxel edit, delivered to observers as it happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub pos: VoxelCoord,
    pub old: BlockKind,
    pub new: BlockKind,
}

/// Handle for removing a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Callback = Arc<Mutex<Box<dyn FnMut(&MutationEvent) + Send>>>;

#[derive(Default)]
struct RegistryInner {
    observers: Vec<(ObserverId, Callback)>,
    next_id: u64,
}

/// Shared registry of mutation observers.
#[derive(Clone, Default)]
pub struct MutationRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl MutationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer until it is explicitly removed.
    pub fn register(&self, callback: impl FnMut(&MutationEvent) + Send + 'static) -> ObserverId {
        let mut inner = self.lock();
        let id = ObserverId(inner.next_id);
        inner.next_id += 1;
        inner
            .observers
            .push((id, Arc::new(Mutex::new(Box::new(callback)))));
        id
    }

    /// Register an observer that is removed when the returned guard drops.
    pub fn register_scoped(
        &self,
        callback: impl FnMut(&MutationEvent) + Send + 'static,
    ) -> ObserverGuard {
        let id = self.register(callback);
        ObserverGuard {
            registry: self.clone(),
            id,
        }
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut inner = self.lock();
        let before = inner.observers.len();
        inner.observers.retain(|(oid, _)| *oid != id);
        inner.observers.len() != before
    }

    pub fn is_registered(&self, id: ObserverId) -> bool {
        self.lock().observers.iter().any(|(oid, _)| *oid == id)
    }

    pub fn len(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().observers.is_empty()
    }

    /// Deliver an event to every currently registered observer.
    pub fn notify(&self, event: &MutationEvent) {
        let snapshot: Vec<(ObserverId, Callback)> = self.lock().observers.clone();
        for (id, callback) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            let mut guard = match callback.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => continue,
            };
            let observer: &mut (dyn FnMut(&MutationEvent) + Send) = &mut **guard;
            observer(event);
        }
    }
}

impl fmt::Debug for MutationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

/// Removes its observer from the registry on drop.
#[must_use = "dropping the guard immediately removes the observer"]
pub struct ObserverGuard {
    registry: MutationRegistry,
    id: ObserverId,
}

impl ObserverGuard {
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
