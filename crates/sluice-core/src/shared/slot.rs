use crate::obs::sink::{self, CacheOutcome, MetricsEvent};
use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        Mutex, MutexGuard, OnceLock, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

///
/// SharedSlot
///
/// One lazily created, reusable resource guarded by an atomic "in use" flag.
/// A caller that wins the flag gets the cached resource; a caller that loses
/// gets a fresh ephemeral one. Nobody waits.
///
/// The mutex is only ever locked by the flag holder, so it is never contended;
/// it exists to hand out `&mut T` from a shared slot.
///

pub struct SharedSlot<T> {
    in_use: AtomicBool,
    cached: OnceLock<Mutex<T>>,
}

impl<T> SharedSlot<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_use: AtomicBool::new(false),
            cached: OnceLock::new(),
        }
    }

    /// Acquire the cached resource, or a fresh one if it is in use.
    ///
    /// `create` runs at most once for the cached resource over the slot's
    /// lifetime (plus once per ephemeral fallback). A failing `create` leaves
    /// the slot idle.
    pub fn acquire<E>(&self, create: impl FnOnce() -> Result<T, E>) -> Result<Lease<'_, T>, E> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let resource = create()?;
            sink::record(MetricsEvent::Acquire {
                outcome: CacheOutcome::Ephemeral,
            });
            tracing::debug!("shared slot in use, allocated ephemeral resource");

            return Ok(Lease::Ephemeral(resource));
        }

        // Resets the flag if `create` fails below.
        let release = ReleaseOnDrop(&self.in_use);

        let (cell, outcome) = match self.cached.get() {
            Some(cell) => (cell, CacheOutcome::Hit),
            None => {
                let resource = create()?;
                (
                    self.cached.get_or_init(|| Mutex::new(resource)),
                    CacheOutcome::Init,
                )
            }
        };
        sink::record(MetricsEvent::Acquire { outcome });

        Ok(Lease::Cached {
            resource: cell.lock().unwrap_or_else(PoisonError::into_inner),
            _release: release,
        })
    }

    /// Return a lease. Equivalent to dropping it.
    pub fn release(&self, lease: Lease<'_, T>) {
        drop(lease);
    }

    #[must_use]
    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cached.get().is_some()
    }
}

impl<T> Default for SharedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SharedSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSlot")
            .field("in_use", &self.is_in_use())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

///
/// ReleaseOnDrop
///

pub struct ReleaseOnDrop<'a>(&'a AtomicBool);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

///
/// Lease
///
/// A resource on loan from a `SharedSlot`. Dropping a cached lease unlocks
/// the resource and then clears the flag; dropping an ephemeral lease
/// drops (closes) the resource.
///

pub enum Lease<'a, T> {
    Cached {
        // drops before `_release`
        resource: MutexGuard<'a, T>,
        _release: ReleaseOnDrop<'a>,
    },
    Ephemeral(T),
}

impl<T> Lease<'_, T> {
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }
}

impl<T> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Self::Cached { resource, .. } => &**resource,
            Self::Ephemeral(resource) => resource,
        }
    }
}

impl<T> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            Self::Cached { resource, .. } => &mut **resource,
            Self::Ephemeral(resource) => resource,
        }
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        sink::record(MetricsEvent::Release {
            cached: self.is_cached(),
        });
    }
}
