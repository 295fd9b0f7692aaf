//! Refresh Coordinator
//!
//! Explicit, process-wide cycle and ownership state for the polling loop.
//! Replaces ambient globals with compare-exchange semantics: at most one
//! refresh cycle in flight, at most one scheduling owner among however many
//! dashboard instances happen to be mounted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;
use uuid::Uuid;

pub struct RefreshCoordinator {
    in_flight: AtomicBool,
    owner: Mutex<Option<Uuid>>,
    instances: AtomicUsize,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            owner: Mutex::new(None),
            instances: AtomicUsize::new(0),
        }
    }

    /// Claim the single in-flight slot. Callers that fail must skip the tick
    /// entirely rather than queue a second concurrent request.
    pub fn try_acquire_cycle(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release_cycle(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn cycle_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Register `id` as the scheduling owner unless a different instance
    /// already holds ownership. Re-registering the current owner succeeds.
    pub fn try_become_owner(&self, id: Uuid) -> bool {
        let mut owner = self.lock_owner();
        match *owner {
            Some(current) if current != id => {
                debug!(instance = %id, owner = %current, "existing owner detected, not starting a second schedule");
                false
            }
            _ => {
                *owner = Some(id);
                true
            }
        }
    }

    pub fn is_owner(&self, id: Uuid) -> bool {
        *self.lock_owner() == Some(id)
    }

    /// Release ownership if and only if `id` holds it; a non-owner release
    /// never touches the shared slot.
    pub fn release_ownership(&self, id: Uuid) -> bool {
        let mut owner = self.lock_owner();
        if *owner == Some(id) {
            *owner = None;
            true
        } else {
            false
        }
    }

    /// Mount bookkeeping; returns the count after registration.
    pub fn register_instance(&self) -> usize {
        self.instances.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Unmount bookkeeping; saturates at zero, returns the remaining count.
    pub fn unregister_instance(&self) -> usize {
        let mut current = self.instances.load(Ordering::Acquire);
        while current > 0 {
            match self.instances.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current - 1,
                Err(observed) => current = observed,
            }
        }
        0
    }

    pub fn instance_count(&self) -> usize {
        self.instances.load(Ordering::Acquire)
    }

    fn lock_owner(&self) -> std::sync::MutexGuard<'_, Option<Uuid>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cycle_in_flight() {
        let coordinator = RefreshCoordinator::new();
        assert!(coordinator.try_acquire_cycle());
        assert!(!coordinator.try_acquire_cycle());
        coordinator.release_cycle();
        assert!(coordinator.try_acquire_cycle());
    }

    #[test]
    fn test_single_owner_among_instances() {
        let coordinator = RefreshCoordinator::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(coordinator.try_become_owner(first));
        assert!(!coordinator.try_become_owner(second));
        // re-registering the current owner is fine
        assert!(coordinator.try_become_owner(first));

        // a non-owner release leaves ownership intact
        assert!(!coordinator.release_ownership(second));
        assert!(coordinator.is_owner(first));

        assert!(coordinator.release_ownership(first));
        assert!(coordinator.try_become_owner(second));
    }

    #[test]
    fn test_instance_bookkeeping_saturates() {
        let coordinator = RefreshCoordinator::new();
        assert_eq!(coordinator.register_instance(), 1);
        assert_eq!(coordinator.register_instance(), 2);
        assert_eq!(coordinator.unregister_instance(), 1);
        assert_eq!(coordinator.unregister_instance(), 0);
        assert_eq!(coordinator.unregister_instance(), 0);
    }

    #[test]
    fn test_concurrent_owner_registration_elects_exactly_one() {
        use std::sync::Arc;

        let coordinator = Arc::new(RefreshCoordinator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = coordinator.clone();
                std::thread::spawn(move || coordinator.try_become_owner(Uuid::new_v4()))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
