//! Global admission control.
//!
//! # Responsibilities
//! - Bound the number of backend attempts in flight across the gateway
//! - Reject immediately when the pool is full (no queueing)
//! - Release exactly once per acquired slot, on every exit path

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lock-free bounded pool of attempt slots.
#[derive(Debug)]
pub struct AdmissionController {
    in_flight: AtomicUsize,
    capacity: usize,
}

impl AdmissionController {
    pub fn new(capacity: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Take a slot, or `None` if the pool is full.
    ///
    /// The slot is returned to the pool when dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<AdmissionSlot> {
        let mut current = self.in_flight.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Some(AdmissionSlot {
            controller: Arc::clone(self),
        })
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A RAII guard for one in-flight backend attempt.
#[derive(Debug)]
pub struct AdmissionSlot {
    controller: Arc<AdmissionController>,
}

impl AdmissionSlot {
    /// Give the slot back now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        self.controller.release();
    }
}
