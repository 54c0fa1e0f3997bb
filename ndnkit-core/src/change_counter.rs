use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Implemented by every packet object that reports mutations through a
/// monotonically non-decreasing count.
pub trait Changed {
    /// The current change count. Reading the count may bump it once when a
    /// child object changed since the last read (lazy propagation), but a
    /// read with no intervening mutation returns the same value.
    fn change_count(&self) -> u64;
}

/// A monotonic mutation counter.
///
/// Relaxed atomics keep packet objects shareable for concurrent read-only
/// access; mutation is still single-writer by the `&mut` rules.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.get()))
    }
}

/// Wraps a child object and remembers its last observed change count, so a
/// parent can poll "did this child change since I last looked?" without the
/// child holding a back-reference.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChangeCounter<T> {
    target: T,
    #[serde(skip)]
    observed: Counter,
}

impl<T: Changed> ChangeCounter<T> {
    pub fn new(target: T) -> Self {
        let counter = Self {
            target,
            observed: Counter::new(),
        };
        counter.checked_changed();
        counter
    }

    pub fn get(&self) -> &T {
        &self.target
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Replace the child and re-arm against its current count. The caller
    /// (the parent's setter) bumps the parent's own counter.
    pub fn set(&mut self, target: T) {
        self.target = target;
        self.checked_changed();
    }

    /// True once per child mutation: reports whether the child's count moved
    /// since the previous call, and records the new count.
    pub fn checked_changed(&self) -> bool {
        let current = self.target.change_count();
        if current != self.observed.get() {
            self.observed.0.store(current, Ordering::Relaxed);
            true
        } else {
            false
        }
    }
}

impl<T: Clone> Clone for ChangeCounter<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            observed: self.observed.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for ChangeCounter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl<T: Eq> Eq for ChangeCounter<T> {}
