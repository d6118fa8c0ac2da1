//! Per-line "processing" guard for the basket quantity stepper.
//!
//! Rapid repeated clicks on + or − must not apply twice while the first
//! change is still being persisted. A click that finds its line busy is
//! dropped.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Set of basket lines with a stepper change in flight.
#[derive(Debug, Default)]
pub struct StepperGuards {
    busy: Mutex<HashSet<usize>>,
}

impl StepperGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `line` busy, or returns `None` if it already is.
    pub fn try_acquire(&self, line: usize) -> Option<StepperGuard<'_>> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(line) {
            debug!(line, "Stepper busy, click dropped");
            return None;
        }
        Some(StepperGuard { guards: self, line })
    }

    pub fn is_busy(&self, line: usize) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&line)
    }
}

/// Releases its line when dropped.
#[derive(Debug)]
pub struct StepperGuard<'a> {
    guards: &'a StepperGuards,
    line: usize,
}

impl StepperGuard<'_> {
    pub fn line(&self) -> usize {
        self.line
    }
}

impl Drop for StepperGuard<'_> {
    fn drop(&mut self) {
        self.guards
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_dropped() {
        let guards = StepperGuards::new();
        let first = guards.try_acquire(0).unwrap();
        assert_eq!(first.line(), 0);
        assert!(guards.try_acquire(0).is_none());

        // other lines are independent
        assert!(guards.try_acquire(1).is_some());

        drop(first);
        assert!(!guards.is_busy(0));
        assert!(guards.try_acquire(0).is_some());
    }
}
