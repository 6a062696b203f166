//! Cooperative abort signal for long-running computations.
//!
//! A [`StopSignal`] is handed to every `compute` callback through the compute
//! context. Long computations are expected to poll it at least once per unit
//! of progress; the executive itself polls it once per continuation pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable abort flag shared between a pipeline and external callers.
///
/// Triggering the signal does not interrupt anything by itself; it is
/// observed cooperatively. A request that observes the signal finishes with
/// [`UpdateStatus::Cancelled`](crate::executive::UpdateStatus::Cancelled)
/// and its partial results are not cached.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation of the in-flight update.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Re-arm the signal so the next update can run to completion.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_and_reset() {
        let signal = StopSignal::new();
        assert!(!signal.is_triggered());

        signal.trigger();
        assert!(signal.is_triggered());

        let clone = signal.clone();
        assert!(clone.is_triggered());

        signal.reset();
        assert!(!clone.is_triggered());
    }
}
