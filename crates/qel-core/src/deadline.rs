//! Cooperative deadlines polled by the long-running engines.

use std::time::{Duration, Instant};

use crate::errors::QelError;

/// Default budget for one grade call.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(3);

/// Monotonic deadline checked at engine interrupt points.
///
/// Nothing is preempted: the symbolic, limit and automaton engines call
/// [`Deadline::check`] inside their loops and unwind with
/// [`QelError::Timeout`] once the budget is spent.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Starts a deadline that expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget: Some(budget),
        }
    }

    /// A deadline that never expires. Used by tests and offline tooling.
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            budget: None,
        }
    }

    /// Time elapsed since the deadline was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Remaining budget, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(self.started.elapsed()))
    }

    /// Returns true once the budget is spent.
    pub fn expired(&self) -> bool {
        match self.budget {
            Some(budget) => self.started.elapsed() >= budget,
            None => false,
        }
    }

    /// Fails with a timeout error naming `stage` once the budget is spent.
    pub fn check(&self, stage: &str) -> Result<(), QelError> {
        if self.expired() {
            tracing::warn!(stage, elapsed_ms = self.elapsed().as_millis() as u64, "deadline expired");
            return Err(QelError::timeout("deadline-expired", "grading did not converge in time")
                .with_context("stage", stage));
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::after(DEFAULT_BUDGET)
    }
}
