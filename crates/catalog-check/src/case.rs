//! Per-node test cases and their outcomes

use std::time::Duration;

/// Outcome of a single node's compilation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    /// Not run yet
    Pending,
    /// Catalog compiled and every precondition held
    Passed,
    /// Precondition unmet or compilation failed
    Failed { error: String },
}

impl CaseStatus {
    /// Check if this status is terminal
    pub fn is_finished(&self) -> bool {
        !matches!(self, CaseStatus::Pending)
    }
}

/// One node's compilation attempt
#[derive(Debug, Clone)]
pub struct TestCase {
    name: String,
    status: CaseStatus,
    duration: Duration,
}

impl TestCase {
    /// Create a pending case for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Pending,
            duration: Duration::ZERO,
        }
    }

    /// Node identity this case compiles
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &CaseStatus {
        &self.status
    }

    /// Tri-state outcome: `None` until the case has run
    pub fn passed(&self) -> Option<bool> {
        match self.status {
            CaseStatus::Pending => None,
            CaseStatus::Passed => Some(true),
            CaseStatus::Failed { .. } => Some(false),
        }
    }

    /// Failure reason, present exactly when the case failed
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            CaseStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Wall-clock time spent on the attempt, zero until run
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Record the outcome of the attempt.
    ///
    /// Only the first call has an effect; finished cases are never rewritten.
    pub(crate) fn finish(&mut self, outcome: Result<(), String>, elapsed: Duration) {
        if self.is_finished() {
            return;
        }
        self.status = match outcome {
            Ok(()) => CaseStatus::Passed,
            Err(error) => CaseStatus::Failed { error },
        };
        // Instant can report zero on coarse clocks
        self.duration = elapsed.max(Duration::from_nanos(1));
    }
}
