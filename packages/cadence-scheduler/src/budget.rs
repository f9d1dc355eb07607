/// Result of spending budget on a set of queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetOutcome {
    /// Every task present at the start was run before the budget ran out.
    Drained,
    /// The budget ran out with work still queued.
    Exhausted,
}

impl BudgetOutcome {
    pub fn is_drained(self) -> bool {
        matches!(self, BudgetOutcome::Drained)
    }
}

/// A fixed-length slice of time a run may consume, measured from `started_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetWindow {
    pub started_at: f64,
    pub interval_ms: f64,
}

impl BudgetWindow {
    pub fn new(started_at: f64, interval_ms: f64) -> Self {
        Self {
            started_at,
            interval_ms,
        }
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.started_at
    }

    pub fn is_spent(&self, now: f64) -> bool {
        self.elapsed(now) >= self.interval_ms
    }

    pub fn remaining(&self, now: f64) -> f64 {
        (self.interval_ms - self.elapsed(now)).max(0.0)
    }
}

/// Whether a frame-bound or idle run is currently consuming budget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running {
        started_at: f64,
    },
}

impl RunState {
    pub fn started_at(self) -> Option<f64> {
        match self {
            RunState::Idle => None,
            RunState::Running { started_at } => Some(started_at),
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}
