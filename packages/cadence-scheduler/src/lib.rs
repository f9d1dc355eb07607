pub mod budget;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod priority;
mod processor;
pub mod queue;
pub mod registry;
pub mod scheduler;

use std::rc::Rc;

/// The scheduling primitives a host event loop must provide.
/// This allows Cadence to run on browsers, native windowing loops or strictly local ones.
///
/// Every `defer_*` call must resume the continuation asynchronously, exactly once,
/// and no earlier than the class of time it names.
pub trait Host {
    /// Resume after the current call stack unwinds, before any rendering happens.
    /// Used for immediate-priority work.
    fn defer_immediate(&self, continuation: Continuation);

    /// Resume at the start of the next render frame.
    /// Used for frame-bound work.
    fn defer_to_next_frame(&self, continuation: Continuation);

    /// Resume once the host reports a period with spare time.
    /// Used for idle work.
    fn defer_to_idle_period(&self, continuation: Continuation);

    /// Get the current time in milliseconds (monotonic).
    fn now(&self) -> f64;
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn defer_immediate(&self, continuation: Continuation) {
        (**self).defer_immediate(continuation)
    }

    fn defer_to_next_frame(&self, continuation: Continuation) {
        (**self).defer_to_next_frame(continuation)
    }

    fn defer_to_idle_period(&self, continuation: Continuation) {
        (**self).defer_to_idle_period(continuation)
    }

    fn now(&self) -> f64 {
        (**self).now()
    }
}

pub use budget::{BudgetOutcome, BudgetWindow, RunState};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::SchedulerConfig;
pub use error::{ConfigError, SchedulerError, TaskError};
pub use host::{Continuation, ManualHost, PendingCallbacks};
pub use priority::{ParsePriorityError, PriorityLevel};
pub use queue::{QueueCursor, Task, TaskId, TaskQueue};
pub use registry::QueueRegistry;
pub use scheduler::Scheduler;
