use crate::Host;
use crate::budget::{BudgetOutcome, BudgetWindow, RunState};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::host::{Continuation, Resume};
use crate::priority::PriorityLevel;
use crate::processor::{process_queues, run_task};
use crate::queue::TaskQueue;
use crate::registry::QueueRegistry;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Defers queued work to the time slices a [`Host`] offers.
///
/// Immediate work is drained in full on the host's microtask turn. Frame-bound
/// and idle work is run against a budget of one frame interval and resumed on a
/// later frame or idle period when the budget runs out.
///
/// Cloning a `Scheduler` yields another handle to the same scheduler.
pub struct Scheduler<H: Host + 'static> {
    inner: Rc<SchedulerInner<H>>,
}

struct SchedulerInner<H: Host + 'static> {
    this: Weak<SchedulerInner<H>>,
    host: H,
    config: SchedulerConfig,
    registry: RefCell<QueueRegistry>,
    run_state: Cell<RunState>,
}

impl<H: Host + 'static> Clone for Scheduler<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host + 'static> Scheduler<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    pub fn with_config(host: H, config: SchedulerConfig) -> Self {
        let inner = Rc::new_cyclic(|this| SchedulerInner {
            this: this.clone(),
            host,
            config,
            registry: RefCell::new(QueueRegistry::new()),
            run_state: Cell::new(RunState::Idle),
        });
        Self { inner }
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn register_queue(&self, priority: PriorityLevel, queue: Rc<TaskQueue>) {
        self.inner.registry.borrow_mut().register(priority, queue);
    }

    pub fn unregister_queue(&self, priority: PriorityLevel, queue: &Rc<TaskQueue>) -> bool {
        self.inner.registry.borrow_mut().unregister(priority, queue)
    }

    pub fn registry(&self) -> Ref<'_, QueueRegistry> {
        self.inner.registry.borrow()
    }

    pub fn run_state(&self) -> RunState {
        self.inner.run_state.get()
    }

    /// Ask the host to process `priority` at the next opportunity of the matching
    /// kind. Call this after adding work to a queue.
    pub fn queue_task_processing(&self, priority: PriorityLevel) {
        self.inner.dispatch(priority);
    }

    /// Like [`Scheduler::queue_task_processing`], for priorities that arrive as
    /// text. Unknown names are ignored.
    pub fn queue_task_processing_named(&self, priority: &str) {
        match priority.parse::<PriorityLevel>() {
            Ok(priority) => self.inner.dispatch(priority),
            Err(err) => tracing::trace!(%err, "ignoring dispatch"),
        }
    }

    /// Run one round-robin pass over the queues at `priority` against the current
    /// budget window. If no run is in flight a window is opened at the current
    /// time for the duration of the call.
    pub fn process_queues(&self, priority: PriorityLevel) -> Result<BudgetOutcome, SchedulerError> {
        let inner = &self.inner;
        let started_at = inner
            .run_state
            .get()
            .started_at()
            .unwrap_or_else(|| inner.host.now());
        inner.process(priority, started_at)
    }
}

impl<H: Host + 'static> SchedulerInner<H> {
    fn dispatch(&self, priority: PriorityLevel) {
        tracing::debug!(%priority, "queueing task processing");
        self.defer(priority);
    }

    fn defer(&self, priority: PriorityLevel) {
        let target: Weak<dyn Resume> = self.this.clone();
        let continuation = Continuation::new(target, priority);
        match priority {
            PriorityLevel::Immediate => self.host.defer_immediate(continuation),
            PriorityLevel::FrameBound => self.host.defer_to_next_frame(continuation),
            PriorityLevel::Idle => self.host.defer_to_idle_period(continuation),
        }
    }

    fn process(
        &self,
        priority: PriorityLevel,
        started_at: f64,
    ) -> Result<BudgetOutcome, SchedulerError> {
        let window = BudgetWindow::new(started_at, self.config.target_interval_ms());
        process_queues(&self.registry, &self.host, priority, window)
    }

    fn run_immediate(&self) -> Result<(), SchedulerError> {
        // Immediate work must be visible before the next paint, so no budget applies.
        let queues = self.registry.borrow().queues(PriorityLevel::Immediate);
        for queue in queues {
            drain_immediate_queue(&queue)?;
        }
        Ok(())
    }

    fn run_frame_bound(&self) -> Result<(), SchedulerError> {
        // A run that is already in flight resumes its window instead of starting a new one.
        let started_at = match self.run_state.get().started_at() {
            Some(started_at) => started_at,
            None => self.begin_run(),
        };

        let outcome = self
            .process(PriorityLevel::FrameBound, started_at)
            .inspect_err(|_| self.end_run())?;
        self.settle(PriorityLevel::FrameBound, outcome);
        Ok(())
    }

    fn run_idle(&self) -> Result<(), SchedulerError> {
        // The host granted a full idle period; start a fresh window.
        let started_at = self.begin_run();

        // Frame-bound work may have arrived since the idle period was requested.
        let mut outcome = self
            .process(PriorityLevel::FrameBound, started_at)
            .inspect_err(|_| self.end_run())?;
        if outcome.is_drained() {
            outcome = self
                .process(PriorityLevel::Idle, started_at)
                .inspect_err(|_| self.end_run())?;
        }
        self.settle(PriorityLevel::Idle, outcome);
        Ok(())
    }

    fn settle(&self, priority: PriorityLevel, outcome: BudgetOutcome) {
        match outcome {
            BudgetOutcome::Drained => {
                tracing::debug!(%priority, "run complete");
                self.end_run();
            }
            BudgetOutcome::Exhausted => {
                let pending = self.registry.borrow().pending_tasks(priority);
                tracing::debug!(%priority, pending, "budget exhausted, re-arming");
                self.defer(priority);
                self.begin_run();
            }
        }
    }

    fn begin_run(&self) -> f64 {
        let started_at = self.host.now();
        self.run_state.set(RunState::Running { started_at });
        started_at
    }

    fn end_run(&self) {
        self.run_state.set(RunState::Idle);
    }
}

impl<H: Host + 'static> Resume for SchedulerInner<H> {
    fn resume(&self, priority: PriorityLevel) -> Result<(), SchedulerError> {
        match priority {
            PriorityLevel::Immediate => self.run_immediate(),
            PriorityLevel::FrameBound => self.run_frame_bound(),
            PriorityLevel::Idle => self.run_idle(),
        }
    }
}

/// Run every task present in `queue` when the drain starts, then clear it.
///
/// Tasks appended to this queue while it drains are dropped without running.
fn drain_immediate_queue(queue: &TaskQueue) -> Result<(), SchedulerError> {
    for id in queue.ids() {
        // An earlier task may have removed this one.
        let Some(task) = queue.get(id) else {
            continue;
        };
        run_task(&task, PriorityLevel::Immediate)?;
        queue.remove(id);
    }

    let discarded = queue.len();
    if discarded > 0 {
        tracing::warn!(discarded, "dropping tasks appended during immediate drain");
    }
    queue.clear();
    Ok(())
}

impl<H: Host + 'static> fmt::Debug for Scheduler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.inner.config)
            .field("run_state", &self.inner.run_state.get())
            .field("registry", &*self.inner.registry.borrow())
            .finish_non_exhaustive()
    }
}
