use crate::Host;
use crate::clock::{Clock, MonotonicClock};
use crate::error::SchedulerError;
use crate::priority::PriorityLevel;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Weak;

/// Something that can pick a run back up when the host offers it time.
pub(crate) trait Resume {
    fn resume(&self, priority: PriorityLevel) -> Result<(), SchedulerError>;
}

/// A suspended runner, handed to a [`Host`] to be resumed exactly once.
///
/// Holds only a weak reference to its scheduler; resuming after the scheduler
/// has been dropped does nothing.
pub struct Continuation {
    target: Weak<dyn Resume>,
    priority: PriorityLevel,
}

impl Continuation {
    pub(crate) fn new(target: Weak<dyn Resume>, priority: PriorityLevel) -> Self {
        Self { target, priority }
    }

    /// The priority level whose runner this continuation resumes.
    pub fn priority(&self) -> PriorityLevel {
        self.priority
    }

    pub fn resume(self) -> Result<(), SchedulerError> {
        match self.target.upgrade() {
            Some(target) => target.resume(self.priority),
            None => {
                tracing::trace!(priority = %self.priority, "scheduler dropped, skipping continuation");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("priority", &self.priority)
            .field("live", &(self.target.strong_count() > 0))
            .finish()
    }
}

/// Pending work counts of a [`ManualHost`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCallbacks {
    pub microtasks: usize,
    pub frames: usize,
    pub idle: usize,
}

/// A deterministic, single-threaded event loop that the embedder drives by hand.
///
/// Microtasks always run before anything else. A frame runs the frame callbacks
/// registered before it started; callbacks registered during the frame wait for
/// the next one. Idle periods are only granted when no frame callback is pending.
pub struct ManualHost<C: Clock = MonotonicClock> {
    clock: C,
    microtasks: RefCell<VecDeque<Continuation>>,
    frames: RefCell<VecDeque<Continuation>>,
    idle: RefCell<VecDeque<Continuation>>,
    frame_count: Cell<u64>,
}

impl ManualHost<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for ManualHost<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ManualHost<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            microtasks: RefCell::new(VecDeque::new()),
            frames: RefCell::new(VecDeque::new()),
            idle: RefCell::new(VecDeque::new()),
            frame_count: Cell::new(0),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn pending(&self) -> PendingCallbacks {
        PendingCallbacks {
            microtasks: self.microtasks.borrow().len(),
            frames: self.frames.borrow().len(),
            idle: self.idle.borrow().len(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == PendingCallbacks::default()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }

    /// Run microtasks until none are left, including ones queued along the way.
    /// Returns how many ran.
    pub fn run_microtasks(&self) -> Result<usize, SchedulerError> {
        let mut ran = 0;
        loop {
            let next = self.microtasks.borrow_mut().pop_front();
            let Some(continuation) = next else {
                return Ok(ran);
            };
            ran += 1;
            continuation.resume().map_err(report)?;
        }
    }

    /// Render one frame. Returns how many frame callbacks ran.
    pub fn run_frame(&self) -> Result<usize, SchedulerError> {
        self.run_microtasks()?;
        self.frame_count.set(self.frame_count.get() + 1);

        let batch = std::mem::take(&mut *self.frames.borrow_mut());
        tracing::trace!(frame = self.frame_count.get(), callbacks = batch.len(), "running frame");
        self.run_batch(batch, &self.frames)
    }

    /// Grant an idle period, unless a frame is pending. Returns how many idle
    /// callbacks ran.
    pub fn run_idle_period(&self) -> Result<usize, SchedulerError> {
        self.run_microtasks()?;
        if !self.frames.borrow().is_empty() {
            return Ok(0);
        }

        let batch = std::mem::take(&mut *self.idle.borrow_mut());
        self.run_batch(batch, &self.idle)
    }

    /// Keep the loop turning (microtasks, then frames, then idle periods) until
    /// nothing is pending or `max_turns` frames and idle periods have run.
    /// Returns the number of turns taken.
    pub fn run_until_stalled(&self, max_turns: usize) -> Result<usize, SchedulerError> {
        let mut turns = 0;
        while turns < max_turns {
            self.run_microtasks()?;
            let pending = self.pending();
            if pending.frames > 0 {
                self.run_frame()?;
            } else if pending.idle > 0 {
                self.run_idle_period()?;
            } else {
                break;
            }
            turns += 1;
        }
        Ok(turns)
    }

    fn run_batch(
        &self,
        mut batch: VecDeque<Continuation>,
        requeue: &RefCell<VecDeque<Continuation>>,
    ) -> Result<usize, SchedulerError> {
        let mut ran = 0;
        while let Some(continuation) = batch.pop_front() {
            ran += 1;
            let result = continuation.resume().map_err(report).and_then(|()| self.run_microtasks());
            if let Err(err) = result {
                // Callbacks behind the failing one still get their turn later.
                let mut pending = requeue.borrow_mut();
                while let Some(rest) = batch.pop_back() {
                    pending.push_front(rest);
                }
                return Err(err);
            }
        }
        Ok(ran)
    }
}

fn report(err: SchedulerError) -> SchedulerError {
    tracing::error!(error = %err, "unhandled error in scheduled callback");
    err
}

impl<C: Clock> Host for ManualHost<C> {
    fn defer_immediate(&self, continuation: Continuation) {
        self.microtasks.borrow_mut().push_back(continuation);
    }

    fn defer_to_next_frame(&self, continuation: Continuation) {
        self.frames.borrow_mut().push_back(continuation);
    }

    fn defer_to_idle_period(&self, continuation: Continuation) {
        self.idle.borrow_mut().push_back(continuation);
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }
}

impl<C: Clock> fmt::Debug for ManualHost<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualHost")
            .field("pending", &self.pending())
            .field("frame_count", &self.frame_count.get())
            .finish()
    }
}
