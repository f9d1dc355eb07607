#![allow(dead_code)]

use cadence_scheduler::{ManualClock, ManualHost, PriorityLevel, Scheduler, TaskQueue};
use std::cell::RefCell;
use std::rc::Rc;

pub type TestHost = Rc<ManualHost<ManualClock>>;
pub type Log = Rc<RefCell<Vec<&'static str>>>;

/// One frame interval at the default 60 fps.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

pub struct Harness {
    pub clock: ManualClock,
    pub host: TestHost,
    pub scheduler: Scheduler<TestHost>,
    pub log: Log,
}

pub fn harness() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let clock = ManualClock::new();
    let host = Rc::new(ManualHost::with_clock(clock.clone()));
    let scheduler = Scheduler::new(host.clone());
    Harness {
        clock,
        host,
        scheduler,
        log: Rc::new(RefCell::new(Vec::new())),
    }
}

impl Harness {
    pub fn queue(&self, priority: PriorityLevel) -> Rc<TaskQueue> {
        let queue = Rc::new(TaskQueue::new());
        self.scheduler.register_queue(priority, queue.clone());
        queue
    }

    pub fn logged(&self) -> Vec<&'static str> {
        self.log.borrow().clone()
    }
}

/// Push a task that records `name` and then advances the clock by `cost_ms`.
pub fn push_logged(queue: &TaskQueue, log: &Log, clock: &ManualClock, name: &'static str, cost_ms: f64) {
    let log = log.clone();
    let clock = clock.clone();
    queue.push(move || {
        log.borrow_mut().push(name);
        clock.advance(cost_ms);
    });
}
