mod common;

use cadence_scheduler::{BudgetOutcome, PriorityLevel, TaskQueue};
use common::{harness, push_logged};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_one_task_from_each_queue_per_pass() {
    let h = harness();
    let first = h.queue(PriorityLevel::FrameBound);
    let second = h.queue(PriorityLevel::FrameBound);
    push_logged(&first, &h.log, &h.clock, "first", 1.0);
    push_logged(&second, &h.log, &h.clock, "second", 1.0);

    let outcome = h.scheduler.process_queues(PriorityLevel::FrameBound).unwrap();

    assert_eq!(outcome, BudgetOutcome::Drained);
    assert_eq!(h.logged(), vec!["first", "second"]);
    assert_eq!(h.scheduler.registry().len(PriorityLevel::FrameBound), 2);
}

#[test]
fn test_busy_queue_cannot_starve_its_neighbour() {
    let h = harness();
    let busy = h.queue(PriorityLevel::FrameBound);
    let quiet = h.queue(PriorityLevel::FrameBound);

    for name in ["busy-1", "busy-2", "busy-3", "busy-4", "busy-5", "busy-6"] {
        push_logged(&busy, &h.log, &h.clock, name, 10.0);
    }
    push_logged(&quiet, &h.log, &h.clock, "quiet", 10.0);

    h.scheduler.queue_task_processing(PriorityLevel::FrameBound);
    h.host.run_frame().unwrap();
    assert_eq!(h.logged(), vec!["busy-1", "busy-2"]);

    // The queue that missed its turn goes first in the next frame.
    h.host.run_frame().unwrap();
    assert_eq!(h.logged(), vec!["busy-1", "busy-2", "quiet", "busy-3"]);
}

#[test]
fn test_queue_registered_mid_pass_waits_for_next_pass() {
    let h = harness();
    let first = h.queue(PriorityLevel::Idle);
    let late = Rc::new(TaskQueue::new());
    push_logged(&late, &h.log, &h.clock, "late", 0.0);

    {
        let scheduler = h.scheduler.clone();
        let late = late.clone();
        let log = h.log.clone();
        first.push(move || {
            log.borrow_mut().push("first");
            scheduler.register_queue(PriorityLevel::Idle, late.clone());
        });
    }

    let outcome = h.scheduler.process_queues(PriorityLevel::Idle).unwrap();
    assert_eq!(outcome, BudgetOutcome::Drained);
    assert_eq!(h.logged(), vec!["first"]);
    assert_eq!(late.len(), 1);

    h.scheduler.process_queues(PriorityLevel::Idle).unwrap();
    assert_eq!(h.logged(), vec!["first", "late"]);
}

#[test]
fn test_exhausted_pass_skips_remaining_queues() {
    let h = harness();
    let first = h.queue(PriorityLevel::FrameBound);
    let second = h.queue(PriorityLevel::FrameBound);
    push_logged(&first, &h.log, &h.clock, "expensive", 30.0);
    push_logged(&second, &h.log, &h.clock, "skipped", 0.0);

    let outcome = h.scheduler.process_queues(PriorityLevel::FrameBound).unwrap();

    assert_eq!(outcome, BudgetOutcome::Exhausted);
    assert_eq!(h.logged(), vec!["expensive"]);
    assert_eq!(second.len(), 1);

    // The first queue was still rotated to the back.
    let order = h.scheduler.registry().queues(PriorityLevel::FrameBound);
    assert!(Rc::ptr_eq(&order[0], &second));
    assert!(Rc::ptr_eq(&order[1], &first));
}

#[test]
fn test_queue_unregistered_during_its_turn_stays_out() {
    let h = harness();
    let owner = h.queue(PriorityLevel::FrameBound);
    let removed = Rc::new(Cell::new(false));

    {
        let scheduler = h.scheduler.clone();
        let owner2 = owner.clone();
        let removed = removed.clone();
        let log = h.log.clone();
        owner.push(move || {
            log.borrow_mut().push("closing");
            removed.set(scheduler.unregister_queue(PriorityLevel::FrameBound, &owner2));
        });
    }
    push_logged(&owner, &h.log, &h.clock, "rest", 0.0);

    let outcome = h.scheduler.process_queues(PriorityLevel::FrameBound).unwrap();

    assert_eq!(outcome, BudgetOutcome::Drained);
    assert!(removed.get());
    // The turn finishes, but the queue is not put back.
    assert_eq!(h.logged(), vec!["closing", "rest"]);
    assert_eq!(h.scheduler.registry().len(PriorityLevel::FrameBound), 0);

    push_logged(&owner, &h.log, &h.clock, "orphan", 0.0);
    h.scheduler.process_queues(PriorityLevel::FrameBound).unwrap();
    assert_eq!(h.logged(), vec!["closing", "rest"]);
}
