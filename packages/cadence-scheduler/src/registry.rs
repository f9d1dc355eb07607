use crate::priority::PriorityLevel;
use crate::queue::TaskQueue;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::rc::Rc;

/// Maps each priority level to the ordered queues registered under it.
///
/// Independent producers register their own queue so that one busy producer
/// cannot starve another at the same priority. The scheduler only ever rotates
/// the sequence; queues are added and removed by their owners.
///
/// A queue taking its turn is checked out of the sequence. It still counts as
/// registered: unregistering it mid-turn keeps the scheduler from putting it back.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: FxHashMap<PriorityLevel, VecDeque<Rc<TaskQueue>>>,
    in_turn: SmallVec<[(PriorityLevel, Rc<TaskQueue>); 2]>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, priority: PriorityLevel, queue: Rc<TaskQueue>) {
        self.queues.entry(priority).or_default().push_back(queue);
    }

    pub fn unregister(&mut self, priority: PriorityLevel, queue: &Rc<TaskQueue>) -> bool {
        if let Some(pos) = self.turn_position(priority, queue) {
            self.in_turn.remove(pos);
            return true;
        }
        let Some(queues) = self.queues.get_mut(&priority) else {
            return false;
        };
        match queues.iter().position(|q| Rc::ptr_eq(q, queue)) {
            Some(pos) => {
                queues.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self, priority: PriorityLevel) -> usize {
        self.queues.get(&priority).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, priority: PriorityLevel) -> bool {
        self.len(priority) == 0
    }

    /// The queues at `priority` in their current rotation order.
    pub fn queues(&self, priority: PriorityLevel) -> SmallVec<[Rc<TaskQueue>; 4]> {
        self.queues
            .get(&priority)
            .map(|queues| queues.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check the front queue at `priority` out for its turn.
    pub fn begin_turn(&mut self, priority: PriorityLevel) -> Option<Rc<TaskQueue>> {
        let queue = self.queues.get_mut(&priority)?.pop_front()?;
        self.in_turn.push((priority, queue.clone()));
        Some(queue)
    }

    /// Return a queue to the back of the sequence after its turn. Returns false,
    /// dropping the queue, if its owner unregistered it during the turn.
    pub fn end_turn(&mut self, priority: PriorityLevel, queue: Rc<TaskQueue>) -> bool {
        match self.turn_position(priority, &queue) {
            Some(pos) => {
                self.in_turn.remove(pos);
                self.register(priority, queue);
                true
            }
            None => false,
        }
    }

    fn turn_position(&self, priority: PriorityLevel, queue: &Rc<TaskQueue>) -> Option<usize> {
        self.in_turn
            .iter()
            .position(|(p, q)| *p == priority && Rc::ptr_eq(q, queue))
    }

    /// Total number of tasks waiting across every queue at `priority`.
    pub fn pending_tasks(&self, priority: PriorityLevel) -> usize {
        self.queues
            .get(&priority)
            .map_or(0, |queues| queues.iter().map(|q| q.len()).sum())
    }
}
