use crate::error::TaskError;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

new_key_type! {
    /// Identity of a task within its queue.
    pub struct TaskId;
}

type TaskFn = Rc<RefCell<dyn FnMut() -> Result<(), TaskError>>>;

/// A handle to a queued task. Cloning the handle does not clone the task.
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    callback: TaskFn,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Run the task. Returns `None` without running it if the task is already
    /// running further up the stack.
    pub fn try_run(&self) -> Option<Result<(), TaskError>> {
        let mut callback = self.callback.try_borrow_mut().ok()?;
        Some((&mut *callback)())
    }

    pub fn is_running(&self) -> bool {
        self.callback.try_borrow_mut().is_err()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish_non_exhaustive()
    }
}

#[derive(Default)]
struct QueueInner {
    tasks: SlotMap<TaskId, TaskFn>,
    order: VecDeque<TaskId>,
}

/// An insertion-ordered queue of tasks.
/// The scheduler is single-threaded, so we use RefCell and hand out `Rc<TaskQueue>`
/// to producers and the registry alike.
#[derive(Default)]
pub struct TaskQueue {
    inner: RefCell<QueueInner>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, mut task: impl FnMut() + 'static) -> TaskId {
        self.push_fallible(move || {
            task();
            Ok(())
        })
    }

    /// Append a task whose failure aborts the current turn of this queue.
    pub fn push_fallible(&self, task: impl FnMut() -> Result<(), TaskError> + 'static) -> TaskId {
        let callback: TaskFn = Rc::new(RefCell::new(task));
        let mut inner = self.inner.borrow_mut();
        let id = inner.tasks.insert(callback);
        inner.order.push_back(id);
        id
    }

    /// Remove a task by identity. Returns false if it already ran or was removed.
    pub fn remove(&self, id: TaskId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.tasks.remove(id).is_none() {
            return false;
        }
        if let Some(pos) = inner.order.iter().position(|&queued| queued == id) {
            inner.order.remove(pos);
        }
        true
    }

    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.tasks.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().order.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.inner.borrow().tasks.contains_key(id)
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        let inner = self.inner.borrow();
        inner.tasks.get(id).map(|callback| Task {
            id,
            callback: callback.clone(),
        })
    }

    pub fn front(&self) -> Option<Task> {
        let front = self.inner.borrow().order.front().copied();
        front.and_then(|id| self.get(id))
    }

    /// Identities of the queued tasks, in insertion order, as of this call.
    pub fn ids(&self) -> SmallVec<[TaskId; 16]> {
        self.inner.borrow().order.iter().copied().collect()
    }

    /// A cursor over the live queue. Tasks appended while the cursor is in use are
    /// visited; tasks removed by someone else are skipped.
    pub fn cursor(&self) -> QueueCursor<'_> {
        QueueCursor {
            queue: self,
            current: None,
        }
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("len", &self.len()).finish()
    }
}

/// Walks a queue front to back while the caller removes what it has processed.
///
/// The cursor always sits on the earliest surviving task, so it never holds a
/// borrow of the queue while a task is running.
pub struct QueueCursor<'q> {
    queue: &'q TaskQueue,
    current: Option<Task>,
}

impl QueueCursor<'_> {
    pub fn current(&mut self) -> Option<Task> {
        if let Some(task) = &self.current {
            if self.queue.contains(task.id) {
                return Some(task.clone());
            }
        }
        self.current = self.queue.front();
        self.current.clone()
    }

    /// Remove the task under the cursor. A task that already left the queue while
    /// it was running is not an error.
    pub fn remove_current(&mut self) {
        if let Some(task) = self.current.take() {
            self.queue.remove(task.id);
        }
    }
}
