//! Task Scheduling
//!
//! Delayed UI choreography (refocus, highlight decay, deferred prompt reset)
//! goes through a `Scheduler` so it can run against a virtual clock in tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Run `task` once after `delay`. The returned handle may cancel it.
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;

    /// Run `task` on the next tick.
    fn defer(&self, task: Task) -> TaskHandle {
        self.schedule(Duration::ZERO, task)
    }
}

/// Cancellation handle for a scheduled task. Dropping it leaves the task scheduled.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Wrap `task` so it becomes a no-op once this handle is cancelled.
    pub fn guard(&self, task: Task) -> Task {
        let cancelled = self.cancelled.clone();
        Box::new(move || {
            if !cancelled.get() {
                task();
            }
        })
    }
}

struct Pending {
    due: Duration,
    seq: u64,
    task: Task,
}

/// Deterministic scheduler driven by an explicit virtual clock.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    seq: Cell<u64>,
    queue: RefCell<Vec<Pending>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Tasks not yet run (cancelled ones included until their due time passes).
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move the clock forward, running every task that falls due on the way.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        while let Some(pending) = self.pop_due(target) {
            self.now.set(pending.due);
            (pending.task)();
        }
        self.now.set(target);
    }

    /// Run only what is due right now (zero-delay deferrals included).
    pub fn tick(&self) {
        self.advance(Duration::ZERO);
    }

    /// Run everything, jumping the clock as far as needed.
    pub fn run_until_idle(&self) {
        loop {
            let next_due = self.queue.borrow().iter().map(|p| p.due).min();
            match next_due {
                Some(due) => self.advance(due.saturating_sub(self.now.get())),
                None => break,
            }
        }
    }

    fn pop_due(&self, target: Duration) -> Option<Pending> {
        let mut queue = self.queue.borrow_mut();
        let index = queue
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        Some(queue.remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        log::debug!("[scheduler] task #{} due in {:?}", seq, delay);
        self.queue.borrow_mut().push(Pending {
            due: self.now.get() + delay,
            seq,
            task: handle.guard(task),
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| -> Task {
            let sink = sink.clone();
            Box::new(move || sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_millis(250), task("refocus"));
        scheduler.defer(task("prompt"));
        scheduler.schedule(Duration::from_millis(1000), task("unhighlight"));

        scheduler.advance(Duration::from_millis(249));
        assert_eq!(*log.borrow(), vec!["prompt"]);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(*log.borrow(), vec!["prompt", "refocus"]);

        scheduler.run_until_idle();
        assert_eq!(*log.borrow(), vec!["prompt", "refocus", "unhighlight"]);
        assert_eq!(scheduler.now(), Duration::from_millis(1000));
    }

    #[test]
    fn test_ties_run_fifo() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        scheduler.defer(task("first"));
        scheduler.defer(task("second"));
        scheduler.tick();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        let handle = scheduler.schedule(Duration::from_millis(10), task("cancelled"));
        handle.cancel();
        scheduler.run_until_idle();
        assert!(log.borrow().is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_task_scheduled_by_task_runs_within_same_advance() {
        let scheduler = Rc::new(ManualScheduler::new());
        let (log, task) = recorder();
        let inner = scheduler.clone();
        let follow_up = task("follow-up");
        scheduler.defer(Box::new(move || {
            inner.schedule(Duration::from_millis(5), follow_up);
        }));

        scheduler.advance(Duration::from_millis(5));
        assert_eq!(*log.borrow(), vec!["follow-up"]);
    }
}
