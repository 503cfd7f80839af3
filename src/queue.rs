//! Per-project FIFO install queue.
//!
//! Every submission draws a ticket; tickets are served strictly in the order
//! they were drawn, one at a time.
//!
//! ```text
//! next_ticket ─► 5   (next submission gets 5)
//! serving     ─► 3   (ticket 3 runs, 4 waits)
//! ```

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Tickets {
    next_ticket: u64,
    serving: u64,
}

/// Runs submitted tasks one at a time, in submission order.
///
/// A failing or panicking task releases its turn like a successful one, so
/// the queue is never poisoned. Identical tasks are not coalesced.
#[derive(Debug, Default)]
pub struct InstallQueue {
    tickets: Mutex<Tickets>,
    turn: Condvar,
}

impl InstallQueue {
    /// Create an idle queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every earlier task has finished, then run `task` and
    /// return its result to this caller only.
    pub fn run<T>(&self, task: impl FnOnce() -> T) -> T {
        let mut tickets = self.tickets.lock();
        let ticket = tickets.next_ticket;
        tickets.next_ticket += 1;
        while tickets.serving != ticket {
            self.turn.wait(&mut tickets);
        }
        drop(tickets);

        let _turn = Turn { queue: self };
        task()
    }

    /// Tasks submitted but not yet finished, the running one included.
    pub fn pending(&self) -> u64 {
        let tickets = self.tickets.lock();
        tickets.next_ticket - tickets.serving
    }

    /// Check if no task is queued or running.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

/// Hands the turn to the next ticket when the running task ends.
struct Turn<'a> {
    queue: &'a InstallQueue,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        self.queue.tickets.lock().serving += 1;
        self.queue.turn.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn wait_until(cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_run_returns_task_result() {
        let queue = InstallQueue::new();
        assert_eq!(queue.run(|| 42), 42);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_runs_in_submission_order() {
        let queue = InstallQueue::new();
        let order = Mutex::new(Vec::new());
        let (release, gate) = mpsc::channel::<()>();

        std::thread::scope(|s| {
            // Hold the queue so later submissions pile up behind it.
            let (head_queue, head_order) = (&queue, &order);
            s.spawn(move || {
                head_queue.run(|| {
                    gate.recv().unwrap();
                    head_order.lock().push(0);
                })
            });
            wait_until(|| queue.pending() == 1);

            for i in 1..=5u64 {
                let (queue, order) = (&queue, &order);
                s.spawn(move || queue.run(|| order.lock().push(i)));
                wait_until(|| queue.pending() == i + 1);
            }

            release.send(()).unwrap();
        });

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4, 5]);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_never_overlaps() {
        let queue = InstallQueue::new();
        let in_flight = AtomicUsize::new(0);
        let max_in_flight = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    queue.run(|| {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(2));
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                });
            }
        });

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_does_not_poison() {
        let queue = InstallQueue::new();
        let first: Result<(), &str> = queue.run(|| Err("boom"));
        assert!(first.is_err());
        let second: Result<u8, &str> = queue.run(|| Ok(1));
        assert_eq!(second, Ok(1));
    }

    #[test]
    fn test_panic_releases_turn() {
        let queue = InstallQueue::new();
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            queue.run(|| -> u8 { panic!("task panicked") })
        }));
        assert!(caught.is_err());
        assert_eq!(queue.run(|| 7), 7);
    }
}
