//! MPSC-style blocking deque used between the monitor, the pipeline, and
//! the consumers of visual/model updates.
//!
//! `wait_pop` blocks until a value arrives or the wait is abandoned;
//! `abandon_wait` wakes every waiter without delivering a value, which is
//! how shutdown unblocks the pipeline thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// A thread-safe FIFO with blocking and non-blocking pops.
#[derive(Debug, Default)]
pub struct EventQueue<T> {
    queue: Mutex<VecDeque<T>>,
    ready: Condvar,
    abandon: AtomicBool,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            abandon: AtomicBool::new(false),
        }
    }

    /// Append a value and wake one waiter.
    pub fn push(&self, value: T) {
        let mut queue = self.queue.lock();
        queue.push_back(value);
        self.ready.notify_one();
    }

    /// Pop the oldest value without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }

    /// Block until a value is available, returning `None` once the wait has
    /// been abandoned.
    pub fn wait_pop(&self) -> Option<T> {
        let mut queue = self.queue.lock();
        loop {
            if self.abandon.load(Ordering::Acquire) {
                return None;
            }
            if let Some(value) = queue.pop_front() {
                return Some(value);
            }
            self.ready.wait(&mut queue);
        }
    }

    /// Wake all waiters without delivering a value. Subsequent `wait_pop`
    /// calls return `None` until `reset_wait` is called.
    pub fn abandon_wait(&self) {
        self.abandon.store(true, Ordering::Release);
        // Take the lock so no waiter can be between its abandon check and
        // its wait when the notification fires.
        let _guard = self.queue.lock();
        self.ready.notify_all();
    }

    /// Re-arm waiting after an `abandon_wait`, e.g. when monitoring restarts.
    pub fn reset_wait(&self) {
        self.abandon.store(false, Ordering::Release);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_push_pop_order() {
        let queue = EventQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wait_pop_receives_pushed_value() {
        let queue = Arc::new(EventQueue::new());
        let producer = Arc::clone(&queue);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.push(42);
        });

        assert_eq!(queue.wait_pop(), Some(42));
        handle.join().unwrap();
    }

    #[test]
    fn test_abandon_wait_unblocks_waiters() {
        let queue: Arc<EventQueue<u32>> = Arc::new(EventQueue::new());
        let waiter = Arc::clone(&queue);

        let handle = std::thread::spawn(move || waiter.wait_pop());

        std::thread::sleep(Duration::from_millis(20));
        queue.abandon_wait();

        assert_eq!(handle.join().unwrap(), None);
        // Once abandoned, waiting is disabled until reset.
        assert_eq!(queue.wait_pop(), None);

        queue.reset_wait();
        queue.push(7);
        assert_eq!(queue.wait_pop(), Some(7));
    }
}
