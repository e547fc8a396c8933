//! Small synchronization primitives for the search worker.

use std::sync::{Condvar, Mutex};

/// A boolean guarded by a mutex/condvar pair, allowing threads to block
/// until it takes a specific value.
pub struct GuardedBool {
    m: Mutex<bool>,
    v: Condvar,
}

impl GuardedBool {
    #[inline]
    pub fn new(value: bool) -> GuardedBool {
        GuardedBool {
            m: Mutex::new(value),
            v: Condvar::new(),
        }
    }

    /// Sets the value and wakes every waiter.
    #[inline]
    pub fn set(&self, value: bool) {
        let mut guard = self.m.lock().unwrap();
        *guard = value;
        self.v.notify_all();
    }

    /// Reads the current value.
    #[inline]
    pub fn get(&self) -> bool {
        *self.m.lock().unwrap()
    }

    /// Blocks until the value equals `value`.
    #[inline]
    pub fn wait(&self, value: bool) {
        let mut guard = self.m.lock().unwrap();
        while *guard != value {
            guard = self.v.wait(guard).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_releases_on_set() {
        let flag = Arc::new(GuardedBool::new(false));
        let flag2 = Arc::clone(&flag);
        let waiter = thread::spawn(move || {
            flag2.wait(true);
            true
        });
        flag.set(true);
        assert!(waiter.join().unwrap());
        assert!(flag.get());
    }
}
