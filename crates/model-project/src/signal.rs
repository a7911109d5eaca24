//! A one-way latch threads can block on

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A boolean latch: initially unset, set by [`signal`](Self::signal), never
/// unset again.
#[derive(Debug, Default)]
pub struct WaitableSignal {
    signaled: Mutex<bool>,
    changed: Condvar,
}

impl WaitableSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch and wake every waiter. Idempotent.
    pub fn signal(&self) {
        let mut signaled = self.signaled.lock();
        if !*signaled {
            *signaled = true;
            self.changed.notify_all();
        }
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }

    /// Block until the latch is set.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.changed.wait(&mut signaled);
        }
    }

    /// Block until the latch is set or `timeout` elapses; returns whether it
    /// was set. A zero timeout just reads the latch.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.changed.wait_until(&mut signaled, deadline).timed_out() {
                return *signaled;
            }
        }
        true
    }
}
