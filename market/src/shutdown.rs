//! Stop signal for worker threads.
//!
//! Workers sleep between iterations through [`Shutdown::sleep`], which wakes
//! up as soon as the trigger fires, so a stop request never waits out a full
//! interval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct Flag {
    stopped: Mutex<bool>,
    cv: Condvar,
}

#[derive(Clone)]
pub struct Shutdown {
    flag: Arc<Flag>,
}

#[derive(Clone)]
pub struct ShutdownTrigger {
    flag: Arc<Flag>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let flag = Arc::new(Flag::default());
    (
        ShutdownTrigger {
            flag: Arc::clone(&flag),
        },
        Shutdown { flag },
    )
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.flag.stopped.lock()
    }

    /// Block for up to `dur`. Returns `true` if shutdown was triggered
    /// before or during the wait.
    pub fn sleep(&self, dur: Duration) -> bool {
        let deadline = Instant::now() + dur;
        let mut stopped = self.flag.stopped.lock();

        // Loop guards against spurious wakeups.
        while !*stopped {
            if self.flag.cv.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

impl ShutdownTrigger {
    /// Idempotent.
    pub fn trigger(&self) {
        let mut stopped = self.flag.stopped.lock();
        if !*stopped {
            *stopped = true;
            self.flag.cv.notify_all();
            tracing::info!(target: "shutdown", "shutdown triggered");
        }
    }
}
