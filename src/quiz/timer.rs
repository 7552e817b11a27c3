//! Countdown timer for a timed attempt.
//!
//! Ticks once per second on a tokio task. Expiry is an `FnOnce`, so it can
//! only ever run once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

pub struct Countdown {
    handle: Option<JoinHandle<()>>,
    remaining: Arc<AtomicU64>,
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("remaining_secs", &self.remaining_secs())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Countdown {
    /// Start counting down from `duration_secs`.
    ///
    /// The first tick lands one second after the call. `on_tick` receives
    /// the remaining seconds after each decrement; `on_expire` runs right
    /// after the tick that reaches zero. Must be called inside a tokio
    /// runtime.
    pub fn start<T, E>(duration_secs: u64, mut on_tick: T, on_expire: E) -> Self
    where
        T: FnMut(u64) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let remaining = Arc::new(AtomicU64::new(duration_secs));
        let shared = Arc::clone(&remaining);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let left = shared.load(Ordering::Relaxed).saturating_sub(1);
                shared.store(left, Ordering::Relaxed);
                on_tick(left);
                if left == 0 {
                    break;
                }
            }

            debug!("Countdown reached zero");
            on_expire();
        });

        Self {
            handle: Some(handle),
            remaining,
        }
    }

    /// Cancel ticking. Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("Stopping countdown with {}s left", self.remaining_secs());
            }
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}
