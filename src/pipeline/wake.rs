//! Adaptive wait on the wake word.
//!
//! The renderer thread is a notification consumer, not a poller: after a
//! short spin/yield window (cheap when producers are bursty) it parks on the
//! wake word's address and costs zero CPU until a producer, the input
//! reader, or shutdown notifies it.
//!
//! The park has no timeout on purpose: every state transition the loop cares
//! about (producer writes, input arrival, `requested_exit`) is paired with
//! a notify on the same word, so a timed wakeup would only add idle churn.

use crate::region::SharedRegion;

/// Backoff knobs. The defaults are tuned for producer bursts in the
/// microsecond range; raise `spin_iters` for latency-critical producers,
/// lower both to park sooner on battery-bound hosts.
#[derive(Debug, Clone, Copy)]
pub struct WakeConfig {
    /// Busy-spin iterations (`spin_loop` hints) before yielding.
    pub spin_iters: u32,
    /// Additional `yield_now` iterations before parking.
    pub yield_iters: u32,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self { spin_iters: 64, yield_iters: 192 }
    }
}

/// One watcher's backoff state across idle iterations.
pub struct AdaptiveWaiter {
    cfg: WakeConfig,
    idle: u32,
}

impl AdaptiveWaiter {
    pub fn new(cfg: WakeConfig) -> Self {
        Self { cfg, idle: 0 }
    }

    /// Work was observed; start the next idle window hot.
    #[inline]
    pub fn reset(&mut self) {
        self.idle = 0;
    }

    /// One backoff step: spin, then yield, then park on the wake word.
    /// Returns after the step; the caller re-checks the word.
    pub fn wait(&mut self, region: &SharedRegion) {
        self.idle = self.idle.saturating_add(1);
        if self.idle <= self.cfg.spin_iters {
            std::hint::spin_loop();
        } else if self.idle <= self.cfg.spin_iters + self.cfg.yield_iters {
            std::thread::yield_now();
        } else {
            region.park_on_wake_word(0);
        }
    }
}
