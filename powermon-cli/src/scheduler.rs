// Powermon CLI - Tick scheduler
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed-period ticker driving the dashboard loop.
//!
//! A [`Ticker`] yields once per period until its [`TickerHandle`] is
//! stopped. Stopping wakes a pending `tick` immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Default)]
struct Shared {
    stopped: AtomicBool,
    wake: Notify,
}

/// Cloneable stop switch for a [`Ticker`].
#[derive(Debug, Clone, Default)]
pub struct TickerHandle {
    shared: Arc<Shared>,
}

impl TickerHandle {
    /// Stop the ticker; pending and future ticks return `false`.
    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }
}

/// Periodic ticker with cancellation.
#[derive(Debug)]
pub struct Ticker {
    interval: Interval,
    handle: TickerHandle,
}

impl Ticker {
    /// First tick fires one `period` from now.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            handle: TickerHandle::default(),
        }
    }

    pub fn handle(&self) -> TickerHandle {
        self.handle.clone()
    }

    /// Wait for the next tick. Returns `false` once stopped.
    pub async fn tick(&mut self) -> bool {
        if self.handle.is_stopped() {
            return false;
        }
        tokio::select! {
            _ = self.interval.tick() => !self.handle.is_stopped(),
            _ = self.handle.shared.wake.notified() => {
                debug!("Ticker stopped");
                false
            }
        }
    }
}
