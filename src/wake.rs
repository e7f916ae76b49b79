//! Wake signal handling
//!
//! [`WakeHandler::on_wake_signal`] runs in interrupt context. It only
//! compares timestamps and flips flags in [`DeviceState`]; powering the
//! radio back up is left to the poll loop.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Duration;

use crate::platform::WakeCause;
use crate::state::DeviceState;

/// Configuration for the wake input
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Triggers closer than this to the last accepted one are dropped
    pub debounce: Duration,
    /// The registered wake source
    pub source: WakeCause,
}

/// Outcome of a single wake trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wake {
    /// Inside the debounce window, nothing changed
    Bounced,
    /// Passed debouncing but the device was awake or the cause did not match
    Ignored,
    /// Device left sleep
    Woken,
}

pub struct WakeHandler<'s> {
    state: &'s DeviceState,
    config: Config,
    last_trigger: Mutex<CriticalSectionRawMutex, Cell<Option<u64>>>,
}

impl<'s> WakeHandler<'s> {
    pub const fn new(state: &'s DeviceState, config: Config) -> Self {
        Self {
            state,
            config,
            last_trigger: Mutex::new(Cell::new(None)),
        }
    }

    pub fn on_wake_signal(&self, now_ms: u64, cause: WakeCause) -> Wake {
        let debounce_ms = self.config.debounce.as_millis();

        let bounced = self.last_trigger.lock(|last| match last.get() {
            Some(t) if now_ms.saturating_sub(t) <= debounce_ms => true,
            _ => {
                last.set(Some(now_ms));
                false
            }
        });

        if bounced {
            trace!("Wake trigger at {=u64}ms bounced", now_ms);
            return Wake::Bounced;
        }

        if !self.state.is_sleeping() || cause != self.config.source {
            trace!("Wake trigger at {=u64}ms ignored ({})", now_ms, cause);
            return Wake::Ignored;
        }

        self.state.set_sleeping(false);
        self.state.record_activity(now_ms);
        self.state.raise_wake_pending();

        Wake::Woken
    }
}
