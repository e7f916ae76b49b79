//! State shared between the poll loop and the wake handler
//!
//! Access contract per field:
//!
//! - `paired`: written only by the poll loop, read anywhere. Word sized
//!   atomic load/store.
//! - `sleeping`: set by the poll loop right before entering low power,
//!   cleared by the wake handler. Word sized atomic load/store.
//! - `wake_pending`: raised by the wake handler, taken by the poll loop.
//!   The take is a read-then-clear, so it runs in a critical section.
//! - `last_activity`: 64 bit millisecond timestamp written from both
//!   contexts. The target has no 64 bit atomics, so it lives behind a
//!   critical section mutex.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

pub struct DeviceState {
    paired: AtomicBool,
    sleeping: AtomicBool,
    wake_pending: AtomicBool,
    last_activity: Mutex<CriticalSectionRawMutex, Cell<u64>>,
}

impl DeviceState {
    pub const fn new() -> Self {
        Self {
            paired: AtomicBool::new(false),
            sleeping: AtomicBool::new(false),
            wake_pending: AtomicBool::new(false),
            last_activity: Mutex::new(Cell::new(0)),
        }
    }

    pub fn is_paired(&self) -> bool {
        self.paired.load(Ordering::Acquire)
    }

    /// Pairing is one way, there is no way back short of a restart.
    pub fn mark_paired(&self) {
        self.paired.store(true, Ordering::Release);
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping.load(Ordering::Acquire)
    }

    pub fn set_sleeping(&self, sleeping: bool) {
        self.sleeping.store(sleeping, Ordering::Release);
    }

    pub fn last_activity(&self) -> u64 {
        self.last_activity.lock(|t| t.get())
    }

    /// Record activity at `now_ms`. Older timestamps are dropped.
    pub fn record_activity(&self, now_ms: u64) {
        self.last_activity.lock(|t| {
            if now_ms > t.get() {
                t.set(now_ms);
            }
        });
    }

    /// Flag a wake that still needs radio follow-up from the poll loop.
    pub fn raise_wake_pending(&self) {
        self.wake_pending.store(true, Ordering::Release);
    }

    pub fn take_wake_pending(&self) -> bool {
        critical_section::with(|_| {
            let pending = self.wake_pending.load(Ordering::Acquire);
            self.wake_pending.store(false, Ordering::Release);
            pending
        })
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
