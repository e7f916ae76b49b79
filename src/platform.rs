//! Platform services the state machine depends on

/// What brought the chip out of low power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeCause {
    /// The external wake input (button)
    External,
    /// A timer or RTC alarm
    Timer,
    /// Cold boot or reset, no wake source involved
    Undefined,
}

/// Low power hardware state
pub trait LowPower {
    /// Arm `cause` as the only source allowed to end low power.
    fn register_wake_source(&mut self, cause: WakeCause);

    /// Suspend until the registered wake source fires.
    ///
    /// Real hardware only returns from here after a wake. Returns `false`
    /// without suspending when low power cannot be entered, e.g. because no
    /// wake source was registered.
    fn enter(&mut self) -> bool;
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
