//! Command and power state machine
//!
//! Turns received command bytes into feedback, handles pairing and decides
//! when the device goes to sleep. The mode is derived from [`DeviceState`],
//! which the wake handler may change at any time.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;

use crate::feedback::{AlertPattern, Feedback, Indicator};
use crate::platform::{Clock, LowPower};
use crate::protocol::{Command, ACK};
use crate::radio::{RadioLink, Transceiver};
use crate::state::DeviceState;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Time without commands or wake events before going to sleep
    pub inactivity_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    UnpairedActive,
    PairedActive,
    Sleeping,
}

impl Mode {
    pub fn is_active(&self) -> bool {
        !matches!(self, Mode::Sleeping)
    }
}

pub struct StateMachine<'s, T, D, F, P, C> {
    state: &'s DeviceState,
    radio: RadioLink<T, D>,
    feedback: F,
    power: P,
    clock: C,
    config: Config,
}

impl<'s, T, D, F, P, C> StateMachine<'s, T, D, F, P, C>
where
    T: Transceiver,
    D: DelayNs,
    F: Feedback,
    P: LowPower,
    C: Clock,
{
    pub fn new(
        state: &'s DeviceState,
        radio: RadioLink<T, D>,
        feedback: F,
        power: P,
        clock: C,
        config: Config,
    ) -> Self {
        Self {
            state,
            radio,
            feedback,
            power,
            clock,
            config,
        }
    }

    /// Bring up the radio and show the "not paired" indicator.
    ///
    /// Never returns if the radio cannot be brought up.
    pub fn boot(&mut self) {
        if let Err(e) = self.radio.initialize() {
            error!("Radio initialization failed: {}", e);
            self.feedback.error_loop();
        }

        if let Err(e) = self.radio.configure() {
            error!("Radio configuration failed: {}", e);
            self.feedback.error_loop();
        }

        self.feedback.set_indicator(Indicator::Red);
        self.state.record_activity(self.clock.now_ms());

        info!("Boot complete, waiting for pairing");
    }

    pub fn mode(&self) -> Mode {
        if self.state.is_sleeping() {
            Mode::Sleeping
        } else if self.state.is_paired() {
            Mode::PairedActive
        } else {
            Mode::UnpairedActive
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn radio(&self) -> &RadioLink<T, D> {
        &self.radio
    }

    /// Handle one received byte, then mark the current time as activity.
    pub fn process_command(&mut self, byte: u8) {
        match Command::from_byte(byte) {
            Some(Command::Pair) if self.mode().is_active() => self.pair(),
            Some(Command::HighAlert) if self.mode().is_active() => {
                debug!("High alert");
                self.feedback.alert(AlertPattern::Single);
            }
            Some(Command::CrowdAlert) if self.mode().is_active() => {
                debug!("Crowd alert");
                self.feedback.alert(AlertPattern::Long);
            }
            Some(Command::Sleep) => {
                info!("Sleep requested");
                self.enter_sleep();
            }
            Some(command) => debug!("Ignoring {} while sleeping", command),
            None => debug!("Ignoring unknown command byte {=u8:#x}", byte),
        }

        self.state.record_activity(self.clock.now_ms());
    }

    /// One iteration of the poll loop.
    pub fn poll_tick(&mut self, now_ms: u64) {
        if self.state.take_wake_pending() {
            info!("Woken up, resuming radio");
            self.radio.power_up();
        }

        if self.state.is_sleeping() {
            return;
        }

        if let Some(byte) = self.radio.try_receive() {
            self.process_command(byte);
        }

        let idle = now_ms.saturating_sub(self.state.last_activity());
        if idle > self.config.inactivity_timeout.as_millis() && !self.state.is_sleeping() {
            info!("Inactive for {=u64}ms, going to sleep", idle);
            self.enter_sleep();
        }
    }

    /// Silence outputs, power down the radio and enter low power.
    ///
    /// If the platform refuses low power the device stays awake and the radio
    /// is brought back up on the next tick.
    pub fn enter_sleep(&mut self) {
        self.feedback.silence_all();
        self.radio.power_down();
        self.state.set_sleeping(true);
        self.feedback.sleep_notice();

        if !self.power.enter() {
            warn!("Low power refused, staying awake");
            self.state.set_sleeping(false);
            self.state.raise_wake_pending();
        }
    }

    fn pair(&mut self) {
        if self.state.is_paired() {
            debug!("Already paired, ignoring pairing request");
            return;
        }

        self.state.mark_paired();
        self.feedback.set_indicator(Indicator::Green);
        self.feedback.tone(AlertPattern::Single);

        // Paired either way, the master tracks whether the ACK arrived
        if self.radio.send_ack(ACK) {
            info!("Paired");
        } else {
            warn!("Paired, but the acknowledgment was not delivered");
        }
    }
}
