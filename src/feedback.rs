//! LED, buzzer and vibration patterns
//!
//! All patterns block until they are done. The state machine only ever talks
//! to the [`Feedback`] trait, so a non-blocking implementation can replace
//! [`OutputFeedback`] without touching it.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

/// Indicator LED pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Steady on
    Green,
    /// On for a while, then off. Shown while not paired
    Red,
    /// One blink, then left on
    Blue,
}

/// Buzzer and vibration pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertPattern {
    /// Short high tone
    Single,
    /// Long low tone
    Long,
}

/// Square wave output driving the piezo buzzer
pub trait Buzzer {
    /// Start a continuous tone, replacing any running one.
    fn tone(&mut self, hz: u32);

    fn silence(&mut self);
}

pub trait Feedback {
    fn set_indicator(&mut self, indicator: Indicator);

    /// Play the tone of `pattern` without vibration.
    fn tone(&mut self, pattern: AlertPattern);

    /// Play the tone of `pattern` while vibrating for the same time.
    fn alert(&mut self, pattern: AlertPattern);

    fn vibrate(&mut self, long: bool);

    /// Force every output off.
    fn silence_all(&mut self);

    /// Short flash telling the user the device goes to sleep.
    fn sleep_notice(&mut self);

    /// Blink the indicator forever. Used when the device cannot operate.
    fn error_loop(&mut self) -> !;
}

/// Timing and tones of the output patterns
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Base LED blink length
    pub blink: Duration,
    /// On and off time of the error blink
    pub error_blink: Duration,
    /// LED flash before going to sleep
    pub sleep_notice: Duration,
    /// Short vibration and tone
    pub short: Duration,
    /// Long vibration and tone
    pub long: Duration,
    pub single_tone_hz: u32,
    pub long_tone_hz: u32,
    /// Logic level at which LED and vibration motor are on
    pub active: PinState,
}

pub struct OutputFeedback<L, V, B, D> {
    led: L,
    vibration: V,
    buzzer: B,
    delay: D,
    config: Config,
    led_on: bool,
}

impl<L, V, B, D> OutputFeedback<L, V, B, D>
where
    L: OutputPin,
    V: OutputPin,
    B: Buzzer,
    D: DelayNs,
{
    pub fn new(led: L, vibration: V, buzzer: B, delay: D, config: Config) -> Self {
        let mut feedback = Self {
            led,
            vibration,
            buzzer,
            delay,
            config,
            led_on: false,
        };
        feedback.silence_all();

        feedback
    }

    /// Current level of the indicator LED.
    pub fn led_on(&self) -> bool {
        self.led_on
    }

    fn set_led(&mut self, on: bool) {
        if self.led.set_state(level(on, self.config.active)).is_err() {
            warn!("Failed to drive indicator LED");
            return;
        }
        self.led_on = on;
    }

    fn set_vibration(&mut self, on: bool) {
        if self.vibration.set_state(level(on, self.config.active)).is_err() {
            warn!("Failed to drive vibration motor");
        }
    }

    fn wait(&mut self, duration: Duration) {
        self.delay.delay_ms(duration.as_millis() as u32);
    }

    fn pattern(&self, pattern: AlertPattern) -> (u32, Duration) {
        match pattern {
            AlertPattern::Single => (self.config.single_tone_hz, self.config.short),
            AlertPattern::Long => (self.config.long_tone_hz, self.config.long),
        }
    }
}

impl<L, V, B, D> Feedback for OutputFeedback<L, V, B, D>
where
    L: OutputPin,
    V: OutputPin,
    B: Buzzer,
    D: DelayNs,
{
    fn set_indicator(&mut self, indicator: Indicator) {
        match indicator {
            Indicator::Green => self.set_led(true),
            Indicator::Red => {
                self.set_led(true);
                self.wait(self.config.blink * 5);
                self.set_led(false);
            }
            Indicator::Blue => {
                self.set_led(true);
                self.wait(self.config.blink);
                self.set_led(false);
                self.wait(self.config.blink);
                self.set_led(true);
            }
        }
    }

    fn tone(&mut self, pattern: AlertPattern) {
        let (hz, duration) = self.pattern(pattern);

        self.buzzer.silence();
        self.buzzer.tone(hz);
        self.wait(duration);
        self.buzzer.silence();
    }

    fn alert(&mut self, pattern: AlertPattern) {
        let (hz, _) = self.pattern(pattern);

        self.buzzer.silence();
        self.buzzer.tone(hz);
        self.vibrate(pattern == AlertPattern::Long);
        self.buzzer.silence();
    }

    fn vibrate(&mut self, long: bool) {
        self.set_vibration(true);
        self.wait(if long {
            self.config.long
        } else {
            self.config.short
        });
        self.set_vibration(false);
    }

    fn silence_all(&mut self) {
        self.buzzer.silence();
        self.set_led(false);
        self.set_vibration(false);
    }

    fn sleep_notice(&mut self) {
        self.set_led(true);
        self.wait(self.config.sleep_notice);
        self.set_led(false);
    }

    fn error_loop(&mut self) -> ! {
        loop {
            self.set_led(true);
            self.wait(self.config.error_blink);
            self.set_led(false);
            self.wait(self.config.error_blink);
        }
    }
}

fn level(on: bool, active: PinState) -> PinState {
    match (on, active) {
        (true, active) => active,
        (false, PinState::High) => PinState::Low,
        (false, PinState::Low) => PinState::High,
    }
}
