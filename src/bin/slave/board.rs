use blindwatch::feedback::Buzzer;
use blindwatch::platform::{Clock, LowPower, WakeCause};
use blindwatch::state::DeviceState;
use defmt::*;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::Instant;
use fixed::types::extra::U4;
use fixed::FixedU16;

use crate::config::BUZZER_DIVIDER;

/// Milliseconds since boot
#[derive(Clone, Copy)]
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Piezo buzzer on PWM channel A
pub struct PwmBuzzer<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
}

impl<'d> PwmBuzzer<'d> {
    pub fn new(pwm: Pwm<'d>) -> Self {
        let mut config = PwmConfig::default();
        config.divider = FixedU16::<U4>::from_num(BUZZER_DIVIDER);
        config.compare_a = 0;

        let mut buzzer = Self { pwm, config };
        buzzer.pwm.set_config(&buzzer.config);

        buzzer
    }
}

impl Buzzer for PwmBuzzer<'_> {
    fn tone(&mut self, hz: u32) {
        let counter_hz = clk_sys_freq() / u32::from(BUZZER_DIVIDER);
        let top = (counter_hz / hz.max(1))
            .saturating_sub(1)
            .min(u32::from(u16::MAX)) as u16;

        self.config.top = top;
        self.config.compare_a = top / 2;
        self.pwm.set_config(&self.config);
    }

    fn silence(&mut self) {
        self.config.compare_a = 0;
        self.pwm.set_config(&self.config);
    }
}

/// Waits for events with the core halted until the wake task clears `sleeping`
pub struct WfeLowPower {
    state: &'static DeviceState,
    source: Option<WakeCause>,
}

impl WfeLowPower {
    pub fn new(state: &'static DeviceState) -> Self {
        Self {
            state,
            source: None,
        }
    }
}

impl LowPower for WfeLowPower {
    fn register_wake_source(&mut self, cause: WakeCause) {
        info!("Wake source {} registered", cause);
        self.source = Some(cause);
    }

    fn enter(&mut self) -> bool {
        if self.source.is_none() {
            warn!("No wake source registered");
            return false;
        }

        info!("Entering low power");
        while self.state.is_sleeping() {
            cortex_m::asm::wfe();
        }
        info!("Left low power");

        true
    }
}
