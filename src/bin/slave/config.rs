use assign_resources::assign_resources;
use blindwatch::platform::WakeCause;
use blindwatch::radio::{DataRate, PaLevel};
use blindwatch::{feedback, machine, radio, wake};
use embassy_rp::peripherals;
use embassy_time::Duration;
use embedded_hal::digital::PinState;

/// Interval of the poll loop
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// SPI clock for the nRF24, chip maximum is 10MHz
pub const SPI_FREQUENCY: u32 = 8_000_000;

/// Link settings shared with the master unit
pub const RADIO_CONFIG: radio::Config = radio::Config {
    channel: 108, // 2.508 GHz
    payload_size: 1,
    reading_pipe: 1,
    address: 0xE8E8F0F0E1,
    pa_level: PaLevel::Max,
    data_rate: DataRate::Kbps250,
    auto_retry_count: 3,
    auto_retry_delay: 5, // 1.5ms
    retry_count: 3,
    retry_delay: Duration::from_millis(15),
};

/// Configuration for indicator, buzzer and vibration behaviour
pub const FEEDBACK_CONFIG: feedback::Config = feedback::Config {
    blink: Duration::from_millis(100),
    error_blink: Duration::from_millis(300),
    sleep_notice: Duration::from_millis(50),
    short: Duration::from_millis(200),
    long: Duration::from_millis(1000),
    single_tone_hz: 3000,
    long_tone_hz: 2000,
    active: PinState::High,
};

pub const MACHINE_CONFIG: machine::Config = machine::Config {
    inactivity_timeout: Duration::from_secs(10 * 60),
};

pub const WAKE_CONFIG: wake::Config = wake::Config {
    debounce: Duration::from_millis(200),
    source: WakeCause::External,
};

/// PWM clock divider for the buzzer, 125MHz / 64 leaves enough range for audible tones
pub const BUZZER_DIVIDER: u8 = 64;

// Pins to be used by the external devices
assign_resources! {
    rf: RfResources {
        spi: SPI0,
        clk: PIN_2,
        mosi: PIN_3,
        miso: PIN_4,
        csn: PIN_5,
        ce: PIN_6,
    },
    feedback: FeedbackResources {
        led: PIN_25,
        vibration: PIN_15,
        buzzer_pwm: PWM_SLICE0,
        buzzer: PIN_16,
    },
    wake: WakeResources {
        pin: PIN_17,
    },
}
