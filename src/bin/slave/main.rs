#![no_std]
#![no_main]

use blindwatch::feedback::OutputFeedback;
use blindwatch::machine::StateMachine;
use blindwatch::nrf24::Nrf24;
use blindwatch::platform::{LowPower, WakeCause};
use blindwatch::radio::RadioLink;
use blindwatch::state::DeviceState;
use blindwatch::tasks::{run_poll_loop, run_wake_task};
use blindwatch::wake::WakeHandler;
use board::{PwmBuzzer, UptimeClock, WfeLowPower};
use config::{AssignedResources, FeedbackResources, RfResources, WakeResources};
use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::SPI0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::spi;
use embassy_rp::spi::Spi;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

mod board;
mod config;

static STATE: DeviceState = DeviceState::new();
static WAKE: WakeHandler<'static> = WakeHandler::new(&STATE, config::WAKE_CONFIG);

static EXECUTOR_WAKE: InterruptExecutor = InterruptExecutor::new();

type Radio = RadioLink<
    Nrf24<Spi<'static, SPI0, spi::Blocking>, Output<'static>, Output<'static>, Delay>,
    Delay,
>;
type Outputs = OutputFeedback<Output<'static>, Output<'static>, PwmBuzzer<'static>, Delay>;

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_WAKE.on_interrupt()
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Blindwatch slave starting ...");

    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    // The wake task has to preempt the poll loop while it sits in low power
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let wake_spawner = EXECUTOR_WAKE.start(interrupt::SWI_IRQ_1);
    unwrap!(wake_spawner.spawn(wake_task(r.wake)));

    let radio = setup_radio(r.rf);
    let feedback = setup_feedback(r.feedback);

    let mut power = WfeLowPower::new(&STATE);
    power.register_wake_source(WakeCause::External);

    let mut machine = StateMachine::new(
        &STATE,
        radio,
        feedback,
        power,
        UptimeClock,
        config::MACHINE_CONFIG,
    );
    machine.boot();

    info!("Blindwatch slave ready");

    run_poll_loop(&mut machine, config::POLL_INTERVAL).await
}

fn setup_radio(r: RfResources) -> Radio {
    let mut spi_config = spi::Config::default();
    spi_config.frequency = config::SPI_FREQUENCY;

    let spi = Spi::new_blocking(r.spi, r.clk, r.mosi, r.miso, spi_config);
    let nrf24 = Nrf24::new(
        spi,
        Output::new(r.csn, Level::High),
        Output::new(r.ce, Level::Low),
        Delay,
    );

    RadioLink::new(nrf24, Delay, config::RADIO_CONFIG)
}

fn setup_feedback(r: FeedbackResources) -> Outputs {
    let pwm = Pwm::new_output_a(r.buzzer_pwm, r.buzzer, PwmConfig::default());

    OutputFeedback::new(
        Output::new(r.led, Level::Low),
        Output::new(r.vibration, Level::Low),
        PwmBuzzer::new(pwm),
        Delay,
        config::FEEDBACK_CONFIG,
    )
}

#[embassy_executor::task]
async fn wake_task(r: WakeResources) {
    let input = Input::new(r.pin, Pull::Up);

    run_wake_task(input, &WAKE, UptimeClock).await
}
