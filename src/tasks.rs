use embassy_time::{Duration, Timer};
use embedded_hal::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::feedback::Feedback;
use crate::machine::StateMachine;
use crate::platform::{Clock, LowPower, WakeCause};
use crate::radio::Transceiver;
use crate::wake::{Wake, WakeHandler};

/// Forward falling edges on the wake input to the wake handler.
///
/// Meant to run on a high priority executor so it can preempt the poll loop.
pub async fn run_wake_task<I: Wait, C: Clock>(
    mut input: I,
    handler: &WakeHandler<'_>,
    clock: C,
) -> ! {
    info!("Wake task started");

    loop {
        if next_wake(&mut input, handler, &clock).await == Some(Wake::Woken) {
            info!("Wake button accepted");
        }
    }
}

/// Wait for one falling edge and hand it to `handler`.
///
/// Returns `None` if the input could not be waited on.
pub async fn next_wake<I: Wait, C: Clock>(
    input: &mut I,
    handler: &WakeHandler<'_>,
    clock: &C,
) -> Option<Wake> {
    if input.wait_for_falling_edge().await.is_err() {
        warn!("Waiting on wake input failed");
        return None;
    }

    Some(handler.on_wake_signal(clock.now_ms(), WakeCause::External))
}

/// Drive the state machine at a fixed tick.
pub async fn run_poll_loop<T, D, F, P, C>(
    machine: &mut StateMachine<'_, T, D, F, P, C>,
    tick: Duration,
) -> !
where
    T: Transceiver,
    D: DelayNs,
    F: Feedback,
    P: LowPower,
    C: Clock,
{
    info!("Poll loop started");

    loop {
        machine.poll_tick(machine.now_ms());

        Timer::after(tick).await;
    }
}
