//! Recording mocks for host tests

extern crate std;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::feedback::{self, AlertPattern, Buzzer, Feedback, Indicator};
use crate::machine;
use crate::platform::{Clock, LowPower, WakeCause};
use crate::radio::{self, DataRate, PaLevel, Transceiver};
use crate::wake;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Transceiver
    Begin,
    PaLevel(PaLevel),
    DataRate(DataRate),
    Channel(u8),
    PayloadSize(u8),
    Retries(u8, u8),
    WritingPipe(u64),
    ReadingPipe(u8, u64),
    StartListening,
    StopListening,
    Read(u8),
    Write(u8),
    PowerDown,
    PowerUp,
    // Feedback
    Indicator(Indicator),
    Tone(AlertPattern),
    Alert(AlertPattern),
    Vibrate(bool),
    SilenceAll,
    SleepNotice,
    BuzzerTone(u32),
    BuzzerSilence,
    // Platform
    WakeSource(WakeCause),
    EnterLowPower,
    Delay(u32),
}

/// Shared event log and simulated time
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
    time: Rc<Cell<u64>>,
}

impl Recorder {
    pub fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }

    pub fn position(&self, event: Event) -> Option<usize> {
        self.events.borrow().iter().position(|e| *e == event)
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn now_ms(&self) -> u64 {
        self.time.get()
    }

    pub fn advance(&self, ms: u64) {
        self.time.set(self.time.get() + ms);
    }

    pub fn set_time(&self, ms: u64) {
        self.time.set(ms);
    }
}

pub struct MockDelay {
    rec: Recorder,
}

impl MockDelay {
    pub fn new(rec: &Recorder) -> Self {
        Self { rec: rec.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.rec.advance(u64::from(ns) / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.rec.push(Event::Delay(ms));
        self.rec.advance(u64::from(ms));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

pub struct MockTransceiver {
    rec: Recorder,
    rx: Rc<RefCell<VecDeque<u8>>>,
    begin_failures: u8,
    acks: VecDeque<bool>,
}

impl MockTransceiver {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            rx: Rc::default(),
            begin_failures: 0,
            acks: VecDeque::new(),
        }
    }

    /// Fail the first `count` calls to `begin`.
    pub fn failing_begin(mut self, count: u8) -> Self {
        self.begin_failures = count;
        self
    }

    /// Outcome of successive writes, writes beyond these succeed.
    pub fn with_acks(mut self, acks: &[bool]) -> Self {
        self.acks = acks.iter().copied().collect();
        self
    }

    /// Handle to queue received payloads after the mock has been moved.
    pub fn rx_queue(&self) -> Rc<RefCell<VecDeque<u8>>> {
        self.rx.clone()
    }

    pub fn push_rx(&self, bytes: &[u8]) {
        self.rx.borrow_mut().extend(bytes.iter().copied());
    }
}

impl Transceiver for MockTransceiver {
    type Error = MockError;

    fn begin(&mut self) -> Result<(), MockError> {
        self.rec.push(Event::Begin);
        if self.begin_failures > 0 {
            self.begin_failures -= 1;
            return Err(MockError);
        }
        Ok(())
    }

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), MockError> {
        self.rec.push(Event::PaLevel(level));
        Ok(())
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), MockError> {
        self.rec.push(Event::DataRate(rate));
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), MockError> {
        self.rec.push(Event::Channel(channel));
        Ok(())
    }

    fn set_payload_size(&mut self, size: u8) -> Result<(), MockError> {
        self.rec.push(Event::PayloadSize(size));
        Ok(())
    }

    fn set_retries(&mut self, delay: u8, count: u8) -> Result<(), MockError> {
        self.rec.push(Event::Retries(delay, count));
        Ok(())
    }

    fn open_writing_pipe(&mut self, address: u64) -> Result<(), MockError> {
        self.rec.push(Event::WritingPipe(address));
        Ok(())
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: u64) -> Result<(), MockError> {
        self.rec.push(Event::ReadingPipe(pipe, address));
        Ok(())
    }

    fn start_listening(&mut self) -> Result<(), MockError> {
        self.rec.push(Event::StartListening);
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), MockError> {
        self.rec.push(Event::StopListening);
        Ok(())
    }

    fn available(&mut self) -> Result<bool, MockError> {
        Ok(!self.rx.borrow().is_empty())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), MockError> {
        let byte = self.rx.borrow_mut().pop_front().ok_or(MockError)?;
        self.rec.push(Event::Read(byte));
        buf[0] = byte;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<bool, MockError> {
        self.rec.push(Event::Write(buf[0]));
        Ok(self.acks.pop_front().unwrap_or(true))
    }

    fn power_down(&mut self) -> Result<(), MockError> {
        self.rec.push(Event::PowerDown);
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), MockError> {
        self.rec.push(Event::PowerUp);
        Ok(())
    }
}

pub struct MockBuzzer {
    rec: Recorder,
}

impl MockBuzzer {
    pub fn new(rec: &Recorder) -> Self {
        Self { rec: rec.clone() }
    }
}

impl Buzzer for MockBuzzer {
    fn tone(&mut self, hz: u32) {
        self.rec.push(Event::BuzzerTone(hz));
    }

    fn silence(&mut self) {
        self.rec.push(Event::BuzzerSilence);
    }
}

/// Records feedback requests instead of driving pins
pub struct MockFeedback {
    rec: Recorder,
}

impl MockFeedback {
    pub fn new(rec: &Recorder) -> Self {
        Self { rec: rec.clone() }
    }
}

impl Feedback for MockFeedback {
    fn set_indicator(&mut self, indicator: Indicator) {
        self.rec.push(Event::Indicator(indicator));
    }

    fn tone(&mut self, pattern: AlertPattern) {
        self.rec.push(Event::Tone(pattern));
    }

    fn alert(&mut self, pattern: AlertPattern) {
        self.rec.push(Event::Alert(pattern));
        self.vibrate(pattern == AlertPattern::Long);
    }

    fn vibrate(&mut self, long: bool) {
        self.rec.push(Event::Vibrate(long));
        self.rec.advance(if long { 1_000 } else { 200 });
    }

    fn silence_all(&mut self) {
        self.rec.push(Event::SilenceAll);
    }

    fn sleep_notice(&mut self) {
        self.rec.push(Event::SleepNotice);
    }

    fn error_loop(&mut self) -> ! {
        panic!("error loop entered");
    }
}

pub struct MockPower {
    rec: Recorder,
    refuse: bool,
}

impl MockPower {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            refuse: false,
        }
    }

    /// Make every following `enter` fail.
    pub fn refuse(&mut self) {
        self.refuse = true;
    }
}

impl LowPower for MockPower {
    fn register_wake_source(&mut self, cause: WakeCause) {
        self.rec.push(Event::WakeSource(cause));
    }

    fn enter(&mut self) -> bool {
        self.rec.push(Event::EnterLowPower);
        !self.refuse
    }
}

pub struct MockClock {
    rec: Recorder,
}

impl MockClock {
    pub fn new(rec: &Recorder) -> Self {
        Self { rec: rec.clone() }
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.rec.now_ms()
    }
}

pub fn test_radio_config() -> radio::Config {
    radio::Config {
        channel: 108,
        payload_size: 1,
        reading_pipe: 1,
        address: 0xE8E8F0F0E1,
        pa_level: PaLevel::Max,
        data_rate: DataRate::Kbps250,
        auto_retry_count: 3,
        auto_retry_delay: 5,
        retry_count: 3,
        retry_delay: Duration::from_millis(15),
    }
}

pub fn test_feedback_config() -> feedback::Config {
    feedback::Config {
        blink: Duration::from_millis(100),
        error_blink: Duration::from_millis(300),
        sleep_notice: Duration::from_millis(50),
        short: Duration::from_millis(200),
        long: Duration::from_millis(1000),
        single_tone_hz: 3000,
        long_tone_hz: 2000,
        active: PinState::High,
    }
}

pub fn test_machine_config() -> machine::Config {
    machine::Config {
        inactivity_timeout: Duration::from_secs(600),
    }
}

pub fn test_wake_config() -> wake::Config {
    wake::Config {
        debounce: Duration::from_millis(200),
        source: WakeCause::External,
    }
}
