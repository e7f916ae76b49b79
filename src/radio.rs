//! Radio link on top of a packet transceiver
//!
//! Owns the link configuration and the software retry policy. Any
//! transceiver that implements [`Transceiver`] can be plugged in.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use thiserror::Error;

use crate::fmt::Format;

/// Transmit power amplifier level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaLevel {
    Min,
    Low,
    High,
    Max,
}

/// Over the air data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    Kbps250,
    Mbps1,
    Mbps2,
}

/// Contract of the transceiver driver
pub trait Transceiver {
    type Error: core::fmt::Debug + Format;

    /// Bring the chip into a known state and check that it responds.
    fn begin(&mut self) -> Result<(), Self::Error>;

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), Self::Error>;

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error>;

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error>;

    fn set_payload_size(&mut self, size: u8) -> Result<(), Self::Error>;

    /// Automatic retransmission done by the chip itself.
    ///
    /// `delay` is in units of 250µs, both values are 4 bit.
    fn set_retries(&mut self, delay: u8, count: u8) -> Result<(), Self::Error>;

    fn open_writing_pipe(&mut self, address: u64) -> Result<(), Self::Error>;

    fn open_reading_pipe(&mut self, pipe: u8, address: u64) -> Result<(), Self::Error>;

    fn start_listening(&mut self) -> Result<(), Self::Error>;

    fn stop_listening(&mut self) -> Result<(), Self::Error>;

    /// Whether a received payload is waiting to be read.
    fn available(&mut self) -> Result<bool, Self::Error>;

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Transmit one payload, `Ok(false)` if the peer never acknowledged it.
    fn write(&mut self, buf: &[u8]) -> Result<bool, Self::Error>;

    fn power_down(&mut self) -> Result<(), Self::Error>;

    fn power_up(&mut self) -> Result<(), Self::Error>;
}

#[derive(Error, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    #[error("Transceiver did not respond after {0} attempts.")]
    NotResponding(u8),
    #[error("Transceiver error: {0:?}")]
    Transceiver(E),
}

/// Link configuration, fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// RF channel index, frequency is 2400MHz + channel
    pub channel: u8,
    /// Static payload width in bytes
    pub payload_size: u8,
    /// Pipe number the master's address is received on
    pub reading_pipe: u8,
    /// Link address shared with the master
    pub address: u64,
    pub pa_level: PaLevel,
    pub data_rate: DataRate,
    /// Chip level retransmissions
    pub auto_retry_count: u8,
    /// Chip level retransmission delay, in units of 250µs
    pub auto_retry_delay: u8,
    /// Software level attempts for initialization and acknowledgments
    pub retry_count: u8,
    /// Delay after a failed software level attempt
    pub retry_delay: Duration,
}

pub struct RadioLink<T, D> {
    transceiver: T,
    delay: D,
    config: Config,
    listening: bool,
}

impl<T: Transceiver, D: DelayNs> RadioLink<T, D> {
    pub fn new(transceiver: T, delay: D, config: Config) -> Self {
        Self {
            transceiver,
            delay,
            config,
            listening: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn initialize(&mut self) -> Result<(), Error<T::Error>> {
        for attempt in 1..=self.config.retry_count {
            match self.transceiver.begin() {
                Ok(()) => {
                    debug!("Transceiver up after {=u8} attempt(s)", attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Transceiver init attempt {=u8} failed: {}", attempt, e);
                    self.delay.delay_ms(self.retry_delay_ms());
                }
            }
        }

        Err(Error::NotResponding(self.config.retry_count))
    }

    pub fn configure(&mut self) -> Result<(), Error<T::Error>> {
        let config = self.config;
        let radio = &mut self.transceiver;

        radio.set_pa_level(config.pa_level).map_err(Error::Transceiver)?;
        radio.set_data_rate(config.data_rate).map_err(Error::Transceiver)?;
        radio.set_channel(config.channel).map_err(Error::Transceiver)?;
        radio.set_payload_size(config.payload_size).map_err(Error::Transceiver)?;
        radio
            .set_retries(config.auto_retry_delay, config.auto_retry_count)
            .map_err(Error::Transceiver)?;
        radio.open_writing_pipe(config.address).map_err(Error::Transceiver)?;
        radio
            .open_reading_pipe(config.reading_pipe, config.address)
            .map_err(Error::Transceiver)?;
        radio.start_listening().map_err(Error::Transceiver)?;
        self.listening = true;

        info!(
            "Radio configured on channel {=u8}, pipe {=u8}",
            config.channel, config.reading_pipe
        );

        Ok(())
    }

    /// Fetch one command byte if the transceiver has queued a payload.
    pub fn try_receive(&mut self) -> Option<u8> {
        if !self.listening {
            return None;
        }

        match self.transceiver.available() {
            Ok(true) => (),
            Ok(false) => return None,
            Err(e) => {
                warn!("Failed polling receive FIFO: {}", e);
                return None;
            }
        }

        let mut buf = [0u8; 1];
        match self.transceiver.read(&mut buf) {
            Ok(()) => Some(buf[0]),
            Err(e) => {
                warn!("Failed reading payload: {}", e);
                None
            }
        }
    }

    /// Send a single byte, retrying on failure, and go back to listening.
    ///
    /// Returns whether any attempt was acknowledged by the peer.
    pub fn send_ack(&mut self, byte: u8) -> bool {
        self.stop_listening();

        let mut sent = false;
        for attempt in 1..=self.config.retry_count {
            match self.transceiver.write(&[byte]) {
                Ok(true) => {
                    sent = true;
                    break;
                }
                Ok(false) => debug!("Attempt {=u8} not acknowledged", attempt),
                Err(e) => warn!("Attempt {=u8} failed: {}", attempt, e),
            }

            if attempt < self.config.retry_count {
                self.delay.delay_ms(self.retry_delay_ms());
            }
        }

        self.start_listening();

        sent
    }

    /// Stop listening and put the transceiver into power down.
    pub fn power_down(&mut self) {
        self.stop_listening();

        if let Err(e) = self.transceiver.power_down() {
            warn!("Failed powering down transceiver: {}", e);
        }
    }

    /// Power the transceiver back up and resume listening.
    pub fn power_up(&mut self) {
        if let Err(e) = self.transceiver.power_up() {
            warn!("Failed powering up transceiver: {}", e);
        }

        self.start_listening();
    }

    fn start_listening(&mut self) {
        match self.transceiver.start_listening() {
            Ok(()) => self.listening = true,
            Err(e) => error!("Failed to start listening: {}", e),
        }
    }

    fn stop_listening(&mut self) {
        if let Err(e) = self.transceiver.stop_listening() {
            warn!("Failed to stop listening: {}", e);
        }
        self.listening = false;
    }

    fn retry_delay_ms(&self) -> u32 {
        self.config.retry_delay.as_millis() as u32
    }
}
