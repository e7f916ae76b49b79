use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use thiserror::Error;

use crate::radio::{DataRate, PaLevel, Transceiver};

const MAX_CHANNEL: u8 = 125;
const MAX_PAYLOAD_SIZE: usize = 32;
const ADDRESS_WIDTH: usize = 5;

/// Polls of STATUS while waiting for a transmission to finish
const TX_POLL_LIMIT: u32 = 1_000;
const TX_POLL_INTERVAL_US: u32 = 100;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("SPI error")]
    Spi,
    #[error("Pin error")]
    Pin,
    #[error("Chip did not respond.")]
    NotResponding,
    #[error("Transmission did not complete.")]
    Timeout,
    #[error("Pipe {0} does not exist.")]
    InvalidPipe(u8),
    #[error("Payload exceeds maximum of {0} bytes.")]
    PayloadTooLarge(usize),
}

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Register {
    CONFIG = 0x00,
    EN_AA = 0x01,
    EN_RXADDR = 0x02,
    SETUP_AW = 0x03,
    SETUP_RETR = 0x04,
    RF_CH = 0x05,
    RF_SETUP = 0x06,
    STATUS = 0x07,
    OBSERVE_TX = 0x08,
    RPD = 0x09,
    RX_ADDR_P0 = 0x0A,
    RX_ADDR_P1 = 0x0B,
    RX_ADDR_P2 = 0x0C,
    RX_ADDR_P3 = 0x0D,
    RX_ADDR_P4 = 0x0E,
    RX_ADDR_P5 = 0x0F,
    TX_ADDR = 0x10,
    RX_PW_P0 = 0x11,
    RX_PW_P1 = 0x12,
    RX_PW_P2 = 0x13,
    RX_PW_P3 = 0x14,
    RX_PW_P4 = 0x15,
    RX_PW_P5 = 0x16,
    FIFO_STATUS = 0x17,
    DYNPD = 0x1C,
    FEATURE = 0x1D,
}

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq)]
enum Instruction {
    R_REGISTER = 0x00,
    W_REGISTER = 0x20,
    R_RX_PAYLOAD = 0x61,
    W_TX_PAYLOAD = 0xA0,
    FLUSH_TX = 0xE1,
    FLUSH_RX = 0xE2,
    NOP = 0xFF,
}

// CONFIG
const EN_CRC: u8 = 1 << 3;
const CRCO: u8 = 1 << 2;
const PWR_UP: u8 = 1 << 1;
const PRIM_RX: u8 = 1 << 0;

// STATUS
const RX_DR: u8 = 1 << 6;
const TX_DS: u8 = 1 << 5;
const MAX_RT: u8 = 1 << 4;

// RF_SETUP
const RF_DR_LOW: u8 = 1 << 5;
const RF_DR_HIGH: u8 = 1 << 3;
const RF_PWR_MASK: u8 = 0b110;

// FIFO_STATUS
const RX_EMPTY: u8 = 1 << 0;

/// Register value written and read back by `begin` to detect the chip
const PROBE_SETUP_RETR: u8 = 0x5F;

/// nRF24L01(+) on a shared SPI bus with manual chip select
pub struct Nrf24<SPI, CS, CE, D> {
    spi: SPI,
    cs: CS,
    ce: CE,
    delay: D,
    config_reg: u8,
    payload_size: u8,
}

impl<SPI, CS, CE, D> Nrf24<SPI, CS, CE, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    CE: OutputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, cs: CS, ce: CE, delay: D) -> Self {
        Self {
            spi,
            cs,
            ce,
            delay,
            config_reg: EN_CRC | CRCO,
            payload_size: MAX_PAYLOAD_SIZE as u8,
        }
    }

    fn with_cs<F, R>(&mut self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut SPI) -> Result<R, SPI::Error>,
    {
        self.cs.set_low().map_err(|_| Error::Pin)?;
        let result = f(&mut self.spi).and_then(|r| self.spi.flush().map(|_| r));
        self.cs.set_high().map_err(|_| Error::Pin)?;

        result.map_err(|_| Error::Spi)
    }

    fn ce(&mut self, high: bool) -> Result<(), Error> {
        if high {
            self.ce.set_high()
        } else {
            self.ce.set_low()
        }
        .map_err(|_| Error::Pin)
    }

    fn instruction(&mut self, instruction: Instruction) -> Result<u8, Error> {
        self.with_cs(|spi| {
            let mut buf = [instruction as u8];
            spi.transfer_in_place(&mut buf).map(|_| buf[0])
        })
    }

    pub fn status(&mut self) -> Result<u8, Error> {
        self.instruction(Instruction::NOP)
    }

    pub fn read_register(&mut self, reg: Register) -> Result<u8, Error> {
        self.with_cs(|spi| {
            let mut buf = [Instruction::R_REGISTER as u8 | reg as u8, 0x00];
            spi.transfer_in_place(&mut buf).map(|_| buf[1])
        })
    }

    pub fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Error> {
        self.with_cs(|spi| spi.write(&[Instruction::W_REGISTER as u8 | reg as u8, value]))
    }

    fn write_address(&mut self, reg: Register, address: u64) -> Result<(), Error> {
        let mut buf = [0u8; ADDRESS_WIDTH + 1];
        buf[0] = Instruction::W_REGISTER as u8 | reg as u8;
        // LSByte first
        buf[1..].copy_from_slice(&address.to_le_bytes()[..ADDRESS_WIDTH]);

        self.with_cs(|spi| spi.write(&buf))
    }

    fn update_register(&mut self, reg: Register, mask: u8, value: u8) -> Result<(), Error> {
        let current = self.read_register(reg)?;
        self.write_register(reg, (current & !mask) | (value & mask))
    }

    fn write_config(&mut self, config: u8) -> Result<(), Error> {
        self.config_reg = config;
        self.write_register(Register::CONFIG, config)
    }

    pub fn flush_rx(&mut self) -> Result<(), Error> {
        self.instruction(Instruction::FLUSH_RX).map(|_| ())
    }

    pub fn flush_tx(&mut self) -> Result<(), Error> {
        self.instruction(Instruction::FLUSH_TX).map(|_| ())
    }

    fn clear_status(&mut self) -> Result<(), Error> {
        self.write_register(Register::STATUS, RX_DR | TX_DS | MAX_RT)
    }

    pub fn is_powered_up(&self) -> bool {
        self.config_reg & PWR_UP != 0
    }

    fn wait_for_transmission(&mut self) -> Result<bool, Error> {
        for _ in 0..TX_POLL_LIMIT {
            let status = self.status()?;

            if status & TX_DS != 0 {
                return Ok(true);
            }
            if status & MAX_RT != 0 {
                return Ok(false);
            }

            self.delay.delay_us(TX_POLL_INTERVAL_US);
        }

        Err(Error::Timeout)
    }
}

impl<SPI, CS, CE, D> Transceiver for Nrf24<SPI, CS, CE, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    CE: OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn begin(&mut self) -> Result<(), Error> {
        debug!("Probing nRF24...");

        self.ce(false)?;
        self.cs.set_high().map_err(|_| Error::Pin)?;

        // Settling time after power on reset
        self.delay.delay_ms(5);

        self.write_register(Register::SETUP_RETR, PROBE_SETUP_RETR)?;
        let readback = self.read_register(Register::SETUP_RETR)?;
        if readback != PROBE_SETUP_RETR {
            debug!("SETUP_RETR read back as {=u8:#x}", readback);
            return Err(Error::NotResponding);
        }

        self.write_register(Register::DYNPD, 0)?;
        self.write_register(Register::FEATURE, 0)?;
        self.write_register(Register::EN_AA, 0x3F)?;
        self.write_register(Register::SETUP_AW, (ADDRESS_WIDTH - 2) as u8)?;
        self.clear_status()?;
        self.flush_rx()?;
        self.flush_tx()?;
        self.write_config(EN_CRC | CRCO)?;

        debug!("nRF24 ready.");

        Ok(())
    }

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), Error> {
        let bits = match level {
            PaLevel::Min => 0b00,
            PaLevel::Low => 0b01,
            PaLevel::High => 0b10,
            PaLevel::Max => 0b11,
        };

        debug!("Setting PA level to {}", level);
        self.update_register(Register::RF_SETUP, RF_PWR_MASK, bits << 1)
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Error> {
        let bits = match rate {
            DataRate::Kbps250 => RF_DR_LOW,
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => RF_DR_HIGH,
        };

        debug!("Setting data rate to {}", rate);
        self.update_register(Register::RF_SETUP, RF_DR_LOW | RF_DR_HIGH, bits)
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), Error> {
        self.write_register(Register::RF_CH, channel.min(MAX_CHANNEL))
    }

    fn set_payload_size(&mut self, size: u8) -> Result<(), Error> {
        self.payload_size = size.clamp(1, MAX_PAYLOAD_SIZE as u8);

        for reg in [
            Register::RX_PW_P0,
            Register::RX_PW_P1,
            Register::RX_PW_P2,
            Register::RX_PW_P3,
            Register::RX_PW_P4,
            Register::RX_PW_P5,
        ] {
            self.write_register(reg, self.payload_size)?;
        }

        Ok(())
    }

    fn set_retries(&mut self, delay: u8, count: u8) -> Result<(), Error> {
        self.write_register(Register::SETUP_RETR, ((delay & 0xF) << 4) | (count & 0xF))
    }

    fn open_writing_pipe(&mut self, address: u64) -> Result<(), Error> {
        // Pipe 0 receives the auto acknowledgments for our transmissions
        self.write_address(Register::RX_ADDR_P0, address)?;
        self.write_address(Register::TX_ADDR, address)?;
        self.update_register(Register::EN_RXADDR, 1, 1)
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: u64) -> Result<(), Error> {
        let (addr_reg, width_reg) = match pipe {
            0 => (Register::RX_ADDR_P0, Register::RX_PW_P0),
            1 => (Register::RX_ADDR_P1, Register::RX_PW_P1),
            2 => (Register::RX_ADDR_P2, Register::RX_PW_P2),
            3 => (Register::RX_ADDR_P3, Register::RX_PW_P3),
            4 => (Register::RX_ADDR_P4, Register::RX_PW_P4),
            5 => (Register::RX_ADDR_P5, Register::RX_PW_P5),
            _ => return Err(Error::InvalidPipe(pipe)),
        };

        if pipe < 2 {
            self.write_address(addr_reg, address)?;
        } else {
            // Pipes 2-5 share the upper address bytes with pipe 1
            self.write_register(addr_reg, address as u8)?;
        }

        self.write_register(width_reg, self.payload_size)?;
        self.update_register(Register::EN_RXADDR, 1 << pipe, 1 << pipe)
    }

    fn start_listening(&mut self) -> Result<(), Error> {
        self.write_config(self.config_reg | PWR_UP | PRIM_RX)?;
        self.clear_status()?;
        self.ce(true)?;

        // RX settling
        self.delay.delay_us(130);

        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), Error> {
        self.ce(false)?;
        self.delay.delay_us(100);
        self.flush_tx()?;
        self.write_config(self.config_reg & !PRIM_RX)
    }

    fn available(&mut self) -> Result<bool, Error> {
        Ok(self.read_register(Register::FIFO_STATUS)? & RX_EMPTY == 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let width = self.payload_size as usize;
        let mut payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        payload[0] = Instruction::R_RX_PAYLOAD as u8;

        self.with_cs(|spi| spi.transfer_in_place(&mut payload[..=width]))?;

        let len = buf.len().min(width);
        buf[..len].copy_from_slice(&payload[1..=len]);

        self.write_register(Register::STATUS, RX_DR)
    }

    fn write(&mut self, buf: &[u8]) -> Result<bool, Error> {
        let width = self.payload_size as usize;
        if buf.len() > width {
            return Err(Error::PayloadTooLarge(width));
        }

        // Static payload width, pad with zeros
        let mut payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        payload[0] = Instruction::W_TX_PAYLOAD as u8;
        payload[1..=buf.len()].copy_from_slice(buf);

        self.with_cs(|spi| spi.write(&payload[..=width]))?;

        self.ce(true)?;
        let result = self.wait_for_transmission();
        self.ce(false)?;

        self.clear_status()?;
        match result {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.flush_tx()?;
                Ok(false)
            }
            Err(e) => {
                self.flush_tx()?;
                Err(e)
            }
        }
    }

    fn power_down(&mut self) -> Result<(), Error> {
        self.ce(false)?;
        self.write_config(self.config_reg & !PWR_UP)
    }

    fn power_up(&mut self) -> Result<(), Error> {
        if !self.is_powered_up() {
            self.write_config(self.config_reg | PWR_UP)?;

            // Power down to standby-I, worst case 5ms with external clock
            self.delay.delay_ms(5);
        }

        Ok(())
    }
}
