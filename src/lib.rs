#![no_std]

pub mod fmt;

pub mod feedback;
pub mod machine;
pub mod nrf24;
pub mod platform;
pub mod protocol;
pub mod radio;
pub mod state;
pub mod tasks;
pub mod wake;

#[cfg(test)]
mod testing;
