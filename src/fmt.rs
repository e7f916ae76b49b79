//! Logging shim
//!
//! Forwards to `defmt` when the `defmt` feature is enabled and compiles to
//! nothing otherwise, so the library can be built and tested on the host.

#![macro_use]
#![allow(unused_macros)]

#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($x:tt)*) => { ::defmt::trace!($($x)*) };
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($x:tt)*) => { ::defmt::debug!($($x)*) };
}

#[cfg(feature = "defmt")]
macro_rules! info {
    ($($x:tt)*) => { ::defmt::info!($($x)*) };
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($x:tt)*) => { ::defmt::warn!($($x)*) };
}

#[cfg(feature = "defmt")]
macro_rules! error {
    ($($x:tt)*) => { ::defmt::error!($($x)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

/// Bound for values that get logged from generic code.
#[cfg(feature = "defmt")]
pub trait Format: defmt::Format {}
#[cfg(feature = "defmt")]
impl<T: defmt::Format + ?Sized> Format for T {}

/// Bound for values that get logged from generic code.
#[cfg(not(feature = "defmt"))]
pub trait Format {}
#[cfg(not(feature = "defmt"))]
impl<T: ?Sized> Format for T {}
