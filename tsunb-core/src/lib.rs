//! Board-agnostic core of the TS-UNB uplink platform layer
//!
//! This crate contains everything between the TS-UNB protocol layer and
//! the chip HAL that does not depend on a specific microcontroller:
//!
//! - Symbol rate configuration (compile-time multiplier, nominal period)
//! - Drift-compensated symbol clock driven by a one-shot alarm interrupt
//! - Extra-delay injection for telegram splitting gaps
//! - Tick waiter (coarse sleep plus fine spin)
//! - Chip-select framed SPI transport for the radio transceiver
//! - Platform facade consumed by the protocol layer

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod identity;
pub mod platform;
pub mod rate;
pub mod transport;

#[cfg(test)]
mod sim;

pub use clock::{Firing, SymbolClock};
pub use identity::NodeIdentity;
pub use platform::{Platform, TsUnbPlatform};
pub use rate::{Rate, SymbolRate, UnsupportedRate};
pub use transport::DuplexTransport;
