//! RP2040-specific HAL for the TS-UNB uplink platform layer
//!
//! This crate provides RP2040 implementations of the `tsunb-hal` traits
//! and assembles them into a ready-to-use platform:
//!
//! - TIMER ALARM1 as the symbol clock alarm, with its interrupt binding
//! - SPI0 transceiver bus with power up/down
//! - GPIO chip-select with runtime direction switching
//! - Pico pin assignment
//! - [`RpPicoTsUnb`](platform::RpPicoTsUnb) platform

#![no_std]

pub mod alarm;
pub mod pins;
pub mod platform;
pub mod spi;

pub use alarm::RpAlarm;
pub use platform::{new_pico, RpPicoTsUnb, TransceiverPins};
