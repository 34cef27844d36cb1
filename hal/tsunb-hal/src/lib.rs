//! TS-UNB Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the TS-UNB platform layer is
//! written against. Chip-specific HALs implement them; the board-agnostic
//! core (symbol clock, delay injection, SPI transport) only ever talks to
//! these traits, which is also what lets it run under host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  TS-UNB protocol layer (external)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tsunb-core (clock, transport)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tsunb-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  tsunb-hal-   │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::DirectionalPin`] - Chip-select control
//! - [`spi::SpiBus`], [`spi::SpiPower`] - SPI master operations and lifecycle
//! - [`alarm::TimeSource`], [`alarm::Alarm`] - Microsecond counter and one-shot alarm

#![no_std]
#![deny(unsafe_code)]

pub mod alarm;
pub mod gpio;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use alarm::{Alarm, TimeSource};
pub use gpio::{DirectionalPin, OutputPin};
pub use spi::{SpiBus, SpiPower};
