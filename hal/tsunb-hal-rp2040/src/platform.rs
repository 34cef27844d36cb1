//! Raspberry Pi Pico TS-UNB platform
//!
//! Puts the RP2040 pieces together: ALARM1 for the symbol clock, the
//! embassy delay for the coarse sleep, SPI0 plus GPIO17 for the
//! transceiver.

use embassy_rp::gpio::Flex;
use embassy_rp::peripherals::{PIN_16, PIN_17, PIN_18, PIN_19, SPI0};
use embassy_rp::spi::Spi;
use embassy_rp::Peri;
use embassy_time::Delay;
use tsunb_core::clock::SymbolClock;
use tsunb_core::identity::NodeIdentity;
use tsunb_core::platform::Platform;
use tsunb_core::transport::DuplexTransport;

use crate::alarm::{self, RpAlarm};
use crate::spi::{to_embassy, transceiver_config, RpCsPin, RpSpi};

/// TS-UNB platform on a Pico with the transceiver on SPI0
pub type RpPicoTsUnb<'d> = Platform<'static, RpAlarm, Delay, RpSpi<'d>, RpCsPin<'d>>;

/// Pins and peripherals the transceiver is wired to
pub struct TransceiverPins<'d> {
    /// Transceiver bus
    pub spi: Peri<'d, SPI0>,
    /// MISO
    pub rx: Peri<'d, PIN_16>,
    /// Chip-select, driven as a GPIO
    pub cs: Peri<'d, PIN_17>,
    /// Bus clock
    pub sck: Peri<'d, PIN_18>,
    /// MOSI
    pub tx: Peri<'d, PIN_19>,
}

/// Build the platform and bind the symbol clock to the alarm interrupt
///
/// The SPI bus is left powered down and the clock stopped; the protocol
/// layer brings both up with `spi_init` and `start_timer`.
pub fn new_pico<'d>(
    clock: &'static SymbolClock,
    pins: TransceiverPins<'d>,
    identity: NodeIdentity,
) -> RpPicoTsUnb<'d> {
    let spi = Spi::new_blocking(pins.spi, pins.sck, pins.tx, pins.rx, to_embassy(&transceiver_config()));
    let transport = DuplexTransport::new(RpSpi::new(spi), RpCsPin::new(Flex::new(pins.cs)));

    alarm::bind(clock);

    #[cfg(feature = "defmt")]
    defmt::info!(
        "TS-UNB platform ready, symbol period {} us",
        clock.period_us()
    );

    Platform::new(clock, RpAlarm::new(), Delay, transport, identity)
}
