//! Transceiver SPI on SPI0
//!
//! The embassy blocking driver does the transfers. Powering the bus up and
//! down is done on the registers directly: the peripheral's SSE bit and the
//! pins' function select. Powered down, the pins are disconnected from
//! SPI0 and float, which is what the transceiver wants while the MCU sleeps.

use embassy_rp::gpio::{Flex, Level};
use embassy_rp::pac;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{self, Blocking, Spi};
use tsunb_hal::gpio::{DirectionalPin, OutputPin};
use tsunb_hal::spi::{Phase, Polarity, SpiBus, SpiConfig, SpiPower};

use crate::pins::{SPI0_RX, SPI0_SCK, SPI0_TX, SPI_BAUDRATE};

/// GPIO function select for SPI
const FUNCSEL_SPI: u8 = 1;

/// GPIO function select for "no function"
const FUNCSEL_NULL: u8 = 0x1f;

/// Transceiver bus configuration
pub fn transceiver_config() -> SpiConfig {
    SpiConfig {
        frequency: SPI_BAUDRATE,
        ..Default::default()
    }
}

/// Convert to the embassy driver's configuration
pub fn to_embassy(config: &SpiConfig) -> spi::Config {
    let mut out = spi::Config::default();
    out.frequency = config.frequency;
    out.polarity = match config.polarity {
        Polarity::IdleLow => spi::Polarity::IdleLow,
        Polarity::IdleHigh => spi::Polarity::IdleHigh,
    };
    out.phase = match config.phase {
        Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
        Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
    };
    out
}

fn route_pins(funcsel: u8) {
    for pin in [SPI0_RX, SPI0_SCK, SPI0_TX] {
        pac::IO_BANK0
            .gpio(pin as usize)
            .ctrl()
            .write(|w| w.set_funcsel(funcsel));
    }
}

/// SPI0 master wired to the transceiver
pub struct RpSpi<'d> {
    spi: Spi<'d, SPI0, Blocking>,
    powered: bool,
}

impl<'d> RpSpi<'d> {
    /// Wrap a configured blocking SPI0 driver
    ///
    /// The embassy constructor enables the peripheral and routes the pins,
    /// so the bus starts powered down here and waits for
    /// [`SpiPower::power_up`].
    pub fn new(spi: Spi<'d, SPI0, Blocking>) -> Self {
        let mut bus = Self { spi, powered: true };
        bus.power_down();
        bus
    }
}

impl SpiBus for RpSpi<'_> {
    type Error = spi::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.spi.blocking_write(data)
    }

    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.blocking_transfer_in_place(data)
    }
}

impl SpiPower for RpSpi<'_> {
    fn power_up(&mut self) {
        route_pins(FUNCSEL_SPI);
        pac::SPI0.cr1().modify(|w| w.set_sse(true));
        self.powered = true;

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI0 up at {} Hz", SPI_BAUDRATE);
    }

    fn power_down(&mut self) {
        pac::SPI0.cr1().modify(|w| w.set_sse(false));
        route_pins(FUNCSEL_NULL);
        self.powered = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("SPI0 down");
    }

    fn is_powered(&self) -> bool {
        self.powered
    }
}

/// Chip-select on a plain GPIO
pub struct RpCsPin<'d> {
    pin: Flex<'d>,
    output: bool,
}

impl<'d> RpCsPin<'d> {
    /// Take the pin, floating until the transport initializes it
    pub fn new(mut pin: Flex<'d>) -> Self {
        pin.set_as_input();
        Self { pin, output: false }
    }
}

impl OutputPin for RpCsPin<'_> {
    fn set_high(&mut self) {
        self.pin.set_level(Level::High);
    }

    fn set_low(&mut self) {
        self.pin.set_level(Level::Low);
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl DirectionalPin for RpCsPin<'_> {
    fn set_as_output(&mut self) {
        self.pin.set_as_output();
        self.output = true;
    }

    fn set_as_input(&mut self) {
        self.pin.set_as_input();
        self.output = false;
    }

    fn is_output(&self) -> bool {
        self.output
    }
}
