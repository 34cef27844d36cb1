//! Pico pin assignment for the transceiver
//!
//! The transceiver sits on SPI0 at the Pico's default SPI0 pins, with the
//! hardware CSn pin driven as a plain GPIO so that one chip-select pulse
//! can frame a multi-byte transfer.

/// SPI0 RX (MISO)
pub const SPI0_RX: u8 = 16;

/// Transceiver chip-select
pub const SPI0_CSN: u8 = 17;

/// SPI0 clock
pub const SPI0_SCK: u8 = 18;

/// SPI0 TX (MOSI)
pub const SPI0_TX: u8 = 19;

/// Transceiver SPI clock in Hz
pub const SPI_BAUDRATE: u32 = 4_000_000;

/// Maximum number of GPIO pins on RP2040
pub const GPIO_COUNT: u8 = 30;

/// SPI peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiId {
    /// SPI0
    Spi0,
    /// SPI1
    Spi1,
}

/// Role of a pin in its SPI function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRole {
    /// Receive data (MISO as master)
    Rx,
    /// Hardware chip-select
    Csn,
    /// Serial clock
    Sck,
    /// Transmit data (MOSI as master)
    Tx,
}

/// Determine which SPI function a GPIO carries
///
/// RP2040 repeats the SPI pin pattern in blocks of four (RX, CSn, SCK, TX),
/// alternating between SPI0 and SPI1 every eight pins.
pub const fn spi_function(gpio: u8) -> Option<(SpiId, SpiRole)> {
    if gpio >= GPIO_COUNT {
        return None;
    }
    let id = if (gpio / 8) % 2 == 0 {
        SpiId::Spi0
    } else {
        SpiId::Spi1
    };
    let role = match gpio % 4 {
        0 => SpiRole::Rx,
        1 => SpiRole::Csn,
        2 => SpiRole::Sck,
        _ => SpiRole::Tx,
    };
    Some((id, role))
}

const fn is_spi0(gpio: u8, role: SpiRole) -> bool {
    match spi_function(gpio) {
        Some((SpiId::Spi0, r)) => r as u8 == role as u8,
        _ => false,
    }
}

const _: () = assert!(is_spi0(SPI0_RX, SpiRole::Rx), "SPI0_RX is not an SPI0 RX pin");
const _: () = assert!(is_spi0(SPI0_SCK, SpiRole::Sck), "SPI0_SCK is not an SPI0 SCK pin");
const _: () = assert!(is_spi0(SPI0_TX, SpiRole::Tx), "SPI0_TX is not an SPI0 TX pin");
