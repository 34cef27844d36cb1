//! Chip-select framed SPI transport to the radio transceiver
//!
//! Every transfer pulls the transceiver's chip-select low, clocks the
//! whole buffer through the bus and releases chip-select again. Transfers
//! block for the duration of the exchange and must not be started from
//! interrupt context.
//!
//! # Read latency
//!
//! The transceiver answers each byte while the *next* one is being
//! clocked in. In a duplex exchange byte `i` of the result is therefore
//! the answer to byte `i - 1` of the request, and byte 0 is whatever was
//! left in the shift register. Register reads are written as
//! `[addr, 0x00]` and the value is taken from index 1.

use tsunb_hal::gpio::{DirectionalPin, OutputPin};
use tsunb_hal::spi::{SpiBus, SpiPower};

/// Chip-select held low for as long as this lives
struct Selected<'a, P: OutputPin>(&'a mut P);

impl<'a, P: OutputPin> Selected<'a, P> {
    fn new(pin: &'a mut P) -> Self {
        pin.set_low();
        Self(pin)
    }
}

impl<P: OutputPin> Drop for Selected<'_, P> {
    fn drop(&mut self) {
        self.0.set_high();
    }
}

/// SPI bus plus the transceiver's chip-select line
pub struct DuplexTransport<B, CS> {
    bus: B,
    cs: CS,
}

impl<B, CS> DuplexTransport<B, CS>
where
    B: SpiBus + SpiPower,
    CS: OutputPin + DirectionalPin,
{
    /// Wrap a bus and chip-select pin
    ///
    /// Does not touch the hardware; call [`init`](Self::init) before the
    /// first transfer.
    pub fn new(bus: B, cs: CS) -> Self {
        Self { bus, cs }
    }

    /// Bring the bus into the active role
    ///
    /// Drives chip-select as an output held high (deselected) and powers
    /// up the peripheral. Calling it again leaves the pins unchanged.
    pub fn init(&mut self) {
        // Level first, so switching to output never glitches low
        self.cs.set_high();
        self.cs.set_as_output();
        self.bus.power_up();
    }

    /// Release the bus and its pins
    ///
    /// Powers the peripheral down and floats chip-select. Safe to call
    /// when already released; [`init`](Self::init) re-activates it.
    pub fn deinit(&mut self) {
        self.bus.power_down();
        self.cs.set_as_input();
    }

    /// Check if the bus is powered and chip-select is driven
    pub fn is_active(&self) -> bool {
        self.bus.is_powered() && self.cs.is_output()
    }

    /// Write `data` to the transceiver, discarding whatever it answers
    ///
    /// An empty buffer is a no-op and does not pulse chip-select.
    pub fn send(&mut self, data: &[u8]) -> Result<(), B::Error> {
        if data.is_empty() {
            return Ok(());
        }
        let _cs = Selected::new(&mut self.cs);
        self.bus.write(data)
    }

    /// Exchange `data` with the transceiver in place
    ///
    /// On return `data[i]` holds the answer to the byte written at
    /// `i - 1`; `data[0]` carries no information.
    pub fn send_receive(&mut self, data: &mut [u8]) -> Result<(), B::Error> {
        if data.is_empty() {
            return Ok(());
        }
        let _cs = Selected::new(&mut self.cs);
        self.bus.transfer_in_place(data)
    }

    /// Give back the bus and pin
    pub fn release(self) -> (B, CS) {
        (self.bus, self.cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{MockBus, MockCs, Wire};

    fn transport() -> (DuplexTransport<MockBus, MockCs>, Wire) {
        let wire = Wire::new();
        let transport = DuplexTransport::new(MockBus::new(&wire), MockCs::new(&wire));
        (transport, wire)
    }

    #[test]
    fn test_init_drives_cs_high() {
        let (mut spi, wire) = transport();
        assert!(!spi.is_active());

        spi.init();
        assert!(spi.is_active());
        assert!(wire.cs_high());
        assert!(wire.cs_output());
        // CS was never driven low while switching to output
        assert!(!wire.cs_glitched());
    }

    #[test]
    fn test_init_is_idempotent() {
        let (mut spi, wire) = transport();
        spi.init();
        spi.init();
        assert!(spi.is_active());
        assert!(wire.cs_high());
        assert!(wire.powered());
    }

    #[test]
    fn test_deinit_floats_cs() {
        let (mut spi, wire) = transport();
        spi.init();
        spi.deinit();
        assert!(!spi.is_active());
        assert!(!wire.cs_output());
        assert!(!wire.powered());

        // Again, and back up
        spi.deinit();
        assert!(!wire.cs_output());
        spi.init();
        assert!(spi.is_active());
        assert!(wire.cs_high());
    }

    #[test]
    fn test_send_frames_with_cs() {
        let (mut spi, wire) = transport();
        spi.init();

        spi.send(&[0x80 | 0x01, 0x04]).unwrap();
        spi.send(&[0xAA]).unwrap();

        let frames = wire.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], vec![0x81, 0x04]);
        assert_eq!(frames[1], vec![0xAA]);
        assert!(wire.all_frames_selected());
        assert!(wire.cs_high());
    }

    #[test]
    fn test_send_empty_is_noop() {
        let (mut spi, wire) = transport();
        spi.init();
        spi.send(&[]).unwrap();
        spi.send_receive(&mut []).unwrap();
        assert!(wire.frames().is_empty());
        assert_eq!(wire.cs_toggles(), 0);
    }

    #[test]
    fn test_send_receive_is_shifted_by_one() {
        let (mut spi, wire) = transport();
        spi.init();

        let request = [0x10, 0x20, 0x30, 0x40];
        let mut data = request;
        spi.send_receive(&mut data).unwrap();

        for i in 1..request.len() {
            assert_eq!(data[i], Wire::answer(request[i - 1]));
        }
        assert_eq!(wire.frames()[0], request.to_vec());
        assert!(wire.cs_high());
    }

    #[test]
    fn test_register_read_pattern() {
        let (mut spi, _wire) = transport();
        spi.init();

        let mut data = [0x01, 0x00];
        spi.send_receive(&mut data).unwrap();
        assert_eq!(data[1], Wire::answer(0x01));
    }

    #[test]
    fn test_cs_released_on_bus_error() {
        let (mut spi, wire) = transport();
        spi.init();
        wire.fail_next();

        assert!(spi.send(&[1, 2, 3]).is_err());
        assert!(wire.cs_high());

        wire.fail_next();
        let mut data = [1, 2];
        assert!(spi.send_receive(&mut data).is_err());
        assert!(wire.cs_high());

        // Bus recovers
        assert!(spi.send(&[4]).is_ok());
    }

    #[test]
    fn test_release_returns_parts() {
        let (mut spi, wire) = transport();
        spi.init();
        let (bus, cs) = spi.release();
        assert!(bus.is_powered());
        assert!(cs.is_output());
        assert!(wire.cs_high());
    }
}
