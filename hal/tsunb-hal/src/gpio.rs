//! GPIO pin abstractions
//!
//! The platform layer only drives a single GPIO itself: the transceiver's
//! chip-select line. It needs to toggle it and to hand it back to a
//! high-impedance state when the SPI interface is shut down.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Pin whose direction can be switched at runtime
///
/// Used to release a pin when its peripheral is powered down, so that the
/// pin no longer drives the line.
pub trait DirectionalPin {
    /// Configure the pin as a push-pull output
    ///
    /// The output level is whatever was last set with [`OutputPin`].
    fn set_as_output(&mut self);

    /// Configure the pin as a floating input
    fn set_as_input(&mut self);

    /// Check if the pin is currently driving the line
    fn is_output(&self) -> bool;
}
