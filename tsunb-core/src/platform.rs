//! Platform interface consumed by the TS-UNB protocol layer
//!
//! The protocol layer (telegram splitting, MAC, burst construction) only
//! needs a handful of primitives from the board: a symbol timer it can
//! start, stretch and wait on, a way to push bytes to the transceiver, and
//! the node identity. [`TsUnbPlatform`] is that contract; [`Platform`]
//! implements it on top of any [`Alarm`], [`DelayNs`] and SPI transport.
//!
//! A transmit loop looks like:
//!
//! ```ignore
//! platform.spi_init();
//! platform.init_timer();
//! platform.start_timer();
//! for (i, symbol) in burst.iter().enumerate() {
//!     if let Some(gap) = gaps.get(i) {
//!         platform.add_timer_delay(*gap);
//!     }
//!     platform.wait_timer();
//!     platform.spi_send(symbol)?;
//! }
//! platform.stop_timer();
//! platform.spi_deinit();
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelayNs;
use tsunb_hal::alarm::Alarm;
use tsunb_hal::gpio::{DirectionalPin, OutputPin};
use tsunb_hal::spi::{SpiBus, SpiPower};

use crate::clock::SymbolClock;
use crate::identity::NodeIdentity;
use crate::transport::DuplexTransport;

/// Board services required by the TS-UNB uplink
pub trait TsUnbPlatform {
    /// Transceiver bus error
    type Error;

    /// Nominal symbol period in microseconds
    fn symbol_period_us(&self) -> f32;

    /// Reset the symbol timer's fractional accumulator
    fn init_timer(&mut self);

    /// Start ticking; the first tick is one symbol period away
    fn start_timer(&mut self);

    /// Stop ticking
    fn stop_timer(&mut self);

    /// Make the next tick `count` symbol periods after the previous one
    fn add_timer_delay(&mut self, count: u32);

    /// Block until the next symbol boundary
    fn wait_timer(&mut self);

    /// Activate the transceiver bus
    fn spi_init(&mut self);

    /// Release the transceiver bus
    fn spi_deinit(&mut self);

    /// Write bytes to the transceiver
    fn spi_send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Exchange bytes with the transceiver in place
    ///
    /// The answer lags the request by one byte; `data[0]` is meaningless.
    fn spi_send_receive(&mut self, data: &mut [u8]) -> Result<(), Self::Error>;

    /// Feed the watchdog
    ///
    /// No watchdog is supervised by the platform layer, so the default
    /// does nothing.
    fn reset_watchdog(&mut self) {}

    /// Node identity for the MAC
    fn identity(&self) -> &NodeIdentity;

    /// Node identity for the MAC, e.g. to advance the packet counter
    fn identity_mut(&mut self) -> &mut NodeIdentity;
}

/// [`TsUnbPlatform`] built from a symbol clock and an SPI transport
///
/// The clock is borrowed because the alarm interrupt needs to reach it
/// too; everything else is owned.
pub struct Platform<'c, A, D, B, CS> {
    clock: &'c SymbolClock,
    alarm: A,
    delay: D,
    transport: DuplexTransport<B, CS>,
    identity: NodeIdentity,
}

impl<'c, A, D, B, CS> Platform<'c, A, D, B, CS>
where
    A: Alarm,
    B: SpiBus + SpiPower,
    CS: OutputPin + DirectionalPin,
{
    /// Assemble a platform; the clock is left stopped
    pub fn new(
        clock: &'c SymbolClock,
        alarm: A,
        delay: D,
        transport: DuplexTransport<B, CS>,
        identity: NodeIdentity,
    ) -> Self {
        Self {
            clock,
            alarm,
            delay,
            transport,
            identity,
        }
    }

    /// The shared symbol clock
    pub fn clock(&self) -> &'c SymbolClock {
        self.clock
    }

    /// The transceiver transport
    pub fn transport(&mut self) -> &mut DuplexTransport<B, CS> {
        &mut self.transport
    }

    /// Async flavour of [`TsUnbPlatform::wait_timer`]
    pub async fn wait_timer_async(&mut self)
    where
        D: AsyncDelayNs,
    {
        self.clock.wait_tick_async(&self.alarm, &mut self.delay).await
    }
}

impl<A, D, B, CS> TsUnbPlatform for Platform<'_, A, D, B, CS>
where
    A: Alarm,
    D: DelayNs,
    B: SpiBus + SpiPower,
    CS: OutputPin + DirectionalPin,
{
    type Error = B::Error;

    fn symbol_period_us(&self) -> f32 {
        self.clock.period_us()
    }

    fn init_timer(&mut self) {
        self.clock.init();
    }

    fn start_timer(&mut self) {
        self.clock.start(&mut self.alarm);
    }

    fn stop_timer(&mut self) {
        self.clock.stop(&mut self.alarm);
    }

    fn add_timer_delay(&mut self, count: u32) {
        self.clock.add_extra_delay(count, &self.alarm);
    }

    fn wait_timer(&mut self) {
        self.clock.wait_tick(&self.alarm, &mut self.delay);
    }

    fn spi_init(&mut self) {
        self.transport.init();
    }

    fn spi_deinit(&mut self) {
        self.transport.deinit();
    }

    fn spi_send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.transport.send(data)
    }

    fn spi_send_receive(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        self.transport.send_receive(data)
    }

    fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut NodeIdentity {
        &mut self.identity
    }
}
