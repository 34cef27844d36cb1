//! Drift-compensated TS-UNB symbol clock
//!
//! The symbol period is a real number of microseconds (about 420.1 µs in
//! normal mode) but the alarm can only be armed on whole microseconds. A
//! fractional accumulator carries the rounding remainder from cycle to
//! cycle, so every boundary lands within half a microsecond of its ideal
//! time and the long-run average period is exactly the nominal one.
//!
//! # Execution contexts
//!
//! [`SymbolClock`] is shared between the mainline (transmit loop) and the
//! alarm interrupt. All shared state is atomic:
//!
//! | Field            | Written by                          | Read by        |
//! |------------------|-------------------------------------|----------------|
//! | accumulator      | interrupt, `add_extra_delay`, start | interrupt      |
//! | deadline / delay | interrupt, start                    | tick waiter    |
//! | tick flag        | interrupt (set), waiter (clear)     | tick waiter    |
//! | extra delay      | `add_extra_delay` (set), interrupt  | interrupt      |
//!
//! The interrupt only ever preempts the mainline, never the other way
//! round, so its plain load/store sequences cannot interleave with
//! mainline updates. Mainline updates of interrupt-owned values use
//! read-modify-write atomics.
//!
//! # Deadlines
//!
//! Each firing re-arms the alarm at the *previous deadline* plus the newly
//! rounded delay, not at "now" plus the delay. Interrupt dispatch latency
//! therefore never accumulates into the symbol timing.

use core::hint::spin_loop;

use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelayNs;
use portable_atomic::{AtomicBool, AtomicF32, AtomicU32, Ordering};
use tsunb_hal::alarm::{until, Alarm, TimeSource};

/// Margin left between the coarse sleep and the deadline
///
/// The tick waiter sleeps until this many microseconds before the armed
/// deadline and busy-polls the tick flag for the rest.
pub const SPIN_GUARD_US: u32 = 10;

const ORD: Ordering = Ordering::SeqCst;

/// Outcome of one alarm firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Firing {
    /// Genuine symbol boundary, tick flag set
    Tick,
    /// Extra-delay recalculation only, tick flag untouched
    DelayOnly,
    /// Clock is stopped, alarm was not re-armed
    Idle,
}

/// Split accumulated time into the whole delay to arm and the remainder
///
/// Rounds half up. The remainder is within [-0.5, 0.5).
pub fn split_delay(accumulated_us: f32) -> (u32, f32) {
    // The accumulator never goes below -0.5 here, so the saturating cast
    // only matters for the degenerate zero-length case.
    let whole = (accumulated_us + 0.5) as u32;
    (whole, accumulated_us - whole as f32)
}

/// Symbol clock state shared with the alarm interrupt
///
/// One instance per transmitter. Create it once (typically in a
/// `static_cell::StaticCell`), hand a `&'static` reference to the
/// interrupt binding, and drive it from the transmit loop:
///
/// ```ignore
/// clock.init();
/// clock.start(&mut alarm);
/// for symbol in burst {
///     transport.send(&symbol)?;
///     clock.wait_tick(&alarm, &mut delay);
/// }
/// clock.stop(&mut alarm);
/// ```
pub struct SymbolClock {
    /// Nominal symbol period in microseconds
    period_us: f32,
    /// Rounding remainder carried into the next cycle
    accumulator_us: AtomicF32,
    /// Whole delay armed for the upcoming firing
    next_cycle_us: AtomicU32,
    /// Absolute counter value of the upcoming firing
    deadline_us: AtomicU32,
    /// Set on a genuine boundary, cleared by the waiter
    tick: AtomicBool,
    /// Next firing only recomputes the delay
    extra_delay_pending: AtomicBool,
    /// Counter value when the last extra delay was requested
    delay_requested_at_us: AtomicU32,
    /// Firings are ignored while clear
    running: AtomicBool,
}

impl SymbolClock {
    /// Create a stopped clock with the given nominal period
    ///
    /// `period_us` must be strictly positive. Use
    /// [`Rate::PERIOD_US`](crate::rate::Rate::PERIOD_US) for the TS-UNB
    /// rates.
    pub const fn new(period_us: f32) -> Self {
        assert!(period_us > 0.0, "symbol period must be positive");
        Self {
            period_us,
            accumulator_us: AtomicF32::new(0.0),
            next_cycle_us: AtomicU32::new(0),
            deadline_us: AtomicU32::new(0),
            tick: AtomicBool::new(false),
            extra_delay_pending: AtomicBool::new(false),
            delay_requested_at_us: AtomicU32::new(0),
            running: AtomicBool::new(false),
        }
    }

    /// Nominal symbol period in microseconds
    pub fn period_us(&self) -> f32 {
        self.period_us
    }

    /// Reset the fractional accumulator
    ///
    /// Also drops any pending tick or extra delay. Call while stopped.
    pub fn init(&self) {
        self.accumulator_us.store(0.0, ORD);
        self.tick.store(false, ORD);
        self.extra_delay_pending.store(false, ORD);
    }

    /// Arm the alarm for the first cycle
    ///
    /// From a reset accumulator the first tick fires one nominal period
    /// after this call. A clock that is already running is restarted.
    pub fn start<A: Alarm>(&self, alarm: &mut A) {
        // Keep a latched firing from touching the state we are about to set
        self.running.store(false, ORD);
        alarm.disarm();

        let mut accumulated = self.accumulator_us.load(ORD);
        if accumulated == 0.0 {
            accumulated += self.period_us;
        }

        self.extra_delay_pending.store(false, ORD);
        self.tick.store(false, ORD);

        let (delay, remainder) = split_delay(accumulated);
        self.accumulator_us.store(remainder, ORD);
        self.next_cycle_us.store(delay, ORD);

        let deadline = alarm.now_us().wrapping_add(delay);
        self.deadline_us.store(deadline, ORD);
        self.running.store(true, ORD);
        alarm.arm_at(deadline);
    }

    /// Cancel the outstanding alarm
    ///
    /// No ticks fire until [`start`](Self::start) is called again, and the
    /// next start is a cold start. A waiter blocked in
    /// [`wait_tick`](Self::wait_tick) is not released.
    pub fn stop<A: Alarm>(&self, alarm: &mut A) {
        self.running.store(false, ORD);
        alarm.disarm();
        self.extra_delay_pending.store(false, ORD);
        self.accumulator_us.store(0.0, ORD);
    }

    /// Alarm interrupt handler body
    ///
    /// Must be called exactly once per alarm interrupt. Does not block.
    pub fn on_alarm<A: Alarm>(&self, alarm: &mut A) -> Firing {
        if !self.running.load(ORD) {
            return Firing::Idle;
        }

        let delay_only = self.extra_delay_pending.load(ORD);

        let mut accumulated = self.accumulator_us.load(ORD);
        if !delay_only {
            accumulated += self.period_us;
        }
        let (delay, remainder) = split_delay(accumulated);
        self.accumulator_us.store(remainder, ORD);
        self.next_cycle_us.store(delay, ORD);

        let deadline = self.deadline_us.load(ORD).wrapping_add(delay);
        self.deadline_us.store(deadline, ORD);
        alarm.arm_at(deadline);

        if delay_only {
            self.extra_delay_pending.store(false, ORD);
            Firing::DelayOnly
        } else {
            // Last, so the waiter never sees a tick before its bookkeeping
            self.tick.store(true, ORD);
            Firing::Tick
        }
    }

    /// Stretch the wait for the next tick to `count` symbol periods
    ///
    /// Call from the mainline between two firings, typically right after
    /// [`wait_tick`](Self::wait_tick) returned. The firing that would have
    /// been the next boundary only re-arms the alarm for the remaining
    /// `count - 1` periods; the tick after that is the next boundary.
    ///
    /// A second call before that firing adds its periods on top, but still
    /// only one firing is suppressed. `count == 0` behaves like `count == 1`.
    pub fn add_extra_delay<T: TimeSource>(&self, count: u32, time: &T) {
        self.delay_requested_at_us.store(time.now_us(), ORD);
        let extra_us = self.period_us * count.saturating_sub(1) as f32;
        self.accumulator_us.fetch_add(extra_us, ORD);
        self.extra_delay_pending.store(true, ORD);
    }

    /// Consume the tick flag
    ///
    /// Returns `true` if a boundary occurred since the last call.
    pub fn take_tick(&self) -> bool {
        self.tick.swap(false, ORD)
    }

    /// Block until the next genuine symbol boundary
    ///
    /// Sleeps until [`SPIN_GUARD_US`] before the armed deadline, then spins
    /// on the tick flag. Extra-delay firings move the deadline without
    /// setting the flag, so the wait simply continues. Never returns if the
    /// clock is stopped.
    pub fn wait_tick<T: TimeSource, D: DelayNs>(&self, time: &T, delay: &mut D) {
        loop {
            // Sized before the flag check, so a boundary landing in between
            // can not stretch the sleep into the next period
            let sleep = self.coarse_sleep_us(time);
            if self.take_tick() {
                return;
            }
            match sleep {
                Some(us) => delay.delay_us(us),
                None => spin_loop(),
            }
        }
    }

    /// Async flavour of [`wait_tick`](Self::wait_tick)
    ///
    /// The coarse sleep yields to the executor; the final spin does not.
    pub async fn wait_tick_async<T: TimeSource, D: AsyncDelayNs>(&self, time: &T, delay: &mut D) {
        loop {
            let sleep = self.coarse_sleep_us(time);
            if self.take_tick() {
                return;
            }
            match sleep {
                Some(us) => delay.delay_us(us).await,
                None => spin_loop(),
            }
        }
    }

    /// How long the waiter may sleep before it has to start spinning
    fn coarse_sleep_us<T: TimeSource>(&self, time: &T) -> Option<u32> {
        let remaining = until(self.deadline_us.load(ORD), time.now_us());
        if remaining > SPIN_GUARD_US as i32 {
            Some(remaining as u32 - SPIN_GUARD_US)
        } else {
            None
        }
    }

    /// Check if the clock is armed
    pub fn is_running(&self) -> bool {
        self.running.load(ORD)
    }

    /// Check if a tick is waiting to be consumed
    pub fn is_tick_pending(&self) -> bool {
        self.tick.load(ORD)
    }

    /// Check if the next firing is an extra-delay recalculation
    pub fn is_extra_delay_pending(&self) -> bool {
        self.extra_delay_pending.load(ORD)
    }

    /// Current rounding remainder in microseconds
    pub fn accumulator_us(&self) -> f32 {
        self.accumulator_us.load(ORD)
    }

    /// Whole delay armed for the upcoming firing
    pub fn next_cycle_us(&self) -> u32 {
        self.next_cycle_us.load(ORD)
    }

    /// Counter value of the upcoming firing
    pub fn deadline_us(&self) -> u32 {
        self.deadline_us.load(ORD)
    }

    /// Counter value when the last extra delay was requested
    pub fn delay_requested_at_us(&self) -> u32 {
        self.delay_requested_at_us.load(ORD)
    }
}
