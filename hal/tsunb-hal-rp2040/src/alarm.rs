//! Symbol alarm on the RP2040 TIMER
//!
//! embassy-rp's time driver owns ALARM0, so the symbol clock runs on
//! ALARM1 and its own interrupt line (`TIMER_IRQ_1`). The alarm compares
//! against the low 32 bits of the 1 MHz timer, which is exactly the
//! wrapping microsecond counter the core expects.
//!
//! The interrupt handler has to reach the [`SymbolClock`]. [`bind`]
//! registers a `'static` clock for that; the firmware then forwards the
//! vector to [`on_interrupt`]:
//!
//! ```ignore
//! #[interrupt]
//! fn TIMER_IRQ_1() {
//!     tsunb_hal_rp2040::alarm::on_interrupt();
//! }
//! ```

use core::cell::Cell;

use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_rp::pac;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use tsunb_core::clock::SymbolClock;
use tsunb_hal::alarm::{until, Alarm, TimeSource};

/// TIMER alarm used for the symbol clock
pub const ALARM: usize = 1;

/// Clock served by the alarm interrupt
static BOUND: Mutex<CriticalSectionRawMutex, Cell<Option<&'static SymbolClock>>> =
    Mutex::new(Cell::new(None));

/// Handle to TIMER ALARM1
///
/// Carries no state; every handle talks to the same registers. One lives
/// in the platform for the mainline, the interrupt handler makes its own.
pub struct RpAlarm {
    _private: (),
}

impl RpAlarm {
    /// Create a handle
    ///
    /// ALARM1 must not be used by anything else.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for RpAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for RpAlarm {
    fn now_us(&self) -> u32 {
        pac::TIMER.timerawl().read()
    }
}

impl Alarm for RpAlarm {
    fn arm_at(&mut self, deadline_us: u32) {
        pac::TIMER.alarm(ALARM).write_value(deadline_us);

        // The compare only matches on equality, a passed deadline would
        // wait for the counter to wrap
        if until(deadline_us, self.now_us()) <= 0 {
            pac::TIMER.armed().write(|w| w.set_armed(1 << ALARM));
            interrupt::TIMER_IRQ_1.pend();
        }
    }

    fn disarm(&mut self) {
        pac::TIMER.armed().write(|w| w.set_armed(1 << ALARM));
        pac::TIMER.intr().write(|w| w.set_alarm(ALARM, true));
        interrupt::TIMER_IRQ_1.unpend();
    }
}

/// Route the alarm interrupt to `clock` and enable it
///
/// The interrupt runs at the highest priority so that the embassy executor
/// can not delay a symbol boundary.
pub fn bind(clock: &'static SymbolClock) {
    BOUND.lock(|bound| bound.set(Some(clock)));

    pac::TIMER.intr().write(|w| w.set_alarm(ALARM, true));
    pac::TIMER.inte().modify(|w| w.set_alarm(ALARM, true));

    interrupt::TIMER_IRQ_1.unpend();
    interrupt::TIMER_IRQ_1.set_priority(Priority::P0);
    // SAFETY: the handler only touches the bound clock and ALARM1
    unsafe { interrupt::TIMER_IRQ_1.enable() };

    #[cfg(feature = "defmt")]
    defmt::debug!("symbol alarm bound to ALARM{}", ALARM);
}

/// Body of the `TIMER_IRQ_1` handler
pub fn on_interrupt() {
    pac::TIMER.intr().write(|w| w.set_alarm(ALARM, true));

    if let Some(clock) = BOUND.lock(|bound| bound.get()) {
        clock.on_alarm(&mut RpAlarm::new());
    }
}
