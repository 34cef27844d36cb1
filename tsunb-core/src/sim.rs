//! Host simulation of the alarm hardware for unit tests
//!
//! Time only moves when the code under test reads the counter (one
//! microsecond per read, which is what lets a spin loop make progress),
//! sleeps through [`SimDelay`], or when a test calls [`Sim::advance`].
//! Alarms that become due while time moves are dispatched to
//! [`SymbolClock::on_alarm`] on the spot, like an interrupt preempting the
//! mainline.
//!
//! [`Wire`] models the transceiver end of the SPI bus for the transport
//! tests.

use std::cell::RefCell;
use std::rc::Rc;

use tsunb_hal::alarm::{until, Alarm, TimeSource};
use tsunb_hal::gpio::{DirectionalPin, OutputPin};
use tsunb_hal::spi::{SpiBus, SpiPower};

use crate::clock::{Firing, SymbolClock};

#[derive(Default)]
struct State {
    now: u32,
    armed: Option<u32>,
    latency: u32,
    fired: Vec<(u32, Firing)>,
    sleeps: Vec<(u32, u32)>,
}

/// Simulated counter plus one-shot alarm wired to a clock
pub struct Sim<'a> {
    clock: &'a SymbolClock,
    state: RefCell<State>,
}

impl<'a> Sim<'a> {
    pub fn new(clock: &'a SymbolClock, now: u32) -> Self {
        Self {
            clock,
            state: RefCell::new(State {
                now,
                ..Default::default()
            }),
        }
    }

    /// Alarm handle to pass to the clock
    pub fn alarm(&self) -> SimAlarm<'_, 'a> {
        SimAlarm { sim: self }
    }

    /// Current counter value, without the cost of a read
    pub fn now(&self) -> u32 {
        self.state.borrow().now
    }

    /// Delay between the deadline and the handler running
    pub fn set_latency(&self, us: u32) {
        self.state.borrow_mut().latency = us;
    }

    /// Every firing so far as (deadline, outcome)
    pub fn fired(&self) -> Vec<(u32, Firing)> {
        self.state.borrow().fired.clone()
    }

    /// Every coarse sleep so far as (start, duration)
    pub fn sleeps(&self) -> Vec<(u32, u32)> {
        self.state.borrow().sleeps.clone()
    }

    /// Jump to the armed deadline and run the handler
    ///
    /// Returns `None` if nothing is armed.
    pub fn fire_next(&self) -> Option<(u32, Firing)> {
        let deadline = {
            let mut state = self.state.borrow_mut();
            let deadline = state.armed.take()?;
            let at = if until(deadline, state.now) > 0 {
                deadline
            } else {
                state.now
            };
            state.now = at.wrapping_add(state.latency);
            deadline
        };

        let firing = self.clock.on_alarm(&mut self.alarm());
        self.state.borrow_mut().fired.push((deadline, firing));
        Some((deadline, firing))
    }

    /// Let `us` microseconds pass, firing everything that falls due
    pub fn advance(&self, us: u32) {
        let target = self.now().wrapping_add(us);
        loop {
            let due = matches!(self.state.borrow().armed, Some(d) if until(d, target) <= 0);
            if !due {
                break;
            }
            self.fire_next();
        }

        let mut state = self.state.borrow_mut();
        if until(target, state.now) > 0 {
            state.now = target;
        }
    }
}

pub struct SimAlarm<'s, 'a> {
    sim: &'s Sim<'a>,
}

impl TimeSource for SimAlarm<'_, '_> {
    fn now_us(&self) -> u32 {
        let now = self.sim.now();
        self.sim.advance(1);
        now
    }
}

impl Alarm for SimAlarm<'_, '_> {
    fn arm_at(&mut self, deadline_us: u32) {
        self.sim.state.borrow_mut().armed = Some(deadline_us);
    }

    fn disarm(&mut self) {
        self.sim.state.borrow_mut().armed = None;
    }
}

/// Sleep provider that moves simulated time forward
pub struct SimDelay<'s, 'a>(pub &'s Sim<'a>);

impl embedded_hal::delay::DelayNs for SimDelay<'_, '_> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        let now = self.0.now();
        self.0.state.borrow_mut().sleeps.push((now, us));
        self.0.advance(us);
    }
}

impl embedded_hal_async::delay::DelayNs for SimDelay<'_, '_> {
    async fn delay_ns(&mut self, ns: u32) {
        embedded_hal::delay::DelayNs::delay_ns(self, ns);
    }

    async fn delay_us(&mut self, us: u32) {
        embedded_hal::delay::DelayNs::delay_us(self, us);
    }
}

#[derive(Default)]
struct WireState {
    cs_high: bool,
    cs_output: bool,
    cs_glitched: bool,
    cs_toggles: usize,
    powered: bool,
    shift: u8,
    fail_next: bool,
    frames: Vec<Vec<u8>>,
    selected: Vec<bool>,
}

/// Shared view of the bus, chip-select and transceiver
#[derive(Clone, Default)]
pub struct Wire(Rc<RefCell<WireState>>);

impl Wire {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the transceiver shifts out after receiving `byte`
    pub fn answer(byte: u8) -> u8 {
        byte ^ 0x5A
    }

    pub fn cs_high(&self) -> bool {
        self.0.borrow().cs_high
    }

    pub fn cs_output(&self) -> bool {
        self.0.borrow().cs_output
    }

    /// CS was ever driven low outside a frame
    pub fn cs_glitched(&self) -> bool {
        self.0.borrow().cs_glitched
    }

    pub fn cs_toggles(&self) -> usize {
        self.0.borrow().cs_toggles
    }

    pub fn powered(&self) -> bool {
        self.0.borrow().powered
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.borrow().frames.clone()
    }

    /// Every frame went out with CS driven low
    pub fn all_frames_selected(&self) -> bool {
        self.0.borrow().selected.iter().all(|&s| s)
    }

    /// Make the next transfer fail
    pub fn fail_next(&self) {
        self.0.borrow_mut().fail_next = true;
    }

    fn clock_out(&self, write: &[u8], read: Option<&mut [u8]>) -> Result<(), BusError> {
        let mut state = self.0.borrow_mut();
        if core::mem::take(&mut state.fail_next) {
            return Err(BusError);
        }
        assert!(state.powered, "transfer on a powered-down bus");

        let selected = state.cs_output && !state.cs_high;
        state.selected.push(selected);
        state.frames.push(write.to_vec());

        let mut answers = Vec::with_capacity(write.len());
        for &byte in write {
            answers.push(state.shift);
            state.shift = Self::answer(byte);
        }
        if let Some(read) = read {
            read.copy_from_slice(&answers);
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BusError;

pub struct MockBus(Wire);

impl MockBus {
    pub fn new(wire: &Wire) -> Self {
        Self(wire.clone())
    }
}

impl SpiBus for MockBus {
    type Error = BusError;

    fn write(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.0.clock_out(data, None)
    }

    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), BusError> {
        let write = data.to_vec();
        self.0.clock_out(&write, Some(data))
    }
}

impl SpiPower for MockBus {
    fn power_up(&mut self) {
        self.0 .0.borrow_mut().powered = true;
    }

    fn power_down(&mut self) {
        self.0 .0.borrow_mut().powered = false;
    }

    fn is_powered(&self) -> bool {
        self.0.powered()
    }
}

/// Chip-select pin, low and floating out of reset
pub struct MockCs(Wire);

impl MockCs {
    pub fn new(wire: &Wire) -> Self {
        Self(wire.clone())
    }
}

impl OutputPin for MockCs {
    fn set_high(&mut self) {
        self.0 .0.borrow_mut().cs_high = true;
    }

    fn set_low(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        state.cs_high = false;
        state.cs_toggles += 1;
    }

    fn is_set_high(&self) -> bool {
        self.0.cs_high()
    }
}

impl DirectionalPin for MockCs {
    fn set_as_output(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        if !state.cs_high {
            state.cs_glitched = true;
        }
        state.cs_output = true;
    }

    fn set_as_input(&mut self) {
        self.0 .0.borrow_mut().cs_output = false;
    }

    fn is_output(&self) -> bool {
        self.0.cs_output()
    }
}
