//! TS-UNB uplink platform firmware for the Raspberry Pi Pico
//!
//! Brings up the symbol clock and the transceiver bus and runs a soak
//! loop: every few seconds an opaque burst is clocked out one symbol at a
//! time, with telegram-splitting style gaps, and the measured timing is
//! logged over RTT.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::interrupt;
use embassy_time::Timer;
use static_cell::StaticCell;
use tsunb_core::clock::SymbolClock;
use tsunb_core::identity::NodeIdentity;
use tsunb_core::platform::TsUnbPlatform;
use tsunb_core::rate::Rate;
use tsunb_hal_rp2040::{new_pico, TransceiverPins};
use {defmt_rtt as _, panic_probe as _};

mod soak;

/// Constants generated from node.toml by build.rs
mod node_config {
    include!(concat!(env!("OUT_DIR"), "/node_config.rs"));
}

/// Burst payload, opaque to the platform layer
const PAYLOAD: &[u8] = b"Hello from the TS-UNB platform soak test";

/// Pause between bursts
const BURST_INTERVAL_S: u64 = 4;

/// Nominal symbol period for the configured rate
const SYMBOL_PERIOD_US: f32 = Rate::<{ node_config::SYMBOL_RATE_MULT }>::PERIOD_US;

// Shared with the alarm interrupt, must live forever
static CLOCK: StaticCell<SymbolClock> = StaticCell::new();

#[interrupt]
fn TIMER_IRQ_1() {
    tsunb_hal_rp2040::alarm::on_interrupt();
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("TS-UNB platform firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let identity = NodeIdentity::new(
        node_config::NETWORK_KEY,
        node_config::EUI64,
        node_config::SHORT_ADDRESS,
    )
    .with_ext_pkg_cnt(node_config::EXT_PKG_CNT)
    .with_tx_power(node_config::TX_POWER_DBM);
    info!(
        "Node EUI-64 {:x}, short address {:x}, {} dBm",
        identity.eui64_u64(),
        identity.short_address_u16(),
        identity.tx_power_dbm
    );

    let clock = CLOCK.init(SymbolClock::new(SYMBOL_PERIOD_US));
    let mut platform = new_pico(
        clock,
        TransceiverPins {
            spi: p.SPI0,
            rx: p.PIN_16,
            cs: p.PIN_17,
            sck: p.PIN_18,
            tx: p.PIN_19,
        },
        identity,
    );
    info!(
        "Symbol rate multiplier {}, period {} us",
        node_config::SYMBOL_RATE_MULT,
        SYMBOL_PERIOD_US
    );

    loop {
        // No watchdog is supervised, this keeps the call site in place
        platform.reset_watchdog();

        let counter = platform.identity_mut().next_ext_pkg_cnt();
        match soak::transmit_burst(&mut platform, PAYLOAD).await {
            Ok(stats) => info!("Burst {}: {}", counter, stats),
            Err(e) => error!("Burst {} failed: {}", counter, e),
        }

        Timer::after_secs(BURST_INTERVAL_S).await;
    }
}
