//! Symbol clock soak burst
//!
//! Clocks an opaque payload out to the transceiver one byte per symbol,
//! split into sub-packets separated by extra-delay gaps the way telegram
//! splitting does, and measures every wake-up against its ideal time.

use defmt::Format;
use tsunb_core::platform::TsUnbPlatform;
use tsunb_hal::TimeSource;
use tsunb_hal_rp2040::{RpAlarm, RpPicoTsUnb};

/// Symbols per sub-packet
pub const SUB_PACKET_LEN: usize = 8;

/// Gap between sub-packets in symbol periods
pub const GAP_SYMBOLS: u32 = 24;

/// Timing of one burst
#[derive(Debug, Clone, Copy, Format)]
pub struct BurstStats {
    /// Symbol periods from the first to the last boundary
    pub symbols: u32,
    /// Measured time from the first to the last boundary
    pub elapsed_us: u32,
    /// Largest wake-up error relative to the first boundary
    pub worst_error_us: f32,
}

/// Send `payload` one byte per symbol
///
/// The timer and the bus are always shut down on return.
pub async fn transmit_burst(
    platform: &mut RpPicoTsUnb<'_>,
    payload: &[u8],
) -> Result<BurstStats, embassy_rp::spi::Error> {
    let time = RpAlarm::new();
    let period = platform.symbol_period_us();

    platform.spi_init();
    platform.init_timer();
    platform.start_timer();

    let mut symbols = 0u32;
    let mut origin = None;
    let mut elapsed_us = 0;
    let mut worst_error_us = 0.0f32;

    for (i, byte) in payload.iter().enumerate() {
        if i > 0 {
            if i % SUB_PACKET_LEN == 0 {
                platform.add_timer_delay(GAP_SYMBOLS);
                symbols += GAP_SYMBOLS;
            } else {
                symbols += 1;
            }
        }

        platform.wait_timer_async().await;
        let now = time.now_us();
        let start = *origin.get_or_insert(now);
        elapsed_us = now.wrapping_sub(start);

        let error = elapsed_us as f32 - symbols as f32 * period;
        let error = if error < 0.0 { -error } else { error };
        if error > worst_error_us {
            worst_error_us = error;
        }

        if let Err(e) = platform.spi_send(&[*byte]) {
            platform.stop_timer();
            platform.spi_deinit();
            return Err(e);
        }
    }

    platform.stop_timer();
    platform.spi_deinit();

    Ok(BurstStats {
        symbols,
        elapsed_us,
        worst_error_us,
    })
}
