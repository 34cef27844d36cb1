//! TS-UNB symbol rate configuration
//!
//! TS-UNB symbol rates are integer multiples of a base rate of
//! 49.591064453125 sym/s. The multiplier is fixed at build time; the
//! platform only supports the multipliers used by the standard's uplink
//! modes, and anything else is rejected during const evaluation.

/// Base symbol rate in symbols per second
pub const BASE_SYMBOL_RATE: f64 = 49.591064453125;

/// Multipliers the platform layer can clock
pub const SUPPORTED_MULTIPLIERS: [u16; 2] = [8, 48];

/// Rate multiplier is not one of [`SUPPORTED_MULTIPLIERS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnsupportedRate(pub u16);

impl core::fmt::Display for UnsupportedRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "unsupported TS-UNB symbol rate multiplier {} (supported: 8, 48)",
            self.0
        )
    }
}

/// Supported TS-UNB symbol rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SymbolRate {
    /// Multiplier 8, 396.729 sym/s
    Low,
    /// Multiplier 48, 2380.371 sym/s
    #[default]
    Normal,
}

impl SymbolRate {
    /// Look up a rate by its multiplier
    pub const fn from_multiplier(multiplier: u16) -> Result<Self, UnsupportedRate> {
        match multiplier {
            8 => Ok(SymbolRate::Low),
            48 => Ok(SymbolRate::Normal),
            other => Err(UnsupportedRate(other)),
        }
    }

    /// Multiple of [`BASE_SYMBOL_RATE`]
    pub const fn multiplier(self) -> u16 {
        match self {
            SymbolRate::Low => 8,
            SymbolRate::Normal => 48,
        }
    }

    /// Nominal symbol period in microseconds
    pub const fn period_us(self) -> f32 {
        nominal_period_us(self.multiplier())
    }
}

/// Nominal symbol period in microseconds for an arbitrary multiplier
///
/// Computed in `f64` and narrowed once, so the stored period is the closest
/// `f32` to the exact value.
pub const fn nominal_period_us(multiplier: u16) -> f32 {
    (1_000_000.0 / (BASE_SYMBOL_RATE * multiplier as f64)) as f32
}

/// Compile-time rate selection
///
/// ```
/// use tsunb_core::rate::Rate;
///
/// const PERIOD: f32 = Rate::<48>::PERIOD_US;
/// assert!((PERIOD - 420.1026).abs() < 1e-3);
/// ```
///
/// Naming an unsupported multiplier fails the build:
///
/// ```compile_fail
/// use tsunb_core::rate::Rate;
///
/// const PERIOD: f32 = Rate::<12>::PERIOD_US;
/// ```
pub struct Rate<const MULT: u16>;

impl<const MULT: u16> Rate<MULT> {
    /// The selected rate
    pub const RATE: SymbolRate = match SymbolRate::from_multiplier(MULT) {
        Ok(rate) => rate,
        Err(_) => panic!("unsupported TS-UNB symbol rate multiplier (supported: 8, 48)"),
    };

    /// Nominal symbol period in microseconds
    pub const PERIOD_US: f32 = Self::RATE.period_us();
}
