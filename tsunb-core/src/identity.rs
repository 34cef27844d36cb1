//! Node identity forwarded to the TS-UNB MAC
//!
//! The platform layer does not interpret any of this; it only stores the
//! values configured for the node and hands them to the protocol layer.

/// Network key length (AES-128)
pub const NETWORK_KEY_LEN: usize = 16;

/// Default transmit power in dBm
pub const DEFAULT_TX_POWER_DBM: i8 = 14;

/// Per-node configuration consumed by the MAC
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeIdentity {
    /// Network key shared with the base station
    pub network_key: [u8; NETWORK_KEY_LEN],
    /// Globally unique device identifier, most significant byte first
    pub eui64: [u8; 8],
    /// Short address assigned by the network, most significant byte first
    pub short_address: [u8; 2],
    /// Extended packet counter, sent with and incremented after every uplink
    pub ext_pkg_cnt: u32,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
}

impl Default for NodeIdentity {
    fn default() -> Self {
        Self {
            network_key: [0; NETWORK_KEY_LEN],
            eui64: [0; 8],
            short_address: [0; 2],
            ext_pkg_cnt: 0,
            tx_power_dbm: DEFAULT_TX_POWER_DBM,
        }
    }
}

impl NodeIdentity {
    /// Create an identity with the packet counter at its initial value
    pub const fn new(network_key: [u8; NETWORK_KEY_LEN], eui64: [u8; 8], short_address: [u8; 2]) -> Self {
        Self {
            network_key,
            eui64,
            short_address,
            ext_pkg_cnt: 0,
            tx_power_dbm: DEFAULT_TX_POWER_DBM,
        }
    }

    /// Set the initial packet counter
    pub const fn with_ext_pkg_cnt(mut self, ext_pkg_cnt: u32) -> Self {
        self.ext_pkg_cnt = ext_pkg_cnt;
        self
    }

    /// Set the transmit power
    pub const fn with_tx_power(mut self, dbm: i8) -> Self {
        self.tx_power_dbm = dbm;
        self
    }

    /// EUI-64 as an integer
    pub fn eui64_u64(&self) -> u64 {
        u64::from_be_bytes(self.eui64)
    }

    /// Short address as an integer
    pub fn short_address_u16(&self) -> u16 {
        u16::from_be_bytes(self.short_address)
    }

    /// Return the counter for the next uplink and advance it
    pub fn next_ext_pkg_cnt(&mut self) -> u32 {
        let current = self.ext_pkg_cnt;
        self.ext_pkg_cnt = self.ext_pkg_cnt.wrapping_add(1);
        current
    }
}

/// Hex text that does not decode to the expected byte string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexError {
    /// Character that is neither a hex digit nor a separator
    InvalidDigit,
    /// Digits do not pair up into bytes
    OddDigits,
    /// Decodes to the wrong number of bytes
    Length {
        /// Bytes in the text
        found: usize,
        /// Bytes the field holds
        expected: usize,
    },
}

impl core::fmt::Display for HexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HexError::InvalidDigit => write!(f, "is not valid hex"),
            HexError::OddDigits => write!(f, "has an odd number of hex digits"),
            HexError::Length { found, expected } => {
                write!(f, "has {} bytes, expected {}", found, expected)
            }
        }
    }
}

/// Decode an identity field written as hex, e.g. `"70B3D567:70FF0000"`
///
/// One leading `0x` is accepted, and ` `, `:`, `-` or `_` may separate
/// digits. `out` must be filled exactly.
pub fn parse_hex(text: &str, out: &mut [u8]) -> Result<(), HexError> {
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let mut digits = text
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':' | b'-' | b'_'));

    let mut found = 0;
    while let Some(hi) = digits.next() {
        let hi = nibble(hi)?;
        let lo = nibble(digits.next().ok_or(HexError::OddDigits)?)?;
        if let Some(slot) = out.get_mut(found) {
            *slot = (hi << 4) | lo;
        }
        found += 1;
    }

    if found != out.len() {
        return Err(HexError::Length {
            found,
            expected: out.len(),
        });
    }
    Ok(())
}

fn nibble(c: u8) -> Result<u8, HexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(HexError::InvalidDigit),
    }
}
