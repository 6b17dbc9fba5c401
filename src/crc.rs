//! CRC-16/CCITT-FALSE checksum engine.
//!
//! Polynomial `0x1021`, initial register `0xFFFF`, no input or output
//! reflection, no final XOR. This is the variant EMVCo Merchant Presented
//! Mode payloads carry in their final `63` field, but nothing here is
//! specific to payments.

/// Generator polynomial (x^16 + x^12 + x^5 + 1).
const POLYNOMIAL: u16 = 0x1021;

/// Register seed.
const INITIAL: u16 = 0xFFFF;

/// Most significant bit of the 16-bit register.
const TOP_BIT: u16 = 0x8000;

/// Incremental CRC-16/CCITT-FALSE accumulator.
///
/// ```
/// use promptpay_rs::crc::Crc16;
///
/// let mut crc = Crc16::new();
/// crc.update_str("12345");
/// crc.update_str("6789");
/// assert_eq!(crc.to_hex(), "29B1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    /// Current register value.
    register: u16,
}

impl Crc16 {
    /// Creates an accumulator seeded with `0xFFFF`.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { register: INITIAL }
    }

    /// Feeds raw bytes into the register.
    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.register = step(self.register, byte);
        }
    }

    /// Feeds a string, one character at a time, using the low byte of
    /// each code point.
    #[inline]
    pub fn update_str(&mut self, input: &str) {
        for ch in input.chars() {
            self.register = step(self.register, low_byte(ch));
        }
    }

    /// Returns the current register value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.register
    }

    /// Returns the register as four uppercase, zero-padded hex digits.
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:04X}", self.register)
    }
}

impl Default for Crc16 {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the CRC-16/CCITT-FALSE of a byte slice.
#[inline]
#[must_use]
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(data);
    crc.value()
}

/// Computes the checksum of `input` as four uppercase hex digits.
///
/// Each character contributes the low byte of its code point, so for
/// ASCII input this is the CRC of the UTF-8 bytes.
///
/// ```
/// assert_eq!(promptpay_rs::crc::checksum(""), "FFFF");
/// assert_eq!(promptpay_rs::crc::checksum("123456789"), "29B1");
/// ```
#[inline]
#[must_use]
pub fn checksum(input: &str) -> String {
    let mut crc = Crc16::new();
    crc.update_str(input);
    crc.to_hex()
}

/// Clocks one byte through the register, MSB first.
fn step(register: u16, byte: u8) -> u16 {
    let mut reg = register ^ (u16::from(byte) << 8_u32);
    for _ in 0..8_u8 {
        reg = if reg & TOP_BIT == 0 {
            reg << 1_u32
        } else {
            (reg << 1_u32) ^ POLYNOMIAL
        };
    }
    reg
}

/// Low byte of a character's code point.
fn low_byte(ch: char) -> u8 {
    let [low, ..] = u32::from(ch).to_le_bytes();
    low
}
