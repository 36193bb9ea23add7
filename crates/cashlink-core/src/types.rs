//! Strong value types for the device protocols.

use crate::constants::EXPONENT_SIGN_BIT;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Operation code identifying a command or the reply answering it.
///
/// The wire formats carry no correlation identifiers; the code only names
/// the operation, it does not match a reply to a specific submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpCode(pub u8);

impl OpCode {
    /// Get the raw code byte.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl From<u8> for OpCode {
    fn from(code: u8) -> Self {
        OpCode(code)
    }
}

/// Slot position in the validator's bill table.
///
/// Indices are assigned by the device and stay stable for the life of a
/// connection; they are only re-learned after a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelIndex(pub u8);

impl ChannelIndex {
    /// Get the raw index byte.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Storage class of a scanner menu command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    /// Setting applies until the next power cycle.
    Volatile,
    /// Setting is written to non-volatile storage.
    Permanent,
}

impl StorageClass {
    /// Wire byte for this storage class.
    #[must_use]
    pub fn to_wire(self) -> u8 {
        match self {
            StorageClass::Volatile => b'0',
            StorageClass::Permanent => b'1',
        }
    }

    /// Parse a storage class from its wire byte.
    pub fn from_wire(byte: u8) -> crate::Result<Self> {
        match byte {
            b'0' => Ok(StorageClass::Volatile),
            b'1' => Ok(StorageClass::Permanent),
            other => Err(crate::Error::invalid_menu_body(format!(
                "unknown storage class byte {other:#04x}"
            ))),
        }
    }
}

/// A currency value encoded as `mantissa × 10^exponent`.
///
/// The wire representation packs the exponent's sign into the top bit of
/// the exponent byte (set means negative). Values are compared with exact
/// integer arithmetic: ordering decides which note satisfies a bound, so a
/// floating-point approximation is not acceptable.
///
/// # Examples
///
/// ```
/// use cashlink_core::Denomination;
///
/// // mantissa 5, exponent byte 0x82 (sign bit set, magnitude 2) => 0.05
/// let five_cents = Denomination::from_wire(5, 0x82).unwrap();
/// assert_eq!(five_cents.to_string(), "0.05");
///
/// // mantissa 10, exponent byte 0x02 => 1000
/// let thousand = Denomination::from_wire(10, 0x02).unwrap();
/// assert_eq!(thousand.to_string(), "1000");
///
/// assert!(five_cents < thousand);
///
/// // A zero mantissa marks an unused slot, not a zero value.
/// assert!(Denomination::from_wire(0, 0x02).is_none());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Denomination {
    mantissa: u8,
    exponent: i8,
}

impl Denomination {
    /// Build a denomination from its raw parts.
    ///
    /// Returns `None` for a zero mantissa: the device uses it to mark an
    /// unused table slot, which must not surface as a zero-valued note.
    #[must_use]
    pub fn new(mantissa: u8, exponent: i8) -> Option<Self> {
        if mantissa == 0 {
            return None;
        }
        Some(Denomination { mantissa, exponent })
    }

    /// Decode a denomination from its wire bytes.
    ///
    /// The exponent byte's top bit is a sign flag that must be cleared
    /// before reading the magnitude.
    #[must_use]
    pub fn from_wire(mantissa: u8, exponent_byte: u8) -> Option<Self> {
        let magnitude = (exponent_byte & !EXPONENT_SIGN_BIT) as i8;
        let exponent = if exponent_byte & EXPONENT_SIGN_BIT != 0 {
            -magnitude
        } else {
            magnitude
        };
        Self::new(mantissa, exponent)
    }

    /// Raw mantissa byte.
    #[must_use]
    pub fn mantissa(self) -> u8 {
        self.mantissa
    }

    /// Signed decimal exponent.
    #[must_use]
    pub fn exponent(self) -> i8 {
        self.exponent
    }
}

impl PartialEq for Denomination {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Denomination {}

impl PartialOrd for Denomination {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Denomination {
    /// Exact comparison of `m1 × 10^e1` against `m2 × 10^e2`.
    ///
    /// The value with the larger exponent is rescaled onto the smaller
    /// one's scale in u128; if the rescale overflows, the larger-exponent
    /// value is necessarily greater (mantissas are non-zero).
    fn cmp(&self, other: &Self) -> Ordering {
        let (hi, lo, swapped) = if self.exponent >= other.exponent {
            (self, other, false)
        } else {
            (other, self, true)
        };

        let shift = u32::from(hi.exponent.abs_diff(lo.exponent));
        let ordering = match 10u128
            .checked_pow(shift)
            .and_then(|scale| scale.checked_mul(u128::from(hi.mantissa)))
        {
            Some(scaled) => scaled.cmp(&u128::from(lo.mantissa)),
            None => Ordering::Greater,
        };

        if swapped { ordering.reverse() } else { ordering }
    }
}

impl fmt::Display for Denomination {
    /// Exact decimal rendering: `"0.05"`, `"1000"`, `"1.5"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent >= 0 {
            let value = 10u128
                .checked_pow(u32::from(self.exponent.unsigned_abs()))
                .and_then(|scale| scale.checked_mul(u128::from(self.mantissa)));
            return match value {
                Some(v) => write!(f, "{v}"),
                // Exponents this large never come off the wire in practice;
                // stay total rather than panic.
                None => write!(f, "{}e{}", self.mantissa, self.exponent),
            };
        }

        let digits = self.mantissa.to_string();
        let frac = self.exponent.unsigned_abs() as usize;
        let (int_part, frac_part) = if digits.len() > frac {
            let split = digits.len() - frac;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            (
                "0".to_string(),
                format!("{}{}", "0".repeat(frac - digits.len()), digits),
            )
        };

        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            write!(f, "{int_part}")
        } else {
            write!(f, "{int_part}.{frac_part}")
        }
    }
}
