//! Six-Decimal Fixed-Point Values
//!
//! Peg biases and the recorded adjustment/bias fields are rounded to six
//! decimal places. This module owns that rounding rule and the canonical
//! text form of such numbers, which feeds the peg map hash.
//!
//! ## Format: micro-units
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  value = micros / 1_000_000      (micros: i64)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rounding : round-half-away-from-zero of value * 1e6        │
//! │  text     : [-]<int>[.<frac, 6 digits, trailing 0s cut>]    │
//! │  examples : 468081 -> "0.468081"   435780 -> "0.43578"      │
//! │             500000 -> "0.5"        1000000 -> "1"           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The text form never uses an exponent and never pads with trailing
//! zeros. It is produced from the integer micro-units, not from a float
//! formatter, so two implementations agree as long as they agree on the
//! integer.

use std::fmt;

/// Six-decimal fixed-point number stored as i64 micro-units.
pub type Micros = i64;

/// Number of micro-units in 1.0
pub const MICROS_PER_UNIT: Micros = 1_000_000;

/// Scale factor as a float (1e6)
pub const MICROS_SCALE: f64 = 1e6;

/// Number of fractional digits in the text form.
pub const DECIMAL_PLACES: usize = 6;

/// Round a float to micro-units.
///
/// Uses round-half-away-from-zero on `value * 1e6`, which matches the
/// usual "round to 6 decimals" rule for every non-negative input.
#[inline]
pub fn to_micros(value: f64) -> Micros {
    (value * MICROS_SCALE).round() as Micros
}

/// Convert micro-units back to the nearest f64.
#[inline]
pub fn from_micros(micros: Micros) -> f64 {
    micros as f64 / MICROS_SCALE
}

/// Round a float to 6 decimal places.
#[inline]
pub fn round6(value: f64) -> f64 {
    from_micros(to_micros(value))
}

/// Canonical text for a micro-unit value.
pub fn format_micros(micros: Micros) -> String {
    Decimal6(micros).to_string()
}

/// Display wrapper producing the canonical text form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal6(pub Micros);

impl fmt::Display for Decimal6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / MICROS_PER_UNIT as u64;
        let frac = magnitude % MICROS_PER_UNIT as u64;

        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}", whole)?;

        if frac != 0 {
            let digits = format!("{:0width$}", frac, width = DECIMAL_PLACES);
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
