//! Core time types. All composition clock arithmetic is exact rational;
//! floating point appears only in log output.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Rational number for edit rates, time bases, and composition clocks
/// (e.g., 24/1 for film frame rate, 30000/1001 for 29.97fps).
///
/// Values are kept reduced with a positive denominator, so derived
/// equality compares mathematical value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    pub const ZERO: Self = Self { num: 0, den: 1 };

    pub const FPS_24: Self = Self { num: 24, den: 1 };
    pub const FPS_25: Self = Self { num: 25, den: 1 };
    pub const FPS_30: Self = Self { num: 30, den: 1 };
    pub const FPS_29_97: Self = Self {
        num: 30000,
        den: 1001,
    };

    /// Build a reduced rational. The sign lives on the numerator.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "Rational denominator must be non-zero");
        Self { num, den }.reduced()
    }

    fn reduced(self) -> Self {
        let (mut num, mut den) = (self.num, self.den);
        if den < 0 {
            num = -num;
            den = -den;
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs());
        if g > 1 {
            num /= g as i64;
            den /= g as i64;
        }
        Self { num, den }
    }

    /// Canonical form of a possibly unreduced value. Host-supplied
    /// rationals (stream time bases) must pass through here before they
    /// are stored or compared, since equality is derived on the fields.
    pub fn normalized(self) -> Self {
        assert!(self.den != 0, "Rational denominator must be non-zero");
        self.reduced()
    }

    /// True when the value is strictly greater than zero.
    pub fn is_positive(self) -> bool {
        self.num > 0
    }

    /// Multiplicative inverse. Panics on zero.
    pub fn inv(self) -> Self {
        assert!(self.num != 0, "cannot invert zero");
        Self::new(self.den, self.num)
    }

    pub fn add(self, other: Self) -> Self {
        let num = self.num as i128 * other.den as i128 + other.num as i128 * self.den as i128;
        let den = self.den as i128 * other.den as i128;
        reduce_i128(num, den)
    }

    pub fn mul(self, other: Self) -> Self {
        reduce_i128(
            self.num as i128 * other.num as i128,
            self.den as i128 * other.den as i128,
        )
    }

    /// Scale by an integer count (e.g., duration in edit units times the
    /// edit unit length).
    pub fn scaled(self, count: i64) -> Self {
        reduce_i128(self.num as i128 * count as i128, self.den as i128)
    }

    /// Exact `self / other`, truncated toward zero, as an integer.
    pub fn div_to_integer(self, other: Self) -> i64 {
        let num = self.num as i128 * other.den as i128;
        let den = self.den as i128 * other.num as i128;
        (num / den) as i64
    }

    /// Lossy conversion for logging and display only.
    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross-multiplication preserves order.
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

fn reduce_i128(num: i128, den: i128) -> Rational {
    let (mut num, mut den) = (num, den);
    if den < 0 {
        num = -num;
        den = -den;
    }
    let g = gcd_u128(num.unsigned_abs(), den.unsigned_abs());
    if g > 1 {
        num /= g as i128;
        den /= g as i128;
    }
    debug_assert!(num <= i64::MAX as i128 && num >= i64::MIN as i128);
    debug_assert!(den <= i64::MAX as i128);
    Rational {
        num: num as i64,
        den: den as i64,
    }
}

/// Greatest common divisor (Euclidean algorithm).
fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reduces_and_normalizes_sign() {
        assert_eq!(Rational::new(48, 2), Rational::new(24, 1));
        assert_eq!(Rational::new(1, -24), Rational::new(-1, 24));
        assert_eq!(Rational::new(-30000, -1001), Rational::FPS_29_97);
    }

    #[test]
    fn normalized_canonicalizes_literal_values() {
        // Field-constructed values (as a host might hand them over) reduce
        // to the same representation `new` produces
        let raw = Rational { num: 2, den: 48 };
        assert_eq!(raw.normalized(), Rational::new(1, 24));
        let negative_den = Rational { num: 1, den: -24 };
        assert_eq!(negative_den.normalized(), Rational::new(-1, 24));
    }

    #[test]
    fn add_is_exact() {
        // 1/24 added 24 times is exactly 1, no float drift
        let unit = Rational::new(1, 24);
        let mut acc = Rational::ZERO;
        for _ in 0..24 {
            acc = acc.add(unit);
        }
        assert_eq!(acc, Rational::new(1, 1));
    }

    #[test]
    fn add_ntsc_rates() {
        let a = Rational::new(1001, 30000);
        let b = Rational::new(1001, 30000);
        assert_eq!(a.add(b), Rational::new(1001, 15000));
    }

    #[test]
    fn ordering_by_value() {
        assert!(Rational::new(1, 24) < Rational::new(1, 23));
        assert!(Rational::new(2, 48) == Rational::new(1, 24));
        assert!(Rational::new(-1, 2) < Rational::ZERO);
    }

    #[test]
    fn inv_and_scaled() {
        assert_eq!(Rational::FPS_24.inv(), Rational::new(1, 24));
        assert_eq!(Rational::new(1, 24).scaled(48), Rational::new(2, 1));
    }

    #[test]
    fn div_to_integer_truncates() {
        // 2 seconds over a 1/24 time base is 48 ticks
        assert_eq!(Rational::new(2, 1).div_to_integer(Rational::new(1, 24)), 48);
        assert_eq!(Rational::new(1, 48).div_to_integer(Rational::new(1, 24)), 0);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Rational::FPS_30.to_string(), "30");
        assert_eq!(Rational::FPS_29_97.to_string(), "30000/1001");
    }

    #[test]
    fn serde_roundtrip() {
        let r = Rational::FPS_29_97;
        let json = serde_json::to_string(&r).unwrap();
        let back: Rational = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
