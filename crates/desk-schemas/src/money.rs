//! Fixed-point money type.
//!
//! # Motivation
//!
//! Every amount in the front-desk system (booking totals, paid and remaining
//! balances, tendered payments) is stored as an `i64` count of minor units
//! (1/100 of the currency unit). Raw `i64` arithmetic would let an amount be
//! mixed with booking ids or room counts without any compile-time signal, so
//! `Money` wraps the integer and offers no `From<i64>`.
//!
//! # Scale
//!
//! 1 currency unit = `Money::from_minor(100)`. Inputs with more than two
//! fractional digits are rejected rather than rounded.
//!
//! # Arithmetic
//!
//! Only checked operations are exposed. An overflow in a balance calculation
//! is a hard error for the caller, never a silent wrap or clamp.
//!
//! # Wire format
//!
//! Serialized as a decimal string (`"5000.00"`). Deserialized from either a
//! decimal string or a JSON number; both go through [`Money::from_str`].

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minor units per major currency unit (two decimal places).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

const FRACTION_DIGITS: usize = 2;

/// A monetary amount in minor units (1/100 of the currency unit).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Construct from a raw minor-unit count (e.g. a `BIGINT` column).
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Construct from whole major units. `None` on overflow.
    pub fn from_major(major: i64) -> Option<Self> {
        major.checked_mul(MINOR_UNITS_PER_MAJOR).map(Money)
    }

    /// Raw minor-unit count, for binding into SQL.
    #[inline]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// `true` if strictly greater than zero.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `true` if strictly less than zero.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Clamp negative amounts to zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        if self.0 < 0 {
            Money::ZERO
        } else {
            self
        }
    }
}

// ---------------------------------------------------------------------------
// Display / parse
// ---------------------------------------------------------------------------

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let major = abs / MINOR_UNITS_PER_MAJOR as u64;
        let minor = abs % MINOR_UNITS_PER_MAJOR as u64;
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{major}.{minor:02}")
    }
}

/// Reason a decimal string could not be read as [`Money`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    Empty,
    Malformed(String),
    TooManyFractionDigits(String),
    Overflow(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::Empty => write!(f, "amount is empty"),
            MoneyParseError::Malformed(s) => write!(f, "amount '{s}' is not a decimal number"),
            MoneyParseError::TooManyFractionDigits(s) => {
                write!(f, "amount '{s}' has more than {FRACTION_DIGITS} decimal places")
            }
            MoneyParseError::Overflow(s) => write!(f, "amount '{s}' is out of range"),
        }
    }
}

impl std::error::Error for MoneyParseError {}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Strict decimal parser: `[-]digits[.d[d]]`. No exponent, no `+`,
    /// no thousands separators, no bare leading/trailing dot.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(MoneyParseError::Empty);
        }

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (body, None),
        };

        let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) {
            return Err(MoneyParseError::Malformed(s.to_string()));
        }

        let frac_minor: i64 = match frac_part {
            None => 0,
            Some(f) => {
                if !all_digits(f) {
                    return Err(MoneyParseError::Malformed(s.to_string()));
                }
                if f.len() > FRACTION_DIGITS {
                    return Err(MoneyParseError::TooManyFractionDigits(s.to_string()));
                }
                // "5" means 50 minor units, "05" means 5.
                let padded = format!("{f:0<width$}", width = FRACTION_DIGITS);
                padded
                    .parse::<i64>()
                    .map_err(|_| MoneyParseError::Malformed(s.to_string()))?
            }
        };

        let major: i64 = int_part
            .parse()
            .map_err(|_| MoneyParseError::Overflow(s.to_string()))?;

        let minor = major
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|m| m.checked_add(frac_minor))
            .ok_or_else(|| MoneyParseError::Overflow(s.to_string()))?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Money::from_major(v).ok_or_else(|| E::custom(MoneyParseError::Overflow(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(Money::from_major)
            .ok_or_else(|| E::custom(MoneyParseError::Overflow(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom(MoneyParseError::Malformed(v.to_string())));
        }
        // f64 Display is the shortest round-tripping decimal and never uses
        // an exponent, so 10.5 -> "10.5" and 10.005 -> "10.005" (rejected).
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
