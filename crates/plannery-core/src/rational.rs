//! Exact rational arithmetic backed by [`BigRational`].
//!
//! Every [`Rational`] is kept in lowest terms with a strictly positive
//! denominator, so structural equality is value equality and zero is always
//! stored as `0/1`. No operation ever rounds; lossy conversion only happens
//! in [`Rational::approximation`] and in decimal formatting (see
//! [`crate::format`]).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::format::NumberLocale;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by fallible rational arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RationalError {
    #[error("division by zero")]
    DivisionByZero,
}

/// Returned by [`FromStr`] when the input is not a number in any accepted
/// notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rational number: {input:?}")]
pub struct ParseRationalError {
    pub input: String,
}

// ---------------------------------------------------------------------------
// Rational
// ---------------------------------------------------------------------------

/// An exact fraction, always stored fully reduced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rational(BigRational);

impl Rational {
    /// Build `numerator / denominator`, reducing the result.
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, RationalError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self::reduced(numerator.into(), denominator))
    }

    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self(BigRational::from_integer(value.into()))
    }

    /// Reduce `numerator / denominator`. The caller guarantees a nonzero
    /// denominator.
    fn reduced(numerator: BigInt, denominator: BigInt) -> Self {
        debug_assert!(!denominator.is_zero());
        Self(BigRational::new(numerator, denominator))
    }

    pub fn numerator(&self) -> &BigInt {
        self.0.numer()
    }

    /// Always strictly positive.
    pub fn denominator(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// The magnitude of this value.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// `-1`, `0` or `1`.
    pub fn signum(&self) -> i8 {
        if self.is_negative() {
            -1
        } else if self.is_positive() {
            1
        } else {
            0
        }
    }

    /// `1 / self`.
    pub fn recip(&self) -> Result<Self, RationalError> {
        if self.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(self.0.recip()))
    }

    pub fn checked_div(&self, rhs: &Self) -> Result<Self, RationalError> {
        if rhs.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    /// Same magnitude, sign forced to match `other`. A zero `other` counts as
    /// positive.
    pub fn matching_sign(&self, other: &Self) -> Self {
        let magnitude = self.abs();
        if other.is_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn match_sign(&mut self, other: &Self) {
        *self = self.matching_sign(other);
    }

    /// Largest integer not greater than this value.
    pub fn floor(&self) -> BigInt {
        self.0.floor().to_integer()
    }

    /// Smallest integer not less than this value.
    pub fn ceil(&self) -> BigInt {
        self.0.ceil().to_integer()
    }

    /// Nearest double-precision value. Lossy; for display and comparisons
    /// against floating-point inputs only.
    pub fn approximation(&self) -> f64 {
        let (numerator, denominator) = (self.numerator(), self.denominator());
        match (numerator.to_f64(), denominator.to_f64()) {
            (Some(n), Some(d)) if n.is_finite() && d.is_finite() => n / d,
            _ => {
                // Both sides are huge: drop low bits until they fit.
                let bits = numerator.bits().max(denominator.bits());
                let shift = bits.saturating_sub(1000) as usize;
                let n = (numerator >> shift).to_f64().unwrap_or(0.0);
                let d = (denominator >> shift).to_f64().unwrap_or(f64::INFINITY);
                n / d
            }
        }
    }

    /// `"N"` or `"N/D"`, prefixed with `+` for positive values when asked.
    pub fn description(&self, always_show_sign: bool) -> String {
        if always_show_sign && self.is_positive() {
            format!("+{self}")
        } else {
            self.to_string()
        }
    }

    /// Parse with the default locale. See [`Rational::parse_with`].
    pub fn parse(input: &str) -> Option<Self> {
        Self::parse_with(input, &NumberLocale::default())
    }

    /// Parse `"N"`, `"N/D"`, or decimal notation (`"1,234.5"`), where both
    /// sides of a `/` may themselves be decimals. Decimals become exact
    /// fractions over a power of ten. Returns `None` on malformed input or a
    /// zero divisor.
    pub fn parse_with(input: &str, locale: &NumberLocale) -> Option<Self> {
        let mut sides = input.split('/');
        let numerator = parse_decimal(sides.next()?, locale)?;
        match (sides.next(), sides.next()) {
            (None, _) => Some(numerator),
            (Some(denominator), None) => {
                let denominator = parse_decimal(denominator, locale)?;
                numerator.checked_div(&denominator).ok()
            }
            _ => None,
        }
    }
}

/// Parse a single decimal number such as `-1'234.50`.
fn parse_decimal(text: &str, locale: &NumberLocale) -> Option<Rational> {
    let mut parts = text.split(locale.decimal_separator);
    let integer_text = parts.next()?;
    let fractional_text = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let cleaned: String = integer_text
        .chars()
        .filter(|c| !locale.is_grouping_separator(*c))
        .collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if !is_digits(digits) {
        return None;
    }
    let integer: BigInt = digits.parse().ok()?;

    let magnitude = match fractional_text {
        None => Rational::from_integer(integer),
        Some("") => Rational::from_integer(integer),
        Some(fraction) => {
            if !is_digits(fraction) {
                return None;
            }
            let denominator = num_traits::pow(BigInt::from(10u8), fraction.len());
            let fraction: BigInt = fraction.parse().ok()?;
            Rational::reduced(integer * &denominator + fraction, denominator)
        }
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Self(BigRational::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Rational {
    fn one() -> Self {
        Self(BigRational::one())
    }
}

impl From<i32> for Rational {
    fn from(value: i32) -> Self {
        Self::from_integer(value)
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<u32> for Rational {
    fn from(value: u32) -> Self {
        Self::from_integer(value)
    }
}

impl From<BigInt> for Rational {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numerator())
        } else {
            write!(f, "{}/{}", self.numerator(), self.denominator())
        }
    }
}

impl FromStr for Rational {
    type Err = ParseRationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseRationalError {
            input: s.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

impl Add<&Rational> for &Rational {
    type Output = Rational;

    fn add(self, rhs: &Rational) -> Rational {
        Rational(&self.0 + &rhs.0)
    }
}

impl Sub<&Rational> for &Rational {
    type Output = Rational;

    fn sub(self, rhs: &Rational) -> Rational {
        Rational(&self.0 - &rhs.0)
    }
}

impl Mul<&Rational> for &Rational {
    type Output = Rational;

    fn mul(self, rhs: &Rational) -> Rational {
        Rational(&self.0 * &rhs.0)
    }
}

impl Div<&Rational> for &Rational {
    type Output = Rational;

    /// Panics on a zero divisor, like integer division. Use
    /// [`Rational::checked_div`] to handle that case.
    fn div(self, rhs: &Rational) -> Rational {
        match self.checked_div(rhs) {
            Ok(quotient) => quotient,
            Err(err) => panic!("{err}: {self} / {rhs}"),
        }
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident, $assign_imp:ident, $assign_method:ident) => {
        impl $imp<Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                (&self).$method(&rhs)
            }
        }

        impl $imp<&Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                (&self).$method(rhs)
            }
        }

        impl $imp<Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                self.$method(&rhs)
            }
        }

        impl $assign_imp<&Rational> for Rational {
            fn $assign_method(&mut self, rhs: &Rational) {
                *self = (&*self).$method(rhs);
            }
        }

        impl $assign_imp<Rational> for Rational {
            fn $assign_method(&mut self, rhs: Rational) {
                *self = (&*self).$method(&rhs);
            }
        }
    };
}

forward_binop!(Add, add, AddAssign, add_assign);
forward_binop!(Sub, sub, SubAssign, sub_assign);
forward_binop!(Mul, mul, MulAssign, mul_assign);
forward_binop!(Div, div, DivAssign, div_assign);

// Integer scaling.

impl Mul<&BigInt> for &Rational {
    type Output = Rational;

    fn mul(self, rhs: &BigInt) -> Rational {
        Rational(self.0.clone() * rhs.clone())
    }
}

impl Mul<i64> for &Rational {
    type Output = Rational;

    fn mul(self, rhs: i64) -> Rational {
        self * &BigInt::from(rhs)
    }
}

impl Mul<i64> for Rational {
    type Output = Rational;

    fn mul(self, rhs: i64) -> Rational {
        &self * rhs
    }
}

impl Div<i64> for &Rational {
    type Output = Rational;

    fn div(self, rhs: i64) -> Rational {
        assert!(rhs != 0, "division by zero: {self} / 0");
        Rational(self.0.clone() / BigInt::from(rhs))
    }
}

impl Div<i64> for Rational {
    type Output = Rational;

    fn div(self, rhs: i64) -> Rational {
        &self / rhs
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        -self.clone()
    }
}

impl Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

/// Integers that fit `i64` are written as numbers, larger ones as strings.
struct IntegerRepr<'a>(&'a BigInt);

impl Serialize for IntegerRepr<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_i64() {
            Some(value) => serializer.serialize_i64(value),
            None => serializer.collect_str(self.0),
        }
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&IntegerRepr(self.numerator()))?;
        pair.serialize_element(&IntegerRepr(self.denominator()))?;
        pair.end()
    }
}

/// Accepts an integer written as a number or as a decimal string.
struct IntegerValue(BigInt);

impl<'de> Deserialize<'de> for IntegerValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntegerVisitor;

        impl Visitor<'_> for IntegerVisitor {
            type Value = IntegerValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a string of decimal digits")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(IntegerValue(v.into()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(IntegerValue(v.into()))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(IntegerValue(v.into()))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(IntegerValue(v.into()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.trim()
                    .parse()
                    .map(IntegerValue)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(IntegerVisitor)
    }
}

struct RationalVisitor;

impl<'de> Visitor<'de> for RationalVisitor {
    type Value = Rational;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a [numerator, denominator] pair, a number, or a fraction string")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Rational, A::Error> {
        let IntegerValue(numerator) = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let IntegerValue(denominator) = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }
        Rational::new(numerator, denominator).map_err(de::Error::custom)
    }

    /// Legacy keyed form with fixed-width integers.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Rational, A::Error> {
        let mut numerator: Option<i64> = None;
        let mut denominator: Option<i64> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "numerator" => numerator = Some(map.next_value()?),
                "denominator" => denominator = Some(map.next_value()?),
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }
        let numerator = numerator.ok_or_else(|| de::Error::missing_field("numerator"))?;
        let denominator = denominator.ok_or_else(|| de::Error::missing_field("denominator"))?;
        Rational::new(numerator, denominator).map_err(de::Error::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Rational, E> {
        Ok(Rational::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rational, E> {
        Ok(Rational::from_integer(v))
    }

    /// Floats are read through their shortest decimal representation, so
    /// `0.1` becomes exactly `1/10`.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Rational, E> {
        if !v.is_finite() {
            return Err(E::invalid_value(de::Unexpected::Float(v), &self));
        }
        Rational::parse(&v.to_string())
            .ok_or_else(|| E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Rational, E> {
        Rational::parse(v.trim()).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Rational {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RationalVisitor)
    }
}
