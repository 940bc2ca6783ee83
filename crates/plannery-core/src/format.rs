//! Human-facing rendering of [`Rational`] values.
//!
//! Exact mode prints `N` or `N/D`. Decimal mode rounds to a fixed number of
//! significant digits and then re-parses its own output: when the printed
//! text no longer denotes the exact value, the last digit is underlined with
//! [`IMPRECISION_MARK`] so the reader knows it is an approximation.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::rational::{ParseRationalError, Rational};

/// U+0332 COMBINING LOW LINE, appended after the last digit of an inexact
/// decimal rendering.
pub const IMPRECISION_MARK: char = '\u{0332}';

/// Characters ignored in the integer part of a decimal regardless of locale.
const COMMON_GROUPING_SEPARATORS: [char; 4] = ['.', ',', '\'', ' '];

/// Decimal and grouping separators used for parsing and decimal output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberLocale {
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

impl NumberLocale {
    /// Whether `c` is skipped inside the integer part of a decimal.
    pub fn is_grouping_separator(&self, c: char) -> bool {
        c != self.decimal_separator
            && (c == self.grouping_separator || COMMON_GROUPING_SEPARATORS.contains(&c))
    }
}

/// Formatting options for a rational value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractionFormat {
    /// Prefix strictly positive values with `+`.
    pub always_show_sign: bool,
    /// Render as a rounded decimal instead of an exact fraction.
    pub use_decimal_format: bool,
    /// Maximum significant digits in decimal mode.
    pub significant_digits: u32,
    pub locale: NumberLocale,
}

impl Default for FractionFormat {
    fn default() -> Self {
        Self {
            always_show_sign: false,
            use_decimal_format: false,
            significant_digits: 4,
            locale: NumberLocale::default(),
        }
    }
}

impl FractionFormat {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn decimal() -> Self {
        Self {
            use_decimal_format: true,
            ..Self::default()
        }
    }

    pub fn with_sign(mut self, always_show_sign: bool) -> Self {
        self.always_show_sign = always_show_sign;
        self
    }

    pub fn with_locale(mut self, locale: NumberLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn format(&self, value: &Rational) -> String {
        let sign = if self.always_show_sign && value.is_positive() {
            "+"
        } else {
            ""
        };
        let number = if self.use_decimal_format {
            self.format_decimal(value)
        } else {
            value.to_string()
        };
        format!("{sign}{number}")
    }

    /// Inverse of [`FractionFormat::format`]. Imprecision marks left over from
    /// a decimal rendering are ignored.
    pub fn parse(&self, input: &str) -> Result<Rational, ParseRationalError> {
        let cleaned: String = input
            .trim()
            .chars()
            .filter(|c| *c != IMPRECISION_MARK)
            .collect();
        Rational::parse_with(&cleaned, &self.locale).ok_or_else(|| ParseRationalError {
            input: input.to_string(),
        })
    }

    /// Whether the decimal rendering of `value` loses precision.
    pub fn is_imprecise(&self, value: &Rational) -> bool {
        let text = self.render_decimal(value);
        Rational::parse_with(&text, &self.locale).as_ref() != Some(value)
    }

    fn format_decimal(&self, value: &Rational) -> String {
        let mut text = self.render_decimal(value);
        let reparsed = Rational::parse_with(&text, &self.locale);
        if reparsed.as_ref() != Some(value) {
            tracing::trace!(%value, %text, "decimal rendering is approximate");
            text.push(IMPRECISION_MARK);
        }
        text
    }

    /// Round half away from zero to `significant_digits`, trim trailing
    /// fractional zeros and group the integer part.
    fn render_decimal(&self, value: &Rational) -> String {
        if value.is_zero() {
            return "0".to_string();
        }
        let digits = i64::from(self.significant_digits.max(1));
        let magnitude = value.abs();

        let mut exponent = decimal_exponent(&magnitude);
        let mut mantissa = round_half_up(&(&magnitude * &pow10(digits - 1 - exponent)));
        if mantissa >= num_traits::pow(BigInt::from(10u8), digits as usize) {
            // Rounding carried into a new leading digit.
            exponent += 1;
            mantissa = round_half_up(&(&magnitude * &pow10(digits - 1 - exponent)));
        }
        let scale = digits - 1 - exponent;

        let (integer, fraction) = if scale <= 0 {
            let integer = mantissa * num_traits::pow(BigInt::from(10u8), (-scale) as usize);
            (integer.to_string(), String::new())
        } else {
            let scale = scale as usize;
            let text = format!("{:0>width$}", mantissa.to_string(), width = scale + 1);
            let (integer, fraction) = text.split_at(text.len() - scale);
            (
                integer.to_string(),
                fraction.trim_end_matches('0').to_string(),
            )
        };

        let mut out = String::new();
        if value.is_negative() {
            out.push('-');
        }
        out.push_str(&group_digits(&integer, self.locale.grouping_separator));
        if !fraction.is_empty() {
            out.push(self.locale.decimal_separator);
            out.push_str(&fraction);
        }
        out
    }
}

/// `10^exponent` as an exact rational, for any sign of `exponent`.
fn pow10(exponent: i64) -> Rational {
    let power = num_traits::pow(BigInt::from(10u8), exponent.unsigned_abs() as usize);
    if exponent >= 0 {
        Rational::from_integer(power)
    } else {
        Rational::new(BigInt::one(), power).unwrap_or_default()
    }
}

/// The `e` with `10^e <= magnitude < 10^(e+1)`. `magnitude` is positive.
fn decimal_exponent(magnitude: &Rational) -> i64 {
    let numerator_digits = magnitude.numerator().to_string().len() as i64;
    let denominator_digits = magnitude.denominator().to_string().len() as i64;
    let mut exponent = numerator_digits - denominator_digits;
    while pow10(exponent) > *magnitude {
        exponent -= 1;
    }
    while pow10(exponent + 1) <= *magnitude {
        exponent += 1;
    }
    exponent
}

/// Round a non-negative value to the nearest integer, halves going up.
fn round_half_up(value: &Rational) -> BigInt {
    let twice_denominator = value.denominator() * 2u8;
    (value.numerator() * 2u8 + value.denominator()).div_floor(&twice_denominator)
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d).unwrap()
    }

    #[test]
    fn exact_mode_prints_fraction() {
        let format = FractionFormat::exact();
        assert_eq!(format.format(&r(3, 4)), "3/4");
        assert_eq!(format.format(&Rational::from(12)), "12");
        assert_eq!(format.with_sign(true).format(&r(3, 4)), "+3/4");
    }

    #[test]
    fn decimal_mode_exact_values_are_unmarked() {
        let format = FractionFormat::decimal();
        assert_eq!(format.format(&r(1, 4)), "0.25");
        assert_eq!(format.format(&r(5, 2)), "2.5");
        assert_eq!(format.format(&r(-7, 8)), "-0.875");
        assert_eq!(format.format(&Rational::from(1234)), "1,234");
        assert_eq!(format.format(&Rational::zero()), "0");
    }

    #[test]
    fn decimal_mode_marks_lost_precision() {
        let format = FractionFormat::decimal();
        assert_eq!(format.format(&r(1, 3)), "0.3333\u{332}");
        assert_eq!(format.format(&r(2, 3)), "0.6667\u{332}");
        assert_eq!(format.format(&Rational::from(12345)), "12,350\u{332}");
        assert!(format.is_imprecise(&r(1, 3)));
        assert!(!format.is_imprecise(&r(1, 8)));
    }

    #[test]
    fn rounding_carry_adds_a_digit() {
        let format = FractionFormat::decimal();
        assert_eq!(format.format(&Rational::from(99_999)), "100,000\u{332}");
        assert_eq!(format.format(&r(99_999, 100_000)), "1\u{332}");
    }

    #[test]
    fn small_values_keep_significant_digits() {
        let format = FractionFormat::decimal();
        assert_eq!(format.format(&r(1, 1000)), "0.001");
        assert_eq!(format.format(&r(1, 7000)), "0.0001429\u{332}");
    }

    #[test]
    fn decimal_mode_follows_locale() {
        let format = FractionFormat::decimal().with_locale(NumberLocale {
            decimal_separator: ',',
            grouping_separator: '.',
        });
        assert_eq!(format.format(&r(12_345, 10)), "1.235\u{332}");
        assert_eq!(format.format(&r(5, 4)), "1,25");
    }

    #[test]
    fn sign_prefix_in_decimal_mode() {
        let format = FractionFormat::decimal().with_sign(true);
        assert_eq!(format.format(&r(3, 2)), "+1.5");
        assert_eq!(format.format(&r(-3, 2)), "-1.5");
    }

    #[test]
    fn parse_strips_marks_and_sign() {
        let format = FractionFormat::decimal();
        assert_eq!(format.parse("0.3333\u{332}").unwrap(), r(3333, 10_000));
        assert_eq!(format.parse("+1.5").unwrap(), r(3, 2));
        assert!(format.parse("one").is_err());
    }

    #[test]
    fn grouping_inserts_every_three_digits() {
        assert_eq!(group_digits("1", ','), "1");
        assert_eq!(group_digits("123", ','), "123");
        assert_eq!(group_digits("1234", ','), "1,234");
        assert_eq!(group_digits("1234567", ','), "1,234,567");
    }
}
