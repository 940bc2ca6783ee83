use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Power draw in megawatts. Fixed-power machines have `min == max`;
/// variable-power recipes cycle between the two.
///
/// Stored as `f64` because clock-speed exponents are fractional, which takes
/// the value out of the rationals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerConsumption {
    pub min: f64,
    pub max: f64,
}

impl PowerConsumption {
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Midpoint of the range.
    pub fn average(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl Add for PowerConsumption {
    type Output = PowerConsumption;

    fn add(self, rhs: PowerConsumption) -> PowerConsumption {
        PowerConsumption {
            min: self.min + rhs.min,
            max: self.max + rhs.max,
        }
    }
}

impl Sum for PowerConsumption {
    fn sum<I: Iterator<Item = PowerConsumption>>(iter: I) -> Self {
        iter.fold(PowerConsumption::default(), Add::add)
    }
}

impl fmt::Display for PowerConsumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fixed() {
            write!(f, "{} MW", format_megawatts(self.min))
        } else {
            write!(
                f,
                "{} - {} MW",
                format_megawatts(self.min),
                format_megawatts(self.max)
            )
        }
    }
}

/// Up to three fractional digits, trailing zeros trimmed.
fn format_megawatts(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_ranges_componentwise() {
        let total: PowerConsumption = [
            PowerConsumption::fixed(4.0),
            PowerConsumption::range(250.0, 750.0),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, PowerConsumption::range(254.0, 754.0));
        assert_eq!(total.average(), 504.0);
    }

    #[test]
    fn display() {
        assert_eq!(PowerConsumption::fixed(4.0).to_string(), "4 MW");
        assert_eq!(PowerConsumption::fixed(2.5).to_string(), "2.5 MW");
        assert_eq!(
            PowerConsumption::range(250.0, 1000.0 / 3.0).to_string(),
            "250 - 333.333 MW"
        );
        assert_eq!(PowerConsumption::default().to_string(), "0 MW");
    }
}
