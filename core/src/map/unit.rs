use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::map::error::{MapError, MapResult};

/// Physical units carried by maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Dimensionless,
    Second,
    SquareMeterSecond,
    SquareCentimeterSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Number,
    Time,
    AreaTime,
}

impl Unit {
    fn dimension(self) -> Dimension {
        match self {
            Unit::Dimensionless => Dimension::Number,
            Unit::Second => Dimension::Time,
            Unit::SquareMeterSecond | Unit::SquareCentimeterSecond => Dimension::AreaTime,
        }
    }

    /// Scale to the SI unit of the same dimension.
    fn si_scale(self) -> f64 {
        match self {
            Unit::Dimensionless | Unit::Second | Unit::SquareMeterSecond => 1.0,
            Unit::SquareCentimeterSecond => 1e-4,
        }
    }

    /// Multiplicative factor taking values in `self` to `target`.
    pub fn conversion_factor(self, target: Unit) -> MapResult<f64> {
        if self.dimension() != target.dimension() {
            return Err(MapError::UnitConversion {
                from: self,
                to: target,
            });
        }
        Ok(self.si_scale() / target.si_scale())
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Dimensionless => "",
            Unit::Second => "s",
            Unit::SquareMeterSecond => "m2 s",
            Unit::SquareCentimeterSecond => "cm2 s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Dimensionless => write!(f, "dimensionless"),
            other => write!(f, "{}", other.symbol()),
        }
    }
}

impl FromStr for Unit {
    type Err = MapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "" | "dimensionless" => Ok(Unit::Dimensionless),
            "s" => Ok(Unit::Second),
            "m2 s" | "s m2" => Ok(Unit::SquareMeterSecond),
            "cm2 s" | "s cm2" => Ok(Unit::SquareCentimeterSecond),
            _ => Err(MapError::UnknownUnit(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_time_conversions() {
        let factor = Unit::SquareCentimeterSecond
            .conversion_factor(Unit::SquareMeterSecond)
            .unwrap();
        assert_eq!(factor, 1e-4);
        let back = Unit::SquareMeterSecond
            .conversion_factor(Unit::SquareCentimeterSecond)
            .unwrap();
        assert_eq!(back, 1e4);
    }

    #[test]
    fn incompatible_dimensions_fail() {
        let err = Unit::Second
            .conversion_factor(Unit::SquareMeterSecond)
            .unwrap_err();
        assert_eq!(
            err,
            MapError::UnitConversion {
                from: Unit::Second,
                to: Unit::SquareMeterSecond
            }
        );
    }

    #[test]
    fn parses_symbols() {
        assert_eq!("".parse::<Unit>().unwrap(), Unit::Dimensionless);
        assert_eq!("m2  s".parse::<Unit>().unwrap(), Unit::SquareMeterSecond);
        assert_eq!("cm2 s".parse::<Unit>().unwrap(), Unit::SquareCentimeterSecond);
        assert!("erg".parse::<Unit>().is_err());
    }
}
