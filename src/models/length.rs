use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Vmin,
    Vmax,
    Vw,
    Vh,
    Em,
    Rem,
    Percent,
}

impl LengthUnit {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_lowercase().as_str() {
            "px" => Some(Self::Px),
            "vmin" => Some(Self::Vmin),
            "vmax" => Some(Self::Vmax),
            "vw" => Some(Self::Vw),
            "vh" => Some(Self::Vh),
            "em" => Some(Self::Em),
            "rem" => Some(Self::Rem),
            "%" => Some(Self::Percent),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Percent => "%",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LengthParseError {
    #[error("empty length")]
    Empty,
    #[error("invalid number in length {0:?}")]
    Number(String),
    #[error("unknown length unit {0:?}")]
    Unit(String),
}

/// A CSS length such as `0.5vmin` or `240px`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn new(value: f32, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    pub const fn vmin(value: f32) -> Self {
        Self::new(value, LengthUnit::Vmin)
    }

    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Length {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LengthParseError::Empty);
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let value: f32 = number
            .parse()
            .map_err(|_| LengthParseError::Number(s.to_string()))?;
        if !value.is_finite() {
            return Err(LengthParseError::Number(s.to_string()));
        }

        // Unitless zero is the only valid bare number in CSS.
        if suffix.is_empty() {
            return if value == 0.0 {
                Ok(Length::px(0.0))
            } else {
                Err(LengthParseError::Unit(String::new()))
            };
        }

        let unit = LengthUnit::from_suffix(suffix.trim())
            .ok_or_else(|| LengthParseError::Unit(suffix.to_string()))?;
        Ok(Length::new(value, unit))
    }
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
