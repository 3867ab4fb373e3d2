//! Exact-rational frame rates
//!
//! ffprobe reports frame rates as `"N/D"` strings and ffmpeg accepts the same
//! form for `-r`. Floating point values are never used because they cannot
//! represent rates like 30000/1001 exactly.
//!
//! Equality is exact-tuple equality: `60/2` and `30/1` are different values
//! until both are passed through [`FrameRate::normalized`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while interpreting a raw value as a frame rate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameRateError {
    #[error("Frame rate can't be negative")]
    Negative,

    #[error("Divisor of the frame rate can't be zero")]
    ZeroDivisor,

    #[error("Only (int, int), or (int,) can be interpreted as a frame rate")]
    InvalidCollection,

    #[error(
        "Expressing frame rate using a floating point number ({0}) is not supported. \
         To get accurate results you should always specify it as a ratio of two integers."
    )]
    NonIntegralFloat(String),

    #[error("'{0}' could not be interpreted as frame rate")]
    InvalidString(String),

    #[error("Value of type {0} could not be interpreted as frame rate")]
    UnsupportedType(&'static str),
}

/// A frame rate expressed as `dividend / divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct FrameRate {
    dividend: u64,
    divisor: u64,
}

impl FrameRate {
    /// Creates a frame rate, rejecting a zero divisor.
    pub fn new(dividend: u64, divisor: u64) -> Result<Self, FrameRateError> {
        if divisor == 0 {
            return Err(FrameRateError::ZeroDivisor);
        }
        Ok(Self { dividend, divisor })
    }

    /// Creates a whole-number frame rate (`n/1`).
    pub const fn whole(fps: u64) -> Self {
        Self {
            dividend: fps,
            divisor: 1,
        }
    }

    /// Creates a frame rate in a constant context. Panics on a zero divisor.
    pub(crate) const fn ratio(dividend: u64, divisor: u64) -> Self {
        assert!(divisor > 0, "frame rate divisor must be positive");
        Self { dividend, divisor }
    }

    pub fn dividend(&self) -> u64 {
        self.dividend
    }

    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// Interprets a generic value as a frame rate.
    ///
    /// Accepts strings (`"30"`, `"30000/1001"`), integers, floats that are
    /// exactly integral and one or two element integer arrays.
    pub fn decode(raw: &Value) -> Result<Self, FrameRateError> {
        match raw {
            Value::String(s) => Self::from_string(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::from_collection(&[i])
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::whole(u))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    if f.is_finite() && f.fract() == 0.0 {
                        if f < 0.0 {
                            return Err(FrameRateError::Negative);
                        }
                        Ok(Self::whole(f as u64))
                    } else {
                        Err(FrameRateError::NonIntegralFloat(n.to_string()))
                    }
                }
            }
            Value::Array(items) => {
                let ints = items
                    .iter()
                    .map(Value::as_i64)
                    .collect::<Option<Vec<i64>>>()
                    .ok_or(FrameRateError::InvalidCollection)?;
                Self::from_collection(&ints)
            }
            Value::Null => Err(FrameRateError::UnsupportedType("null")),
            Value::Bool(_) => Err(FrameRateError::UnsupportedType("bool")),
            Value::Object(_) => Err(FrameRateError::UnsupportedType("object")),
        }
    }

    /// Builds a frame rate from `[dividend]` or `[dividend, divisor]`.
    pub fn from_collection(parts: &[i64]) -> Result<Self, FrameRateError> {
        let (dividend, divisor) = match parts {
            [dividend] => (*dividend, 1),
            [dividend, divisor] => (*dividend, *divisor),
            _ => return Err(FrameRateError::InvalidCollection),
        };

        if dividend < 0 || divisor < 0 {
            return Err(FrameRateError::Negative);
        }

        Self::new(dividend as u64, divisor as u64)
    }

    /// Parses `"N"` or `"N/D"`. Only the first `/` splits, so `"30/1/2"` fails
    /// on its second component.
    pub fn from_string(value: &str) -> Result<Self, FrameRateError> {
        let parts = value
            .splitn(2, '/')
            .map(|part| part.trim().parse::<i64>())
            .collect::<Result<Vec<i64>, _>>()
            .map_err(|_| FrameRateError::InvalidString(value.to_string()))?;

        Self::from_collection(&parts)
    }

    /// Divides dividend and divisor by their greatest common divisor.
    pub fn normalized(&self) -> Self {
        debug_assert!(self.divisor > 0);

        let common = gcd(self.dividend, self.divisor);
        Self {
            dividend: self.dividend / common,
            divisor: self.divisor / common,
        }
    }

    pub fn to_float(&self) -> f64 {
        self.dividend as f64 / self.divisor as f64
    }
}

pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Passed to ffmpeg verbatim as the -r value
        write!(f, "{}/{}", self.dividend, self.divisor)
    }
}

impl FromStr for FrameRate {
    type Err = FrameRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl TryFrom<Value> for FrameRate {
    type Error = FrameRateError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<FrameRate> for String {
    fn from(rate: FrameRate) -> Self {
        rate.to_string()
    }
}
