//! Axis values: plain numbers or UTC timestamps.
//!
//! A timetable is either numerical or temporal for its whole lifetime. All
//! arithmetic happens on a raw `f64`: the number itself, or epoch
//! milliseconds for dates. `AxisValue` is only the typed face of that raw
//! value at API boundaries, where the mode guard lives.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{Result, TimetableError};

/// Numeric-vs-temporal mode of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    Numerical,
    Temporal,
}

impl fmt::Display for AxisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisMode::Numerical => f.write_str("numerical"),
            AxisMode::Temporal => f.write_str("temporal"),
        }
    }
}

/// A single point on the axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Date(DateTime<Utc>),
}

impl AxisValue {
    pub fn mode(&self) -> AxisMode {
        match self {
            AxisValue::Number(_) => AxisMode::Numerical,
            AxisValue::Date(_) => AxisMode::Temporal,
        }
    }

    /// Raw arithmetic value (epoch milliseconds for dates).
    pub fn raw(&self) -> f64 {
        match self {
            AxisValue::Number(n) => *n,
            AxisValue::Date(d) => d.timestamp_millis() as f64,
        }
    }

    /// Build a value of the given mode from a raw number.
    ///
    /// Temporal values are rounded to the millisecond; values outside
    /// chrono's range saturate to its bounds.
    pub fn from_raw(mode: AxisMode, raw: f64) -> Self {
        match mode {
            AxisMode::Numerical => AxisValue::Number(raw),
            AxisMode::Temporal => AxisValue::Date(millis_to_date(raw)),
        }
    }

    /// Reject values whose mode differs from `mode`.
    pub fn expect_mode(&self, mode: AxisMode) -> Result<f64> {
        if self.mode() != mode {
            return Err(TimetableError::TypeMismatch {
                expected: mode,
                found: self.mode(),
            });
        }
        Ok(self.raw())
    }

    /// Reinterpret the value in `mode` (numbers become epoch millis and back).
    pub fn coerce(&self, mode: AxisMode) -> Self {
        if self.mode() == mode {
            *self
        } else {
            AxisValue::from_raw(mode, self.raw())
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AxisValue::Date(d) => Some(*d),
            AxisValue::Number(_) => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Number(n) => write!(f, "{}", n),
            AxisValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Number(v)
    }
}

impl From<i32> for AxisValue {
    fn from(v: i32) -> Self {
        AxisValue::Number(v as f64)
    }
}

impl From<DateTime<Utc>> for AxisValue {
    fn from(v: DateTime<Utc>) -> Self {
        AxisValue::Date(v)
    }
}

pub(crate) fn millis_to_date(raw: f64) -> DateTime<Utc> {
    let millis = raw.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64;
    match Utc.timestamp_millis_opt(millis).single() {
        Some(d) => d,
        None if millis < 0 => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip_date() {
        let d = Utc.with_ymd_and_hms(2009, 1, 1, 12, 30, 0).unwrap();
        let v = AxisValue::from(d);
        assert_eq!(v.mode(), AxisMode::Temporal);
        assert_eq!(AxisValue::from_raw(AxisMode::Temporal, v.raw()), v);
    }

    #[test]
    fn test_expect_mode() {
        let n = AxisValue::from(5.0);
        assert_eq!(n.expect_mode(AxisMode::Numerical), Ok(5.0));
        assert_eq!(
            n.expect_mode(AxisMode::Temporal),
            Err(TimetableError::TypeMismatch {
                expected: AxisMode::Temporal,
                found: AxisMode::Numerical,
            })
        );
    }

    #[test]
    fn test_coerce_number_to_date() {
        let v = AxisValue::Number(86_400_000.0).coerce(AxisMode::Temporal);
        assert_eq!(v.as_date().unwrap(), Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap());
    }
}
