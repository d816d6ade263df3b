//! Segment generation: boundary sequences for banding, scales and scrollbar marks.
//!
//! A rule is one of:
//! - an explicit list of points, used as given
//! - a calendar unit (`am/pm`, `hour`, `day`, `week`, `month`, `year`)
//! - a numeric step
//! - a custom increment function
//!
//! Generated sequences start at the first point (snapped to the unit grid
//! for calendar units) and keep incrementing until a point reaches `stop`,
//! so the last `[points[i], points[i + 1])` pair always covers `stop`.
//! Months and years use calendar arithmetic; every other unit is a fixed
//! number of milliseconds in UTC.

use chrono::{Datelike, Months, NaiveDate, TimeZone, Utc};
use log::trace;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{Result, TimetableError};
use crate::entities::value::millis_to_date;
use crate::entities::{AxisMode, AxisValue};

const HOUR_MS: f64 = 3_600_000.0;
const HALF_DAY_MS: f64 = 12.0 * HOUR_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;
const WEEK_MS: f64 = 7.0 * DAY_MS;

/// Default cap on generated points before a rule is considered runaway.
pub const DEFAULT_MAX_SEGMENTS: usize = 100_000;

/// Named calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarUnit {
    AmPm,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for CalendarUnit {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "am/pm" => Ok(CalendarUnit::AmPm),
            "hour" => Ok(CalendarUnit::Hour),
            "day" => Ok(CalendarUnit::Day),
            "week" => Ok(CalendarUnit::Week),
            "month" => Ok(CalendarUnit::Month),
            "year" => Ok(CalendarUnit::Year),
            other => Err(TimetableError::config(format!("unknown segment unit '{}'", other))),
        }
    }
}

impl CalendarUnit {
    /// Snap down to the unit grid at or before `raw` (epoch millis).
    fn snap(self, raw: f64) -> f64 {
        match self {
            CalendarUnit::AmPm => (raw / HALF_DAY_MS).floor() * HALF_DAY_MS,
            CalendarUnit::Hour => (raw / HOUR_MS).floor() * HOUR_MS,
            CalendarUnit::Day => (raw / DAY_MS).floor() * DAY_MS,
            CalendarUnit::Week => {
                let midnight = (raw / DAY_MS).floor() * DAY_MS;
                let weekday = millis_to_date(midnight).weekday().num_days_from_sunday();
                midnight - weekday as f64 * DAY_MS
            }
            CalendarUnit::Month | CalendarUnit::Year => {
                let date = millis_to_date(raw);
                let month = if self == CalendarUnit::Year { 1 } else { date.month() };
                NaiveDate::from_ymd_opt(date.year(), month, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|d| Utc.from_utc_datetime(&d).timestamp_millis() as f64)
                    .unwrap_or(raw)
            }
        }
    }

    /// Next boundary after `raw`; `None` when the calendar overflows.
    fn advance(self, raw: f64) -> Option<f64> {
        let months = match self {
            CalendarUnit::AmPm => return Some(raw + HALF_DAY_MS),
            CalendarUnit::Hour => return Some(raw + HOUR_MS),
            CalendarUnit::Day => return Some(raw + DAY_MS),
            CalendarUnit::Week => return Some(raw + WEEK_MS),
            CalendarUnit::Month => 1,
            CalendarUnit::Year => 12,
        };
        millis_to_date(raw)
            .checked_add_months(Months::new(months))
            .map(|d| d.timestamp_millis() as f64)
    }
}

/// Custom increment: given a boundary, return the next one.
pub type IncrementFn = Arc<dyn Fn(AxisValue) -> AxisValue + Send + Sync>;

/// How boundary points are produced.
#[derive(Clone)]
pub enum SegmentRule {
    Points(Vec<AxisValue>),
    Unit(CalendarUnit),
    Step(f64),
    Custom(IncrementFn),
}

impl fmt::Debug for SegmentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentRule::Points(p) => f.debug_tuple("Points").field(&p.len()).finish(),
            SegmentRule::Unit(u) => f.debug_tuple("Unit").field(u).finish(),
            SegmentRule::Step(s) => f.debug_tuple("Step").field(s).finish(),
            SegmentRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl SegmentRule {
    /// Parse a unit name such as `"day"` or `"am/pm"`.
    pub fn unit(name: &str) -> Result<Self> {
        Ok(SegmentRule::Unit(name.parse()?))
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(AxisValue) -> AxisValue + Send + Sync + 'static,
    {
        SegmentRule::Custom(Arc::new(f))
    }
}

impl From<CalendarUnit> for SegmentRule {
    fn from(u: CalendarUnit) -> Self {
        SegmentRule::Unit(u)
    }
}

impl From<f64> for SegmentRule {
    fn from(step: f64) -> Self {
        SegmentRule::Step(step)
    }
}

impl From<Vec<AxisValue>> for SegmentRule {
    fn from(points: Vec<AxisValue>) -> Self {
        SegmentRule::Points(points)
    }
}

/// Where the first boundary goes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SegmentStart {
    /// Snap calendar units to their grid; other rules use the range start.
    #[default]
    Auto,
    At(AxisValue),
}

/// One `[start, end)` span between consecutive boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub start: AxisValue,
    pub end: AxisValue,
}

/// Label renderer for segments. A missing template yields empty labels.
pub type Template = Arc<dyn Fn(&Segment) -> String + Send + Sync>;

/// Pair up consecutive points.
pub fn segments(points: &[AxisValue]) -> Vec<Segment> {
    points
        .windows(2)
        .enumerate()
        .map(|(index, w)| Segment {
            index,
            start: w[0],
            end: w[1],
        })
        .collect()
}

/// Index of the latest point `<= raw`, if any. `points` must be ascending.
pub fn latest_at_or_before(points: &[AxisValue], raw: f64) -> Option<usize> {
    let n = points.partition_point(|p| p.raw() <= raw);
    n.checked_sub(1)
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentGenerator {
    mode: AxisMode,
    max_segments: usize,
}

impl SegmentGenerator {
    pub fn new(mode: AxisMode, max_segments: usize) -> Self {
        Self {
            mode,
            max_segments: max_segments.max(2),
        }
    }

    /// Produce boundary points covering `[start, stop]`.
    pub fn generate(
        &self,
        rule: &SegmentRule,
        start: AxisValue,
        stop: AxisValue,
        first: SegmentStart,
    ) -> Result<Vec<AxisValue>> {
        let start = start.expect_mode(self.mode)?;
        let stop = stop.expect_mode(self.mode)?;

        let explicit = match first {
            SegmentStart::Auto => None,
            SegmentStart::At(v) => Some(v.coerce(self.mode).raw()),
        };

        let points = match rule {
            SegmentRule::Points(points) => return self.verbatim(points),
            SegmentRule::Unit(unit) => {
                if self.mode != AxisMode::Temporal {
                    return Err(TimetableError::TypeMismatch {
                        expected: self.mode,
                        found: AxisMode::Temporal,
                    });
                }
                let first = explicit.unwrap_or_else(|| unit.snap(start));
                self.run(first, stop, |p| unit.advance(p))?
            }
            SegmentRule::Step(step) => {
                let step = *step;
                self.run(explicit.unwrap_or(start), stop, |p| Some(p + step))?
            }
            SegmentRule::Custom(f) => {
                let mode = self.mode;
                self.run(explicit.unwrap_or(start), stop, |p| {
                    Some(f(AxisValue::from_raw(mode, p)).coerce(mode).raw())
                })?
            }
        };

        trace!("{:?} generated {} points", rule, points.len());
        Ok(points.into_iter().map(|p| AxisValue::from_raw(self.mode, p)).collect())
    }

    fn verbatim(&self, points: &[AxisValue]) -> Result<Vec<AxisValue>> {
        let points: Vec<AxisValue> = points.iter().map(|p| p.coerce(self.mode)).collect();
        if points.windows(2).any(|w| !(w[0].raw() < w[1].raw())) {
            return Err(TimetableError::config("segment points must be strictly increasing"));
        }
        Ok(points)
    }

    fn run(&self, first: f64, stop: f64, mut next: impl FnMut(f64) -> Option<f64>) -> Result<Vec<f64>> {
        let mut points = vec![first];
        let mut current = first;
        while current < stop {
            if points.len() >= self.max_segments {
                return Err(TimetableError::GenerationNonProgress {
                    iterations: points.len(),
                });
            }
            match next(current) {
                Some(p) if p > current => {
                    points.push(p);
                    current = p;
                }
                _ => {
                    return Err(TimetableError::GenerationNonProgress {
                        iterations: points.len(),
                    });
                }
            }
        }
        Ok(points)
    }
}
