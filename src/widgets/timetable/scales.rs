//! Banding, scales and the side they sit on.

use serde::{Deserialize, Serialize};

use super::segments::{Segment, SegmentStart, Template, segments};
use crate::core::error::{Result, TimetableError};
use crate::entities::AxisValue;

/// Direction the axis runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

/// Which side of the tracks a scale or scrollbar is placed on.
///
/// Primary is top (horizontal) or left (vertical); secondary is bottom or right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Primary,
    Secondary,
    Both,
}

impl Side {
    /// Parse a placement name for the given orientation.
    ///
    /// Horizontal timetables take `top`/`bottom`, vertical ones `left`/`right`;
    /// `both`, `primary` and `secondary` work for either.
    pub fn parse(name: &str, orientation: Orientation) -> Result<Self> {
        match (name, orientation) {
            ("primary", _) => Ok(Side::Primary),
            ("secondary", _) => Ok(Side::Secondary),
            ("both", _) => Ok(Side::Both),
            ("top", Orientation::Horizontal) | ("left", Orientation::Vertical) => Ok(Side::Primary),
            ("bottom", Orientation::Horizontal) | ("right", Orientation::Vertical) => {
                Ok(Side::Secondary)
            }
            _ => Err(TimetableError::config(format!(
                "position '{}' is not valid for a {:?} timetable",
                name, orientation
            ))),
        }
    }

    /// Concrete sides this placement expands to.
    pub fn expand(self) -> &'static [Side] {
        match self {
            Side::Primary => &[Side::Primary],
            Side::Secondary => &[Side::Secondary],
            Side::Both => &[Side::Primary, Side::Secondary],
        }
    }
}

/// Background striping boundaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Banding {
    pub points: Vec<AxisValue>,
}

impl Banding {
    pub fn bands(&self) -> Vec<Segment> {
        segments(&self.points)
    }

    /// Band containing `raw`, as `[start, end)`.
    pub fn band_at(&self, raw: f64) -> Option<Segment> {
        self.bands()
            .into_iter()
            .find(|s| s.start.raw() <= raw && raw < s.end.raw())
    }
}

#[derive(Clone, Default)]
pub struct BandingOptions {
    pub start: SegmentStart,
}

/// Options shared by `add_scale` and `add_scrollbar`.
#[derive(Clone, Default)]
pub struct ScaleOptions {
    /// Explicit id; rejected together with `Side::Both`.
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub template: Option<Template>,
    pub start: SegmentStart,
}

/// A labelled ruler alongside the tracks.
#[derive(Clone)]
pub struct Scale {
    pub id: String,
    pub side: Side,
    /// Breadth across the axis, in pixels.
    pub size: f64,
    pub class_name: Option<String>,
    pub points: Vec<AxisValue>,
    template: Option<Template>,
}

impl std::fmt::Debug for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scale")
            .field("id", &self.id)
            .field("side", &self.side)
            .field("size", &self.size)
            .field("points", &self.points.len())
            .finish()
    }
}

impl Scale {
    pub(crate) fn new(
        id: String,
        side: Side,
        size: f64,
        points: Vec<AxisValue>,
        opts: &ScaleOptions,
    ) -> Self {
        Self {
            id,
            side,
            size,
            class_name: opts.class_name.clone(),
            points,
            template: opts.template.clone(),
        }
    }

    pub fn segments(&self) -> Vec<Segment> {
        segments(&self.points)
    }

    pub fn label(&self, segment: &Segment) -> String {
        render_label(self.template.as_ref(), segment)
    }
}

pub(crate) fn render_label(template: Option<&Template>, segment: &Segment) -> String {
    match template {
        Some(t) => t(segment),
        None => String::new(),
    }
}
