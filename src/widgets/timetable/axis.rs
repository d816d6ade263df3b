//! Axis model: bounds, view window and value↔pixel conversion.
//!
//! Pixel 0 is always the axis start, never the view start. The whole
//! dataset is laid out on one surface and panning moves that surface by a
//! negative offset, so converting a value never depends on where the user
//! has scrolled to.
//!
//! Pixel measurements only exist after `attach()`; until then conversions
//! fail with `NotAttached` while value-level state (position, view range)
//! is already usable.

use log::{debug, warn};

use crate::core::error::{Result, TimetableError};
use crate::entities::{AxisMode, AxisValue};

/// Measurements supplied once the widget is placed in a live layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    /// Length of the visible viewport along the axis, in pixels.
    pub viewport_px: f64,
}

/// Allowed surface offsets while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBounds {
    /// Most negative offset (view window at the axis end).
    pub min_offset: f64,
    /// Always 0 (view window at the axis start).
    pub max_offset: f64,
    /// Extent handed to the draggable collaborator: `2 * full - viewport`.
    pub range_px: f64,
}

#[derive(Debug, Clone)]
pub struct Axis {
    mode: AxisMode,
    start: f64,
    end: f64,
    view_size: f64,
    position: f64,
    viewport_px: Option<f64>,
}

impl Axis {
    /// Build an axis. View bounds outside `[start, end]` are clamped.
    pub fn new(
        start: AxisValue,
        end: AxisValue,
        view_start: AxisValue,
        view_end: AxisValue,
    ) -> Result<Self> {
        let mode = start.mode();
        let mut start = start.raw();
        let mut end = end.expect_mode(mode)?;
        let view_start = view_start.expect_mode(mode)?;
        let view_end = view_end.expect_mode(mode)?;

        if end < start {
            warn!("axis end {} before start {}, swapping", end, start);
            std::mem::swap(&mut start, &mut end);
        }
        if end == start {
            return Err(TimetableError::config("axis start and end must differ"));
        }

        let mut axis = Self {
            mode,
            start,
            end,
            view_size: end - start,
            position: start,
            viewport_px: None,
        };
        axis.set_view_raw(view_start, view_end);
        Ok(axis)
    }

    pub fn mode(&self) -> AxisMode {
        self.mode
    }

    pub fn start(&self) -> AxisValue {
        AxisValue::from_raw(self.mode, self.start)
    }

    pub fn end(&self) -> AxisValue {
        AxisValue::from_raw(self.mode, self.end)
    }

    pub(crate) fn start_raw(&self) -> f64 {
        self.start
    }

    pub(crate) fn end_raw(&self) -> f64 {
        self.end
    }

    /// `view_end - view_start`, the zoom level in axis units.
    pub fn view_size(&self) -> f64 {
        self.view_size
    }

    /// Largest reachable position: the view window touching the axis end.
    /// Rounding in `end - view_size` may land just under `start`.
    pub(crate) fn max_position_raw(&self) -> f64 {
        (self.end - self.view_size).max(self.start)
    }

    pub(crate) fn position_raw(&self) -> f64 {
        self.position
    }

    pub fn position(&self) -> AxisValue {
        AxisValue::from_raw(self.mode, self.position)
    }

    /// View window `[view_start, view_end]` as raw values.
    pub(crate) fn view_raw(&self) -> (f64, f64) {
        (self.position, self.position + self.view_size)
    }

    /// Clamp into `[start, end - view_size]` and store. Returns the stored value.
    pub(crate) fn set_position_raw(&mut self, raw: f64) -> f64 {
        let clamped = if raw.is_nan() {
            self.start
        } else {
            raw.min(self.max_position_raw()).max(self.start)
        };
        self.position = clamped;
        clamped
    }

    /// Replace the view window (zoom). Bounds are clamped into the axis.
    pub(crate) fn set_view_raw(&mut self, view_start: f64, view_end: f64) {
        let (mut a, mut b) = (view_start, view_end);
        if b < a {
            std::mem::swap(&mut a, &mut b);
        }
        let a = a.clamp(self.start, self.end);
        let b = b.clamp(self.start, self.end);
        if b > a {
            self.view_size = b - a;
        } else {
            debug!("empty view window [{}, {}], showing whole axis", a, b);
            self.view_size = self.end - self.start;
        }
        self.set_position_raw(a);
    }

    // ========== Layout ==========

    pub fn attach(&mut self, ctx: LayoutContext) -> Result<()> {
        if !(ctx.viewport_px > 0.0) {
            return Err(TimetableError::config(format!(
                "viewport must be positive, got {}",
                ctx.viewport_px
            )));
        }
        self.viewport_px = Some(ctx.viewport_px);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.viewport_px.is_some()
    }

    pub fn viewport_px(&self) -> Result<f64> {
        self.viewport_px.ok_or(TimetableError::NotAttached)
    }

    /// Axis units per pixel.
    pub fn scale(&self) -> Result<f64> {
        Ok(self.view_size / self.viewport_px()?)
    }

    pub fn value_to_pixels(&self, raw: f64) -> Result<f64> {
        Ok((raw - self.start) / self.scale()?)
    }

    pub fn pixels_to_value(&self, px: f64) -> Result<f64> {
        Ok(px * self.scale()? + self.start)
    }

    /// Length of the whole axis in pixels at the current zoom.
    pub fn full_extent_px(&self) -> Result<f64> {
        self.value_to_pixels(self.end)
    }

    /// Current surface offset (zero or negative).
    pub fn offset(&self) -> Result<f64> {
        Ok(-self.value_to_pixels(self.position)?)
    }

    /// Move to the position shown by a surface offset; returns the clamped offset.
    pub(crate) fn set_offset(&mut self, offset: f64) -> Result<f64> {
        let raw = self.pixels_to_value(-offset)?;
        self.set_position_raw(raw);
        self.offset()
    }

    pub fn drag_bounds(&self) -> Result<DragBounds> {
        let full = self.full_extent_px()?;
        let viewport = self.viewport_px()?;
        Ok(DragBounds {
            min_offset: -(full - viewport),
            max_offset: 0.0,
            range_px: 2.0 * full - viewport,
        })
    }
}
