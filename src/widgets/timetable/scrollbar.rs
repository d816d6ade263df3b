//! Scrollbars: an external slider bound to the axis position.
//!
//! The slider works in axis units: `min` is the axis start and `max` the last
//! reachable position (`end - view_size`). Vertical timetables negate `min`,
//! `max` and `value` together so the slider's ascending direction matches a
//! surface that grows downwards.
//!
//! Pushing a value into the slider may make it report a change of its own.
//! The adapter remembers what it pushed and drops the matching echo.

use log::trace;
use std::fmt;

use super::scales::{Side, render_label};
use super::segments::{Segment, SegmentStart, Template, segments};
use crate::entities::AxisValue;

/// Range configuration handed to a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    /// 0 means continuous.
    pub step: f64,
    pub value: f64,
}

/// One-dimensional range control consumed by a scrollbar.
pub trait Slider {
    fn configure(&mut self, range: SliderRange);
    fn value(&self) -> f64;
    fn set_value(&mut self, value: f64);
}

/// Notifications the host forwards from a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderInput {
    SlideStart,
    Change(f64),
    SlideStop,
}

/// Builds the slider for a newly added scrollbar.
pub type SliderFactory = Box<dyn FnMut(Side) -> Box<dyn Slider>>;

/// In-memory slider: clamps to its range and snaps to its step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSlider {
    range: Option<SliderRange>,
    value: f64,
}

impl ValueSlider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<SliderRange> {
        self.range
    }

    fn normalize(&self, value: f64) -> f64 {
        let Some(r) = self.range else {
            return value;
        };
        let mut v = value.clamp(r.min.min(r.max), r.max.max(r.min));
        if r.step > 0.0 {
            v = r.min + ((v - r.min) / r.step).round() * r.step;
            v = v.clamp(r.min.min(r.max), r.max.max(r.min));
        }
        v
    }
}

impl Slider for ValueSlider {
    fn configure(&mut self, range: SliderRange) {
        self.range = Some(range);
        self.value = self.normalize(range.value);
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn set_value(&mut self, value: f64) {
        self.value = self.normalize(value);
    }
}

/// Binds one slider to the axis position.
pub struct ScrollbarAdapter {
    slider: Box<dyn Slider>,
    inverted: bool,
    echo: Option<f64>,
}

impl fmt::Debug for ScrollbarAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollbarAdapter")
            .field("inverted", &self.inverted)
            .field("value", &self.slider.value())
            .finish()
    }
}

impl ScrollbarAdapter {
    pub fn new(slider: Box<dyn Slider>, inverted: bool) -> Self {
        Self {
            slider,
            inverted,
            echo: None,
        }
    }

    fn sign(&self) -> f64 {
        if self.inverted { -1.0 } else { 1.0 }
    }

    /// Set the slider range from axis positions.
    pub fn configure(&mut self, min_position: f64, max_position: f64, step: f64, position: f64) {
        let range = if self.inverted {
            SliderRange {
                min: -max_position,
                max: -min_position,
                step,
                value: -position,
            }
        } else {
            SliderRange {
                min: min_position,
                max: max_position,
                step,
                value: position,
            }
        };
        self.slider.configure(range);
        self.echo = None;
    }

    /// Move the slider to an axis position without treating it as user input.
    pub fn push(&mut self, position: f64) {
        self.slider.set_value(self.sign() * position);
        self.echo = Some(self.slider.value());
    }

    /// Translate a slider change into an axis position.
    ///
    /// Returns `None` for the echo of our own last `push`.
    pub fn accept(&mut self, slider_value: f64) -> Option<f64> {
        if self.echo.take() == Some(slider_value) {
            trace!("scrollbar ignoring echoed value {}", slider_value);
            return None;
        }
        self.slider.set_value(slider_value);
        Some(self.position())
    }

    /// Slider value mapped back to an axis position.
    pub fn position(&self) -> f64 {
        self.sign() * self.slider.value()
    }

    pub fn slider_value(&self) -> f64 {
        self.slider.value()
    }
}

/// Options for `add_scrollbar`.
#[derive(Clone, Default)]
pub struct ScrollbarOptions {
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub template: Option<Template>,
    pub start: SegmentStart,
    /// Slider step in axis units; 0 means continuous.
    pub step: f64,
}

/// Scrollbar on one side: marks plus its slider.
pub struct Scrollbar {
    pub id: String,
    pub side: Side,
    pub size: f64,
    pub class_name: Option<String>,
    pub marks: Vec<AxisValue>,
    pub step: f64,
    template: Option<Template>,
    pub(crate) adapter: ScrollbarAdapter,
}

impl fmt::Debug for Scrollbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scrollbar")
            .field("id", &self.id)
            .field("side", &self.side)
            .field("marks", &self.marks.len())
            .field("adapter", &self.adapter)
            .finish()
    }
}

impl Scrollbar {
    pub(crate) fn new(
        id: String,
        side: Side,
        size: f64,
        marks: Vec<AxisValue>,
        opts: &ScrollbarOptions,
        adapter: ScrollbarAdapter,
    ) -> Self {
        Self {
            id,
            side,
            size,
            class_name: opts.class_name.clone(),
            marks,
            step: opts.step,
            template: opts.template.clone(),
            adapter,
        }
    }

    pub fn segments(&self) -> Vec<Segment> {
        segments(&self.marks)
    }

    pub fn label(&self, segment: &Segment) -> String {
        render_label(self.template.as_ref(), segment)
    }

    /// Axis position the slider currently shows.
    pub fn position(&self) -> f64 {
        self.adapter.position()
    }

    pub fn slider_value(&self) -> f64 {
        self.adapter.slider_value()
    }
}
