//! Presentation contract and the frame model handed to it.
//!
//! `draw()` produces a `DrawFrame` with every box laid out in surface pixels
//! (pixel 0 = axis start). After a draw, visibility changes arrive as
//! show/hide diffs so the host never re-renders untouched items.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use super::scales::{Orientation, Side};
use crate::entities::{ItemId, TrackId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemBox {
    pub id: ItemId,
    pub title: String,
    pub class_name: Option<String>,
    pub offset_px: f64,
    /// Zero for items whose end is not after their start.
    pub length_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackFrame {
    pub id: TrackId,
    pub title: String,
    pub size: f64,
    pub disabled: bool,
    pub class_name: Option<String>,
    pub items: Vec<ItemBox>,
}

/// A labelled span along the axis (band or scale segment).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanFrame {
    pub offset_px: f64,
    pub length_px: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleFrame {
    pub id: String,
    pub side: Side,
    pub size: f64,
    pub class_name: Option<String>,
    pub segments: Vec<SpanFrame>,
}

/// Scrollbar tick, positioned as a fraction (0..=1) of the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkFrame {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollbarFrame {
    pub id: String,
    pub side: Side,
    pub size: f64,
    pub marks: Vec<MarkFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawFrame {
    pub timetable: String,
    pub title: Option<String>,
    pub orientation: Orientation,
    pub viewport_px: f64,
    pub full_extent_px: f64,
    pub offset_px: f64,
    pub bands: Vec<SpanFrame>,
    pub tracks: Vec<TrackFrame>,
    pub scales: Vec<ScaleFrame>,
    pub scrollbars: Vec<ScrollbarFrame>,
}

/// Host-side presentation of a timetable.
///
/// Only `draw` is required; the rest default to no-ops for hosts that
/// re-read the engine state themselves.
pub trait Renderer {
    fn draw(&mut self, frame: &DrawFrame);

    fn show_item(&mut self, _item: ItemId) {}

    fn hide_item(&mut self, _item: ItemId) {}

    /// Shift an item's content so it stays readable; `None` clears the shift.
    fn set_content_offset(&mut self, _item: ItemId, _offset_px: Option<f64>) {}

    /// Accessibility selector now shows option `index`.
    fn select_option(&mut self, _index: usize) {}
}

/// Renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &DrawFrame) {}
}

/// Recorded renderer call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderOp {
    Draw { tracks: usize, items: usize },
    Show { item: ItemId },
    Hide { item: ItemId },
    ContentOffset { item: ItemId, offset_px: Option<f64> },
    Select { index: usize },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RenderLog {
    pub ops: Vec<RenderOp>,
    pub last_frame: Option<DrawFrame>,
}

/// Renderer that records calls into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    log: Arc<Mutex<RenderLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the log; stays valid after the renderer moves into a timetable.
    pub fn log(&self) -> Arc<Mutex<RenderLog>> {
        Arc::clone(&self.log)
    }

    fn push(&self, op: RenderOp) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).ops.push(op);
    }
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, frame: &DrawFrame) {
        let items = frame.tracks.iter().map(|t| t.items.len()).sum();
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.ops.push(RenderOp::Draw {
            tracks: frame.tracks.len(),
            items,
        });
        log.last_frame = Some(frame.clone());
    }

    fn show_item(&mut self, item: ItemId) {
        self.push(RenderOp::Show { item });
    }

    fn hide_item(&mut self, item: ItemId) {
        self.push(RenderOp::Hide { item });
    }

    fn set_content_offset(&mut self, item: ItemId, offset_px: Option<f64>) {
        self.push(RenderOp::ContentOffset { item, offset_px });
    }

    fn select_option(&mut self, index: usize) {
        self.push(RenderOp::Select { index });
    }
}
