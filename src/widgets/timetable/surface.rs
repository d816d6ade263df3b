//! Draggable surface contract.
//!
//! The surface holds the whole axis; the engine moves it by a single-axis
//! offset. Hosts forward raw pointer input as `SurfaceInput` and the engine
//! turns it into offsets, clamping against `DragBounds`.

use super::axis::DragBounds;
use crate::entities::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAxis {
    X,
    Y,
}

/// Single-axis draggable container.
pub trait Draggable {
    fn configure(&mut self, axis: DragAxis, bounds: DragBounds);
    fn set_offset(&mut self, offset_px: f64);
}

/// Pointer input on the surface, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceInput {
    /// `target` is the item under the pointer, if any.
    PointerDown { x: f64, y: f64, target: Option<ItemId> },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
}

/// Draggable that only remembers its state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceOffset {
    pub axis: Option<DragAxis>,
    pub bounds: Option<DragBounds>,
    pub offset: f64,
}

impl Draggable for SurfaceOffset {
    fn configure(&mut self, axis: DragAxis, bounds: DragBounds) {
        self.axis = Some(axis);
        self.bounds = Some(bounds);
    }

    fn set_offset(&mut self, offset_px: f64) {
        self.offset = offset_px;
    }
}
