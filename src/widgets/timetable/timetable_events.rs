//! Timetable events.
//!
//! Published on the timetable's `EventBus`; subscribe by type.

use serde::Serialize;

use super::scales::Side;
use crate::entities::{Attrs, AxisValue, ItemId};

/// What started a pan gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MoveSource {
    Surface,
    Scrollbar(Side),
}

/// The committed position differs from the one before the move.
#[derive(Clone, Debug, Serialize)]
pub struct ChangeEvent {
    pub timetable: String,
    pub position: AxisValue,
    pub previous: AxisValue,
}

/// A pointer press and release on an item that stayed within the click tolerance.
#[derive(Clone, Debug, Serialize)]
pub struct ItemClickEvent {
    pub timetable: String,
    pub item: ItemId,
    pub title: String,
    pub data: Attrs,
}

#[derive(Clone, Debug, Serialize)]
pub struct MoveStartEvent {
    pub timetable: String,
    pub position: AxisValue,
    pub source: MoveSource,
}

#[derive(Clone, Debug, Serialize)]
pub struct MoveStopEvent {
    pub timetable: String,
    pub position: AxisValue,
    pub source: MoveSource,
}
