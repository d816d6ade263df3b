//! Track and Item structures for the timetable.
//!
//! # Architecture
//!
//! - `Item` - one interval `[start, end)` with a title and a data bag
//! - `Track` - a lane owning an ordered list of items (items may overlap)
//!
//! # Ordering
//!
//! Items are kept sorted by `(start, insertion_index)`. The insertion index
//! is assigned once per track and never reused, so two items with the same
//! start keep the order they were added in no matter how the list is sorted.
//!
//! # Queries
//!
//! Point and range queries are linear scans that stop as soon as an item
//! starts past the query end. Nothing after that item can match because the
//! list is start-sorted.
//!
//! Every query argument is checked against the track's axis mode; a date on
//! a numeric timetable (or the reverse) is a `TypeMismatch`.

use log::trace;
use serde::{Deserialize, Serialize};

use super::attrs::Attrs;
use super::value::{AxisMode, AxisValue};
use crate::core::error::{Result, TimetableError};

/// Handle to a track, unique within its timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

/// Handle to an item: owning track plus its immutable insertion index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    pub track: TrackId,
    pub index: u64,
}

/// Optional settings for `Track::add_item`.
#[derive(Debug, Clone, Default)]
pub struct ItemOptions {
    pub class_name: Option<String>,
    pub data: Attrs,
}

/// Single interval on a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    start: AxisValue,
    end: AxisValue,
    pub class_name: Option<String>,
    pub data: Attrs,
}

impl Item {
    pub fn start(&self) -> AxisValue {
        self.start
    }

    pub fn end(&self) -> AxisValue {
        self.end
    }

    pub fn track(&self) -> TrackId {
        self.id.track
    }

    pub fn insertion_index(&self) -> u64 {
        self.id.index
    }

    pub(crate) fn start_raw(&self) -> f64 {
        self.start.raw()
    }

    pub(crate) fn end_raw(&self) -> f64 {
        self.end.raw()
    }

    /// `start <= point < end`
    pub(crate) fn contains_raw(&self, point: f64) -> bool {
        self.start_raw() <= point && point < self.end_raw()
    }

    /// Open-interval overlap: `start < range_end && end > range_start`
    pub(crate) fn overlaps_raw(&self, range_start: f64, range_end: f64) -> bool {
        self.start_raw() < range_end && self.end_raw() > range_start
    }
}

/// Optional settings for `Timetable::add_track`.
#[derive(Debug, Clone, Default)]
pub struct TrackOptions {
    pub class_name: Option<String>,
    pub disabled: bool,
    pub data: Attrs,
}

/// Lane of items along the axis.
///
/// # Invariants
///
/// - `items` is sorted by `(start, insertion_index)`
/// - every item's values share `mode`
/// - insertion indices are unique and increase with every `add_item`
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    /// Breadth across the axis, in pixels.
    pub size: f64,
    pub class_name: Option<String>,
    pub data: Attrs,
    disabled: bool,
    #[serde(skip)]
    mode: AxisMode,
    items: Vec<Item>,
    #[serde(skip)]
    next_index: u64,
}

impl Track {
    pub(crate) fn new(
        id: TrackId,
        mode: AxisMode,
        title: impl Into<String>,
        size: f64,
        opts: TrackOptions,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            size,
            class_name: opts.class_name,
            data: opts.data,
            disabled: opts.disabled,
            mode,
            items: Vec::new(),
            next_index: 0,
        }
    }

    pub fn mode(&self) -> AxisMode {
        self.mode
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Add an item and restore the sort order.
    ///
    /// Both bounds must match the track's mode. `start > end` is accepted;
    /// such an item never matches a point query.
    pub fn add_item(
        &mut self,
        title: impl Into<String>,
        start: impl Into<AxisValue>,
        end: impl Into<AxisValue>,
        opts: ItemOptions,
    ) -> Result<ItemId> {
        let start = start.into();
        let end = end.into();
        start.expect_mode(self.mode)?;
        end.expect_mode(self.mode)?;

        let id = ItemId {
            track: self.id,
            index: self.next_index,
        };
        self.next_index += 1;

        self.items.push(Item {
            id,
            title: title.into(),
            start,
            end,
            class_name: opts.class_name,
            data: opts.data,
        });
        self.items.sort_by(|a, b| {
            a.start_raw()
                .total_cmp(&b.start_raw())
                .then(a.insertion_index().cmp(&b.insertion_index()))
        });
        trace!("track {:?}: added item {:?} ({} items)", self.id, id, self.items.len());
        Ok(id)
    }

    /// Remove an item by id.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Item> {
        let pos = self.position_of(id).ok_or(TimetableError::UnknownItem(id))?;
        Ok(self.items.remove(pos))
    }

    /// Items in `(start, insertion_index)` order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Current index of an item in `items()`.
    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    // ========== Queries ==========

    /// Indices of items with `start <= point < end`.
    pub fn indices_at(&self, point: impl Into<AxisValue>) -> Result<Vec<usize>> {
        let point = point.into().expect_mode(self.mode)?;
        let mut found = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            if item.start_raw() > point {
                break;
            }
            if item.contains_raw(point) {
                found.push(i);
            }
        }
        Ok(found)
    }

    /// Items with `start <= point < end`, ascending start.
    pub fn items_at(&self, point: impl Into<AxisValue>) -> Result<Vec<&Item>> {
        Ok(self
            .indices_at(point)?
            .into_iter()
            .map(|i| &self.items[i])
            .collect())
    }

    /// First item covering `point`.
    pub fn item_at(&self, point: impl Into<AxisValue>) -> Result<Option<&Item>> {
        Ok(self.items_at(point)?.into_iter().next())
    }

    /// Indices of items overlapping the open range `(range_start, range_end)`.
    pub fn indices_in_range(
        &self,
        range_start: impl Into<AxisValue>,
        range_end: impl Into<AxisValue>,
    ) -> Result<Vec<usize>> {
        let a = range_start.into().expect_mode(self.mode)?;
        let b = range_end.into().expect_mode(self.mode)?;
        Ok(self.indices_in_raw_range(a, b))
    }

    /// Items overlapping `(range_start, range_end)`, ascending start.
    pub fn items_in_range(
        &self,
        range_start: impl Into<AxisValue>,
        range_end: impl Into<AxisValue>,
    ) -> Result<Vec<&Item>> {
        Ok(self
            .indices_in_range(range_start, range_end)?
            .into_iter()
            .map(|i| &self.items[i])
            .collect())
    }

    /// Unguarded range scan on raw values, used by the view culler.
    pub(crate) fn indices_in_raw_range(&self, a: f64, b: f64) -> Vec<usize> {
        let mut found = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            if item.start_raw() >= b {
                break;
            }
            if item.overlaps_raw(a, b) {
                found.push(i);
            }
        }
        found
    }
}
