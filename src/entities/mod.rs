//! Entities module - axis values, tracks and items
//!
//! Pure data with no knowledge of pixels. The timetable widget owns the
//! tracks and drives rendering from them.

pub mod attrs;
pub mod track;
pub mod value;

pub use attrs::{AttrValue, Attrs};
pub use track::{Item, ItemId, ItemOptions, Track, TrackId, TrackOptions};
pub use value::{AxisMode, AxisValue};
