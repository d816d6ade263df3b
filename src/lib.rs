//! TIMETABLE - headless timetable engine
//!
//! Re-exports all modules for use by the binary target.

// Core plumbing (errors, events, ids)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod paths;
pub mod scenario;
pub mod widgets;

// Re-export commonly used types from core
pub use core::error::{Result, TimetableError};
pub use core::event_bus::{downcast_event, BoxedEvent, EventBus};
pub use core::ids::IdGenerator;

// Re-export entities
pub use entities::{AttrValue, Attrs, AxisMode, AxisValue, Item, ItemId, Track, TrackId};

// Re-export the widget entry points
pub use widgets::timetable::{Timetable, TimetableFactory, TimetableOptions};
