//! Core plumbing - errors, events, ids
//!
//! Independent of any particular widget; the timetable builds on top.

pub mod error;
pub mod event_bus;
pub mod ids;

pub use error::{Result, TimetableError};
pub use event_bus::{BoxedEvent, EventBus, downcast_event};
pub use ids::IdGenerator;
