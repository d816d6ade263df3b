//! Widgets - self-contained components driven by host input
//!
//! Each widget publishes its notifications on its own EventBus

pub mod timetable;
