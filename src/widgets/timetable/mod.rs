//! Timetable widget - tracks of items along a scrollable axis
//!
//! Headless: the host supplies a `Renderer`, a `Draggable` surface and
//! sliders, and forwards their input. Everything else (layout in pixels,
//! culling, scale segmentation, scrollbar binding) happens here.

pub mod axis;
pub mod renderer;
pub mod scales;
pub mod scrollbar;
pub mod segments;
pub mod selector;
pub mod surface;
mod sync;
mod timetable;
pub mod timetable_events;

pub use axis::{DragBounds, LayoutContext};
pub use renderer::{DrawFrame, NullRenderer, RecordingRenderer, RenderLog, RenderOp, Renderer};
pub use scales::{Banding, BandingOptions, Orientation, Scale, ScaleOptions, Side};
pub use scrollbar::{Scrollbar, ScrollbarOptions, Slider, SliderFactory, SliderInput, SliderRange, ValueSlider};
pub use segments::{CalendarUnit, Segment, SegmentRule, SegmentStart, Template};
pub use selector::{Selector, SelectorOption};
pub use surface::{DragAxis, Draggable, SurfaceInput, SurfaceOffset};
pub use timetable::{Timetable, TimetableFactory, TimetableOptions, ViewRange};
pub use timetable_events::{ChangeEvent, ItemClickEvent, MoveSource, MoveStartEvent, MoveStopEvent};
