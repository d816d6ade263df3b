//! Gestures and view synchronization.
//!
//! One gesture at a time, started by the surface or a scrollbar:
//!
//! ```text
//! Idle --PointerDown/SlideStart--> Dragging --PointerUp/SlideStop--> Idle
//! ```
//!
//! While dragging, every position update is mirrored to the draggable
//! surface, the other scrollbars and the selector, but culling is suspended
//! and every item is shown. The commit re-culls, emits `MoveStop`, and emits
//! `Change` only if the position actually moved.

use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

use super::scales::{Orientation, Side};
use super::scrollbar::SliderInput;
use super::surface::SurfaceInput;
use super::timetable::Timetable;
use super::timetable_events::{ChangeEvent, ItemClickEvent, MoveSource, MoveStartEvent, MoveStopEvent};
use crate::core::error::{Result, TimetableError};
use crate::entities::{AxisValue, ItemId};

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Gesture {
    pub(super) source: MoveSource,
    pub(super) start_position: f64,
    /// Pointer position where the press landed.
    pub(super) origin: (f64, f64),
    /// Pointer position matching `anchor_offset`. Moves when the view is
    /// repositioned from outside the gesture.
    pub(super) anchor: (f64, f64),
    pub(super) anchor_offset: f64,
    pub(super) last: (f64, f64),
    /// Item pressed at the start; dropped once the pointer leaves the tolerance.
    pub(super) pending_click: Option<ItemId>,
}

/// What the host was last told about item visibility.
#[derive(Debug, Default)]
pub(super) struct ViewState {
    pub(super) gesture: Option<Gesture>,
    pub(super) visible: BTreeSet<ItemId>,
    pub(super) hanging: BTreeMap<ItemId, f64>,
}

impl Timetable {
    /// Move to `value` (clamped). Emits `Change` if the position moved.
    pub fn set_current_position(&mut self, value: impl Into<AxisValue>) -> Result<AxisValue> {
        let raw = value.into().expect_mode(self.mode())?;
        let previous = self.axis.position_raw();
        self.axis.set_position_raw(raw);
        self.after_move(previous, None)?;
        Ok(self.current_position())
    }

    /// Jump to a selector option.
    pub fn select_option(&mut self, index: usize) -> Result<AxisValue> {
        let value = self
            .selector
            .options()
            .get(index)
            .map(|o| o.value)
            .ok_or_else(|| TimetableError::config(format!("no selector option {}", index)))?;
        self.set_current_position(value)
    }

    /// Feed pointer input from the draggable surface.
    pub fn handle_surface(&mut self, input: SurfaceInput) -> Result<()> {
        match input {
            SurfaceInput::PointerDown { x, y, target } => {
                if self.view.gesture.is_some() {
                    debug!("{}: pointer down ignored, gesture in progress", self.id);
                    return Ok(());
                }
                let target = target.filter(|id| {
                    self.tracks
                        .get(&id.track)
                        .is_some_and(|t| !t.disabled() && t.item(*id).is_some())
                });
                self.begin(MoveSource::Surface, (x, y), target)
            }
            SurfaceInput::PointerMove { x, y } => self.drag_surface(x, y),
            SurfaceInput::PointerUp { x, y } => {
                if !self.gesture_from(MoveSource::Surface) {
                    return Ok(());
                }
                self.drag_surface(x, y)?;
                if let Some(item) = self.commit()?.and_then(|g| g.pending_click) {
                    self.emit_click(item);
                }
                Ok(())
            }
        }
    }

    /// Feed slider notifications from the scrollbar on `side`.
    pub fn handle_slider(&mut self, side: Side, input: SliderInput) -> Result<()> {
        if self.scrollbar(side).is_none() {
            debug!("{}: slider input for missing {:?} scrollbar", self.id, side);
            return Ok(());
        }
        let source = MoveSource::Scrollbar(side);
        match input {
            SliderInput::SlideStart => {
                if self.view.gesture.is_none() {
                    self.begin(source, (0.0, 0.0), None)?;
                }
                Ok(())
            }
            SliderInput::Change(value) => {
                let Some(position) = self
                    .scrollbar_mut(side)
                    .and_then(|bar| bar.adapter.accept(value))
                else {
                    return Ok(());
                };
                if self.view.gesture.is_some() && !self.gesture_from(source) {
                    debug!("{}: {:?} scrollbar input ignored, gesture in progress", self.id, side);
                    let current = self.axis.position_raw();
                    if let Some(bar) = self.scrollbar_mut(side) {
                        bar.adapter.push(current);
                    }
                    return Ok(());
                }
                let previous = self.axis.position_raw();
                self.axis.set_position_raw(position);
                if self.gesture_from(source) {
                    self.sync_views(Some(source))
                } else {
                    self.after_move(previous, Some(source))
                }
            }
            SliderInput::SlideStop => {
                if self.gesture_from(source) {
                    self.commit()?;
                }
                Ok(())
            }
        }
    }

    fn gesture_from(&self, source: MoveSource) -> bool {
        self.view.gesture.as_ref().is_some_and(|g| g.source == source)
    }

    fn begin(&mut self, source: MoveSource, origin: (f64, f64), pending_click: Option<ItemId>) -> Result<()> {
        let anchor_offset = self.axis.offset()?;

        for item in std::mem::take(&mut self.view.hanging).into_keys() {
            self.renderer.set_content_offset(item, None);
        }
        let all = self.all_item_ids();
        for item in all.difference(&self.view.visible) {
            self.renderer.show_item(*item);
        }
        self.view.visible = all;

        self.view.gesture = Some(Gesture {
            source,
            start_position: self.axis.position_raw(),
            origin,
            anchor: origin,
            anchor_offset,
            last: origin,
            pending_click,
        });
        debug!("{}: move start ({:?})", self.id, source);
        self.events.emit(MoveStartEvent {
            timetable: self.id.clone(),
            position: self.current_position(),
            source,
        });
        Ok(())
    }

    fn drag_surface(&mut self, x: f64, y: f64) -> Result<()> {
        let tolerance = self.drag_tolerance;
        let vertical = self.orientation == Orientation::Vertical;
        let Some(gesture) = self.view.gesture.as_mut() else {
            return Ok(());
        };
        if gesture.source != MoveSource::Surface {
            return Ok(());
        }

        let (dx, dy) = (x - gesture.origin.0, y - gesture.origin.1);
        if gesture.pending_click.is_some() && (dx.abs() > tolerance || dy.abs() > tolerance) {
            trace!("pointer left click tolerance ({}, {})", dx, dy);
            gesture.pending_click = None;
        }
        gesture.last = (x, y);
        let shift = if vertical {
            y - gesture.anchor.1
        } else {
            x - gesture.anchor.0
        };
        let target = gesture.anchor_offset + shift;
        self.axis.set_offset(target)?;
        self.sync_views(Some(MoveSource::Surface))
    }

    /// Restart the running drag from the current view, so the next pointer
    /// move applies on top of a programmatic move or zoom.
    pub(super) fn rebase_gesture(&mut self) -> Result<()> {
        if self.view.gesture.is_none() {
            return Ok(());
        }
        let offset = self.axis.offset()?;
        if let Some(gesture) = self.view.gesture.as_mut() {
            gesture.anchor = gesture.last;
            gesture.anchor_offset = offset;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<Option<Gesture>> {
        let Some(gesture) = self.view.gesture.take() else {
            return Ok(None);
        };
        self.cull()?;
        debug!("{}: move stop at {}", self.id, self.current_position());
        self.events.emit(MoveStopEvent {
            timetable: self.id.clone(),
            position: self.current_position(),
            source: gesture.source,
        });
        self.notify_change(gesture.start_position);
        Ok(Some(gesture))
    }

    fn emit_click(&self, item: ItemId) {
        let Some(it) = self.item(item) else {
            return;
        };
        debug!("{}: item click {:?}", self.id, item);
        self.events.emit(ItemClickEvent {
            timetable: self.id.clone(),
            item,
            title: it.title.clone(),
            data: it.data.clone(),
        });
    }

    /// Programmatic move: mirror, cull unless a gesture is running, notify.
    fn after_move(&mut self, previous: f64, source: Option<MoveSource>) -> Result<()> {
        if self.axis.is_attached() {
            self.sync_views(source)?;
            if self.view.gesture.is_none() {
                self.cull()?;
            } else {
                self.rebase_gesture()?;
            }
        } else {
            self.configure_scrollbars();
        }
        self.notify_change(previous);
        Ok(())
    }

    pub(super) fn notify_change(&self, previous: f64) {
        if self.axis.position_raw() == previous {
            return;
        }
        self.events.emit(ChangeEvent {
            timetable: self.id.clone(),
            position: self.current_position(),
            previous: AxisValue::from_raw(self.mode(), previous),
        });
    }

    /// Mirror the position everywhere except `source`.
    pub(super) fn sync_views(&mut self, source: Option<MoveSource>) -> Result<()> {
        let offset = self.axis.offset()?;
        self.draggable.set_offset(offset);

        let position = self.axis.position_raw();
        for side in [Side::Primary, Side::Secondary] {
            if source == Some(MoveSource::Scrollbar(side)) {
                continue;
            }
            if let Some(bar) = self.scrollbar_mut(side) {
                bar.adapter.push(position);
            }
        }

        let scale = self.axis.scale()?;
        if let Some(index) = self.selector.sync(position, scale) {
            self.renderer.select_option(index);
        }
        Ok(())
    }

    /// Show items overlapping the view, hide the rest, and offset the
    /// content of items that start before the view but continue into it.
    pub(super) fn cull(&mut self) -> Result<()> {
        if !self.axis.is_attached() {
            return Ok(());
        }
        let known = self.all_item_ids();
        self.view.visible.retain(|id| known.contains(id));
        self.view.hanging.retain(|id, _| known.contains(id));

        let (view_start, view_end) = self.axis.view_raw();
        let view_start_px = self.axis.value_to_pixels(view_start)?;

        let mut visible = BTreeSet::new();
        let mut hanging = BTreeMap::new();
        for track in self.tracks.values() {
            for i in track.indices_in_raw_range(view_start, view_end) {
                let item = &track.items()[i];
                visible.insert(item.id);
                if self.keep_content_in_view
                    && item.start_raw() < view_start
                    && item.end_raw() > view_start
                {
                    let shift = view_start_px - self.axis.value_to_pixels(item.start_raw())?;
                    hanging.insert(item.id, shift);
                }
            }
        }

        for item in self.view.visible.difference(&visible) {
            self.renderer.hide_item(*item);
        }
        for item in visible.difference(&self.view.visible) {
            self.renderer.show_item(*item);
        }
        for item in self.view.hanging.keys() {
            if !hanging.contains_key(item) {
                self.renderer.set_content_offset(*item, None);
            }
        }
        for (item, shift) in &hanging {
            if self.view.hanging.get(item) != Some(shift) {
                self.renderer.set_content_offset(*item, Some(*shift));
            }
        }
        trace!("{}: {} items visible, {} hanging", self.id, visible.len(), hanging.len());
        self.view.visible = visible;
        self.view.hanging = hanging;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::config::Settings;
    use crate::core::event_bus::EventBus;
    use crate::entities::{ItemOptions, TrackOptions};
    use crate::widgets::timetable::axis::{DragBounds, LayoutContext};
    use crate::widgets::timetable::renderer::{RecordingRenderer, RenderLog, RenderOp};
    use crate::widgets::timetable::scales::ScaleOptions;
    use crate::widgets::timetable::scrollbar::ScrollbarOptions;
    use crate::widgets::timetable::segments::{CalendarUnit, Segment, SegmentRule, Template};
    use crate::widgets::timetable::surface::{DragAxis, Draggable};
    use crate::widgets::timetable::timetable::{TimetableFactory, TimetableOptions};

    #[derive(Debug, Default)]
    struct SurfaceState {
        axis: Option<DragAxis>,
        bounds: Option<DragBounds>,
        offset: f64,
    }

    #[derive(Clone, Default)]
    struct SharedSurface(Arc<Mutex<SurfaceState>>);

    impl Draggable for SharedSurface {
        fn configure(&mut self, axis: DragAxis, bounds: DragBounds) {
            let mut s = self.0.lock().unwrap();
            s.axis = Some(axis);
            s.bounds = Some(bounds);
        }

        fn set_offset(&mut self, offset_px: f64) {
            self.0.lock().unwrap().offset = offset_px;
        }
    }

    struct Fixture {
        tt: Timetable,
        log: Arc<Mutex<RenderLog>>,
        surface: SharedSurface,
        changes: Arc<Mutex<Vec<ChangeEvent>>>,
        clicks: Arc<Mutex<Vec<ItemClickEvent>>>,
        moves: Arc<Mutex<Vec<String>>>,
    }

    impl Fixture {
        fn ops(&self) -> Vec<RenderOp> {
            self.log.lock().unwrap().ops.clone()
        }

        fn clear_ops(&self) {
            self.log.lock().unwrap().ops.clear();
        }

        fn position(&self) -> f64 {
            self.tt.current_position().raw()
        }
    }

    fn record<E: Clone + Send + Sync + 'static>(bus: &EventBus) -> Arc<Mutex<Vec<E>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe::<E, _>(move |e: &E| sink.lock().unwrap().push(e.clone()));
        seen
    }

    /// Horizontal 0..100, view [0, 10] over 500 px (scale 0.02).
    fn fixture(orientation: Orientation) -> Fixture {
        let renderer = RecordingRenderer::new();
        let log = renderer.log();
        let surface = SharedSurface::default();
        let tt = TimetableFactory::new(Settings::default())
            .create(
                Box::new(renderer),
                0.0,
                100.0,
                0.0,
                10.0,
                TimetableOptions {
                    orientation: Some(orientation),
                    draggable: Some(Box::new(surface.clone())),
                    ..Default::default()
                },
            )
            .unwrap();

        let changes = record::<ChangeEvent>(tt.events());
        let clicks = record::<ItemClickEvent>(tt.events());
        let moves = Arc::new(Mutex::new(Vec::new()));
        let (start, stop) = (Arc::clone(&moves), Arc::clone(&moves));
        tt.events().subscribe::<MoveStartEvent, _>(move |_| start.lock().unwrap().push("start".into()));
        tt.events().subscribe::<MoveStopEvent, _>(move |_| stop.lock().unwrap().push("stop".into()));

        Fixture { tt, log, surface, changes, clicks, moves }
    }

    fn attached(orientation: Orientation) -> Fixture {
        let mut f = fixture(orientation);
        f.tt.attach(LayoutContext { viewport_px: 500.0 }).unwrap();
        f
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn down(x: f64, y: f64, target: Option<ItemId>) -> SurfaceInput {
        SurfaceInput::PointerDown { x, y, target }
    }

    #[test]
    fn test_pixel_queries_need_attach() {
        let mut f = fixture(Orientation::Horizontal);
        assert_eq!(f.tt.scale(), Err(TimetableError::NotAttached));
        assert!(f.tt.draw(true).is_ok());
        assert!(f.ops().is_empty());

        f.tt.attach(LayoutContext { viewport_px: 500.0 }).unwrap();
        assert!(approx(f.tt.scale().unwrap(), 0.02));
        assert!(approx(f.tt.value_to_pixels(50.0).unwrap(), 2500.0));
        assert!(approx(f.tt.pixels_to_value(250.0).unwrap().raw(), 5.0));
        assert!(matches!(f.ops().first(), Some(RenderOp::Draw { .. })));
    }

    #[test]
    fn test_drag_moves_by_pixel_delta_and_changes_once() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.handle_surface(down(300.0, 40.0, None)).unwrap();
        assert!(f.tt.is_dragging());
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 250.0, y: 40.0 }).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 200.0, y: 40.0 }).unwrap();
        // No change until release
        assert!(f.changes.lock().unwrap().is_empty());
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 200.0, y: 40.0 }).unwrap();

        assert!(approx(f.position(), 2.0));
        assert!(approx(f.surface.0.lock().unwrap().offset, -100.0));
        let changes = f.changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous, AxisValue::Number(0.0));
        assert_eq!(*f.moves.lock().unwrap(), ["start", "stop"]);
    }

    #[test]
    fn test_drag_clamps_to_axis() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.handle_surface(down(0.0, 0.0, None)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 300.0, y: 0.0 }).unwrap();
        assert_eq!(f.position(), 0.0);
        // Nothing moved, so no change
        assert!(f.changes.lock().unwrap().is_empty());

        f.tt.handle_surface(down(0.0, 0.0, None)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: -1e6, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 90.0));
        let bounds = f.surface.0.lock().unwrap().bounds.unwrap();
        assert!(approx(bounds.min_offset, -4500.0));
    }

    #[test]
    fn test_vertical_drag_uses_y() {
        let mut f = attached(Orientation::Vertical);
        assert_eq!(f.surface.0.lock().unwrap().axis, Some(DragAxis::Y));
        f.tt.handle_surface(down(0.0, 300.0, None)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 400.0, y: 50.0 }).unwrap();
        assert!(approx(f.position(), 5.0));
    }

    #[test]
    fn test_click_versus_drag() {
        let mut f = attached(Orientation::Horizontal);
        let track = f.tt.add_track("Room A", 40.0, TrackOptions::default());
        let item = f
            .tt
            .track_mut(track)
            .unwrap()
            .add_item("Talk", 1.0, 4.0, ItemOptions::default())
            .unwrap();
        f.tt.draw(false).unwrap();

        // Within tolerance: click, and the small pan still counts as a move
        f.tt.handle_surface(down(100.0, 10.0, Some(item))).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 95.0, y: 18.0 }).unwrap();
        {
            let clicks = f.clicks.lock().unwrap();
            assert_eq!(clicks.len(), 1);
            assert_eq!(clicks[0].item, item);
            assert_eq!(clicks[0].title, "Talk");
        }
        assert_eq!(f.changes.lock().unwrap().len(), 1);

        // Beyond tolerance on either axis: drag, no click
        f.tt.handle_surface(down(100.0, 10.0, Some(item))).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 100.0, y: 30.0 }).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 100.0, y: 10.0 }).unwrap();
        assert_eq!(f.clicks.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_disabled_track_never_clicks() {
        let mut f = attached(Orientation::Horizontal);
        let track = f.tt.add_track(
            "Closed",
            40.0,
            TrackOptions {
                disabled: true,
                ..Default::default()
            },
        );
        let item = f
            .tt
            .track_mut(track)
            .unwrap()
            .add_item("Nope", 1.0, 4.0, ItemOptions::default())
            .unwrap();
        f.tt.handle_surface(down(100.0, 10.0, Some(item))).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 100.0, y: 10.0 }).unwrap();
        assert!(f.clicks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_scrollbar_to_max() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.add_scrollbar(10.0, Side::Primary, 20.0, ScrollbarOptions::default())
            .unwrap();

        f.tt.handle_slider(Side::Primary, SliderInput::SlideStart).unwrap();
        f.tt.handle_slider(Side::Primary, SliderInput::Change(90.0)).unwrap();
        f.tt.handle_slider(Side::Primary, SliderInput::SlideStop).unwrap();

        assert!(approx(f.position(), 90.0));
        assert!(approx(f.surface.0.lock().unwrap().offset, -4500.0));
        assert_eq!(f.changes.lock().unwrap().len(), 1);
        assert_eq!(f.tt.selector().selected_option().unwrap().label, "end");
        assert_eq!(*f.moves.lock().unwrap(), ["start", "stop"]);
    }

    #[test]
    fn test_vertical_scrollbar_is_inverted() {
        let mut f = attached(Orientation::Vertical);
        f.tt.add_scrollbar(10.0, Side::Primary, 20.0, ScrollbarOptions::default())
            .unwrap();
        f.tt.handle_slider(Side::Primary, SliderInput::Change(-30.0)).unwrap();
        assert!(approx(f.position(), 30.0));
        // Outside a gesture a slider change is a programmatic move
        assert_eq!(f.changes.lock().unwrap().len(), 1);
        assert!(f.moves.lock().unwrap().is_empty());
    }

    #[test]
    fn test_surface_drag_feeds_scrollbars_without_echo() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.add_scrollbar(10.0, Side::Both, 20.0, ScrollbarOptions::default())
            .unwrap();
        f.tt.handle_surface(down(300.0, 0.0, None)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 50.0, y: 0.0 }).unwrap();

        let echoed = f.tt.scrollbar(Side::Secondary).unwrap().slider_value();
        assert!(approx(echoed, 5.0));
        // The slider reporting back what it was given is not user input
        f.tt.handle_slider(Side::Secondary, SliderInput::Change(echoed)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 50.0, y: 0.0 }).unwrap();
        assert_eq!(f.changes.lock().unwrap().len(), 1);
        assert!(approx(f.tt.scrollbar(Side::Primary).unwrap().position(), 5.0));
    }

    #[test]
    fn test_programmatic_move() {
        let mut f = attached(Orientation::Horizontal);
        assert_eq!(f.tt.set_current_position(250.0).unwrap(), AxisValue::Number(90.0));
        assert_eq!(f.tt.set_current_position(90.0).unwrap(), AxisValue::Number(90.0));
        assert_eq!(f.changes.lock().unwrap().len(), 1);
        assert!(approx(f.surface.0.lock().unwrap().offset, -4500.0));

        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            f.tt.set_current_position(date),
            Err(TimetableError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_culling_diffs_and_hanging_items() {
        let mut f = attached(Orientation::Horizontal);
        let track = f.tt.add_track("Stage", 40.0, TrackOptions::default());
        let (a, b, c) = {
            let t = f.tt.track_mut(track).unwrap();
            (
                t.add_item("a", 0.0, 5.0, ItemOptions::default()).unwrap(),
                t.add_item("b", 8.0, 20.0, ItemOptions::default()).unwrap(),
                t.add_item("c", 50.0, 60.0, ItemOptions::default()).unwrap(),
            )
        };
        f.tt.draw(false).unwrap();
        assert!(f.tt.item_in_current_view(a));
        assert!(f.tt.item_in_current_view(b));
        assert!(!f.tt.item_in_current_view(c));
        assert!(f.ops().contains(&RenderOp::Hide { item: c }));

        f.clear_ops();
        f.tt.set_current_position(12.0).unwrap();
        let ops = f.ops();
        assert!(ops.contains(&RenderOp::Hide { item: a }));
        assert!(!ops.iter().any(|op| matches!(op, RenderOp::Show { .. })));
        // b starts at 8, view starts at 12: content shifted by 4 units = 200 px
        let hanging: Vec<_> = f.tt.hanging_items().collect();
        assert_eq!(hanging.len(), 1);
        assert_eq!(hanging[0].0, b);
        assert!(approx(hanging[0].1, 200.0));

        // A gesture shows everything and clears offsets
        f.clear_ops();
        f.tt.handle_surface(down(0.0, 0.0, None)).unwrap();
        let ops = f.ops();
        assert!(ops.contains(&RenderOp::ContentOffset { item: b, offset_px: None }));
        assert!(ops.contains(&RenderOp::Show { item: a }));
        assert!(ops.contains(&RenderOp::Show { item: c }));
        assert_eq!(f.tt.visible_items().count(), 3);

        f.tt.handle_surface(SurfaceInput::PointerUp { x: 0.0, y: 0.0 }).unwrap();
        assert!(!f.tt.item_in_current_view(c));
        assert_eq!(f.tt.hanging_items().count(), 1);
    }

    #[test]
    fn test_no_culling_while_dragging() {
        let mut f = attached(Orientation::Horizontal);
        let track = f.tt.add_track("Stage", 40.0, TrackOptions::default());
        let far = f
            .tt
            .track_mut(track)
            .unwrap()
            .add_item("far", 70.0, 80.0, ItemOptions::default())
            .unwrap();
        f.tt.draw(false).unwrap();

        f.tt.handle_surface(down(0.0, 0.0, None)).unwrap();
        f.tt.set_current_position(20.0).unwrap();
        assert!(f.tt.item_in_current_view(far));
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 0.0, y: 0.0 }).unwrap();
        assert!(!f.tt.item_in_current_view(far));
    }

    #[test]
    fn test_programmatic_move_during_drag_is_kept() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.handle_surface(down(300.0, 0.0, None)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 250.0, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 1.0));

        f.tt.set_current_position(20.0).unwrap();
        // Pointer keeps going from where it was: 50 px more is one unit
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 200.0, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 21.0));
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 200.0, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 21.0));
        assert_eq!(f.changes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_zoom_during_drag_uses_new_scale() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.handle_surface(down(300.0, 0.0, None)).unwrap();
        f.tt.set_view_range(10.0, 30.0).unwrap();
        assert!(approx(f.tt.scale().unwrap(), 0.04));

        f.tt.handle_surface(SurfaceInput::PointerMove { x: 250.0, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 12.0));
        f.tt.handle_surface(SurfaceInput::PointerUp { x: 250.0, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 12.0));
    }

    #[test]
    fn test_removed_item_not_hidden_again() {
        let mut f = attached(Orientation::Horizontal);
        let track = f.tt.add_track("Stage", 40.0, TrackOptions::default());
        let (gone, kept) = {
            let t = f.tt.track_mut(track).unwrap();
            (
                t.add_item("gone", 1.0, 4.0, ItemOptions::default()).unwrap(),
                t.add_item("kept", 2.0, 6.0, ItemOptions::default()).unwrap(),
            )
        };
        f.tt.draw(false).unwrap();
        assert!(f.tt.item_in_current_view(gone));

        f.tt.track_mut(track).unwrap().remove_item(gone).unwrap();
        f.clear_ops();
        f.tt.set_current_position(50.0).unwrap();

        let ops = f.ops();
        assert!(!ops.contains(&RenderOp::Hide { item: gone }));
        assert!(ops.contains(&RenderOp::Hide { item: kept }));
        assert!(!f.tt.item_in_current_view(gone));
    }

    #[test]
    fn test_other_scrollbar_ignored_during_drag() {
        let mut f = attached(Orientation::Horizontal);
        f.tt.add_scrollbar(10.0, Side::Both, 20.0, ScrollbarOptions::default())
            .unwrap();
        f.tt.handle_surface(down(300.0, 0.0, None)).unwrap();
        f.tt.handle_surface(SurfaceInput::PointerMove { x: 250.0, y: 0.0 }).unwrap();

        f.tt.handle_slider(Side::Primary, SliderInput::Change(60.0)).unwrap();
        assert!(approx(f.position(), 1.0));
        assert!(f.changes.lock().unwrap().is_empty());
        // The slider is put back where the drag has it
        let restored = f.tt.scrollbar(Side::Primary).unwrap().slider_value();
        assert!(approx(restored, 1.0));
        f.tt.handle_slider(Side::Primary, SliderInput::Change(restored)).unwrap();

        f.tt.handle_surface(SurfaceInput::PointerUp { x: 250.0, y: 0.0 }).unwrap();
        assert!(approx(f.position(), 1.0));
        assert_eq!(f.changes.lock().unwrap().len(), 1);
        assert_eq!(*f.moves.lock().unwrap(), ["start", "stop"]);
    }

    #[test]
    fn test_selector_follows_position() {
        let renderer = RecordingRenderer::new();
        let log = renderer.log();
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        let view_end = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let mut tt = TimetableFactory::default()
            .create(Box::new(renderer), start, end, start, view_end, TimetableOptions::default())
            .unwrap();
        let template: Template = Arc::new(|seg: &Segment| {
            seg.start.as_date().map(|d| d.format("%a").to_string())
                .unwrap_or_default()
        });
        tt.add_scale(
            SegmentRule::Unit(CalendarUnit::Day),
            Side::Primary,
            30.0,
            ScaleOptions {
                template: Some(template),
                ..Default::default()
            },
        )
        .unwrap();
        tt.attach(LayoutContext { viewport_px: 800.0 }).unwrap();

        let labels: Vec<_> = tt.selector().options().iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, ["start", "Tue", "Wed", "Thu", "end"]);
        assert_eq!(tt.selector().selected(), Some(0));

        let thursday = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap();
        tt.set_current_position(thursday).unwrap();
        assert_eq!(tt.selector().selected_option().unwrap().label, "Thu");
        assert!(log.lock().unwrap().ops.contains(&RenderOp::Select { index: 3 }));

        assert_eq!(tt.select_option(1).unwrap().as_date().unwrap().format("%a").to_string(), "Tue");
        assert!(tt.select_option(42).is_err());
    }
}
