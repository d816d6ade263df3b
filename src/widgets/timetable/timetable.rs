//! Timetable widget - aggregate root, factory and configuration.
//!
//! Lifecycle is two-phase: `TimetableFactory::create()` builds the model
//! (tracks, items, scales and queries all work immediately), then
//! `attach()` supplies the viewport measurement and performs the first
//! draw. Anything that needs pixels fails with `NotAttached` before that.
//!
//! Gesture handling and view synchronization live in `sync.rs`; this file
//! owns configuration and the draw pass.

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;

use super::axis::{Axis, LayoutContext};
use super::renderer::{
    DrawFrame, ItemBox, MarkFrame, Renderer, ScaleFrame, ScrollbarFrame, SpanFrame, TrackFrame,
};
use super::scales::{Banding, BandingOptions, Orientation, Scale, ScaleOptions, Side};
use super::scrollbar::{
    Scrollbar, ScrollbarAdapter, ScrollbarOptions, Slider, SliderFactory, ValueSlider,
};
use super::segments::{segments, Segment, SegmentGenerator, SegmentRule, SegmentStart};
use super::selector::Selector;
use super::surface::{DragAxis, Draggable, SurfaceOffset};
use super::sync::ViewState;
use crate::config::Settings;
use crate::core::error::{Result, TimetableError};
use crate::core::event_bus::EventBus;
use crate::core::ids::IdGenerator;
use crate::entities::{AxisMode, AxisValue, Item, ItemId, Track, TrackId, TrackOptions};

/// Per-instance options. Unset fields fall back to the factory settings.
#[derive(Default)]
pub struct TimetableOptions {
    pub id: Option<String>,
    pub title: Option<String>,
    pub orientation: Option<Orientation>,
    pub keep_item_content_in_view: Option<bool>,
    /// Surface collaborator; defaults to a `SurfaceOffset`.
    pub draggable: Option<Box<dyn Draggable>>,
    /// Builds sliders for scrollbars; defaults to `ValueSlider`.
    pub slider_factory: Option<SliderFactory>,
}

/// Visible window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewRange {
    pub start: AxisValue,
    pub end: AxisValue,
}

/// Creates timetables sharing one id space and one set of settings.
#[derive(Debug, Clone, Default)]
pub struct TimetableFactory {
    ids: IdGenerator,
    settings: Settings,
}

impl TimetableFactory {
    pub fn new(settings: Settings) -> Self {
        Self {
            ids: IdGenerator::new(),
            settings,
        }
    }

    pub fn with_ids(ids: IdGenerator, settings: Settings) -> Self {
        Self { ids, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Build a timetable over `[start, end]` showing `[view_start, view_end]`.
    ///
    /// `container` receives everything the timetable draws. The mode
    /// (numerical or temporal) is taken from `start`; the other bounds
    /// must match it.
    pub fn create(
        &self,
        container: Box<dyn Renderer>,
        start: impl Into<AxisValue>,
        end: impl Into<AxisValue>,
        view_start: impl Into<AxisValue>,
        view_end: impl Into<AxisValue>,
        opts: TimetableOptions,
    ) -> Result<Timetable> {
        let axis = Axis::new(start.into(), end.into(), view_start.into(), view_end.into())?;
        let id = opts.id.unwrap_or_else(|| self.ids.next_named("timetable"));
        let orientation = opts.orientation.unwrap_or(self.settings.orientation);
        let slider_factory = opts.slider_factory.unwrap_or_else(default_slider_factory);
        let draggable: Box<dyn Draggable> = match opts.draggable {
            Some(d) => d,
            None => Box::new(SurfaceOffset::default()),
        };

        info!(
            "Timetable {} created ({}, {:?}, [{}, {}])",
            id,
            axis.mode(),
            orientation,
            axis.start(),
            axis.end()
        );

        let mut timetable = Timetable {
            id,
            title: opts.title,
            orientation,
            keep_content_in_view: opts
                .keep_item_content_in_view
                .unwrap_or(self.settings.keep_item_content_in_view),
            drag_tolerance: self.settings.drag_tolerance_px,
            generator: SegmentGenerator::new(axis.mode(), self.settings.max_segments),
            axis,
            tracks: IndexMap::new(),
            banding: None,
            primary_scales: Vec::new(),
            secondary_scales: Vec::new(),
            primary_scrollbar: None,
            secondary_scrollbar: None,
            selector: Selector::default(),
            renderer: container,
            draggable,
            slider_factory,
            events: EventBus::new(),
            ids: self.ids.clone(),
            view: ViewState::default(),
            dirty: true,
        };
        timetable.rebuild_selector();
        Ok(timetable)
    }
}

pub struct Timetable {
    pub(super) id: String,
    pub(super) title: Option<String>,
    pub(super) orientation: Orientation,
    pub(super) keep_content_in_view: bool,
    pub(super) drag_tolerance: f64,
    pub(super) axis: Axis,
    pub(super) generator: SegmentGenerator,
    pub(super) tracks: IndexMap<TrackId, Track>,
    pub(super) banding: Option<Banding>,
    pub(super) primary_scales: Vec<Scale>,
    pub(super) secondary_scales: Vec<Scale>,
    pub(super) primary_scrollbar: Option<Scrollbar>,
    pub(super) secondary_scrollbar: Option<Scrollbar>,
    pub(super) selector: Selector,
    pub(super) renderer: Box<dyn Renderer>,
    pub(super) draggable: Box<dyn Draggable>,
    pub(super) slider_factory: SliderFactory,
    pub(super) events: EventBus,
    pub(super) ids: IdGenerator,
    pub(super) view: ViewState,
    pub(super) dirty: bool,
}

impl std::fmt::Debug for Timetable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timetable")
            .field("id", &self.id)
            .field("axis", &self.axis)
            .field("tracks", &self.tracks.len())
            .field("attached", &self.axis.is_attached())
            .finish()
    }
}

impl Timetable {
    // ========== Identity & axis ==========

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn mode(&self) -> AxisMode {
        self.axis.mode()
    }

    pub fn start(&self) -> AxisValue {
        self.axis.start()
    }

    pub fn end(&self) -> AxisValue {
        self.axis.end()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn current_position(&self) -> AxisValue {
        self.axis.position()
    }

    pub fn view_range(&self) -> ViewRange {
        let (start, end) = self.axis.view_raw();
        ViewRange {
            start: AxisValue::from_raw(self.mode(), start),
            end: AxisValue::from_raw(self.mode(), end),
        }
    }

    /// Change the visible window (zoom and position). Forces a redraw.
    pub fn set_view_range(
        &mut self,
        start: impl Into<AxisValue>,
        end: impl Into<AxisValue>,
    ) -> Result<ViewRange> {
        let start = start.into().expect_mode(self.mode())?;
        let end = end.into().expect_mode(self.mode())?;
        let previous = self.axis.position_raw();

        self.axis.set_view_raw(start, end);
        debug!("{}: view range now {:?}", self.id, self.axis.view_raw());
        self.configure_scrollbars();
        self.rebuild_selector();
        self.dirty = true;
        self.draw(true)?;
        self.rebase_gesture()?;
        self.notify_change(previous);
        Ok(self.view_range())
    }

    /// Axis units per pixel.
    pub fn scale(&self) -> Result<f64> {
        self.axis.scale()
    }

    pub fn value_to_pixels(&self, value: impl Into<AxisValue>) -> Result<f64> {
        let raw = value.into().expect_mode(self.mode())?;
        self.axis.value_to_pixels(raw)
    }

    pub fn pixels_to_value(&self, px: f64) -> Result<AxisValue> {
        Ok(AxisValue::from_raw(self.mode(), self.axis.pixels_to_value(px)?))
    }

    // ========== Layout ==========

    /// Supply measurements and draw for the first time.
    pub fn attach(&mut self, ctx: LayoutContext) -> Result<()> {
        self.axis.attach(ctx)?;
        info!("{}: attached with {}px viewport", self.id, ctx.viewport_px);
        self.draw(true)
    }

    pub fn is_attached(&self) -> bool {
        self.axis.is_attached()
    }

    pub fn is_dragging(&self) -> bool {
        self.view.gesture.is_some()
    }

    // ========== Tracks ==========

    pub fn add_track(&mut self, title: impl Into<String>, size: f64, opts: TrackOptions) -> TrackId {
        let id = TrackId(self.ids.next_id());
        let track = Track::new(id, self.mode(), title, size, opts);
        debug!("{}: added track {:?} '{}'", self.id, id, track.title);
        self.tracks.insert(id, track);
        self.dirty = true;
        id
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        let track = self
            .tracks
            .shift_remove(&id)
            .ok_or(TimetableError::UnknownTrack(id))?;
        self.view.visible.retain(|item| item.track != id);
        self.view.hanging.retain(|item, _| item.track != id);
        self.dirty = true;
        Ok(track)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Mutable track access. Changes show up on the next `draw()`.
    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        let track = self.tracks.get_mut(&id);
        if track.is_some() {
            self.dirty = true;
        }
        track
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.tracks.get(&id.track).and_then(|t| t.item(id))
    }

    /// Whether the item overlapped the view window at the last commit.
    pub fn item_in_current_view(&self, id: ItemId) -> bool {
        self.view.visible.contains(&id)
    }

    pub fn visible_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.view.visible.iter().copied()
    }

    /// Items currently drawn with a content offset, and that offset.
    pub fn hanging_items(&self) -> impl Iterator<Item = (ItemId, f64)> + '_ {
        self.view.hanging.iter().map(|(id, px)| (*id, *px))
    }

    pub(super) fn all_item_ids(&self) -> BTreeSet<ItemId> {
        self.tracks
            .values()
            .flat_map(|t| t.items().iter().map(|i| i.id))
            .collect()
    }

    // ========== Banding, scales, scrollbars ==========

    pub fn set_banding(&mut self, rule: impl Into<SegmentRule>, opts: BandingOptions) -> Result<()> {
        let rule: SegmentRule = rule.into();
        let points = self.generate(&rule, opts.start)?;
        debug!("{}: banding with {} boundaries", self.id, points.len());
        self.banding = Some(Banding { points });
        self.dirty = true;
        Ok(())
    }

    pub fn clear_banding(&mut self) {
        self.banding = None;
        self.dirty = true;
    }

    pub fn banding(&self) -> Option<&Banding> {
        self.banding.as_ref()
    }

    /// Add a scale on one or both sides. Returns the new scale ids.
    pub fn add_scale(
        &mut self,
        rule: impl Into<SegmentRule>,
        side: Side,
        size: f64,
        opts: ScaleOptions,
    ) -> Result<Vec<String>> {
        self.check_id(opts.id.as_deref(), side)?;
        let rule: SegmentRule = rule.into();
        let points = self.generate(&rule, opts.start)?;

        let mut ids = Vec::new();
        for &s in side.expand() {
            let id = opts.id.clone().unwrap_or_else(|| self.ids.next_named("scale"));
            let scale = Scale::new(id.clone(), s, size, points.clone(), &opts);
            match s {
                Side::Secondary => self.secondary_scales.push(scale),
                _ => self.primary_scales.push(scale),
            }
            ids.push(id);
        }
        debug!("{}: added scales {:?}", self.id, ids);
        self.rebuild_selector();
        self.dirty = true;
        Ok(ids)
    }

    pub fn remove_scales(&mut self, side: Side) {
        for &s in side.expand() {
            match s {
                Side::Secondary => self.secondary_scales.clear(),
                _ => self.primary_scales.clear(),
            }
        }
        self.rebuild_selector();
        self.dirty = true;
    }

    pub fn scales(&self, side: Side) -> &[Scale] {
        match side {
            Side::Secondary => &self.secondary_scales,
            _ => &self.primary_scales,
        }
    }

    /// Add (or replace) the scrollbar on one or both sides.
    pub fn add_scrollbar(
        &mut self,
        rule: impl Into<SegmentRule>,
        side: Side,
        size: f64,
        opts: ScrollbarOptions,
    ) -> Result<Vec<String>> {
        self.check_id(opts.id.as_deref(), side)?;
        let rule: SegmentRule = rule.into();
        let marks = self.generate(&rule, opts.start)?;
        let inverted = self.orientation == Orientation::Vertical;

        let mut ids = Vec::new();
        for &s in side.expand() {
            let id = opts.id.clone().unwrap_or_else(|| self.ids.next_named("scrollbar"));
            let mut adapter = ScrollbarAdapter::new((self.slider_factory)(s), inverted);
            adapter.configure(
                self.axis.start_raw(),
                self.axis.max_position_raw(),
                opts.step,
                self.axis.position_raw(),
            );
            let bar = Scrollbar::new(id.clone(), s, size, marks.clone(), &opts, adapter);
            if let Some(old) = self.scrollbar_slot(s).replace(bar) {
                debug!("{}: replaced scrollbar {}", self.id, old.id);
            }
            ids.push(id);
        }
        self.rebuild_selector();
        self.dirty = true;
        Ok(ids)
    }

    pub fn remove_scrollbar(&mut self, side: Side) {
        for &s in side.expand() {
            self.scrollbar_slot(s).take();
        }
        self.rebuild_selector();
        self.dirty = true;
    }

    pub fn scrollbar(&self, side: Side) -> Option<&Scrollbar> {
        match side {
            Side::Primary => self.primary_scrollbar.as_ref(),
            Side::Secondary => self.secondary_scrollbar.as_ref(),
            Side::Both => None,
        }
    }

    pub(super) fn scrollbar_mut(&mut self, side: Side) -> Option<&mut Scrollbar> {
        match side {
            Side::Primary => self.primary_scrollbar.as_mut(),
            Side::Secondary => self.secondary_scrollbar.as_mut(),
            Side::Both => None,
        }
    }

    fn scrollbar_slot(&mut self, side: Side) -> &mut Option<Scrollbar> {
        match side {
            Side::Secondary => &mut self.secondary_scrollbar,
            _ => &mut self.primary_scrollbar,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    fn generate(&self, rule: &SegmentRule, start: SegmentStart) -> Result<Vec<AxisValue>> {
        self.generator
            .generate(rule, self.axis.start(), self.axis.end(), start)
    }

    fn check_id(&self, id: Option<&str>, side: Side) -> Result<()> {
        let Some(id) = id else {
            return Ok(());
        };
        if side == Side::Both {
            return Err(TimetableError::config(format!(
                "id '{}' cannot be used when adding to both sides",
                id
            )));
        }
        let taken = self
            .primary_scales
            .iter()
            .chain(self.secondary_scales.iter())
            .any(|s| s.id == id)
            || [&self.primary_scrollbar, &self.secondary_scrollbar]
                .into_iter()
                .flatten()
                .any(|b| b.id == id);
        if taken {
            return Err(TimetableError::config(format!("id '{}' is already in use", id)));
        }
        Ok(())
    }

    pub(super) fn configure_scrollbars(&mut self) {
        let (min, max, pos) = (
            self.axis.start_raw(),
            self.axis.max_position_raw(),
            self.axis.position_raw(),
        );
        for bar in [&mut self.primary_scrollbar, &mut self.secondary_scrollbar]
            .into_iter()
            .flatten()
        {
            bar.adapter.configure(min, max, bar.step, pos);
        }
    }

    /// Selector source: first primary scale, else first secondary scale,
    /// else scrollbar marks.
    pub(super) fn rebuild_selector(&mut self) {
        let boundaries: Vec<(AxisValue, String)> = if let Some(scale) = self
            .primary_scales
            .first()
            .or_else(|| self.secondary_scales.first())
        {
            labelled(&scale.points, |seg| scale.label(seg))
        } else if let Some(bar) = self
            .primary_scrollbar
            .as_ref()
            .or(self.secondary_scrollbar.as_ref())
        {
            labelled(&bar.marks, |seg| bar.label(seg))
        } else {
            Vec::new()
        };

        let max_position = AxisValue::from_raw(self.mode(), self.axis.max_position_raw());
        self.selector.rebuild(&boundaries, self.axis.start(), max_position);
        if let Ok(scale) = self.axis.scale() {
            if let Some(i) = self.selector.sync(self.axis.position_raw(), scale) {
                self.renderer.select_option(i);
            }
        }
    }

    // ========== Drawing ==========

    /// Render the whole timetable.
    ///
    /// Without `force` nothing happens unless something changed since the
    /// last draw. Before `attach()` this is a no-op.
    pub fn draw(&mut self, force: bool) -> Result<()> {
        if !self.axis.is_attached() {
            debug!("{}: draw deferred until attach", self.id);
            return Ok(());
        }
        if !force && !self.dirty {
            return Ok(());
        }

        let frame = self.build_frame()?;
        self.renderer.draw(&frame);
        self.dirty = false;

        let axis = match self.orientation {
            Orientation::Horizontal => DragAxis::X,
            Orientation::Vertical => DragAxis::Y,
        };
        self.draggable.configure(axis, self.axis.drag_bounds()?);
        self.configure_scrollbars();

        // A fresh draw shows every item without content offsets.
        self.view.visible = self.all_item_ids();
        self.view.hanging.clear();
        if !self.is_dragging() {
            self.cull()?;
        }
        self.sync_views(None)
    }

    fn build_frame(&self) -> Result<DrawFrame> {
        let axis = &self.axis;
        let span = |a: f64, b: f64, label: String| -> Result<SpanFrame> {
            let offset_px = axis.value_to_pixels(a)?;
            Ok(SpanFrame {
                offset_px,
                length_px: (axis.value_to_pixels(b)? - offset_px).max(0.0),
                label,
            })
        };

        let bands = match &self.banding {
            Some(banding) => banding
                .bands()
                .iter()
                .map(|b| span(b.start.raw(), b.end.raw(), String::new()))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let mut tracks = Vec::with_capacity(self.tracks.len());
        for track in self.tracks.values() {
            let items = track
                .items()
                .iter()
                .map(|item| {
                    let s = span(item.start_raw(), item.end_raw(), String::new())?;
                    Ok(ItemBox {
                        id: item.id,
                        title: item.title.clone(),
                        class_name: item.class_name.clone(),
                        offset_px: s.offset_px,
                        length_px: s.length_px,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            tracks.push(TrackFrame {
                id: track.id,
                title: track.title.clone(),
                size: track.size,
                disabled: track.disabled(),
                class_name: track.class_name.clone(),
                items,
            });
        }

        let mut scales = Vec::new();
        for scale in self.primary_scales.iter().chain(self.secondary_scales.iter()) {
            let segments = scale
                .segments()
                .iter()
                .map(|seg| span(seg.start.raw(), seg.end.raw(), scale.label(seg)))
                .collect::<Result<Vec<_>>>()?;
            scales.push(ScaleFrame {
                id: scale.id.clone(),
                side: scale.side,
                size: scale.size,
                class_name: scale.class_name.clone(),
                segments,
            });
        }

        let length = axis.end_raw() - axis.start_raw();
        let scrollbars = [&self.primary_scrollbar, &self.secondary_scrollbar]
            .into_iter()
            .flatten()
            .map(|bar| ScrollbarFrame {
                id: bar.id.clone(),
                side: bar.side,
                size: bar.size,
                marks: bar
                    .segments()
                    .iter()
                    .map(|seg| MarkFrame {
                        position: (seg.start.raw() - axis.start_raw()) / length,
                        label: bar.label(seg),
                    })
                    .collect(),
            })
            .collect();

        Ok(DrawFrame {
            timetable: self.id.clone(),
            title: self.title.clone(),
            orientation: self.orientation,
            viewport_px: axis.viewport_px()?,
            full_extent_px: axis.full_extent_px()?,
            offset_px: axis.offset()?,
            bands,
            tracks,
            scales,
            scrollbars,
        })
    }
}

fn default_slider_factory() -> SliderFactory {
    Box::new(|_: Side| -> Box<dyn Slider> { Box::new(ValueSlider::new()) })
}

fn labelled(
    points: &[AxisValue],
    label: impl Fn(&Segment) -> String,
) -> Vec<(AxisValue, String)> {
    let segs = segments(points);
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (*p, segs.get(i).map(&label).unwrap_or_default()))
        .collect()
}
