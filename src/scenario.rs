//! Scripted scenarios for the command-line runner.
//!
//! A scenario is a JSON document describing one timetable (axis, tracks,
//! banding, scales, scrollbars) plus an input script. It is replayed against
//! a `RecordingRenderer` and the result (final state, events, renderer calls)
//! is returned as a serializable `Outcome`.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::core::event_bus::downcast_event;
use crate::entities::{Attrs, AxisValue, ItemId, ItemOptions, TrackId, TrackOptions};
use crate::widgets::timetable::{
    BandingOptions, ChangeEvent, ItemClickEvent, LayoutContext, MoveStartEvent, MoveStopEvent,
    Orientation, RecordingRenderer, RenderLog, ScaleOptions, ScrollbarOptions, Segment,
    SegmentRule, SegmentStart, SelectorOption, Side, SliderInput, SurfaceInput, Template,
    Timetable, TimetableFactory, TimetableOptions, ViewRange,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub id: Option<String>,
    pub title: Option<String>,
    pub orientation: Option<Orientation>,
    pub start: AxisValue,
    pub end: AxisValue,
    pub view_start: AxisValue,
    pub view_end: AxisValue,
    /// Attach with this viewport before running the script; omit to stay detached.
    pub viewport_px: Option<f64>,
    #[serde(default)]
    pub tracks: Vec<TrackSpec>,
    pub banding: Option<RuleSpec>,
    #[serde(default)]
    pub scales: Vec<DecorationSpec>,
    #[serde(default)]
    pub scrollbars: Vec<DecorationSpec>,
    #[serde(default)]
    pub script: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackSpec {
    pub title: String,
    #[serde(default = "default_track_size")]
    pub size: f64,
    pub class_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

fn default_track_size() -> f64 {
    40.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSpec {
    pub title: String,
    pub start: AxisValue,
    pub end: AxisValue,
    pub class_name: Option<String>,
    #[serde(default)]
    pub data: Attrs,
}

/// `{"unit": "day"}`, `{"step": 10}` or `{"points": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSpec {
    Unit(String),
    Step(f64),
    Points(Vec<AxisValue>),
}

impl RuleSpec {
    fn to_rule(&self) -> Result<SegmentRule> {
        Ok(match self {
            RuleSpec::Unit(name) => SegmentRule::unit(name)?,
            RuleSpec::Step(step) => SegmentRule::Step(*step),
            RuleSpec::Points(points) => SegmentRule::Points(points.clone()),
        })
    }
}

/// A scale or scrollbar.
#[derive(Debug, Clone, Deserialize)]
pub struct DecorationSpec {
    pub rule: RuleSpec,
    pub side: String,
    #[serde(default = "default_track_size")]
    pub size: f64,
    pub id: Option<String>,
    pub class_name: Option<String>,
    /// strftime pattern for temporal labels; numeric labels print the value.
    pub label: Option<String>,
    pub start: Option<AxisValue>,
    /// Slider step (scrollbars only).
    #[serde(default)]
    pub step: f64,
}

impl DecorationSpec {
    fn template(&self) -> Option<Template> {
        let pattern = self.label.clone()?;
        let template: Template = Arc::new(move |seg: &Segment| {
            let mut out = String::new();
            let written = match seg.start.as_date() {
                Some(date) => write!(out, "{}", date.format(&pattern)),
                None => write!(out, "{}", seg.start),
            };
            if written.is_err() {
                out.clear();
            }
            out
        });
        Some(template)
    }

    fn segment_start(&self) -> SegmentStart {
        self.start.map(SegmentStart::At).unwrap_or_default()
    }
}

/// Points at an item by declaration order: `tracks[track].items[item]`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemRef {
    pub track: usize,
    pub item: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    SetPosition { value: AxisValue },
    SetView { start: AxisValue, end: AxisValue },
    Select { index: usize },
    /// Press at `from`, move in `steps` increments, release at `to`.
    Drag {
        from: (f64, f64),
        to: (f64, f64),
        #[serde(default)]
        steps: usize,
        item: Option<ItemRef>,
    },
    Click { at: (f64, f64), item: ItemRef },
    /// One slider gesture passing through `values`.
    Slide { side: String, values: Vec<f64> },
    SetDisabled { track: usize, disabled: bool },
    Draw {
        #[serde(default)]
        force: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventRecord {
    Change(ChangeEvent),
    ItemClick(ItemClickEvent),
    MoveStart(MoveStartEvent),
    MoveStop(MoveStopEvent),
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub timetable: String,
    pub position: AxisValue,
    pub view: ViewRange,
    pub visible: Vec<ItemId>,
    pub hanging: Vec<(ItemId, f64)>,
    pub selected: Option<SelectorOption>,
    pub events: Vec<EventRecord>,
    pub render: RenderLog,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario: {}", path.display()))
    }
}

/// Ids handed out while building, indexed like the scenario.
struct Built {
    tracks: Vec<TrackId>,
    items: Vec<Vec<ItemId>>,
}

impl Built {
    fn track(&self, index: usize) -> Result<TrackId> {
        self.tracks
            .get(index)
            .copied()
            .with_context(|| format!("No track #{} in scenario", index))
    }

    fn item(&self, r: ItemRef) -> Result<ItemId> {
        self.items
            .get(r.track)
            .and_then(|items| items.get(r.item))
            .copied()
            .with_context(|| format!("No item #{} on track #{}", r.item, r.track))
    }
}

pub fn run(scenario: &Scenario, settings: Settings) -> Result<Outcome> {
    let renderer = RecordingRenderer::new();
    let log = renderer.log();
    let mut tt = TimetableFactory::new(settings)
        .create(
            Box::new(renderer),
            scenario.start,
            scenario.end,
            scenario.view_start,
            scenario.view_end,
            TimetableOptions {
                id: scenario.id.clone(),
                title: scenario.title.clone(),
                orientation: scenario.orientation,
                ..Default::default()
            },
        )
        .context("Failed to create timetable")?;

    let built = build(&mut tt, scenario)?;

    if let Some(viewport_px) = scenario.viewport_px {
        tt.attach(LayoutContext { viewport_px })?;
    }

    for (i, step) in scenario.script.iter().enumerate() {
        debug!("Step {}: {:?}", i, step);
        apply(&mut tt, &built, step).with_context(|| format!("Script step #{} failed", i))?;
    }
    tt.draw(false)?;

    let events = tt
        .events()
        .poll()
        .iter()
        .filter_map(|e| {
            if let Some(e) = downcast_event::<ChangeEvent>(e) {
                Some(EventRecord::Change(e.clone()))
            } else if let Some(e) = downcast_event::<ItemClickEvent>(e) {
                Some(EventRecord::ItemClick(e.clone()))
            } else if let Some(e) = downcast_event::<MoveStartEvent>(e) {
                Some(EventRecord::MoveStart(e.clone()))
            } else {
                downcast_event::<MoveStopEvent>(e).map(|e| EventRecord::MoveStop(e.clone()))
            }
        })
        .collect::<Vec<_>>();
    info!("Scenario finished with {} events", events.len());

    let render = log.lock().map(|l| l.clone()).unwrap_or_else(|e| e.into_inner().clone());
    Ok(Outcome {
        timetable: tt.id().to_string(),
        position: tt.current_position(),
        view: tt.view_range(),
        visible: tt.visible_items().collect(),
        hanging: tt.hanging_items().collect(),
        selected: tt.selector().selected_option().cloned(),
        events,
        render,
    })
}

fn build(tt: &mut Timetable, scenario: &Scenario) -> Result<Built> {
    let mut built = Built {
        tracks: Vec::new(),
        items: Vec::new(),
    };
    for spec in &scenario.tracks {
        let id = tt.add_track(
            spec.title.as_str(),
            spec.size,
            TrackOptions {
                class_name: spec.class_name.clone(),
                disabled: spec.disabled,
                data: Attrs::new(),
            },
        );
        let track = tt.track_mut(id).context("Track vanished after add")?;
        let mut items = Vec::with_capacity(spec.items.len());
        for item in &spec.items {
            let item_id = track
                .add_item(
                    item.title.as_str(),
                    item.start,
                    item.end,
                    ItemOptions {
                        class_name: item.class_name.clone(),
                        data: item.data.clone(),
                    },
                )
                .with_context(|| format!("Bad item '{}' on track '{}'", item.title, spec.title))?;
            items.push(item_id);
        }
        built.tracks.push(id);
        built.items.push(items);
    }

    if let Some(rule) = &scenario.banding {
        tt.set_banding(rule.to_rule()?, BandingOptions::default())
            .context("Failed to set banding")?;
    }
    for spec in &scenario.scales {
        let side = Side::parse(&spec.side, tt.orientation())?;
        tt.add_scale(
            spec.rule.to_rule()?,
            side,
            spec.size,
            ScaleOptions {
                id: spec.id.clone(),
                class_name: spec.class_name.clone(),
                template: spec.template(),
                start: spec.segment_start(),
            },
        )
        .context("Failed to add scale")?;
    }
    for spec in &scenario.scrollbars {
        let side = Side::parse(&spec.side, tt.orientation())?;
        tt.add_scrollbar(
            spec.rule.to_rule()?,
            side,
            spec.size,
            ScrollbarOptions {
                id: spec.id.clone(),
                class_name: spec.class_name.clone(),
                template: spec.template(),
                start: spec.segment_start(),
                step: spec.step,
            },
        )
        .context("Failed to add scrollbar")?;
    }
    Ok(built)
}

fn apply(tt: &mut Timetable, built: &Built, step: &Step) -> Result<()> {
    match step {
        Step::SetPosition { value } => {
            tt.set_current_position(*value)?;
        }
        Step::SetView { start, end } => {
            tt.set_view_range(*start, *end)?;
        }
        Step::Select { index } => {
            tt.select_option(*index)?;
        }
        Step::Drag { from, to, steps, item } => {
            let target = item.map(|r| built.item(r)).transpose()?;
            tt.handle_surface(SurfaceInput::PointerDown {
                x: from.0,
                y: from.1,
                target,
            })?;
            for i in 1..=*steps {
                let t = i as f64 / (*steps + 1) as f64;
                tt.handle_surface(SurfaceInput::PointerMove {
                    x: from.0 + (to.0 - from.0) * t,
                    y: from.1 + (to.1 - from.1) * t,
                })?;
            }
            tt.handle_surface(SurfaceInput::PointerUp { x: to.0, y: to.1 })?;
        }
        Step::Click { at, item } => {
            let target = Some(built.item(*item)?);
            tt.handle_surface(SurfaceInput::PointerDown { x: at.0, y: at.1, target })?;
            tt.handle_surface(SurfaceInput::PointerUp { x: at.0, y: at.1 })?;
        }
        Step::Slide { side, values } => {
            let side = Side::parse(side, tt.orientation())?;
            tt.handle_slider(side, SliderInput::SlideStart)?;
            for v in values {
                tt.handle_slider(side, SliderInput::Change(*v))?;
            }
            tt.handle_slider(side, SliderInput::SlideStop)?;
        }
        Step::SetDisabled { track, disabled } => {
            let id = built.track(*track)?;
            tt.track_mut(id)
                .with_context(|| format!("Track #{} was removed", track))?
                .set_disabled(*disabled);
        }
        Step::Draw { force } => tt.draw(*force)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFERENCE: &str = r#"{
        "orientation": "horizontal",
        "start": 0, "end": 100, "view_start": 0, "view_end": 10,
        "viewport_px": 500,
        "tracks": [
            {"title": "Main hall", "items": [
                {"title": "Keynote", "start": 1, "end": 4, "data": {"speaker": "Ada"}},
                {"title": "Panel", "start": 30, "end": 40}
            ]},
            {"title": "Closed room", "disabled": true, "items": [
                {"title": "Setup", "start": 0, "end": 3}
            ]}
        ],
        "scales": [{"rule": {"step": 25}, "side": "top", "size": 20}],
        "scrollbars": [{"rule": {"step": 10}, "side": "bottom", "size": 12}],
        "script": [
            {"action": "click", "at": [100, 10], "item": {"track": 0, "item": 0}},
            {"action": "click", "at": [50, 60], "item": {"track": 1, "item": 0}},
            {"action": "drag", "from": [300, 10], "to": [200, 10], "steps": 3}
        ]
    }"#;

    fn changes(outcome: &Outcome) -> usize {
        outcome
            .events
            .iter()
            .filter(|e| matches!(e, EventRecord::Change(_)))
            .count()
    }

    #[test]
    fn test_conference_scenario() {
        let scenario: Scenario = serde_json::from_str(CONFERENCE).unwrap();
        let outcome = run(&scenario, Settings::default()).unwrap();

        assert!((outcome.position.raw() - 2.0).abs() < 1e-9);
        assert_eq!(changes(&outcome), 1);

        let clicks: Vec<_> = outcome
            .events
            .iter()
            .filter_map(|e| match e {
                EventRecord::ItemClick(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].title, "Keynote");
        assert_eq!(clicks[0].data.get_str("speaker"), Some("Ada"));

        // Only the first track's keynote and the disabled setup overlap [2, 12]
        assert_eq!(outcome.visible.len(), 2);
        let frame = outcome.render.last_frame.as_ref().unwrap();
        assert_eq!(frame.tracks.len(), 2);
        assert_eq!(frame.scales[0].segments.len(), 4);
        assert_eq!(frame.scrollbars[0].side, Side::Secondary);
    }

    #[test]
    fn test_outcome_serializes() {
        let scenario: Scenario = serde_json::from_str(CONFERENCE).unwrap();
        let outcome = run(&scenario, Settings::default()).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["events"][0]["event"], "move_start");
        assert!(json["render"]["ops"].as_array().is_some_and(|ops| !ops.is_empty()));
    }

    #[test]
    fn test_temporal_labels() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "start": "2024-03-04T00:00:00Z", "end": "2024-03-09T00:00:00Z",
                "view_start": "2024-03-04T00:00:00Z", "view_end": "2024-03-05T00:00:00Z",
                "viewport_px": 600,
                "scales": [{"rule": {"unit": "day"}, "side": "left", "label": "%a"}],
                "script": [{"action": "select", "index": 2}]
            }"#,
        )
        .unwrap();
        let outcome = run(&scenario, Settings::default()).unwrap();
        let frame = outcome.render.last_frame.as_ref().unwrap();
        let labels: Vec<_> = frame.scales[0].segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Mon", "Tue", "Wed", "Thu", "Fri"]);
        assert_eq!(outcome.selected.unwrap().label, "Wed");
    }

    #[test]
    fn test_mismatched_item_is_reported() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "start": 0, "end": 10, "view_start": 0, "view_end": 5,
                "tracks": [{"title": "A", "items": [
                    {"title": "bad", "start": "2024-01-01T00:00:00Z", "end": 3}
                ]}]
            }"#,
        )
        .unwrap();
        let err = run(&scenario, Settings::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("type mismatch"));
    }

    #[test]
    fn test_unknown_item_ref() {
        let mut scenario: Scenario = serde_json::from_str(CONFERENCE).unwrap();
        scenario.script = vec![Step::Click {
            at: (0.0, 0.0),
            item: ItemRef { track: 5, item: 0 },
        }];
        assert!(run(&scenario, Settings::default()).is_err());
    }
}
