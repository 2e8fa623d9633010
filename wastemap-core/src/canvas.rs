//! Map canvas: camera state, filter, map type, and the scene drawn from a snapshot.
//!
//! State changes go through [`reduce`], a pure function from state and event
//! to the next state plus the effects to run. [`MapCanvas`] owns the state,
//! runs those effects (debounced fits, camera commands, host callbacks) and
//! derives a [`MapFrame`] for the renderer.

use std::mem;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::controls::{FilterChip, MapMode, filter_chips};
use crate::model::{Bin, BinId, Coordinates, FleetSnapshot, Route, RouteId};
use crate::progress::{RouteOverlay, path_for, render_route};
use crate::stats::FleetStats;
use crate::style::{BinIcon, Palette, Priority, Rgb, Tone, bin_tone, icon_for, priority_for};
use crate::viewport::{
    CAMERA_ANIMATION, CameraCommand, EdgePadding, PAN_FRACTION, PanDirection, Region,
    ViewportFitter, ViewportSize,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Settings a host passes when it mounts the map.
pub struct MapConfig {
    /// Camera region before the first fit.
    pub initial_region: Region,
    /// Region the locate control returns to.
    pub home_region: Option<Region>,
    /// Free space around fitted content, in logical pixels.
    pub edge_padding: EdgePadding,
    /// Rendered map size, in logical pixels.
    pub size: ViewportSize,
    /// Colors for markers and lines.
    pub palette: Palette,
    /// Filter selected at mount.
    pub category: Category,
    /// Map type selected at mount.
    pub mode: MapMode,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_region: Region::default(),
            home_region: None,
            edge_padding: EdgePadding::default(),
            size: ViewportSize::default(),
            palette: Palette::default(),
            category: Category::All,
            mode: MapMode::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Everything the canvas remembers between events.
pub struct MapState {
    /// Last region reported by the map or committed by a command.
    pub region: Region,
    /// Base for the next zoom or pan; updated as soon as a command is issued.
    pub committed: Region,
    /// Region the locate control returns to.
    pub home: Region,
    /// Active filter.
    pub category: Category,
    /// Base map type.
    pub mode: MapMode,
    /// Whether the legend panel is open.
    pub legend_expanded: bool,
}

impl MapState {
    /// State at mount time.
    #[must_use]
    pub fn new(config: &MapConfig) -> Self {
        Self {
            region: config.initial_region,
            committed: config.initial_region,
            home: config.home_region.unwrap_or(config.initial_region),
            category: config.category,
            mode: config.mode,
            legend_expanded: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Input to the canvas reducer.
pub enum MapEvent {
    /// The user moved the map by gesture.
    RegionChanged(Region),
    /// The bin or route collections were replaced.
    DataChanged,
    /// Select a filter.
    SetCategory(Category),
    /// Select the next filter.
    CycleCategory,
    /// Zoom control.
    ZoomIn,
    /// Zoom control.
    ZoomOut,
    /// Pan control.
    Pan(PanDirection),
    /// Select a map type.
    SetMapMode(MapMode),
    /// Map type switch.
    CycleMapMode,
    /// "My location" control.
    LocateMe,
    /// Legend button.
    ToggleLegend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Side effect requested by the reducer.
pub enum Effect {
    /// Move the camera.
    Camera(CameraCommand),
    /// Fit the camera to the visible set once input settles.
    ScheduleFit,
    /// Tell the host the map type changed.
    MapModeChanged(MapMode),
}

#[derive(Debug, Clone, PartialEq)]
/// Result of one reducer step.
pub struct Reduction {
    /// Next state.
    pub state: MapState,
    /// Effects to run, in order.
    pub effects: Vec<Effect>,
}

/// Apply one event to the canvas state.
#[must_use]
pub fn reduce(state: MapState, event: &MapEvent) -> Reduction {
    let mut next = state;
    let mut effects = Vec::new();

    match *event {
        MapEvent::RegionChanged(region) => {
            next.region = region;
            next.committed = region;
        }
        MapEvent::DataChanged => effects.push(Effect::ScheduleFit),
        MapEvent::SetCategory(category) => {
            if category != state.category {
                next.category = category;
                effects.push(Effect::ScheduleFit);
            }
        }
        MapEvent::CycleCategory => {
            next.category = state.category.next();
            effects.push(Effect::ScheduleFit);
        }
        MapEvent::ZoomIn => animate_to(&mut next, &mut effects, state.committed.zoomed_in()),
        MapEvent::ZoomOut => animate_to(&mut next, &mut effects, state.committed.zoomed_out()),
        MapEvent::Pan(direction) => animate_to(
            &mut next,
            &mut effects,
            state.committed.panned(direction, PAN_FRACTION),
        ),
        MapEvent::LocateMe => animate_to(&mut next, &mut effects, state.home),
        MapEvent::SetMapMode(mode) => {
            if mode != state.mode {
                next.mode = mode;
                effects.push(Effect::MapModeChanged(mode));
            }
        }
        MapEvent::CycleMapMode => {
            next.mode = state.mode.next();
            effects.push(Effect::MapModeChanged(next.mode));
        }
        MapEvent::ToggleLegend => next.legend_expanded = !state.legend_expanded,
    }

    Reduction {
        state: next,
        effects,
    }
}

fn animate_to(state: &mut MapState, effects: &mut Vec<Effect>, region: Region) {
    // commit before the animation runs so rapid taps compound correctly
    state.committed = region;
    state.region = region;
    effects.push(Effect::Camera(CameraCommand::AnimateTo {
        region,
        duration: CAMERA_ANIMATION,
    }));
}

/// Receiver of map interactions. Calls are fire-and-forget.
pub trait MapHost {
    /// A bin marker was pressed.
    fn on_bin_selected(&mut self, _bin: &Bin) {}

    /// A route line or one of its stops was pressed.
    fn on_route_selected(&mut self, _route: &Route) {}

    /// The map type changed.
    fn on_map_mode_changed(&mut self, _mode: MapMode) {}
}

impl MapHost for () {}

#[derive(Debug, Clone, PartialEq)]
/// Styled marker for one bin.
pub struct BinMarker {
    /// Bin behind the marker.
    pub bin_id: BinId,
    /// Marker caption.
    pub label: String,
    /// Marker position.
    pub coordinates: Coordinates,
    /// Semantic color slot.
    pub tone: Tone,
    /// Resolved color.
    pub color: Rgb,
    /// Collection priority.
    pub priority: Priority,
    /// Glyph.
    pub icon: BinIcon,
    /// Fill level in percent.
    pub fill_level: u8,
}

#[derive(Debug, Clone, PartialEq)]
/// What the map draws for one render pass, plus the counters beside it.
pub struct MapFrame {
    /// Camera region.
    pub region: Region,
    /// Base map type.
    pub mode: MapMode,
    /// Active filter.
    pub category: Category,
    /// Whether the legend panel is open.
    pub legend_expanded: bool,
    /// Markers for filtered bins with coordinates.
    pub markers: Vec<BinMarker>,
    /// Filtered bins that have no coordinates and are not drawn.
    pub unplaced_bins: usize,
    /// Drawable routes.
    pub routes: Vec<RouteOverlay>,
    /// Counters over the same snapshot.
    pub stats: FleetStats,
    /// Filter chips with counts.
    pub chips: Vec<FilterChip>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Target of a press on the map.
pub enum Hit {
    /// A bin marker.
    Bin(BinId),
    /// A route stop marker.
    Route(RouteId),
}

/// Interactive map over a bin and route snapshot.
pub struct MapCanvas<H: MapHost> {
    state: MapState,
    fitter: ViewportFitter,
    snapshot: Arc<FleetSnapshot>,
    palette: Palette,
    size: ViewportSize,
    commands: Vec<CameraCommand>,
    host: H,
}

impl<H: MapHost> MapCanvas<H> {
    /// Mount a canvas with an empty snapshot.
    #[must_use]
    pub fn new(config: MapConfig, host: H) -> Self {
        Self {
            state: MapState::new(&config),
            fitter: ViewportFitter::new(config.edge_padding),
            snapshot: Arc::new(FleetSnapshot::default()),
            palette: config.palette,
            size: config.size,
            commands: Vec::new(),
            host,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &MapState {
        &self.state
    }

    /// Snapshot being drawn.
    #[must_use]
    pub fn snapshot(&self) -> &Arc<FleetSnapshot> {
        &self.snapshot
    }

    /// Palette in use.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Host receiving callbacks.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Host receiving callbacks, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Update the rendered size used to convert edge padding.
    pub fn set_size(&mut self, size: ViewportSize) {
        self.size = size;
    }

    /// Replace the snapshot and schedule a fit to it.
    pub fn set_snapshot(&mut self, snapshot: Arc<FleetSnapshot>, now: Instant) {
        tracing::info!(
            bins = snapshot.bins.len(),
            routes = snapshot.routes.len(),
            "snapshot replaced"
        );
        self.snapshot = snapshot;
        self.dispatch(MapEvent::DataChanged, now);
    }

    /// Run one event through the reducer and carry out its effects.
    pub fn dispatch(&mut self, event: MapEvent, now: Instant) {
        if event == MapEvent::LocateMe {
            tracing::info!("locate requested, no position source; returning to home region");
        }
        let Reduction { state, effects } = reduce(self.state, &event);
        self.state = state;
        for effect in effects {
            match effect {
                Effect::Camera(command) => {
                    tracing::debug!(?event, region = ?command.region(), "camera command");
                    self.commands.push(command);
                }
                Effect::ScheduleFit => {
                    let coordinates = self.fit_coordinates();
                    self.fitter.request_fit(now, coordinates);
                }
                Effect::MapModeChanged(mode) => self.host.on_map_mode_changed(mode),
            }
        }
    }

    /// Fire the debounced fit once its quiet period has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(command) = self.fitter.poll(now, self.size) {
            self.state.committed = command.region();
            self.state.region = command.region();
            self.commands.push(command);
        }
    }

    /// When [`MapCanvas::tick`] next has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.fitter.deadline()
    }

    /// Camera commands issued since the last call, oldest first.
    pub fn take_camera_commands(&mut self) -> Vec<CameraCommand> {
        mem::take(&mut self.commands)
    }

    /// Bins passing the active filter, in snapshot order.
    #[must_use]
    pub fn visible_bins(&self) -> Vec<&Bin> {
        let category = self.state.category;
        self.snapshot
            .bins
            .iter()
            .filter(|bin| category.matches(bin))
            .collect()
    }

    fn fit_coordinates(&self) -> Vec<Coordinates> {
        let bins = self.visible_bins().into_iter().filter_map(Bin::coordinates);
        let stops = self.snapshot.routes.iter().filter_map(path_for).flatten();
        bins.chain(stops).collect()
    }

    /// Derive the scene and its counters from the current snapshot.
    #[must_use]
    pub fn frame(&self, now: DateTime<Utc>) -> MapFrame {
        let visible = self.visible_bins();
        let markers: Vec<BinMarker> = visible
            .iter()
            .filter_map(|bin| {
                let coordinates = bin.coordinates()?;
                let tone = bin_tone(bin);
                Some(BinMarker {
                    bin_id: bin.id.clone(),
                    label: bin.label().to_owned(),
                    coordinates,
                    tone,
                    color: self.palette.color(tone),
                    priority: priority_for(bin),
                    icon: icon_for(bin),
                    fill_level: bin.fill_level(),
                })
            })
            .collect();
        let unplaced_bins = visible.len() - markers.len();

        let routes = self
            .snapshot
            .routes
            .iter()
            .filter_map(|route| render_route(route, &self.palette))
            .collect();

        let stats = FleetStats::compute(&self.snapshot.bins, now);
        MapFrame {
            region: self.state.region,
            mode: self.state.mode,
            category: self.state.category,
            legend_expanded: self.state.legend_expanded,
            markers,
            unplaced_bins,
            routes,
            chips: filter_chips(&stats, self.state.category),
            stats,
        }
    }

    /// Forward a bin press to the host. Returns `false` for unknown ids.
    pub fn press_bin(&mut self, id: &BinId) -> bool {
        let snapshot = Arc::clone(&self.snapshot);
        match snapshot.bin(id) {
            Some(bin) => {
                self.host.on_bin_selected(bin);
                true
            }
            None => false,
        }
    }

    /// Forward a route press to the host. Returns `false` for unknown ids.
    pub fn press_route(&mut self, id: &RouteId) -> bool {
        let snapshot = Arc::clone(&self.snapshot);
        match snapshot.route(id) {
            Some(route) => {
                self.host.on_route_selected(route);
                true
            }
            None => false,
        }
    }

    /// Nearest visible bin or stop marker within `tolerance` degrees of `point`.
    ///
    /// Bins win ties with stops at the same distance.
    #[must_use]
    pub fn hit_test(&self, point: Coordinates, tolerance: f64) -> Option<Hit> {
        let bins = self
            .visible_bins()
            .into_iter()
            .filter_map(|bin| Some((Hit::Bin(bin.id.clone()), bin.coordinates()?)));
        // routes without a drawable path have no stop markers on screen
        let drawn = self
            .snapshot
            .routes
            .iter()
            .filter(|route| path_for(route).is_some());
        let stops = drawn.flat_map(|route| {
            route
                .stops
                .iter()
                .filter_map(|stop| Some((Hit::Route(route.id.clone()), stop.coordinates()?)))
        });

        let mut best: Option<(Hit, f64)> = None;
        for (hit, coordinates) in bins.chain(stops) {
            let distance = (coordinates.latitude - point.latitude)
                .hypot(coordinates.longitude - point.longitude);
            if distance <= tolerance && best.as_ref().is_none_or(|(_, closest)| distance < *closest)
            {
                best = Some((hit, distance));
            }
        }
        best.map(|(hit, _)| hit)
    }

    /// Hit-test `point` and forward the press to the host.
    pub fn press_at(&mut self, point: Coordinates, tolerance: f64) -> Option<Hit> {
        let hit = self.hit_test(point, tolerance)?;
        match &hit {
            Hit::Bin(id) => self.press_bin(id),
            Hit::Route(id) => self.press_route(id),
        };
        Some(hit)
    }

    /// Release the debounce timer and drop queued camera commands.
    pub fn teardown(&mut self) {
        if self.fitter.cancel() {
            tracing::debug!("pending fit cancelled on teardown");
        }
        self.commands.clear();
    }
}

impl<H: MapHost> Drop for MapCanvas<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
