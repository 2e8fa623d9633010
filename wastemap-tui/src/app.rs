use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use wastemap_core::{
    CameraCommand, Hit, MapCanvas, MapConfig, MapEvent, MapHost, MapMode, Region,
    model::{Bin, BinId, Coordinates, FleetSnapshot, Route, RouteId},
    service::FleetService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    Bin(BinId),
    Route(RouteId),
}

/// Receives canvas callbacks on behalf of the screen.
#[derive(Debug, Default)]
pub(crate) struct Selections {
    pub selected: Option<Selection>,
    pub mode_announcement: Option<MapMode>,
}

impl MapHost for Selections {
    fn on_bin_selected(&mut self, bin: &Bin) {
        tracing::debug!(bin = %bin.id, "bin selected");
        self.selected = Some(Selection::Bin(bin.id.clone()));
    }

    fn on_route_selected(&mut self, route: &Route) {
        tracing::debug!(route = %route.id, "route selected");
        self.selected = Some(Selection::Route(route.id.clone()));
    }

    fn on_map_mode_changed(&mut self, mode: MapMode) {
        self.mode_announcement = Some(mode);
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: Region,
    to: Region,
    started: Instant,
    duration: Duration,
}

/// Displayed camera, easing towards the last commanded region.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Camera {
    region: Region,
    transition: Option<Transition>,
}

impl Camera {
    pub(crate) const fn new(region: Region) -> Self {
        Self {
            region,
            transition: None,
        }
    }

    pub(crate) const fn region(&self) -> Region {
        self.region
    }

    pub(crate) const fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Start moving towards the command's region from wherever the camera is now.
    pub(crate) fn apply(&mut self, command: CameraCommand, now: Instant) {
        let duration = command.duration();
        if duration.is_zero() {
            self.jump(command.region());
            return;
        }
        self.transition = Some(Transition {
            from: self.region,
            to: command.region(),
            started: now,
            duration,
        });
    }

    pub(crate) fn jump(&mut self, region: Region) {
        self.region = region;
        self.transition = None;
    }

    pub(crate) fn advance(&mut self, now: Instant) {
        let Some(transition) = self.transition else {
            return;
        };
        let elapsed = now.saturating_duration_since(transition.started);
        let progress = elapsed.as_secs_f64() / transition.duration.as_secs_f64();
        self.region = transition.from.lerp(&transition.to, progress);
        if progress >= 1.0 {
            self.transition = None;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    column: u16,
    row: u16,
    origin: Region,
    moved: bool,
}

pub(crate) struct App {
    pub service: Arc<FleetService>,
    pub canvas: MapCanvas<Selections>,
    pub camera: Camera,
    /// Inner area of the map widget from the last draw.
    pub map_area: Rect,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pub status_message: Option<String>,

    drag: Option<Drag>,
}

impl App {
    pub(crate) fn new(service: Arc<FleetService>, config: MapConfig) -> Self {
        let canvas = MapCanvas::new(config, Selections::default());
        let camera = Camera::new(canvas.state().region);
        Self {
            service,
            canvas,
            camera,
            map_area: Rect::default(),
            is_loading: false,
            error_message: None,
            status_message: None,
            drag: None,
        }
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: Arc<FleetSnapshot>, now: Instant) {
        let stale = match &self.canvas.host().selected {
            Some(Selection::Bin(id)) => snapshot.bin(id).is_none(),
            Some(Selection::Route(id)) => snapshot.route(id).is_none(),
            None => false,
        };
        if stale {
            self.clear_selection();
        }
        self.status_message = Some(format!(
            "Loaded {} bins and {} routes",
            snapshot.bins.len(),
            snapshot.routes.len()
        ));
        self.canvas.set_snapshot(snapshot, now);
    }

    pub(crate) fn dispatch(&mut self, event: MapEvent, now: Instant) {
        self.canvas.dispatch(event, now);
        if let Some(mode) = self.canvas.host_mut().mode_announcement.take() {
            self.status_message = Some(format!("Map type: {mode}"));
        }
        self.drain_camera(now);
    }

    /// Advance timers and the camera transition.
    pub(crate) fn tick(&mut self, now: Instant) {
        self.canvas.tick(now);
        self.drain_camera(now);
        self.camera.advance(now);
    }

    fn drain_camera(&mut self, now: Instant) {
        for command in self.canvas.take_camera_commands() {
            self.camera.apply(command, now);
        }
    }

    /// Move the bin selection through the visible bins.
    pub(crate) fn cycle_bin(&mut self) {
        let ids: Vec<BinId> = self
            .canvas
            .visible_bins()
            .into_iter()
            .filter(|bin| bin.coordinates().is_some())
            .map(|bin| bin.id.clone())
            .collect();
        let current = match &self.canvas.host().selected {
            Some(Selection::Bin(id)) => ids.iter().position(|candidate| candidate == id),
            _ => None,
        };
        let next = current.map_or(0, |index| index + 1) % ids.len().max(1);
        if let Some(id) = ids.get(next) {
            self.canvas.press_bin(id);
        }
    }

    /// Move the route selection through all routes.
    pub(crate) fn cycle_route(&mut self) {
        let ids: Vec<RouteId> = self
            .canvas
            .snapshot()
            .routes
            .iter()
            .map(|route| route.id.clone())
            .collect();
        let current = match &self.canvas.host().selected {
            Some(Selection::Route(id)) => ids.iter().position(|candidate| candidate == id),
            _ => None,
        };
        let next = current.map_or(0, |index| index + 1) % ids.len().max(1);
        if let Some(id) = ids.get(next) {
            self.canvas.press_route(id);
        }
    }

    pub(crate) fn clear_selection(&mut self) {
        self.canvas.host_mut().selected = None;
    }

    pub(crate) fn selected_bin(&self) -> Option<&Bin> {
        match &self.canvas.host().selected {
            Some(Selection::Bin(id)) => self.canvas.snapshot().bin(id),
            _ => None,
        }
    }

    pub(crate) fn selected_route(&self) -> Option<&Route> {
        match &self.canvas.host().selected {
            Some(Selection::Route(id)) => self.canvas.snapshot().route(id),
            _ => None,
        }
    }

    /// Degrees covered by one terminal cell, as (latitude, longitude).
    fn cell_span(&self) -> Option<(f64, f64)> {
        if self.map_area.width == 0 || self.map_area.height == 0 {
            return None;
        }
        let region = self.camera.region();
        Some((
            region.latitude_delta / f64::from(self.map_area.height),
            region.longitude_delta / f64::from(self.map_area.width),
        ))
    }

    /// Map coordinates under a terminal cell of the map widget.
    pub(crate) fn coordinates_at(&self, column: u16, row: u16) -> Option<Coordinates> {
        let area = self.map_area;
        if column < area.x || column >= area.right() || row < area.y || row >= area.bottom() {
            return None;
        }
        let (lat_per_cell, lon_per_cell) = self.cell_span()?;
        let bounds = self.camera.region().bounds();
        let longitude = bounds.west + (f64::from(column - area.x) + 0.5) * lon_per_cell;
        let latitude = bounds.north - (f64::from(row - area.y) + 0.5) * lat_per_cell;
        Some(Coordinates::new(latitude, longitude))
    }

    pub(crate) fn mouse_down(&mut self, column: u16, row: u16) {
        if self.coordinates_at(column, row).is_some() {
            self.drag = Some(Drag {
                column,
                row,
                origin: self.camera.region(),
                moved: false,
            });
        }
    }

    /// Pan with the pointer; reported to the canvas as a user gesture.
    pub(crate) fn mouse_drag(&mut self, column: u16, row: u16, now: Instant) {
        let Some(mut drag) = self.drag else {
            return;
        };
        let Some((lat_per_cell, lon_per_cell)) = self.cell_span() else {
            return;
        };
        let columns = f64::from(column) - f64::from(drag.column);
        let rows = f64::from(row) - f64::from(drag.row);
        let center = Coordinates::new(
            drag.origin.center.latitude + rows * lat_per_cell,
            drag.origin.center.longitude - columns * lon_per_cell,
        );
        let region = Region {
            center,
            ..drag.origin
        };
        drag.moved = true;
        self.drag = Some(drag);
        self.canvas.dispatch(MapEvent::RegionChanged(region), now);
        self.camera.jump(region);
    }

    /// Finish a drag, or treat a stationary press as a tap.
    pub(crate) fn mouse_up(&mut self, column: u16, row: u16) -> Option<Hit> {
        let drag = self.drag.take()?;
        if drag.moved {
            return None;
        }
        let point = self.coordinates_at(column, row)?;
        let (lat_per_cell, lon_per_cell) = self.cell_span()?;
        let tolerance = lat_per_cell.max(lon_per_cell);
        let hit = self.canvas.press_at(point, tolerance);
        if hit.is_none() {
            self.clear_selection();
        }
        hit
    }
}
