//! Camera regions, bounding boxes, and the debounced viewport fitter.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::model::Coordinates;
use crate::timer::Debouncer;

/// Quiet period a fit request waits for before it is committed.
pub const FIT_QUIET_PERIOD: Duration = Duration::from_millis(500);
/// Duration of zoom, pan, and fit camera transitions.
pub const CAMERA_ANIMATION: Duration = Duration::from_millis(250);
/// Smallest span a fit produces, roughly a few city blocks.
pub const MIN_FIT_DELTA: f64 = 0.01;
/// Smallest span zooming in can reach.
pub const MIN_DELTA: f64 = 0.000_01;
/// Largest latitude span.
pub const MAX_LATITUDE_DELTA: f64 = 180.0;
/// Largest longitude span.
pub const MAX_LONGITUDE_DELTA: f64 = 360.0;
/// Share of the current span one pan step moves.
pub const PAN_FRACTION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Visible extent of the map camera.
pub struct Region {
    /// Center of the view.
    pub center: Coordinates,
    /// Visible latitude span in degrees.
    pub latitude_delta: f64,
    /// Visible longitude span in degrees.
    pub longitude_delta: f64,
}

impl Default for Region {
    fn default() -> Self {
        // Cologne city center
        Self {
            center: Coordinates::new(50.9375, 6.9603),
            latitude_delta: 0.0922,
            longitude_delta: 0.0421,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Direction of a pan command, in screen terms.
pub enum PanDirection {
    /// North.
    Up,
    /// South.
    Down,
    /// West.
    Left,
    /// East.
    Right,
}

impl Region {
    /// Region with both deltas halved.
    #[must_use]
    pub fn zoomed_in(&self) -> Self {
        self.scaled(0.5)
    }

    /// Region with both deltas doubled.
    #[must_use]
    pub fn zoomed_out(&self) -> Self {
        self.scaled(2.0)
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            center: self.center,
            latitude_delta: (self.latitude_delta * factor).clamp(MIN_DELTA, MAX_LATITUDE_DELTA),
            longitude_delta: (self.longitude_delta * factor)
                .clamp(MIN_DELTA, MAX_LONGITUDE_DELTA),
        }
    }

    /// Region moved by `fraction` of its span towards `direction`.
    #[must_use]
    pub fn panned(&self, direction: PanDirection, fraction: f64) -> Self {
        let (north, east) = match direction {
            PanDirection::Up => (1.0, 0.0),
            PanDirection::Down => (-1.0, 0.0),
            PanDirection::Left => (0.0, -1.0),
            PanDirection::Right => (0.0, 1.0),
        };
        let latitude = self.center.latitude + north * fraction * self.latitude_delta;
        let longitude = self.center.longitude + east * fraction * self.longitude_delta;
        Self {
            center: Coordinates::new(latitude.clamp(-90.0, 90.0), longitude.clamp(-180.0, 180.0)),
            ..*self
        }
    }

    /// Linear blend towards `target`, `progress` clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(&self, target: &Region, progress: f64) -> Self {
        if progress >= 1.0 {
            return *target;
        }
        let progress = progress.max(0.0);
        let blend = |from: f64, to: f64| from + (to - from) * progress;
        Self {
            center: Coordinates::new(
                blend(self.center.latitude, target.center.latitude),
                blend(self.center.longitude, target.center.longitude),
            ),
            latitude_delta: blend(self.latitude_delta, target.latitude_delta),
            longitude_delta: blend(self.longitude_delta, target.longitude_delta),
        }
    }

    /// Southern, western, northern, and eastern edges of the region.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let half_lat = self.latitude_delta / 2.0;
        let half_lon = self.longitude_delta / 2.0;
        Bounds {
            south: self.center.latitude - half_lat,
            west: self.center.longitude - half_lon,
            north: self.center.latitude + half_lat,
            east: self.center.longitude + half_lon,
        }
    }

    /// Whether `point` lies inside the region.
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        self.bounds().contains(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Axis-aligned box in degrees.
pub struct Bounds {
    /// Minimum latitude.
    pub south: f64,
    /// Minimum longitude.
    pub west: f64,
    /// Maximum latitude.
    pub north: f64,
    /// Maximum longitude.
    pub east: f64,
}

impl Bounds {
    /// Smallest box covering every point. `None` when there are no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinates>,
    {
        points.into_iter().fold(None, |acc: Option<Self>, point| {
            Some(match acc {
                None => Self {
                    south: point.latitude,
                    west: point.longitude,
                    north: point.latitude,
                    east: point.longitude,
                },
                Some(bounds) => Self {
                    south: bounds.south.min(point.latitude),
                    west: bounds.west.min(point.longitude),
                    north: bounds.north.max(point.latitude),
                    east: bounds.east.max(point.longitude),
                },
            })
        })
    }

    /// Whether `point` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }

    /// Region that shows the whole box inside `size` with `padding` kept free.
    ///
    /// Padding is in the same logical pixels as `size`. When the padding
    /// leaves no room on an axis the span on that axis is doubled instead.
    #[must_use]
    pub fn fit_region(&self, padding: EdgePadding, size: ViewportSize) -> Region {
        let span_lat = (self.north - self.south).max(MIN_FIT_DELTA);
        let span_lon = (self.east - self.west).max(MIN_FIT_DELTA);

        let latitude_delta =
            padded_span(span_lat, size.height, padding.top + padding.bottom).min(MAX_LATITUDE_DELTA);
        let longitude_delta =
            padded_span(span_lon, size.width, padding.left + padding.right).min(MAX_LONGITUDE_DELTA);

        // asymmetric padding shifts the box off the camera center
        let shift_lat = if size.height > 0.0 {
            (padding.top - padding.bottom) / 2.0 * latitude_delta / size.height
        } else {
            0.0
        };
        let shift_lon = if size.width > 0.0 {
            (padding.left - padding.right) / 2.0 * longitude_delta / size.width
        } else {
            0.0
        };

        Region {
            center: Coordinates::new(
                (self.south + self.north) / 2.0 + shift_lat,
                (self.west + self.east) / 2.0 - shift_lon,
            ),
            latitude_delta,
            longitude_delta,
        }
    }
}

fn padded_span(span: f64, extent: f64, padding: f64) -> f64 {
    let inner = extent - padding;
    if extent <= 0.0 || inner <= 0.0 {
        span * 2.0
    } else {
        span * extent / inner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Free space kept around fitted content, in logical pixels.
pub struct EdgePadding {
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
    /// Left edge.
    pub left: f64,
}

impl EdgePadding {
    /// Same padding on every edge.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for EdgePadding {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Rendered size of the map, in logical pixels.
pub struct ViewportSize {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Instruction for the map primitive to move its camera.
pub enum CameraCommand {
    /// Fit to a computed region after a debounced fit request.
    Fit {
        /// Target region.
        region: Region,
        /// Animate the transition.
        animated: bool,
    },
    /// Move to a region from a zoom, pan, or locate control.
    AnimateTo {
        /// Target region.
        region: Region,
        /// Transition length.
        duration: Duration,
    },
}

impl CameraCommand {
    /// Region the camera ends up at.
    #[must_use]
    pub const fn region(&self) -> Region {
        match self {
            CameraCommand::Fit { region, .. } | CameraCommand::AnimateTo { region, .. } => *region,
        }
    }

    /// Transition length, zero for unanimated fits.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            CameraCommand::Fit { animated: true, .. } => CAMERA_ANIMATION,
            CameraCommand::Fit { animated: false, .. } => Duration::ZERO,
            CameraCommand::AnimateTo { duration, .. } => *duration,
        }
    }
}

#[derive(Debug)]
/// Fits the camera to coordinate sets, committing only the last of a burst.
pub struct ViewportFitter {
    debouncer: Debouncer<Vec<Coordinates>>,
    padding: EdgePadding,
}

impl ViewportFitter {
    /// Fitter with the standard quiet period.
    #[must_use]
    pub fn new(padding: EdgePadding) -> Self {
        Self::with_quiet_period(padding, FIT_QUIET_PERIOD)
    }

    /// Fitter with a custom quiet period.
    #[must_use]
    pub fn with_quiet_period(padding: EdgePadding, quiet_period: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(quiet_period),
            padding,
        }
    }

    /// Ask for a fit to `coordinates`, replacing any request still waiting.
    pub fn request_fit(&mut self, now: Instant, coordinates: Vec<Coordinates>) {
        tracing::debug!(points = coordinates.len(), "fit requested");
        self.debouncer.request(now, coordinates);
    }

    /// The fit command once the quiet period of the last request has passed.
    ///
    /// Yields nothing when the committed request had no coordinates.
    pub fn poll(&mut self, now: Instant, size: ViewportSize) -> Option<CameraCommand> {
        let coordinates = self.debouncer.poll(now)?;
        let Some(bounds) = Bounds::from_points(coordinates) else {
            tracing::debug!("fit skipped, no coordinates");
            return None;
        };
        let region = bounds.fit_region(self.padding, size);
        tracing::debug!(?region, "fit committed");
        Some(CameraCommand::Fit {
            region,
            animated: true,
        })
    }

    /// Drop the pending request. Returns whether one was waiting.
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }

    /// Whether a request is waiting for its quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// When the waiting request will be committed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn points() -> Vec<Coordinates> {
        vec![
            Coordinates::new(50.0, 7.0),
            Coordinates::new(51.0, 6.0),
            Coordinates::new(50.5, 6.5),
        ]
    }

    #[test]
    fn bounds_cover_every_point() {
        let bounds = Bounds::from_points(points()).unwrap();
        assert!((bounds.south - 50.0).abs() < EPSILON);
        assert!((bounds.north - 51.0).abs() < EPSILON);
        assert!((bounds.west - 6.0).abs() < EPSILON);
        assert!((bounds.east - 7.0).abs() < EPSILON);
        assert!(points().into_iter().all(|point| bounds.contains(point)));
        assert!(Bounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn padding_widens_the_fitted_span() {
        let bounds = Bounds::from_points(points()).unwrap();
        let size = ViewportSize {
            width: 200.0,
            height: 400.0,
        };
        let region = bounds.fit_region(EdgePadding::uniform(50.0), size);
        // 400 px tall with 100 px padding leaves 300 px for one degree
        assert!((region.latitude_delta - 4.0 / 3.0).abs() < EPSILON);
        // 200 px wide with 100 px padding leaves 100 px for one degree
        assert!((region.longitude_delta - 2.0).abs() < EPSILON);
        assert!((region.center.latitude - 50.5).abs() < EPSILON);
        assert!((region.center.longitude - 6.5).abs() < EPSILON);

        let unpadded = bounds.fit_region(EdgePadding::uniform(0.0), size);
        assert!((unpadded.latitude_delta - 1.0).abs() < EPSILON);
        assert!(points().into_iter().all(|point| region.contains(point)));
    }

    #[test]
    fn single_point_gets_a_minimum_span() {
        let bounds = Bounds::from_points([Coordinates::new(10.0, 20.0)]).unwrap();
        let region = bounds.fit_region(EdgePadding::uniform(0.0), ViewportSize::default());
        assert!((region.latitude_delta - MIN_FIT_DELTA).abs() < EPSILON);
        assert!((region.center.latitude - 10.0).abs() < EPSILON);
    }

    #[test]
    fn oversized_padding_doubles_the_span() {
        let bounds = Bounds::from_points(points()).unwrap();
        let size = ViewportSize {
            width: 80.0,
            height: 80.0,
        };
        let region = bounds.fit_region(EdgePadding::uniform(50.0), size);
        assert!((region.latitude_delta - 2.0).abs() < EPSILON);
    }

    #[test]
    fn asymmetric_padding_shifts_the_center() {
        let bounds = Bounds::from_points(points()).unwrap();
        let size = ViewportSize {
            width: 200.0,
            height: 200.0,
        };
        let padding = EdgePadding {
            top: 100.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
        };
        let region = bounds.fit_region(padding, size);
        // box is pushed down, so the camera looks further north
        assert!(region.center.latitude > 50.5);
        assert!((region.center.longitude - 6.5).abs() < EPSILON);
    }

    #[test]
    fn zoom_halves_and_doubles_deltas() {
        let region = Region::default();
        let zoomed = region.zoomed_in();
        assert!((zoomed.latitude_delta - region.latitude_delta / 2.0).abs() < EPSILON);
        assert!((zoomed.longitude_delta - region.longitude_delta / 2.0).abs() < EPSILON);
        let back = zoomed.zoomed_out();
        assert!((back.latitude_delta - region.latitude_delta).abs() < EPSILON);
        assert_eq!(back.center, region.center);
    }

    #[test]
    fn zoom_out_is_capped_at_the_whole_world() {
        let mut region = Region::default();
        for _ in 0..40 {
            region = region.zoomed_out();
        }
        assert!((region.latitude_delta - MAX_LATITUDE_DELTA).abs() < EPSILON);
        assert!((region.longitude_delta - MAX_LONGITUDE_DELTA).abs() < EPSILON);
    }

    #[test]
    fn pan_moves_by_a_fraction_of_the_span() {
        let region = Region::default();
        let north = region.panned(PanDirection::Up, PAN_FRACTION);
        let expected = region.center.latitude + region.latitude_delta * PAN_FRACTION;
        assert!((north.center.latitude - expected).abs() < EPSILON);
        let east = region.panned(PanDirection::Right, 1.0);
        assert!(
            (east.center.longitude - region.center.longitude - region.longitude_delta).abs()
                < EPSILON
        );
    }

    #[test]
    fn lerp_reaches_the_target() {
        let from = Region::default();
        let to = from.zoomed_in().panned(PanDirection::Left, 1.0);
        assert_eq!(from.lerp(&to, 1.0), to);
        assert_eq!(from.lerp(&to, 0.0), from);
        let halfway = from.lerp(&to, 0.5);
        assert!(halfway.latitude_delta < from.latitude_delta);
        assert!(halfway.latitude_delta > to.latitude_delta);
    }

    #[test]
    fn burst_of_requests_commits_only_the_last() {
        let start = Instant::now();
        let mut fitter = ViewportFitter::new(EdgePadding::uniform(0.0));
        let size = ViewportSize::default();

        fitter.request_fit(start, vec![Coordinates::new(0.0, 0.0)]);
        fitter.request_fit(
            start + Duration::from_millis(200),
            vec![Coordinates::new(1.0, 1.0), Coordinates::new(2.0, 2.0)],
        );
        let last = vec![Coordinates::new(40.0, 10.0), Coordinates::new(41.0, 11.0)];
        fitter.request_fit(start + Duration::from_millis(400), last.clone());

        let mut committed = Vec::new();
        for step in 0..40 {
            if let Some(command) = fitter.poll(start + Duration::from_millis(step * 50), size) {
                committed.push(command);
            }
        }

        assert_eq!(committed.len(), 1);
        let expected = Bounds::from_points(last)
            .unwrap()
            .fit_region(EdgePadding::uniform(0.0), size);
        assert_eq!(committed.first().map(CameraCommand::region), Some(expected));
    }

    #[test]
    fn empty_request_issues_no_command() {
        let start = Instant::now();
        let mut fitter = ViewportFitter::new(EdgePadding::default());
        fitter.request_fit(start, Vec::new());
        assert!(fitter.is_pending());
        assert_eq!(fitter.poll(start + FIT_QUIET_PERIOD, ViewportSize::default()), None);
        assert!(!fitter.is_pending());
    }

    #[test]
    fn empty_request_replaces_a_pending_fit() {
        let start = Instant::now();
        let mut fitter = ViewportFitter::new(EdgePadding::default());
        fitter.request_fit(start, vec![Coordinates::new(50.0, 7.0)]);
        fitter.request_fit(start + Duration::from_millis(100), Vec::new());
        let size = ViewportSize::default();
        assert_eq!(fitter.poll(start + FIT_QUIET_PERIOD, size), None);
        assert_eq!(
            fitter.poll(start + Duration::from_millis(100) + FIT_QUIET_PERIOD, size),
            None
        );
        assert!(!fitter.is_pending());
    }
}
