//! Route paths, completed-so-far prefixes, and their polyline styling.

use crate::model::{Coordinates, Route, RouteId, RouteStatus, StopStatus};
use crate::style::{Palette, Rgb, Tone, route_tone, stop_tone};

/// Stroke width of the full route path.
pub const BASE_STROKE_WIDTH: u8 = 3;
/// Stroke width of the progress overlay.
pub const PROGRESS_STROKE_WIDTH: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
/// Styled line through a sequence of coordinates.
pub struct Polyline {
    /// Points in drawing order.
    pub points: Vec<Coordinates>,
    /// Stroke color.
    pub color: Rgb,
    /// Stroke width in logical pixels.
    pub width: u8,
    /// Dashed stroke.
    pub dashed: bool,
    /// Higher values draw above lower ones.
    pub z_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Text on a stop marker.
pub enum StopLabel {
    /// First stop with coordinates.
    Start,
    /// Last stop with coordinates.
    End,
    /// Any other stop, numbered from one.
    Number(usize),
}

impl StopLabel {
    /// Marker text.
    #[must_use]
    pub fn text(self) -> String {
        match self {
            StopLabel::Start => "S".to_owned(),
            StopLabel::End => "E".to_owned(),
            StopLabel::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Numbered marker for one stop.
pub struct StopMarker {
    /// Marker position.
    pub coordinates: Coordinates,
    /// Marker text.
    pub label: StopLabel,
    /// Fill color, keyed by the stop's own status.
    pub color: Rgb,
    /// Stop status.
    pub status: StopStatus,
}

#[derive(Debug, Clone, PartialEq)]
/// Everything drawn for one route.
pub struct RouteOverlay {
    /// Route being drawn.
    pub route_id: RouteId,
    /// Full path.
    pub base: Polyline,
    /// Completed part, drawn above the base.
    pub progress: Option<Polyline>,
    /// Stop markers in path order.
    pub stops: Vec<StopMarker>,
}

/// Stop coordinates in traversal order; stops without coordinates are dropped.
///
/// `None` when fewer than two points remain, since one point is no line.
#[must_use]
pub fn path_for(route: &Route) -> Option<Vec<Coordinates>> {
    let path: Vec<Coordinates> = route.stops.iter().filter_map(|stop| stop.coordinates()).collect();
    (path.len() >= 2).then_some(path)
}

/// Leading part of the path that counts as completed.
///
/// Only in-progress routes have one. Completed stops count even without
/// coordinates, and the share of completed stops is rounded up to whole path
/// points so a freshly completed stop shows immediately.
#[must_use]
pub fn progress_prefix(route: &Route) -> Vec<Coordinates> {
    if route.status != RouteStatus::InProgress {
        return Vec::new();
    }
    let Some(path) = path_for(route) else {
        return Vec::new();
    };
    let length = prefix_length(route.completed_stops(), route.stops.len(), path.len());
    path.into_iter().take(length).collect()
}

// ceil(completed / total * points), in integers
fn prefix_length(completed: usize, total: usize, points: usize) -> usize {
    if total == 0 || completed == 0 {
        return 0;
    }
    let completed = completed.min(total);
    (completed * points).div_ceil(total)
}

/// Polylines and stop markers for `route`, or `None` when it has no drawable path.
#[must_use]
pub fn render_route(route: &Route, palette: &Palette) -> Option<RouteOverlay> {
    let path = path_for(route)?;

    let prefix = progress_prefix(route);
    // a lone point cannot be stroked either
    let progress = (prefix.len() >= 2).then(|| Polyline {
        points: prefix,
        color: palette.color(Tone::Success),
        width: PROGRESS_STROKE_WIDTH,
        dashed: false,
        z_index: 1,
    });

    let last = path.len().saturating_sub(1);
    let stops = route
        .stops
        .iter()
        .filter_map(|stop| stop.coordinates().map(|coordinates| (stop.status, coordinates)))
        .enumerate()
        .map(|(index, (status, coordinates))| StopMarker {
            coordinates,
            label: match index {
                0 => StopLabel::Start,
                _ if index == last => StopLabel::End,
                _ => StopLabel::Number(index + 1),
            },
            color: palette.color(stop_tone(status)),
            status,
        })
        .collect();

    let base = Polyline {
        points: path,
        color: palette.color(route_tone(route.status)),
        width: BASE_STROKE_WIDTH,
        dashed: route.status == RouteStatus::Draft,
        z_index: 0,
    };

    Some(RouteOverlay {
        route_id: route.id.clone(),
        base,
        progress,
        stops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, RouteStop};

    fn stop(status: StopStatus, coordinates: Option<(f64, f64)>) -> RouteStop {
        RouteStop {
            location: coordinates.map(|(lat, lon)| Location::at(Coordinates::new(lat, lon))),
            status,
            ..RouteStop::default()
        }
    }

    fn route(status: RouteStatus, stops: Vec<RouteStop>) -> Route {
        Route {
            id: RouteId("r".to_owned()),
            name: None,
            status,
            stops,
            completion_percentage: None,
        }
    }

    fn located(statuses: &[StopStatus]) -> Vec<RouteStop> {
        statuses
            .iter()
            .zip(0_u32..)
            .map(|(status, offset)| stop(*status, Some((50.0 + f64::from(offset) * 0.01, 7.0))))
            .collect()
    }

    #[test]
    fn half_completed_route_draws_half_the_path() {
        use StopStatus::{Completed, Pending};
        let candidate = route(
            RouteStatus::InProgress,
            located(&[Completed, Completed, Pending, Pending]),
        );
        let prefix = progress_prefix(&candidate);
        assert_eq!(prefix.len(), 2);
        let expected: Vec<Coordinates> = path_for(&candidate)
            .unwrap_or_default()
            .into_iter()
            .take(2)
            .collect();
        assert_eq!(prefix, expected);
    }

    #[test]
    fn prefix_rounds_up() {
        use StopStatus::{Completed, Pending};
        let candidate = route(
            RouteStatus::InProgress,
            located(&[Completed, Pending, Pending, Pending, Pending]),
        );
        // ceil(1/5 * 5) = 1 and ceil(1/3 * 2) = 1
        assert_eq!(progress_prefix(&candidate).len(), 1);
        assert_eq!(prefix_length(1, 3, 2), 1);
        assert_eq!(prefix_length(2, 3, 2), 2);
    }

    #[test]
    fn completed_stops_without_coordinates_still_count() {
        use StopStatus::{Completed, Pending};
        let mut stops = vec![stop(Completed, None), stop(Completed, None)];
        stops.extend(located(&[Pending, Pending]));
        let candidate = route(RouteStatus::InProgress, stops);
        // c = 2, total = 4, n = 2 -> ceil(0.5 * 2) = 1
        assert_eq!(progress_prefix(&candidate).len(), 1);
    }

    #[test]
    fn prefix_is_monotonic_and_reaches_full_path() {
        let total = 6;
        let mut previous = 0;
        for completed in 0..=total {
            let statuses: Vec<StopStatus> = (0..total)
                .map(|index| {
                    if index < completed {
                        StopStatus::Completed
                    } else {
                        StopStatus::Pending
                    }
                })
                .collect();
            let candidate = route(RouteStatus::InProgress, located(&statuses));
            let length = progress_prefix(&candidate).len();
            assert!(length >= previous, "prefix shrank at {completed} completed");
            if completed == 0 {
                assert_eq!(length, 0);
            }
            if completed == total {
                assert_eq!(length, total);
            }
            previous = length;
        }
    }

    #[test]
    fn only_in_progress_routes_have_a_prefix() {
        use StopStatus::Completed;
        let candidate = route(RouteStatus::Completed, located(&[Completed, Completed]));
        assert!(progress_prefix(&candidate).is_empty());
        let overlay = render_route(&candidate, &Palette::default()).unwrap();
        assert!(overlay.progress.is_none());
        assert_eq!(overlay.base.color, Palette::default().success);
    }

    #[test]
    fn single_located_stop_draws_nothing() {
        use StopStatus::{Completed, Pending};
        let candidate = route(
            RouteStatus::InProgress,
            vec![
                stop(Completed, None),
                stop(Pending, Some((50.0, 7.0))),
                stop(Pending, None),
            ],
        );
        assert!(path_for(&candidate).is_none());
        assert!(progress_prefix(&candidate).is_empty());
        assert!(render_route(&candidate, &Palette::default()).is_none());
    }

    #[test]
    fn overlay_styles_and_labels() {
        use StopStatus::{Completed, Pending, Skipped};
        let palette = Palette::default();
        let candidate = route(
            RouteStatus::InProgress,
            located(&[Completed, Completed, Skipped, Pending]),
        );
        let overlay = render_route(&candidate, &palette).unwrap();

        assert_eq!(overlay.base.color, palette.primary);
        assert_eq!(overlay.base.width, BASE_STROKE_WIDTH);
        assert!(!overlay.base.dashed);

        let progress = overlay.progress.unwrap();
        assert_eq!(progress.color, palette.success);
        assert!(progress.z_index > overlay.base.z_index);
        assert!(progress.width > overlay.base.width);
        assert_eq!(progress.points.len(), 2);

        let labels: Vec<String> = overlay.stops.iter().map(|marker| marker.label.text()).collect();
        assert_eq!(labels, ["S", "2", "3", "E"]);
        let colors: Vec<Rgb> = overlay.stops.iter().map(|marker| marker.color).collect();
        assert_eq!(
            colors,
            [palette.success, palette.success, palette.caution, palette.primary]
        );
    }

    #[test]
    fn draft_routes_are_dashed() {
        let candidate = route(
            RouteStatus::Draft,
            located(&[StopStatus::Pending, StopStatus::Pending]),
        );
        let overlay = render_route(&candidate, &Palette::default()).unwrap();
        assert!(overlay.base.dashed);
        assert_eq!(overlay.base.color, Palette::default().muted);
        let labels: Vec<StopLabel> = overlay.stops.iter().map(|marker| marker.label).collect();
        assert_eq!(labels, [StopLabel::Start, StopLabel::End]);
    }
}
