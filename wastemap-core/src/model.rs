//! Domain data structures for bins, routes, and their stops.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a bin.
pub struct BinId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a collection route.
pub struct RouteId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a single stop inside a route.
pub struct StopId(pub String);

impl fmt::Display for BinId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// WGS84 position in decimal degrees.
pub struct Coordinates {
    /// Latitude, positive north.
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude, positive east.
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinates {
    /// Construct a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the pair is finite and inside the WGS84 value ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Location block attached to bins and stops.
pub struct Location {
    /// Raw coordinates. Malformed payloads are dropped while decoding.
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Option<Coordinates>,
    /// Optional street address for display.
    #[serde(default)]
    pub address: Option<String>,
}

impl Location {
    /// Location at the given coordinates.
    #[must_use]
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            address: None,
        }
    }

    /// Coordinates usable for spatial rendering.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Operational status reported for a bin.
pub enum BinStatus {
    /// Sensor online and bin in service.
    Active,
    /// Sensor not reporting.
    Offline,
    /// Bin under maintenance.
    Maintenance,
    /// Bin flagged full by the backend.
    Full,
    /// Missing or unrecognised status.
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Waste receptacle with a fill-level sensor.
pub struct Bin {
    /// Unique identifier.
    #[serde(alias = "_id")]
    pub id: BinId,
    /// Human-friendly name or bin code.
    #[serde(default)]
    pub name: Option<String>,
    /// Sensor fill level in percent.
    #[serde(default, deserialize_with = "lenient_percent")]
    pub fill_level: Option<u8>,
    /// Operational status.
    #[serde(default)]
    pub status: BinStatus,
    /// Where the bin stands.
    #[serde(default)]
    pub location: Option<Location>,
    /// Timestamp of the last collection, as sent by the backend.
    #[serde(default)]
    pub last_collection: Option<String>,
}

impl Bin {
    /// Fill level in percent, missing values read as empty.
    #[must_use]
    pub fn fill_level(&self) -> u8 {
        self.fill_level.unwrap_or(0).min(100)
    }

    /// Coordinates usable for spatial rendering.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.as_ref().and_then(Location::coordinates)
    }

    /// Display label, falling back to the identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id.0)
    }

    /// Parsed last collection time. `None` when absent or unparseable.
    #[must_use]
    pub fn last_collection_at(&self) -> Option<DateTime<Utc>> {
        self.last_collection.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Progress of a single stop.
pub enum StopStatus {
    /// Collected.
    Completed,
    /// Passed over, usually with a reason.
    Skipped,
    /// Not visited yet. Missing or unrecognised values land here too.
    #[default]
    #[serde(other)]
    Pending,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ordered waypoint of a route.
pub struct RouteStop {
    /// Stop identifier if the backend assigns one.
    #[serde(default, alias = "_id")]
    pub id: Option<StopId>,
    /// Bin served at this stop.
    #[serde(default)]
    pub bin: Option<BinId>,
    /// Where the stop is.
    #[serde(default)]
    pub location: Option<Location>,
    /// Progress of the stop.
    #[serde(default)]
    pub status: StopStatus,
    /// Why the stop was skipped.
    #[serde(default)]
    pub reason: Option<String>,
}

impl RouteStop {
    /// Coordinates usable for spatial rendering.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.as_ref().and_then(Location::coordinates)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Lifecycle of a route.
pub enum RouteStatus {
    /// Being planned.
    Draft,
    /// Handed to a crew.
    Assigned,
    /// Crew is driving it.
    InProgress,
    /// All stops handled.
    Completed,
    /// Called off.
    Cancelled,
    /// Missing or unrecognised status.
    #[default]
    #[serde(other)]
    Unknown,
}

impl RouteStatus {
    /// Lower-case display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RouteStatus::Draft => "draft",
            RouteStatus::Assigned => "assigned",
            RouteStatus::InProgress => "in progress",
            RouteStatus::Completed => "completed",
            RouteStatus::Cancelled => "cancelled",
            RouteStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ordered collection of stops assigned to a crew.
pub struct Route {
    /// Unique identifier.
    #[serde(alias = "_id")]
    pub id: RouteId,
    /// Route name shown to dispatchers.
    #[serde(default)]
    pub name: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: RouteStatus,
    /// Stops in traversal order.
    #[serde(default)]
    pub stops: Vec<RouteStop>,
    /// Completion as reported by the backend.
    #[serde(default, deserialize_with = "lenient_percent")]
    pub completion_percentage: Option<u8>,
}

impl Route {
    /// Number of stops with status completed, with or without coordinates.
    #[must_use]
    pub fn completed_stops(&self) -> usize {
        self.stops
            .iter()
            .filter(|stop| stop.status == StopStatus::Completed)
            .count()
    }

    /// Completion recomputed from the stop list, rounded to whole percent.
    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        let total = self.stops.len();
        if total == 0 {
            return 0;
        }
        let completed = self.completed_stops();
        // round(100 * c / total) in integers
        let percent = (200 * completed + total) / (2 * total);
        u8::try_from(percent.min(100)).unwrap_or(100)
    }

    /// Completion reported by the backend, or the recomputed one when absent.
    #[must_use]
    pub fn reported_completion(&self) -> u8 {
        self.completion_percentage
            .map_or_else(|| self.completion_percentage(), |percent| percent.min(100))
    }

    /// Display label, falling back to the identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Bins and routes as handed over by the data-fetching side.
pub struct FleetSnapshot {
    /// All known bins.
    #[serde(default)]
    pub bins: Vec<Bin>,
    /// All known routes.
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl FleetSnapshot {
    /// Look up a bin by id.
    #[must_use]
    pub fn bin(&self, id: &BinId) -> Option<&Bin> {
        self.bins.iter().find(|bin| &bin.id == id)
    }

    /// Look up a route by id.
    #[must_use]
    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.iter().find(|route| &route.id == id)
    }
}

/// Render the last collection time of a bin for display.
///
/// Absent timestamps read `"Never"`, unparseable ones `"Invalid Date"`.
#[must_use]
pub fn format_last_collection(bin: &Bin, now: DateTime<Utc>) -> String {
    let Some(raw) = bin.last_collection.as_deref() else {
        return "Never".to_owned();
    };
    let Some(collected) = parse_timestamp(raw) else {
        return "Invalid Date".to_owned();
    };

    let days = (now.date_naive() - collected.date_naive()).num_days();
    match days {
        0 => "today".to_owned(),
        1 => "yesterday".to_owned(),
        2..=6 => format!("{days} days ago"),
        _ => collected.format("%d.%m.%Y").to_string(),
    }
}

/// Whether the bin was collected within `window` before `now`.
#[must_use]
pub fn collected_within(bin: &Bin, now: DateTime<Utc>, window: Duration) -> bool {
    bin.last_collection_at()
        .is_some_and(|collected| collected <= now && now - collected <= window)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// Accepts `{latitude, longitude}` objects and GeoJSON `[lng, lat]` or
// `[lng, lat, alt]` positions; altitude is ignored.
// Anything else decodes to `None` instead of failing the whole payload.
fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Object(Coordinates),
        GeoJson([f64; 2]),
        GeoJsonWithAltitude([f64; 3]),
        Malformed(IgnoredAny),
    }

    let coordinates = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Object(coordinates)) => Some(coordinates),
        Some(
            Raw::GeoJson([longitude, latitude]) | Raw::GeoJsonWithAltitude([longitude, latitude, _]),
        ) => Some(Coordinates::new(latitude, longitude)),
        Some(Raw::Malformed(_)) | None => None,
    };
    Ok(coordinates.filter(Coordinates::is_valid))
}

fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Malformed(IgnoredAny),
    }

    let level = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) if value.is_finite() => {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "value is clamped to 0..=100 first"
            )]
            let percent = value.round().clamp(0.0, 100.0) as u8;
            Some(percent)
        }
        Some(Raw::Number(_) | Raw::Malformed(_)) | None => None,
    };
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_with(statuses: &[StopStatus]) -> Route {
        Route {
            id: RouteId("r1".to_owned()),
            name: None,
            status: RouteStatus::InProgress,
            stops: statuses
                .iter()
                .map(|status| RouteStop {
                    status: *status,
                    ..RouteStop::default()
                })
                .collect(),
            completion_percentage: None,
        }
    }

    #[test]
    fn missing_fill_level_reads_as_zero() {
        let bin: Bin = serde_json::from_str(r#"{"id":"b1","status":"active"}"#).unwrap();
        assert_eq!(bin.fill_level(), 0);
        assert_eq!(bin.status, BinStatus::Active);
    }

    #[test]
    fn unknown_status_and_mongo_id_are_accepted() {
        let bin: Bin =
            serde_json::from_str(r#"{"_id":"b2","status":"decommissioned","fillLevel":42}"#)
                .unwrap();
        assert_eq!(bin.id, BinId("b2".to_owned()));
        assert_eq!(bin.status, BinStatus::Unknown);
        assert_eq!(bin.fill_level(), 42);
    }

    #[test]
    fn geojson_pair_is_longitude_first() {
        let bin: Bin = serde_json::from_str(
            r#"{"id":"b3","location":{"type":"Point","coordinates":[6.96,50.94]}}"#,
        )
        .unwrap();
        let coords = bin.coordinates().unwrap();
        assert!((coords.latitude - 50.94).abs() < 1e-9);
        assert!((coords.longitude - 6.96).abs() < 1e-9);
    }

    #[test]
    fn geojson_altitude_is_ignored() {
        let stop: RouteStop =
            serde_json::from_str(r#"{"location":{"coordinates":[6.96,50.94,54.0]}}"#).unwrap();
        let coords = stop.coordinates().unwrap();
        assert!((coords.latitude - 50.94).abs() < 1e-9);
        assert!((coords.longitude - 6.96).abs() < 1e-9);
    }

    #[test]
    fn malformed_coordinates_drop_silently() {
        let bin: Bin = serde_json::from_str(
            r#"{"id":"b4","fillLevel":"n/a","location":{"coordinates":"somewhere"}}"#,
        )
        .unwrap();
        assert!(bin.coordinates().is_none());
        assert_eq!(bin.fill_level(), 0);

        let out_of_range: Bin = serde_json::from_str(
            r#"{"id":"b5","location":{"coordinates":{"latitude":123.0,"longitude":7.0}}}"#,
        )
        .unwrap();
        assert!(out_of_range.coordinates().is_none());
    }

    #[test]
    fn fractional_fill_level_rounds_and_clamps() {
        let bin: Bin = serde_json::from_str(r#"{"id":"b6","fillLevel":89.6}"#).unwrap();
        assert_eq!(bin.fill_level(), 90);
        let over: Bin = serde_json::from_str(r#"{"id":"b7","fillLevel":140}"#).unwrap();
        assert_eq!(over.fill_level(), 100);
    }

    #[test]
    fn completion_is_recomputed_from_stops() {
        let mut route = route_with(&[
            StopStatus::Completed,
            StopStatus::Completed,
            StopStatus::Pending,
        ]);
        route.completion_percentage = Some(10);
        assert_eq!(route.completion_percentage(), 67);
        assert_eq!(route.reported_completion(), 10);

        route.completion_percentage = None;
        assert_eq!(route.reported_completion(), 67);
        assert_eq!(route_with(&[]).completion_percentage(), 0);
    }

    #[test]
    fn route_status_uses_kebab_case() {
        let route: Route =
            serde_json::from_str(r#"{"id":"r2","status":"in-progress","stops":[{}]}"#).unwrap();
        assert_eq!(route.status, RouteStatus::InProgress);
        assert_eq!(route.stops.first().map(|stop| stop.status), Some(StopStatus::Pending));
    }

    #[test]
    fn unknown_route_and_stop_statuses_degrade() {
        let body = r#"{
            "bins": [{"id": "b1", "fillLevel": 40}],
            "routes": [
                {"id": "r1", "status": "paused", "stops": [{"status": "in-progress"}]},
                {"id": "r2", "stops": [{"status": "completed"}]}
            ]
        }"#;
        let snapshot: FleetSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.bins.len(), 1);

        let paused = snapshot.route(&RouteId("r1".to_owned())).unwrap();
        assert_eq!(paused.status, RouteStatus::Unknown);
        assert_eq!(paused.stops.first().map(|stop| stop.status), Some(StopStatus::Pending));

        let missing = snapshot.route(&RouteId("r2".to_owned())).unwrap();
        assert_eq!(missing.status, RouteStatus::Unknown);
        assert_eq!(missing.status.label(), "unknown");
        assert_eq!(missing.completion_percentage(), 100);
    }

    #[test]
    fn last_collection_formats_fallbacks() {
        let now = DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut bin: Bin = serde_json::from_str(r#"{"id":"b8"}"#).unwrap();
        assert_eq!(format_last_collection(&bin, now), "Never");

        bin.last_collection = Some("not a date".to_owned());
        assert_eq!(format_last_collection(&bin, now), "Invalid Date");

        bin.last_collection = Some("2024-05-09T08:30:00Z".to_owned());
        assert_eq!(format_last_collection(&bin, now), "yesterday");

        bin.last_collection = Some("2024-04-01".to_owned());
        assert_eq!(format_last_collection(&bin, now), "01.04.2024");
    }

    #[test]
    fn collected_within_respects_window() {
        let now = DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut bin: Bin = serde_json::from_str(r#"{"id":"b9"}"#).unwrap();
        assert!(!collected_within(&bin, now, Duration::days(7)));

        bin.last_collection = Some("2024-05-05T12:00:00Z".to_owned());
        assert!(collected_within(&bin, now, Duration::days(7)));

        bin.last_collection = Some("2024-05-01T12:00:00Z".to_owned());
        assert!(!collected_within(&bin, now, Duration::days(7)));
    }
}
