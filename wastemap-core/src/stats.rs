//! Counters shown next to the map: category counts, average fill, recent collections.

use chrono::{DateTime, Duration, Utc};

use crate::category::{Category, classify};
use crate::model::{Bin, collected_within};

/// Window for the "collected recently" share.
pub const RECENT_COLLECTION_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Non-spatial statistics over a bin snapshot.
///
/// Bins without coordinates are counted here even though the map skips them.
pub struct FleetStats {
    /// Number of bins.
    pub total: usize,
    /// Bins at or above the urgent threshold.
    pub urgent: usize,
    /// Bins in the filling band.
    pub filling: usize,
    /// Bins below the filling band.
    pub normal: usize,
    /// Bins with an offline sensor.
    pub offline: usize,
    /// Bins under maintenance.
    pub maintenance: usize,
    /// Mean fill level in percent, missing levels counted as empty.
    pub average_fill: f64,
    /// Share of bins collected within the trailing week, whole percent.
    pub collected_recently: u8,
}

impl FleetStats {
    /// Statistics for `bins` as of `now`.
    #[must_use]
    pub fn compute(bins: &[Bin], now: DateTime<Utc>) -> Self {
        let window = Duration::days(RECENT_COLLECTION_WINDOW_DAYS);
        let mut stats = Self {
            total: bins.len(),
            ..Self::default()
        };
        let mut fill_sum = 0_u64;
        let mut recent = 0_usize;

        for bin in bins {
            let counter = match classify(bin) {
                Category::Urgent => &mut stats.urgent,
                Category::Filling => &mut stats.filling,
                _ => &mut stats.normal,
            };
            *counter += 1;
            if Category::Offline.matches(bin) {
                stats.offline += 1;
            }
            if Category::Maintenance.matches(bin) {
                stats.maintenance += 1;
            }
            fill_sum += u64::from(bin.fill_level());
            if collected_within(bin, now, window) {
                recent += 1;
            }
        }

        if stats.total > 0 {
            #[expect(
                clippy::cast_precision_loss,
                reason = "bin counts stay far below 2^52"
            )]
            let total = stats.total as f64;
            #[expect(
                clippy::cast_precision_loss,
                reason = "sum of percentages stays far below 2^52"
            )]
            let sum = fill_sum as f64;
            stats.average_fill = sum / total;
            // round(100 * recent / total) in integers
            let percent = (200 * recent + stats.total) / (2 * stats.total);
            stats.collected_recently = u8::try_from(percent).unwrap_or(100);
        }
        stats
    }

    /// Count behind a filter chip.
    #[must_use]
    pub const fn count(&self, category: Category) -> usize {
        match category {
            Category::All => self.total,
            Category::Urgent => self.urgent,
            Category::Filling => self.filling,
            Category::Normal => self.normal,
            Category::Offline => self.offline,
            Category::Maintenance => self.maintenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::filter_bins;
    use crate::model::{BinId, BinStatus};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn bin(fill_level: Option<u8>, status: BinStatus, collected: Option<&str>) -> Bin {
        Bin {
            id: BinId("b".to_owned()),
            name: None,
            fill_level,
            status,
            location: None,
            last_collection: collected.map(str::to_owned),
        }
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        assert_eq!(FleetStats::compute(&[], now()), FleetStats::default());
    }

    #[test]
    fn counts_match_the_filter_predicates() {
        let bins = vec![
            bin(Some(95), BinStatus::Offline, Some("2024-05-09T00:00:00Z")),
            bin(Some(75), BinStatus::Active, Some("2024-04-01T00:00:00Z")),
            bin(None, BinStatus::Maintenance, None),
            bin(Some(30), BinStatus::Active, Some("garbage")),
        ];
        let stats = FleetStats::compute(&bins, now());
        for category in Category::ALL_FILTERS {
            assert_eq!(
                stats.count(category),
                filter_bins(&bins, category).len(),
                "count for {category}"
            );
        }
        assert_eq!(stats.urgent + stats.filling + stats.normal, stats.total);
        assert!((stats.average_fill - 50.0).abs() < 1e-9);
        assert_eq!(stats.collected_recently, 25);
    }
}
