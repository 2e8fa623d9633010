//! Derived bin categories and the single-filter predicate used by the map.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Bin, BinStatus};

/// Fill level at or above which a bin is urgent.
pub const URGENT_FILL_LEVEL: u8 = 90;
/// Fill level at or above which a bin is filling up.
pub const FILLING_FILL_LEVEL: u8 = 70;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Filter bucket for bins. Exactly one is active on the map at a time.
pub enum Category {
    /// Identity filter.
    #[default]
    All,
    /// Fill level at or above 90 %.
    #[serde(alias = "full")]
    Urgent,
    /// Fill level from 70 % up to 90 %.
    Filling,
    /// Fill level below 70 %.
    Normal,
    /// Sensor offline.
    Offline,
    /// Under maintenance.
    Maintenance,
}

impl Category {
    /// Every category in chip order.
    pub const ALL_FILTERS: [Category; 6] = [
        Category::All,
        Category::Urgent,
        Category::Filling,
        Category::Normal,
        Category::Offline,
        Category::Maintenance,
    ];

    /// Whether `bin` belongs to this category.
    ///
    /// Fill-level categories look at the fill level only and status
    /// categories look at the status only, so one bin can match several.
    #[must_use]
    pub fn matches(self, bin: &Bin) -> bool {
        match self {
            Category::All => true,
            Category::Urgent | Category::Filling | Category::Normal => classify(bin) == self,
            Category::Offline => bin.status == BinStatus::Offline,
            Category::Maintenance => bin.status == BinStatus::Maintenance,
        }
    }

    /// Next category in chip order, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Category::All => Category::Urgent,
            Category::Urgent => Category::Filling,
            Category::Filling => Category::Normal,
            Category::Normal => Category::Offline,
            Category::Offline => Category::Maintenance,
            Category::Maintenance => Category::All,
        }
    }

    /// Chip label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Urgent => "Urgent",
            Category::Filling => "Filling",
            Category::Normal => "Normal",
            Category::Offline => "Offline",
            Category::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Fill-level band of a bin: urgent, filling, or normal.
///
/// Status never enters here; a missing fill level counts as empty.
#[must_use]
pub fn classify(bin: &Bin) -> Category {
    let level = bin.fill_level();
    if level >= URGENT_FILL_LEVEL {
        Category::Urgent
    } else if level >= FILLING_FILL_LEVEL {
        Category::Filling
    } else {
        Category::Normal
    }
}

/// Bins matching `category`, in input order.
#[must_use]
pub fn filter_bins(bins: &[Bin], category: Category) -> Vec<&Bin> {
    bins.iter().filter(|bin| category.matches(bin)).collect()
}
