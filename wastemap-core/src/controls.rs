//! Overlay panels around the map: camera controls, map type, legend, filter chips.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canvas::MapEvent;
use crate::category::Category;
use crate::stats::FleetStats;
use crate::style::{Palette, Rgb, Tone};
use crate::viewport::PanDirection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Base map rendering.
pub enum MapMode {
    /// Street map.
    #[default]
    Standard,
    /// Aerial imagery.
    Satellite,
    /// Imagery with street labels.
    Hybrid,
    /// Elevation shading.
    Terrain,
}

impl MapMode {
    /// Next mode in the map-type switch.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            MapMode::Standard => MapMode::Satellite,
            MapMode::Satellite => MapMode::Hybrid,
            MapMode::Hybrid => MapMode::Terrain,
            MapMode::Terrain => MapMode::Standard,
        }
    }

    /// Switch label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            MapMode::Standard => "Standard",
            MapMode::Satellite => "Satellite",
            MapMode::Hybrid => "Hybrid",
            MapMode::Terrain => "Terrain",
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Button on the controls panel.
pub enum ControlCommand {
    /// Zoom in one step.
    ZoomIn,
    /// Zoom out one step.
    ZoomOut,
    /// Move the camera.
    Pan(PanDirection),
    /// Switch to the next map type.
    CycleMapMode,
    /// Center on the current position.
    LocateMe,
    /// Show or hide the legend.
    ToggleLegend,
}

impl From<ControlCommand> for MapEvent {
    fn from(command: ControlCommand) -> Self {
        match command {
            ControlCommand::ZoomIn => MapEvent::ZoomIn,
            ControlCommand::ZoomOut => MapEvent::ZoomOut,
            ControlCommand::Pan(direction) => MapEvent::Pan(direction),
            ControlCommand::CycleMapMode => MapEvent::CycleMapMode,
            ControlCommand::LocateMe => MapEvent::LocateMe,
            ControlCommand::ToggleLegend => MapEvent::ToggleLegend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a legend swatch stands for.
pub enum LegendGroup {
    /// Bin markers.
    Bins,
    /// Route lines.
    Routes,
    /// Stop markers.
    Stops,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One swatch in the legend.
pub struct LegendEntry {
    /// Section of the legend.
    pub group: LegendGroup,
    /// Swatch text.
    pub label: &'static str,
    /// Swatch color.
    pub color: Rgb,
}

const LEGEND: [(LegendGroup, &str, Tone); 13] = [
    (LegendGroup::Bins, "Normal (< 70%)", Tone::Success),
    (LegendGroup::Bins, "Filling (70-89%)", Tone::Warning),
    (LegendGroup::Bins, "Urgent (90%+)", Tone::Error),
    (LegendGroup::Bins, "Maintenance", Tone::Caution),
    (LegendGroup::Bins, "Offline", Tone::Offline),
    (LegendGroup::Routes, "In progress", Tone::Primary),
    (LegendGroup::Routes, "Assigned", Tone::Info),
    (LegendGroup::Routes, "Completed / progress", Tone::Success),
    (LegendGroup::Routes, "Draft / cancelled", Tone::Muted),
    (LegendGroup::Stops, "Pending", Tone::Primary),
    (LegendGroup::Stops, "Completed", Tone::Success),
    (LegendGroup::Stops, "Skipped", Tone::Caution),
    (LegendGroup::Stops, "Start / end: S / E", Tone::Muted),
];

/// Legend swatches resolved against `palette`.
#[must_use]
pub fn legend_entries(palette: &Palette) -> Vec<LegendEntry> {
    LEGEND
        .iter()
        .map(|(group, label, tone)| LegendEntry {
            group: *group,
            label: *label,
            color: palette.color(*tone),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Filter chip with its bin count.
pub struct FilterChip {
    /// Category behind the chip.
    pub category: Category,
    /// Chip text.
    pub label: &'static str,
    /// Bins in the category, map-less bins included.
    pub count: usize,
    /// Whether this chip is the active filter.
    pub active: bool,
}

/// One chip per category, counted from `stats`.
#[must_use]
pub fn filter_chips(stats: &FleetStats, active: Category) -> Vec<FilterChip> {
    Category::ALL_FILTERS
        .into_iter()
        .map(|category| FilterChip {
            category,
            label: category.label(),
            count: stats.count(category),
            active: category == active,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_mode_cycles_through_all_four() {
        let mut mode = MapMode::Standard;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, MapMode::Standard);
        assert_eq!(
            seen,
            [MapMode::Standard, MapMode::Satellite, MapMode::Hybrid, MapMode::Terrain]
        );
    }

    #[test]
    fn legend_follows_the_palette() {
        let mut palette = Palette::default();
        palette.error = Rgb::new(1, 2, 3);
        let entries = legend_entries(&palette);
        let urgent = entries
            .iter()
            .find(|entry| entry.label.starts_with("Urgent"))
            .unwrap();
        assert_eq!(urgent.color, Rgb::new(1, 2, 3));
        assert!(entries.iter().any(|entry| entry.group == LegendGroup::Stops));
    }

    #[test]
    fn exactly_one_chip_is_active() {
        let stats = FleetStats {
            total: 5,
            urgent: 2,
            ..FleetStats::default()
        };
        let chips = filter_chips(&stats, Category::Urgent);
        assert_eq!(chips.len(), Category::ALL_FILTERS.len());
        let active: Vec<&FilterChip> = chips.iter().filter(|chip| chip.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|chip| chip.count), Some(2));
    }

    #[test]
    fn controls_map_onto_events() {
        assert_eq!(MapEvent::from(ControlCommand::ZoomIn), MapEvent::ZoomIn);
        assert_eq!(
            MapEvent::from(ControlCommand::Pan(PanDirection::Left)),
            MapEvent::Pan(PanDirection::Left)
        );
    }
}
