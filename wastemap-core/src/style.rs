//! Marker colors, priorities, and icons.
//!
//! Every status type maps to a semantic [`Tone`] through one exhaustive
//! function. Tones become concrete colors only through an injected
//! [`Palette`], so hosts can re-theme the map without touching the mapping.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::category::{FILLING_FILL_LEVEL, URGENT_FILL_LEVEL};
use crate::model::{Bin, BinStatus, RouteStatus, StopStatus};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Failure to parse a `#rrggbb` color.
pub enum ParseColorError {
    /// The string is not seven characters starting with `#`.
    #[error("expected #rrggbb, got {0:?}")]
    Format(String),
    /// A channel is not valid hexadecimal.
    #[error("invalid hex digits in {0:?}")]
    Hex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// 24-bit RGB color.
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Construct a color from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "#{:02x}{:02x}{:02x}",
            self.red, self.green, self.blue
        )
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let Some(hex) = trimmed.strip_prefix('#') else {
            return Err(ParseColorError::Format(input.to_owned()));
        };
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError::Format(input.to_owned()));
        }
        let channel = |range: Range<usize>| {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| ParseColorError::Hex(input.to_owned()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Semantic color slot.
pub enum Tone {
    /// Healthy, collected, completed.
    Success,
    /// Filling up.
    Warning,
    /// Maintenance, skipped.
    Caution,
    /// Full, urgent.
    Error,
    /// Sensor offline.
    Offline,
    /// Brand color.
    Primary,
    /// Assigned routes.
    Info,
    /// Drafts and cancelled routes.
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Color per tone. Injected into the renderer, never global.
pub struct Palette {
    /// [`Tone::Success`].
    pub success: Rgb,
    /// [`Tone::Warning`].
    pub warning: Rgb,
    /// [`Tone::Caution`].
    pub caution: Rgb,
    /// [`Tone::Error`].
    pub error: Rgb,
    /// [`Tone::Offline`].
    pub offline: Rgb,
    /// [`Tone::Primary`].
    pub primary: Rgb,
    /// [`Tone::Info`].
    pub info: Rgb,
    /// [`Tone::Muted`].
    pub muted: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            success: Rgb::new(0x4c, 0xaf, 0x50),
            warning: Rgb::new(0xff, 0x98, 0x00),
            caution: Rgb::new(0xff, 0xc1, 0x07),
            error: Rgb::new(0xf4, 0x43, 0x36),
            offline: Rgb::new(0x9e, 0x9e, 0x9e),
            primary: Rgb::new(0x2e, 0x7d, 0x32),
            info: Rgb::new(0x21, 0x96, 0xf3),
            muted: Rgb::new(0x75, 0x75, 0x75),
        }
    }
}

impl Palette {
    /// Concrete color for a tone.
    #[must_use]
    pub const fn color(&self, tone: Tone) -> Rgb {
        match tone {
            Tone::Success => self.success,
            Tone::Warning => self.warning,
            Tone::Caution => self.caution,
            Tone::Error => self.error,
            Tone::Offline => self.offline,
            Tone::Primary => self.primary,
            Tone::Info => self.info,
            Tone::Muted => self.muted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
/// Collection priority derived from fill level alone.
pub enum Priority {
    /// Below 70 %.
    Low,
    /// 70 % up to 90 %.
    Medium,
    /// 90 % and above.
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Marker glyph for a bin.
pub enum BinIcon {
    /// Regular bin.
    Bin,
    /// Bin at or above the urgent threshold.
    FullBin,
    /// Bin under maintenance.
    Wrench,
    /// Sensor offline.
    SignalOff,
}

/// Tone of a bin marker.
///
/// Status wins over fill level: offline, then maintenance, then the fill
/// bands. Filtering deliberately does not follow this order.
#[must_use]
pub fn bin_tone(bin: &Bin) -> Tone {
    match bin.status {
        BinStatus::Offline => Tone::Offline,
        BinStatus::Maintenance => Tone::Caution,
        BinStatus::Active | BinStatus::Full | BinStatus::Unknown => {
            let level = bin.fill_level();
            if level >= URGENT_FILL_LEVEL {
                Tone::Error
            } else if level >= FILLING_FILL_LEVEL {
                Tone::Warning
            } else {
                Tone::Success
            }
        }
    }
}

/// Marker color of a bin under `palette`.
#[must_use]
pub fn color_for(bin: &Bin, palette: &Palette) -> Rgb {
    palette.color(bin_tone(bin))
}

/// Collection priority of a bin, ignoring its status.
#[must_use]
pub fn priority_for(bin: &Bin) -> Priority {
    let level = bin.fill_level();
    if level >= URGENT_FILL_LEVEL {
        Priority::Urgent
    } else if level >= FILLING_FILL_LEVEL {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Marker glyph of a bin, with the same precedence as [`bin_tone`].
#[must_use]
pub fn icon_for(bin: &Bin) -> BinIcon {
    match bin_tone(bin) {
        Tone::Offline => BinIcon::SignalOff,
        Tone::Caution => BinIcon::Wrench,
        Tone::Error => BinIcon::FullBin,
        _ => BinIcon::Bin,
    }
}

/// Base polyline tone of a route.
#[must_use]
pub const fn route_tone(status: RouteStatus) -> Tone {
    match status {
        RouteStatus::Completed => Tone::Success,
        RouteStatus::InProgress => Tone::Primary,
        RouteStatus::Assigned => Tone::Info,
        RouteStatus::Draft | RouteStatus::Cancelled | RouteStatus::Unknown => Tone::Muted,
    }
}

/// Marker tone of a stop, independent of its route.
#[must_use]
pub const fn stop_tone(status: StopStatus) -> Tone {
    match status {
        StopStatus::Completed => Tone::Success,
        StopStatus::Skipped => Tone::Caution,
        StopStatus::Pending => Tone::Primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BinId;

    fn bin(fill_level: u8, status: BinStatus) -> Bin {
        Bin {
            id: BinId("b".to_owned()),
            name: None,
            fill_level: Some(fill_level),
            status,
            location: None,
            last_collection: None,
        }
    }

    #[test]
    fn full_active_bin_is_red_and_urgent() {
        let candidate = bin(95, BinStatus::Active);
        let palette = Palette::default();
        assert_eq!(color_for(&candidate, &palette), palette.error);
        assert_eq!(priority_for(&candidate), Priority::Urgent);
        assert_eq!(icon_for(&candidate), BinIcon::FullBin);
    }

    #[test]
    fn status_overrides_fill_level_color() {
        let palette = Palette::default();
        assert_eq!(color_for(&bin(95, BinStatus::Offline), &palette), palette.offline);
        assert_eq!(color_for(&bin(95, BinStatus::Maintenance), &palette), palette.caution);
        // priority keeps looking at the fill level
        assert_eq!(priority_for(&bin(95, BinStatus::Offline)), Priority::Urgent);
    }

    #[test]
    fn fill_bands_color_active_bins() {
        assert_eq!(bin_tone(&bin(75, BinStatus::Active)), Tone::Warning);
        assert_eq!(bin_tone(&bin(10, BinStatus::Full)), Tone::Success);
        assert_eq!(priority_for(&bin(70, BinStatus::Active)), Priority::Medium);
        assert_eq!(priority_for(&bin(69, BinStatus::Active)), Priority::Low);
    }

    #[test]
    fn route_and_stop_tones() {
        assert_eq!(route_tone(RouteStatus::InProgress), Tone::Primary);
        assert_eq!(route_tone(RouteStatus::Assigned), Tone::Info);
        assert_eq!(route_tone(RouteStatus::Cancelled), Tone::Muted);
        assert_eq!(route_tone(RouteStatus::Unknown), Tone::Muted);
        assert_eq!(stop_tone(StopStatus::default()), Tone::Primary);
        assert_eq!(stop_tone(StopStatus::Skipped), Tone::Caution);
        assert_eq!(stop_tone(StopStatus::Completed), Tone::Success);
    }

    #[test]
    fn rgb_parses_and_prints_hex() {
        let color: Rgb = "#1A2b3c".parse().unwrap();
        assert_eq!(color, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_string(), "#1a2b3c");
        assert!(matches!("1a2b3c".parse::<Rgb>(), Err(ParseColorError::Format(_))));
        assert!(matches!("#zz0000".parse::<Rgb>(), Err(ParseColorError::Hex(_))));
    }

    #[test]
    fn palette_overrides_merge_with_defaults() {
        let palette: Palette = serde_json::from_str(r##"{"primary":"#000000"}"##).unwrap();
        assert_eq!(palette.primary, Rgb::new(0, 0, 0));
        assert_eq!(palette.error, Palette::default().error);
    }
}
