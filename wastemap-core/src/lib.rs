//! Core types and map logic for the wastemap waste-collection map.

/// Map canvas state, reducer, and scene composition.
pub mod canvas;
/// Derived bin categories and filtering.
pub mod category;
/// Controls, legend, and filter chip panels.
pub mod controls;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Traits describing snapshot sources.
pub mod ports;
/// Route paths and progress overlays.
pub mod progress;
/// High-level service facade used by clients.
pub mod service;
/// Non-spatial counters over a snapshot.
pub mod stats;
/// Marker colors, priorities, and icons.
pub mod style;
/// Cancelable timers polled by the host loop.
pub mod timer;
/// Camera regions and the debounced viewport fitter.
pub mod viewport;

pub use canvas::*;
pub use category::*;
pub use controls::*;
pub use model::*;
pub use ports::*;
pub use progress::*;
pub use service::*;
pub use stats::*;
pub use style::*;
pub use timer::*;
pub use viewport::*;
