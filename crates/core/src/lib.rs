//! Core of the timeline histogram: bin counting, calendar grid planning,
//! pan/zoom projection and the render surface that ties them together.
//!
//! Nothing in this crate talks to a GUI toolkit. A paint pass produces a
//! list of [`timeline_protocol::RenderCommand`]s that the egui and terminal
//! front ends (or [`svg::render_svg`]) draw.

pub mod binning;
pub mod config;
pub mod error;
pub mod grid;
pub mod index;
pub mod nearest;
pub mod range;
pub mod source;
pub mod surface;
pub mod svg;
pub mod viewport;
pub mod views;

pub use binning::BinSpec;
pub use config::TimelineConfig;
pub use error::TimelineError;
pub use grid::{FixedWidthMetrics, GridLine, GridPlanner, LabelMetrics};
pub use index::{HistogramBin, TimestampIndex};
pub use nearest::{RowOrder, nearest_row};
pub use range::TimeRange;
pub use surface::{HoverInfo, InputEvent, RenderSurface, SurfaceEvent};
pub use viewport::{ViewportTransform, WheelDelta, WheelMode};
