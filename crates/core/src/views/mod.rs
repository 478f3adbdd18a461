//! Pure functions from surface state to render commands.

pub mod histogram;
pub mod indicators;
pub mod time_axis;
pub mod tooltip;
