use thiserror::Error;

use crate::config::ConfigError;
use crate::grid::GridError;
use crate::index::IndexError;
use crate::source::SourceError;
use crate::viewport::ViewportError;

/// Crate-level error: every contract violation the core can report.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("index: {0}")]
    Index(#[from] IndexError),
    #[error("grid: {0}")]
    Grid(#[from] GridError),
    #[error("viewport: {0}")]
    Viewport(#[from] ViewportError),
    #[error("source: {0}")]
    Source(#[from] SourceError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}
