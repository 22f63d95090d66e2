//! # Overmode Plot
//!
//! Renders the two pipeline figures with `plotters`:
//!
//! - a dark-theme overlay of normalised optical intensity, electrical
//!   field vectors, and structure outlines;
//! - a light-theme optical-only profile with the same outlines.
//!
//! Both figures share one viewport: the intersection of the electrical
//! and optical dataset bounds. Non-overlapping datasets are reported as
//! [`PlotError::EmptyViewport`] rather than drawn degenerately.

mod compose;
pub mod theme;

pub use compose::{render_figures, render_mode, render_overlay};
pub use overmode_core::geometry::common_viewport;
pub use theme::Theme;

use thiserror::Error;

/// Errors from figure composition.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("electrical and optical datasets do not overlap in space")]
    EmptyViewport,

    #[error("drawing error: {0}")]
    Draw(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
