//! # Overmode Core
//!
//! The data backbone of the Overmode pipeline. This crate defines the
//! containers, array transforms, and solver-session abstraction used to
//! turn raw exports from an external charge-transport / eigenmode engine
//! into regular-grid field maps ready for plotting.
//!
//! ## Architecture
//!
//! The external engine is reached only through the [`session::SolverSession`]
//! trait. Pipeline stages ([`extract`], [`mode`]) drive a session, reduce the
//! returned arrays with [`transforms`], and hand immutable result containers
//! ([`types`]) to the plotting layer.
//!
//! ## Modules
//!
//! - [`types`] — Grids, extents, meshes, and field-map containers.
//! - [`session`] — The solver session trait and its error type.
//! - [`transforms`] — Pure array reductions (bias slicing, normalisation).
//! - [`geometry`] — Structure extent lookup and viewport math.
//! - [`extract`] — Electrical-field extraction stage.
//! - [`mode`] — Optical eigenmode stage.
//! - [`cache`] — On-disk persistence of the processed electrical map.

pub mod cache;
pub mod extract;
pub mod geometry;
pub mod mode;
pub mod session;
pub mod transforms;
pub mod types;

use thiserror::Error;

/// Errors from a pipeline stage: either the session failed or one of the
/// array reductions rejected the data it was handed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Session(#[from] session::SessionError),

    #[error(transparent)]
    Transform(#[from] transforms::TransformError),
}
