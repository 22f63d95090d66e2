//! Solver session abstraction.
//!
//! The [`SolverSession`] trait isolates the pipeline from the external
//! simulation engine's scripting surface. Pipeline stages operate against
//! this trait; backend crates provide the concrete connections.
//!
//! A session owns the engine/licence handle for one solver module. The
//! handle is released when the session is dropped, including on an early
//! error return, so a failed stage never leaks a solver process. The two
//! pipeline sessions (device, then mode) are never open simultaneously.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::types::{ModeFieldTensor, RawVectorField, RegularGrid, TriangularMesh};

/// Which solver module a session is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// Charge-transport / electrostatic device solver.
    Device,
    /// Optical eigenmode solver.
    Mode,
}

/// A value assigned to a named analysis setting before a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisValue {
    Number(f64),
    Text(String),
    Toggle(bool),
    Path(PathBuf),
}

/// Errors crossing the session boundary.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no project loaded in this session")]
    NoProject,

    #[error("failed to load project {path}: {reason}")]
    ProjectLoad { path: PathBuf, reason: String },

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("object '{object}' has no property '{property}'")]
    PropertyMissing { object: String, property: String },

    #[error("result not found: {0}")]
    ResultMissing(String),

    #[error("unexpected array shape for {what}: {details}")]
    ShapeMismatch { what: String, details: String },

    #[error("solver backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connection to one solver module of the external simulation engine.
///
/// The method set mirrors the engine's scripting API: load a prebuilt
/// project, configure analysis settings, run, and pull results and
/// geometry properties back out. The triangulation interpolation is the
/// engine's own routine and stays opaque behind this trait.
pub trait SolverSession {
    /// The solver module this session is connected to.
    fn kind(&self) -> SolverKind;

    /// Load a prebuilt project file into the session.
    fn load_project(&mut self, path: &Path) -> Result<(), SessionError>;

    /// Run the currently configured solve.
    fn run(&mut self) -> Result<(), SessionError>;

    /// Assign a named analysis setting (wavelength, search index, bias
    /// field import, ...).
    fn set_analysis(&mut self, key: &str, value: AnalysisValue) -> Result<(), SessionError>;

    /// Fetch a named vector-field result attribute on its native mesh.
    fn vector_result(&mut self, result: &str, attribute: &str)
        -> Result<RawVectorField, SessionError>;

    /// Fetch the triangular mesh a named result is defined on.
    fn result_mesh(&mut self, result: &str) -> Result<TriangularMesh, SessionError>;

    /// Interpolate per-vertex values from a triangular mesh onto a regular
    /// grid, returning an (nx, nz) array. Grid points outside the mesh are
    /// filled with 0.0.
    fn interpolate_to_grid(
        &self,
        values: &Array1<f64>,
        mesh: &TriangularMesh,
        grid: &RegularGrid,
    ) -> Result<Array2<f64>, SessionError>;

    /// Select a named structural object for subsequent property queries.
    fn select(&mut self, object: &str) -> Result<(), SessionError>;

    /// Read a numeric property of the currently selected object.
    fn get_number(&mut self, property: &str) -> Result<f64, SessionError>;

    /// Fetch the full vector field of a solved mode (0-based index).
    /// Only meaningful after [`SolverSession::run`] on a mode session.
    fn mode_field(&mut self, mode_index: usize) -> Result<ModeFieldTensor, SessionError>;
}
