//! Electrical field extraction stage.
//!
//! Pulls the electrostatic vector field and its supporting triangular
//! mesh from a solved device session, reduces it to the in-plane
//! (E_x, E_z) pair at one bias point, and interpolates both components
//! onto a regular grid via the engine's own triangulation routine.
//!
//! Any session failure aborts the stage; there is nothing to degrade to
//! without the field.

use crate::session::{SessionError, SolverSession};
use crate::transforms;
use crate::types::{ElectricalFieldMap, RawVectorField, RegularGrid};
use crate::StageError;

/// What to pull from the device session and how to grid it.
#[derive(Debug, Clone)]
pub struct ElectricalSpec {
    /// Name of the solver result holding the field (e.g. "electrostatics").
    pub result: String,
    /// Name of the vector attribute within the result (e.g. "E").
    pub attribute: String,
    /// Regular grid resolution along x.
    pub nx: usize,
    /// Regular grid resolution along z.
    pub nz: usize,
    /// Bias point to collapse a swept result to (middle of the sweep).
    pub bias_index: usize,
}

/// Run the extraction against a device session whose project has been
/// loaded and solved.
pub fn extract_electrical_field(
    session: &mut dyn SolverSession,
    spec: &ElectricalSpec,
) -> Result<ElectricalFieldMap, StageError> {
    let raw = session.vector_result(&spec.result, &spec.attribute)?;
    let mesh = session.result_mesh(&spec.result)?;

    let n_vertices = mesh.vertices.nrows();
    let n_samples = match &raw {
        RawVectorField::Swept(f) => f.len_of(ndarray::Axis(0)),
        RawVectorField::Static(f) => f.nrows(),
    };
    if n_samples != n_vertices {
        return Err(StageError::Session(SessionError::ShapeMismatch {
            what: format!("{}::{}", spec.result, spec.attribute),
            details: format!("{n_samples} field samples on a {n_vertices}-vertex mesh"),
        }));
    }

    let was_swept = matches!(raw, RawVectorField::Swept(_));
    let in_plane = transforms::in_plane_components(&raw, spec.bias_index)?;

    let extent = mesh.bounds();
    let grid = RegularGrid::from_extent(&extent, spec.nx, spec.nz);

    let ex = session.interpolate_to_grid(&in_plane.column(0).to_owned(), &mesh, &grid)?;
    let ez = session.interpolate_to_grid(&in_plane.column(1).to_owned(), &mesh, &grid)?;
    let magnitude = transforms::vector_magnitude(&ex, &ez);

    Ok(ElectricalFieldMap {
        x: grid.x,
        z: grid.z,
        ex,
        ez,
        magnitude,
        extent,
        bias_index: was_swept.then_some(spec.bias_index),
    })
}
