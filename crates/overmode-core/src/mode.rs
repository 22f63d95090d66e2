//! Optical eigenmode stage.
//!
//! Configures the mode solver (wavelength, search effective index, and —
//! explicitly — the electrical-field cache to import as the bias
//! condition), runs the eigenmode search, and reduces the requested
//! mode's field tensor to a max-normalised intensity map on the solver's
//! native grid.

use std::path::PathBuf;

use crate::session::{AnalysisValue, SolverSession};
use crate::transforms;
use crate::types::{Extent2, OpticalModeMap};
use crate::StageError;

/// Mode solve configuration.
#[derive(Debug, Clone)]
pub struct ModeSpec {
    /// Vacuum wavelength (µm).
    pub wavelength_um: f64,
    /// Effective index to search for guided modes near.
    pub target_neff: f64,
    /// Which solved mode to extract (0 = dominant).
    pub mode_index: usize,
    /// Out-of-plane slab layer to slice the field tensor at.
    pub slab_index: usize,
    /// Electrical-field cache to import as the bias condition. Wired
    /// explicitly here so the coupling between the two stages never
    /// depends on out-of-band engine state.
    pub bias_field_cache: Option<PathBuf>,
}

/// Run the eigenmode search against an open mode session with a loaded
/// photonic project.
pub fn solve_mode(
    session: &mut dyn SolverSession,
    spec: &ModeSpec,
) -> Result<OpticalModeMap, StageError> {
    session.set_analysis("wavelength", AnalysisValue::Number(spec.wavelength_um))?;
    session.set_analysis("search neff", AnalysisValue::Number(spec.target_neff))?;
    match &spec.bias_field_cache {
        Some(path) => {
            session.set_analysis("import bias field", AnalysisValue::Toggle(true))?;
            session.set_analysis("bias field path", AnalysisValue::Path(path.clone()))?;
        }
        None => {
            session.set_analysis("import bias field", AnalysisValue::Toggle(false))?;
        }
    }

    session.run()?;

    let tensor = session.mode_field(spec.mode_index)?;
    let magnitude = transforms::mode_plane_magnitude(&tensor, spec.slab_index)?;
    let intensity = transforms::normalise_max(&magnitude)?;
    let extent = Extent2::from_coords(&tensor.x, &tensor.z);

    Ok(OpticalModeMap {
        x: tensor.x,
        z: tensor.z,
        intensity,
        extent,
        neff: tensor.neff,
        wavelength_um: spec.wavelength_um,
    })
}
