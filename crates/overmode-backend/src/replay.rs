//! Replay session: a solver session driven by recorded engine exports.
//!
//! A recorded session is a JSON sidecar next to the project file
//! (`device.ldev` → `device.json`) holding the object property tables,
//! named vector results with their meshes, and solved mode tensors. The
//! replay backend serves these through the full [`SolverSession`] trait,
//! including a real barycentric triangulation interpolation, so the
//! pipeline and its tests run without an engine licence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3, Array4};
use serde::Deserialize;

use overmode_core::session::{
    AnalysisValue, SessionError, SolverKind, SolverSession,
};
use overmode_core::types::{ModeFieldTensor, RawVectorField, RegularGrid, TriangularMesh};

#[derive(Debug, Deserialize)]
struct RecordedProject {
    #[serde(default)]
    objects: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    results: BTreeMap<String, RecordedResult>,
    #[serde(default)]
    modes: Vec<RecordedMode>,
}

#[derive(Debug, Deserialize)]
struct RecordedResult {
    /// (x, z) per mesh vertex.
    vertices: Vec<[f64; 2]>,
    /// Vertex indices per triangle.
    triangles: Vec<[usize; 3]>,
    attributes: BTreeMap<String, RecordedAttribute>,
}

/// A vector attribute: either one component triple per vertex, or a
/// triple of per-bias sweeps per vertex.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordedAttribute {
    Swept { swept: Vec<Vec<Vec<f64>>> },
    Static { values: Vec<[f64; 3]> },
}

#[derive(Debug, Deserialize)]
struct RecordedMode {
    neff: f64,
    x: Vec<f64>,
    z: Vec<f64>,
    /// (nx, nz, n_slab, 3).
    dims: [usize; 4],
    /// Row-major flattened field tensor.
    field: Vec<f64>,
}

/// A [`SolverSession`] backed by a recorded project.
pub struct ReplaySession {
    kind: SolverKind,
    project: Option<RecordedProject>,
    selected: Option<String>,
    settings: BTreeMap<String, AnalysisValue>,
    ran: bool,
}

impl ReplaySession {
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            project: None,
            selected: None,
            settings: BTreeMap::new(),
            ran: false,
        }
    }

    /// The last value assigned to an analysis setting, if any.
    pub fn analysis_setting(&self, key: &str) -> Option<&AnalysisValue> {
        self.settings.get(key)
    }

    /// Sidecar path for a project file: `device.ldev` → `device.json`.
    fn sidecar(path: &Path) -> PathBuf {
        if path.extension().is_some_and(|e| e == "json") {
            path.to_path_buf()
        } else {
            path.with_extension("json")
        }
    }

    fn project(&self) -> Result<&RecordedProject, SessionError> {
        self.project.as_ref().ok_or(SessionError::NoProject)
    }

    fn result(&self, name: &str) -> Result<&RecordedResult, SessionError> {
        let project = self.project()?;
        if !self.ran {
            return Err(SessionError::Backend(
                "solver has not been run in this session".into(),
            ));
        }
        project
            .results
            .get(name)
            .ok_or_else(|| SessionError::ResultMissing(name.to_string()))
    }
}

impl SolverSession for ReplaySession {
    fn kind(&self) -> SolverKind {
        self.kind
    }

    fn load_project(&mut self, path: &Path) -> Result<(), SessionError> {
        let sidecar = Self::sidecar(path);
        let content =
            std::fs::read_to_string(&sidecar).map_err(|e| SessionError::ProjectLoad {
                path: sidecar.clone(),
                reason: e.to_string(),
            })?;
        let project: RecordedProject =
            serde_json::from_str(&content).map_err(|e| SessionError::ProjectLoad {
                path: sidecar,
                reason: e.to_string(),
            })?;
        log::info!(
            "replay: loaded {} ({} objects, {} results, {} modes)",
            path.display(),
            project.objects.len(),
            project.results.len(),
            project.modes.len()
        );
        self.project = Some(project);
        self.selected = None;
        self.ran = false;
        Ok(())
    }

    fn run(&mut self) -> Result<(), SessionError> {
        self.project()?;
        self.ran = true;
        Ok(())
    }

    fn set_analysis(&mut self, key: &str, value: AnalysisValue) -> Result<(), SessionError> {
        log::debug!("replay: analysis setting {key} = {value:?}");
        self.settings.insert(key.to_string(), value);
        Ok(())
    }

    fn vector_result(
        &mut self,
        result: &str,
        attribute: &str,
    ) -> Result<RawVectorField, SessionError> {
        let record = self.result(result)?;
        let attr = record.attributes.get(attribute).ok_or_else(|| {
            SessionError::ResultMissing(format!("{result}::{attribute}"))
        })?;

        match attr {
            RecordedAttribute::Static { values } => {
                let n = values.len();
                let flat: Vec<f64> = values.iter().flatten().copied().collect();
                let array = Array2::from_shape_vec((n, 3), flat).map_err(|e| {
                    SessionError::ShapeMismatch {
                        what: format!("{result}::{attribute}"),
                        details: e.to_string(),
                    }
                })?;
                Ok(RawVectorField::Static(array))
            }
            RecordedAttribute::Swept { swept } => {
                let n = swept.len();
                let mismatch = |details: String| SessionError::ShapeMismatch {
                    what: format!("{result}::{attribute}"),
                    details,
                };
                let components = swept.first().map_or(0, Vec::len);
                if components != 3 {
                    return Err(mismatch(format!("{components} components per sample")));
                }
                let points = swept[0][0].len();
                let mut array = Array3::zeros((n, 3, points));
                for (i, sample) in swept.iter().enumerate() {
                    if sample.len() != 3 {
                        return Err(mismatch(format!("ragged sample {i}")));
                    }
                    for (c, sweep) in sample.iter().enumerate() {
                        if sweep.len() != points {
                            return Err(mismatch(format!("ragged bias sweep at sample {i}")));
                        }
                        for (b, value) in sweep.iter().enumerate() {
                            array[[i, c, b]] = *value;
                        }
                    }
                }
                Ok(RawVectorField::Swept(array))
            }
        }
    }

    fn result_mesh(&mut self, result: &str) -> Result<TriangularMesh, SessionError> {
        let record = self.result(result)?;
        let nv = record.vertices.len();
        let nt = record.triangles.len();
        let vertices = Array2::from_shape_vec(
            (nv, 2),
            record.vertices.iter().flatten().copied().collect(),
        )
        .map_err(|e| SessionError::ShapeMismatch {
            what: format!("{result} mesh vertices"),
            details: e.to_string(),
        })?;
        let triangles = Array2::from_shape_vec(
            (nt, 3),
            record.triangles.iter().flatten().copied().collect(),
        )
        .map_err(|e| SessionError::ShapeMismatch {
            what: format!("{result} mesh elements"),
            details: e.to_string(),
        })?;
        for &index in &triangles {
            if index >= nv {
                return Err(SessionError::ShapeMismatch {
                    what: format!("{result} mesh elements"),
                    details: format!("vertex index {index} out of range ({nv} vertices)"),
                });
            }
        }
        Ok(TriangularMesh { vertices, triangles })
    }

    fn interpolate_to_grid(
        &self,
        values: &Array1<f64>,
        mesh: &TriangularMesh,
        grid: &RegularGrid,
    ) -> Result<Array2<f64>, SessionError> {
        if values.len() != mesh.vertices.nrows() {
            return Err(SessionError::ShapeMismatch {
                what: "interpolation input".into(),
                details: format!(
                    "{} values for a {}-vertex mesh",
                    values.len(),
                    mesh.vertices.nrows()
                ),
            });
        }

        let mut out = Array2::zeros((grid.x.len(), grid.z.len()));
        for (i, &px) in grid.x.iter().enumerate() {
            for (j, &pz) in grid.z.iter().enumerate() {
                if let Some(v) = interpolate_point(px, pz, mesh, values) {
                    out[[i, j]] = v;
                }
            }
        }
        Ok(out)
    }

    fn select(&mut self, object: &str) -> Result<(), SessionError> {
        if self.project()?.objects.contains_key(object) {
            self.selected = Some(object.to_string());
            Ok(())
        } else {
            Err(SessionError::ObjectNotFound(object.to_string()))
        }
    }

    fn get_number(&mut self, property: &str) -> Result<f64, SessionError> {
        let object = self
            .selected
            .clone()
            .ok_or_else(|| SessionError::Backend("no object selected".into()))?;
        self.project()?
            .objects
            .get(&object)
            .and_then(|table| table.get(property))
            .copied()
            .ok_or(SessionError::PropertyMissing {
                object,
                property: property.to_string(),
            })
    }

    fn mode_field(&mut self, mode_index: usize) -> Result<ModeFieldTensor, SessionError> {
        if !self.ran {
            return Err(SessionError::Backend(
                "mode solver has not been run in this session".into(),
            ));
        }
        let project = self.project()?;
        let mode = project
            .modes
            .get(mode_index)
            .ok_or_else(|| SessionError::ResultMissing(format!("mode {mode_index}")))?;

        let [nx, nz, n_slab, nc] = mode.dims;
        let mismatch = |details: String| SessionError::ShapeMismatch {
            what: format!("mode {mode_index} field tensor"),
            details,
        };
        if nc != 3 {
            return Err(mismatch(format!("{nc} Cartesian components")));
        }
        if mode.x.len() != nx || mode.z.len() != nz {
            return Err(mismatch(format!(
                "coordinate arrays ({}, {}) do not match dims ({nx}, {nz})",
                mode.x.len(),
                mode.z.len()
            )));
        }
        let field = Array4::from_shape_vec((nx, nz, n_slab, nc), mode.field.clone())
            .map_err(|e| mismatch(e.to_string()))?;

        Ok(ModeFieldTensor {
            x: Array1::from_vec(mode.x.clone()),
            z: Array1::from_vec(mode.z.clone()),
            neff: mode.neff,
            field,
        })
    }
}

/// Barycentric interpolation of per-vertex values at one point. Returns
/// `None` when the point lies in no triangle.
fn interpolate_point(
    px: f64,
    pz: f64,
    mesh: &TriangularMesh,
    values: &Array1<f64>,
) -> Option<f64> {
    const EPS: f64 = 1e-12;

    for tri in mesh.triangles.rows() {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let (ax, az) = (mesh.vertices[[a, 0]], mesh.vertices[[a, 1]]);
        let (bx, bz) = (mesh.vertices[[b, 0]], mesh.vertices[[b, 1]]);
        let (cx, cz) = (mesh.vertices[[c, 0]], mesh.vertices[[c, 1]]);

        let det = (bx - ax) * (cz - az) - (cx - ax) * (bz - az);
        if det.abs() < EPS {
            continue; // degenerate triangle
        }

        let l1 = ((px - ax) * (cz - az) - (cx - ax) * (pz - az)) / det;
        let l2 = ((bx - ax) * (pz - az) - (px - ax) * (bz - az)) / det;
        let l0 = 1.0 - l1 - l2;

        if l0 >= -EPS && l1 >= -EPS && l2 >= -EPS {
            return Some(l0 * values[a] + l1 * values[b] + l2 * values[c]);
        }
    }
    None
}
