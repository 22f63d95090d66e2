//! Core types shared across the Overmode pipeline.
//!
//! Every container here is produced exactly once per run and is immutable
//! afterwards: the electrical map is written to the cache file and both
//! maps are consumed by the plotting layer.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3, Array4};
use serde::{Deserialize, Serialize};

/// Axis-aligned extent of a structure or dataset in the x–z plane (µm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent2 {
    pub x_min: f64,
    pub x_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl Extent2 {
    pub fn new(x_min: f64, x_max: f64, z_min: f64, z_max: f64) -> Self {
        Self { x_min, x_max, z_min, z_max }
    }

    /// Build an extent from centre and full-span values:
    /// `min = centre - span/2`, `max = centre + span/2`.
    pub fn from_centre_span(x_centre: f64, x_span: f64, z_centre: f64, z_span: f64) -> Self {
        Self {
            x_min: x_centre - x_span / 2.0,
            x_max: x_centre + x_span / 2.0,
            z_min: z_centre - z_span / 2.0,
            z_max: z_centre + z_span / 2.0,
        }
    }

    /// Smallest extent containing all coordinates in `x` and `z`.
    pub fn from_coords(x: &Array1<f64>, z: &Array1<f64>) -> Self {
        let fold = |a: &Array1<f64>, init: f64, f: fn(f64, f64) -> f64| {
            a.iter().copied().fold(init, f)
        };
        Self {
            x_min: fold(x, f64::INFINITY, f64::min),
            x_max: fold(x, f64::NEG_INFINITY, f64::max),
            z_min: fold(z, f64::INFINITY, f64::min),
            z_max: fold(z, f64::NEG_INFINITY, f64::max),
        }
    }

    /// Raw intersection: max of mins, min of maxes. May be empty —
    /// check with [`Extent2::is_empty`].
    pub fn intersection(&self, other: &Extent2) -> Extent2 {
        Extent2 {
            x_min: self.x_min.max(other.x_min),
            x_max: self.x_max.min(other.x_max),
            z_min: self.z_min.max(other.z_min),
            z_max: self.z_max.min(other.z_max),
        }
    }

    /// An extent is empty when either interval has collapsed (min > max).
    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.z_min > self.z_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.z_max - self.z_min
    }
}

/// A uniform rectangular sampling grid in the x–z plane.
#[derive(Debug, Clone)]
pub struct RegularGrid {
    /// Sample positions along x (µm), ascending.
    pub x: Array1<f64>,
    /// Sample positions along z (µm), ascending.
    pub z: Array1<f64>,
}

impl RegularGrid {
    /// Build an `nx` × `nz` grid spanning the given extent.
    pub fn from_extent(extent: &Extent2, nx: usize, nz: usize) -> Self {
        Self {
            x: Array1::linspace(extent.x_min, extent.x_max, nx),
            z: Array1::linspace(extent.z_min, extent.z_max, nz),
        }
    }
}

/// The unstructured triangular mesh a solver result is defined on.
#[derive(Debug, Clone)]
pub struct TriangularMesh {
    /// Vertex positions, shape (n_vertices, 2): columns are x, z (µm).
    pub vertices: Array2<f64>,
    /// Vertex indices of each triangle, shape (n_triangles, 3).
    pub triangles: Array2<usize>,
}

impl TriangularMesh {
    /// Bounding box of the mesh vertices.
    pub fn bounds(&self) -> Extent2 {
        Extent2::from_coords(
            &self.vertices.column(0).to_owned(),
            &self.vertices.column(1).to_owned(),
        )
    }
}

/// A vector field as handed back by the solver, before any reduction.
///
/// Electrostatic results may carry a trailing bias-sweep axis; a result
/// from a single operating point does not.
#[derive(Debug, Clone)]
pub enum RawVectorField {
    /// Shape (n_points, 3, n_bias): one column triple per bias point.
    Swept(Array3<f64>),
    /// Shape (n_points, 3).
    Static(Array2<f64>),
}

/// Processed electrical field on a regular grid, plus the original mesh
/// bounds. Persisted to the cache file between pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricalFieldMap {
    /// Grid positions along x (µm).
    pub x: Array1<f64>,
    /// Grid positions along z (µm).
    pub z: Array1<f64>,
    /// In-plane field component E_x, shape (nx, nz) (V/µm).
    pub ex: Array2<f64>,
    /// In-plane field component E_z, shape (nx, nz) (V/µm).
    pub ez: Array2<f64>,
    /// |E| = sqrt(E_x² + E_z²), shape (nx, nz).
    pub magnitude: Array2<f64>,
    /// Bounds of the unstructured mesh the field was interpolated from.
    pub extent: Extent2,
    /// Bias point the sweep was collapsed to, if the result was swept.
    pub bias_index: Option<usize>,
}

/// The full vector field of one solved eigenmode on the mode solver's
/// native (non-uniform) grid.
#[derive(Debug, Clone)]
pub struct ModeFieldTensor {
    /// Native sample positions along x (µm).
    pub x: Array1<f64>,
    /// Native sample positions along z (µm).
    pub z: Array1<f64>,
    /// Solved effective index of this mode.
    pub neff: f64,
    /// Field tensor, shape (nx, nz, n_slab, 3): the last axis holds the
    /// Cartesian components, the third the out-of-plane slab layers.
    pub field: Array4<f64>,
}

/// Normalised optical mode intensity on the mode solver's native grid.
#[derive(Debug, Clone)]
pub struct OpticalModeMap {
    /// Native sample positions along x (µm).
    pub x: Array1<f64>,
    /// Native sample positions along z (µm).
    pub z: Array1<f64>,
    /// |E| normalised to its own maximum, shape (nx, nz). Max is 1.0.
    pub intensity: Array2<f64>,
    /// Bounds of the native grid.
    pub extent: Extent2,
    /// Solved effective index.
    pub neff: f64,
    /// Vacuum wavelength the mode was solved at (µm).
    pub wavelength_um: f64,
}

/// Name → extent for every structural region whose geometry could be
/// resolved. Regions that fail both lookup strategies are absent.
pub type ShapeMap = BTreeMap<String, Extent2>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn centre_span_is_exact_for_negative_centres() {
        let e = Extent2::from_centre_span(-1.5, 3.0, -0.25, 0.5);
        assert_eq!(e.x_min, -3.0);
        assert_eq!(e.x_max, 1.5);
        assert_eq!(e.z_min, -0.5);
        assert_eq!(e.z_max, 0.0);
    }

    #[test]
    fn intersection_is_max_min_of_bounds() {
        let a = Extent2::new(-2.0, 2.0, 0.0, 1.0);
        let b = Extent2::new(-1.0, 3.0, -0.5, 0.75);
        let c = a.intersection(&b);
        assert_eq!(c, Extent2::new(-1.0, 2.0, 0.0, 0.75));
        assert!(!c.is_empty());
    }

    #[test]
    fn disjoint_extents_intersect_to_empty() {
        let a = Extent2::new(0.0, 1.0, 0.0, 1.0);
        let b = Extent2::new(2.0, 3.0, 0.0, 1.0);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn mesh_bounds_cover_all_vertices() {
        let mesh = TriangularMesh {
            vertices: array![[0.0, -1.0], [2.0, 0.5], [-0.5, 3.0]],
            triangles: array![[0usize, 1, 2]],
        };
        let b = mesh.bounds();
        assert_eq!(b, Extent2::new(-0.5, 2.0, -1.0, 3.0));
    }

    #[test]
    fn regular_grid_spans_extent_inclusively() {
        let grid = RegularGrid::from_extent(&Extent2::new(0.0, 6.0, -1.0, 1.0), 7, 3);
        assert_eq!(grid.x.len(), 7);
        assert_eq!(grid.x[0], 0.0);
        assert_eq!(grid.x[6], 6.0);
        assert_eq!(grid.z.to_vec(), vec![-1.0, 0.0, 1.0]);
    }
}
