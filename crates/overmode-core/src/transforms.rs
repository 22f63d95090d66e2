//! Pure array reductions between the solver's raw exports and the
//! plottable field maps. Everything here is independent of the external
//! engine and fully unit-tested.

use ndarray::{Array2, Array3, Axis};
use thiserror::Error;

use crate::types::{ModeFieldTensor, RawVectorField};

/// Errors from array reductions.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("bias index {index} out of range for a sweep of {points} points")]
    BiasIndexOutOfRange { index: usize, points: usize },

    #[error("expected a 3-component vector field, found {found} components")]
    ComponentCount { found: usize },

    #[error("slab index {index} out of range ({layers} out-of-plane layers)")]
    SlabIndexOutOfRange { index: usize, layers: usize },

    #[error("cannot normalise an all-zero field")]
    ZeroField,
}

/// Collapse a bias-swept field (n, 3, n_bias) to the single operating
/// point `bias_index`, yielding (n, 3).
pub fn select_bias_point(
    field: &Array3<f64>,
    bias_index: usize,
) -> Result<Array2<f64>, TransformError> {
    let points = field.len_of(Axis(2));
    if bias_index >= points {
        return Err(TransformError::BiasIndexOutOfRange { index: bias_index, points });
    }
    Ok(field.index_axis(Axis(2), bias_index).to_owned())
}

/// Drop the out-of-plane component (column 1) of an (n, 3) field,
/// keeping the in-plane pair in order: first column x, second z.
pub fn drop_transverse_component(field: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
    let components = field.len_of(Axis(1));
    if components != 3 {
        return Err(TransformError::ComponentCount { found: components });
    }
    Ok(field.select(Axis(1), &[0, 2]))
}

/// Reduce a raw solver export to the in-plane (E_x, E_z) pair, shape
/// (n, 2). Swept results are collapsed to `bias_index` first.
pub fn in_plane_components(
    raw: &RawVectorField,
    bias_index: usize,
) -> Result<Array2<f64>, TransformError> {
    match raw {
        RawVectorField::Swept(field) => {
            let at_bias = select_bias_point(field, bias_index)?;
            drop_transverse_component(&at_bias)
        }
        RawVectorField::Static(field) => drop_transverse_component(field),
    }
}

/// Element-wise |E| = sqrt(E_x² + E_z²).
pub fn vector_magnitude(ex: &Array2<f64>, ez: &Array2<f64>) -> Array2<f64> {
    (ex * ex + ez * ez).mapv(f64::sqrt)
}

/// Magnitude of the three Cartesian components of a mode field, sliced
/// at one out-of-plane slab layer. Returns an (nx, nz) array.
pub fn mode_plane_magnitude(
    tensor: &ModeFieldTensor,
    slab_index: usize,
) -> Result<Array2<f64>, TransformError> {
    let layers = tensor.field.len_of(Axis(2));
    if slab_index >= layers {
        return Err(TransformError::SlabIndexOutOfRange { index: slab_index, layers });
    }
    let plane = tensor.field.index_axis(Axis(2), slab_index);
    let magnitude = plane.map_axis(Axis(2), |e| {
        e.iter().map(|v| v * v).sum::<f64>().sqrt()
    });
    Ok(magnitude)
}

/// Normalise a non-negative field by its own maximum so that the
/// resulting maximum is exactly 1.0. An all-zero field is rejected.
pub fn normalise_max(field: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
    let max = field.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max > 0.0) {
        return Err(TransformError::ZeroField);
    }
    Ok(field.mapv(|v| v / max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Array3, Array4};

    /// A 2-point, 3-component, 9-bias sweep with distinguishable entries.
    fn swept_field() -> Array3<f64> {
        Array3::from_shape_fn((2, 3, 9), |(p, c, b)| {
            100.0 * p as f64 + 10.0 * c as f64 + b as f64
        })
    }

    #[test]
    fn bias_selection_matches_manual_indexing() {
        let raw = swept_field();
        let at_mid = select_bias_point(&raw, 4).unwrap();
        for p in 0..2 {
            for c in 0..3 {
                assert_eq!(at_mid[[p, c]], raw[[p, c, 4]]);
            }
        }
    }

    #[test]
    fn bias_index_out_of_range_is_rejected() {
        let raw = swept_field();
        assert!(matches!(
            select_bias_point(&raw, 9),
            Err(TransformError::BiasIndexOutOfRange { index: 9, points: 9 })
        ));
    }

    #[test]
    fn transverse_drop_preserves_remaining_column_order() {
        let field = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let in_plane = drop_transverse_component(&field).unwrap();
        assert_eq!(in_plane, array![[1.0, 3.0], [4.0, 6.0]]);
    }

    #[test]
    fn two_component_field_is_rejected() {
        let field = array![[1.0, 2.0]];
        assert!(matches!(
            drop_transverse_component(&field),
            Err(TransformError::ComponentCount { found: 2 })
        ));
    }

    #[test]
    fn swept_and_static_reductions_agree_at_the_selected_bias() {
        let raw = swept_field();
        let swept = in_plane_components(&RawVectorField::Swept(raw.clone()), 4).unwrap();
        let static_at_4 = raw.index_axis(ndarray::Axis(2), 4).to_owned();
        let from_static =
            in_plane_components(&RawVectorField::Static(static_at_4), 0).unwrap();
        assert_eq!(swept, from_static);
    }

    #[test]
    fn magnitude_is_pythagorean() {
        let ex = array![[3.0, 0.0]];
        let ez = array![[4.0, 0.0]];
        let m = vector_magnitude(&ex, &ez);
        assert_relative_eq!(m[[0, 0]], 5.0);
        assert_relative_eq!(m[[0, 1]], 0.0);
    }

    #[test]
    fn normalised_maximum_is_exactly_one() {
        let field = array![[0.5, 2.0], [1.25, 0.0]];
        let n = normalise_max(&field).unwrap();
        let max = n.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(max, 1.0);
        assert_relative_eq!(n[[0, 0]], 0.25);
    }

    #[test]
    fn all_zero_field_cannot_be_normalised() {
        let field = Array2::<f64>::zeros((4, 4));
        assert!(matches!(normalise_max(&field), Err(TransformError::ZeroField)));
    }

    #[test]
    fn mode_plane_magnitude_slices_the_requested_layer() {
        // Two slab layers: layer 0 holds (1, 2, 2), layer 1 is zero.
        let mut field = Array4::<f64>::zeros((1, 1, 2, 3));
        field[[0, 0, 0, 0]] = 1.0;
        field[[0, 0, 0, 1]] = 2.0;
        field[[0, 0, 0, 2]] = 2.0;
        let tensor = ModeFieldTensor {
            x: Array1::zeros(1),
            z: Array1::zeros(1),
            neff: 2.6,
            field,
        };
        let m0 = mode_plane_magnitude(&tensor, 0).unwrap();
        assert_relative_eq!(m0[[0, 0]], 3.0);
        let m1 = mode_plane_magnitude(&tensor, 1).unwrap();
        assert_eq!(m1[[0, 0]], 0.0);
        assert!(matches!(
            mode_plane_magnitude(&tensor, 2),
            Err(TransformError::SlabIndexOutOfRange { index: 2, layers: 2 })
        ));
    }
}
