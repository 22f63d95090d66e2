//! Structure geometry lookup.
//!
//! Each structural region of the loaded photonic project is reduced to an
//! axis-aligned [`Extent2`] for the outline overlay. Two query strategies
//! are tried in order:
//!
//! 1. direct `x min` / `x max` / `z min` / `z max` properties;
//! 2. centre plus span (`x`, `x span`, `z`, `z span`), converted to
//!    min/max.
//!
//! Unlike a silent try-and-ignore lookup, the outcome distinguishes a
//! structure that is absent from the project ([`ShapeLookupError::NotFound`])
//! from one that exists but exposes neither property schema
//! ([`ShapeLookupError::Malformed`]). Either way the caller omits the
//! structure from the map and the run continues.

use crate::session::{SessionError, SolverSession};
use crate::types::{Extent2, ShapeMap};
use thiserror::Error;

/// Why a structure's extent could not be determined.
#[derive(Debug, Error)]
pub enum ShapeLookupError {
    #[error("structure '{0}' is not present in the loaded project")]
    NotFound(String),

    #[error("structure '{name}' exposes neither extent nor span properties: {reason}")]
    Malformed { name: String, reason: String },
}

/// Imported layers are registered by the engine under a scoped name.
fn imported_name(name: &str) -> String {
    format!("import::{name}")
}

/// Look up the extent of one named structure.
pub fn shape_extent(
    session: &mut dyn SolverSession,
    name: &str,
) -> Result<Extent2, ShapeLookupError> {
    match session.select(name) {
        Ok(()) => {}
        Err(SessionError::ObjectNotFound(_)) => {
            return Err(ShapeLookupError::NotFound(name.to_string()))
        }
        Err(e) => {
            return Err(ShapeLookupError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }
    }

    match direct_extent(session) {
        Ok(extent) => return Ok(extent),
        Err(SessionError::PropertyMissing { .. }) => {}
        Err(e) => {
            return Err(ShapeLookupError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }
    }

    centre_span_extent(session).map_err(|e| ShapeLookupError::Malformed {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn direct_extent(session: &mut dyn SolverSession) -> Result<Extent2, SessionError> {
    Ok(Extent2::new(
        session.get_number("x min")?,
        session.get_number("x max")?,
        session.get_number("z min")?,
        session.get_number("z max")?,
    ))
}

fn centre_span_extent(session: &mut dyn SolverSession) -> Result<Extent2, SessionError> {
    Ok(Extent2::from_centre_span(
        session.get_number("x")?,
        session.get_number("x span")?,
        session.get_number("z")?,
        session.get_number("z span")?,
    ))
}

/// Build the shape map for the outline overlay.
///
/// Every structure in `names` is looked up; the imported ferroelectric
/// layer is additionally retried under its engine-scoped import name.
/// Unresolvable structures are logged and omitted.
pub fn collect_shapes(
    session: &mut dyn SolverSession,
    names: &[String],
    ferroelectric: Option<&str>,
) -> ShapeMap {
    let mut shapes = ShapeMap::new();

    for name in names {
        match shape_extent(session, name) {
            Ok(extent) => {
                shapes.insert(name.clone(), extent);
            }
            Err(e) => log::warn!("omitting structure from overlay: {e}"),
        }
    }

    if let Some(name) = ferroelectric {
        let looked_up = shape_extent(session, name).or_else(|first| match first {
            ShapeLookupError::NotFound(_) => shape_extent(session, &imported_name(name)),
            malformed => Err(malformed),
        });
        match looked_up {
            Ok(extent) => {
                shapes.insert(name.to_string(), extent);
            }
            Err(e) => log::warn!("omitting ferroelectric layer from overlay: {e}"),
        }
    }

    shapes
}

/// The viewport both figures share: the intersection of the two
/// datasets' bounds, or `None` when they do not overlap.
pub fn common_viewport(a: &Extent2, b: &Extent2) -> Option<Extent2> {
    let candidate = a.intersection(b);
    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AnalysisValue, SessionError, SolverKind, SolverSession};
    use crate::types::{ModeFieldTensor, RawVectorField, RegularGrid, TriangularMesh};
    use ndarray::{Array1, Array2};
    use std::collections::BTreeMap;
    use std::path::Path;

    /// A property-table-only session for geometry tests.
    struct PropertySession {
        objects: BTreeMap<String, BTreeMap<String, f64>>,
        selected: Option<String>,
    }

    impl PropertySession {
        fn new() -> Self {
            Self { objects: BTreeMap::new(), selected: None }
        }

        fn with_object(mut self, name: &str, props: &[(&str, f64)]) -> Self {
            let table = props.iter().map(|(k, v)| (k.to_string(), *v)).collect();
            self.objects.insert(name.to_string(), table);
            self
        }
    }

    impl SolverSession for PropertySession {
        fn kind(&self) -> SolverKind {
            SolverKind::Mode
        }

        fn load_project(&mut self, _path: &Path) -> Result<(), SessionError> {
            Ok(())
        }

        fn run(&mut self) -> Result<(), SessionError> {
            Ok(())
        }

        fn set_analysis(&mut self, _key: &str, _value: AnalysisValue) -> Result<(), SessionError> {
            Ok(())
        }

        fn vector_result(
            &mut self,
            result: &str,
            _attribute: &str,
        ) -> Result<RawVectorField, SessionError> {
            Err(SessionError::ResultMissing(result.to_string()))
        }

        fn result_mesh(&mut self, result: &str) -> Result<TriangularMesh, SessionError> {
            Err(SessionError::ResultMissing(result.to_string()))
        }

        fn interpolate_to_grid(
            &self,
            _values: &Array1<f64>,
            _mesh: &TriangularMesh,
            _grid: &RegularGrid,
        ) -> Result<Array2<f64>, SessionError> {
            Err(SessionError::Backend("not supported".into()))
        }

        fn select(&mut self, object: &str) -> Result<(), SessionError> {
            if self.objects.contains_key(object) {
                self.selected = Some(object.to_string());
                Ok(())
            } else {
                Err(SessionError::ObjectNotFound(object.to_string()))
            }
        }

        fn get_number(&mut self, property: &str) -> Result<f64, SessionError> {
            let object = self.selected.clone().ok_or(SessionError::NoProject)?;
            self.objects
                .get(&object)
                .and_then(|t| t.get(property))
                .copied()
                .ok_or(SessionError::PropertyMissing {
                    object,
                    property: property.to_string(),
                })
        }

        fn mode_field(&mut self, mode_index: usize) -> Result<ModeFieldTensor, SessionError> {
            Err(SessionError::ResultMissing(format!("mode {mode_index}")))
        }
    }

    #[test]
    fn direct_extent_properties_win() {
        let mut s = PropertySession::new().with_object(
            "ridge",
            &[("x min", -0.5), ("x max", 0.5), ("z min", 0.0), ("z max", 0.22)],
        );
        let e = shape_extent(&mut s, "ridge").unwrap();
        assert_eq!(e, Extent2::new(-0.5, 0.5, 0.0, 0.22));
    }

    #[test]
    fn centre_span_fallback_converts_to_min_max() {
        let mut s = PropertySession::new().with_object(
            "slab",
            &[("x", -1.0), ("x span", 4.0), ("z", 0.1), ("z span", 0.2)],
        );
        let e = shape_extent(&mut s, "slab").unwrap();
        assert_eq!(e, Extent2::new(-3.0, 1.0, 0.0, 0.2));
    }

    #[test]
    fn missing_structure_is_not_found() {
        let mut s = PropertySession::new();
        assert!(matches!(
            shape_extent(&mut s, "ghost"),
            Err(ShapeLookupError::NotFound(_))
        ));
    }

    #[test]
    fn structure_with_neither_schema_is_malformed() {
        let mut s = PropertySession::new().with_object("odd", &[("index", 2.2)]);
        assert!(matches!(
            shape_extent(&mut s, "odd"),
            Err(ShapeLookupError::Malformed { .. })
        ));
    }

    #[test]
    fn collect_shapes_omits_failures_and_keeps_the_rest() {
        let mut s = PropertySession::new()
            .with_object(
                "ridge",
                &[("x min", -0.5), ("x max", 0.5), ("z min", 0.0), ("z max", 0.22)],
            )
            .with_object("odd", &[("index", 2.2)]);
        let names = vec!["ridge".to_string(), "odd".to_string(), "ghost".to_string()];
        let shapes = collect_shapes(&mut s, &names, None);
        assert_eq!(shapes.len(), 1);
        assert!(shapes.contains_key("ridge"));
    }

    #[test]
    fn ferroelectric_layer_resolves_under_import_scope() {
        let mut s = PropertySession::new().with_object(
            "import::bto_film",
            &[("x", 0.0), ("x span", 6.0), ("z", 0.1), ("z span", 0.2)],
        );
        let shapes = collect_shapes(&mut s, &[], Some("bto_film"));
        assert_eq!(
            shapes.get("bto_film"),
            Some(&Extent2::new(-3.0, 3.0, 0.0, 0.2))
        );
    }

    #[test]
    fn common_viewport_is_none_without_overlap() {
        let a = Extent2::new(0.0, 1.0, 0.0, 1.0);
        let b = Extent2::new(5.0, 6.0, 0.0, 1.0);
        assert!(common_viewport(&a, &b).is_none());
        let c = Extent2::new(0.5, 2.0, 0.25, 2.0);
        assert_eq!(
            common_viewport(&a, &c),
            Some(Extent2::new(0.5, 1.0, 0.25, 1.0))
        );
    }
}
