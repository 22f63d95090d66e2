//! Persistence of the processed electrical field between pipeline runs
//! and stages. The map is written once after the device stage and read
//! back (by the mode solver, or a later re-plot) from the same path.

use std::path::Path;

use thiserror::Error;

use crate::types::ElectricalFieldMap;

/// Errors from cache I/O.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialisation error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the field map as JSON, creating parent directories as needed.
pub fn write_field_map(map: &ElectricalFieldMap, path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(map)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a field map previously written by [`write_field_map`].
pub fn read_field_map(path: &Path) -> Result<ElectricalFieldMap, CacheError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Extent2;
    use ndarray::{Array1, Array2};

    #[test]
    fn field_map_survives_a_disk_round_trip() {
        let map = ElectricalFieldMap {
            x: Array1::linspace(0.0, 1.0, 4),
            z: Array1::linspace(-1.0, 1.0, 3),
            ex: Array2::from_elem((4, 3), 0.5),
            ez: Array2::from_elem((4, 3), -0.5),
            magnitude: Array2::from_elem((4, 3), 0.5_f64.hypot(0.5)),
            extent: Extent2::new(0.0, 1.0, -1.0, 1.0),
            bias_index: Some(4),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("electrical_field.json");
        write_field_map(&map, &path).unwrap();

        let back = read_field_map(&path).unwrap();
        assert_eq!(back.x, map.x);
        assert_eq!(back.ez, map.ez);
        assert_eq!(back.extent, map.extent);
        assert_eq!(back.bias_index, Some(4));
    }
}
