//! Figure composition: heatmap, quiver, and outline layers.

use std::path::Path;

use ndarray::Array1;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use overmode_core::geometry::common_viewport;
use overmode_core::types::{ElectricalFieldMap, Extent2, OpticalModeMap, ShapeMap};

use crate::theme::Theme;
use crate::PlotError;

const FIGURE_SIZE: (u32, u32) = (1100, 850);
/// Quiver arrows are scaled by 2x the field's own maximum, so the
/// longest arrow spans half an arrow-unit.
const QUIVER_SCALE_FACTOR: f64 = 2.0;
/// Target number of quiver arrows along the longer grid axis.
const QUIVER_TARGET: usize = 24;

fn draw_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Draw(e.to_string())
}

/// Render both figures on the shared common viewport.
///
/// `z_max_um`, when set, additionally caps the top of the viewport (the
/// region of interest ends at the top of the waveguide stack).
pub fn render_figures(
    electrical: &ElectricalFieldMap,
    optical: &OpticalModeMap,
    shapes: &ShapeMap,
    z_max_um: Option<f64>,
    overlay_path: &Path,
    mode_path: &Path,
) -> Result<(), PlotError> {
    let mut viewport =
        common_viewport(&electrical.extent, &optical.extent).ok_or(PlotError::EmptyViewport)?;
    if let Some(z_max) = z_max_um {
        viewport.z_max = viewport.z_max.min(z_max);
        if viewport.is_empty() {
            return Err(PlotError::EmptyViewport);
        }
    }

    render_overlay(electrical, optical, shapes, &viewport, overlay_path, &Theme::dark())?;
    render_mode(optical, shapes, &viewport, mode_path, &Theme::light())?;
    Ok(())
}

/// Dark combined figure: optical intensity heatmap, electrical quiver,
/// structure outlines.
pub fn render_overlay(
    electrical: &ElectricalFieldMap,
    optical: &OpticalModeMap,
    shapes: &ShapeMap,
    viewport: &Extent2,
    path: &Path,
    theme: &Theme,
) -> Result<(), PlotError> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&theme.background).map_err(draw_err)?;

    let caption = format!(
        "Mode intensity and DC field (λ = {:.3} µm, n_eff = {:.3})",
        optical.wavelength_um, optical.neff
    );
    let mut chart = ChartBuilder::on(&root)
        .margin(24)
        .caption(caption.as_str(), ("sans-serif", 24).into_font().color(&theme.foreground))
        .x_label_area_size(46)
        .y_label_area_size(60)
        .build_cartesian_2d(viewport.x_min..viewport.x_max, viewport.z_min..viewport.z_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x (µm)")
        .y_desc("z (µm)")
        .label_style(("sans-serif", 15).into_font().color(&theme.foreground))
        .axis_style(&theme.foreground)
        .draw()
        .map_err(draw_err)?;

    draw_heatmap(&mut chart, optical, viewport, theme)?;
    draw_quiver(&mut chart, electrical, viewport, theme)?;
    draw_outlines(&mut chart, shapes, viewport, theme)?;

    root.present().map_err(draw_err)?;
    log::info!("overlay figure written to {}", path.display());
    Ok(())
}

/// Light optical-only figure: intensity heatmap and structure outlines.
pub fn render_mode(
    optical: &OpticalModeMap,
    shapes: &ShapeMap,
    viewport: &Extent2,
    path: &Path,
    theme: &Theme,
) -> Result<(), PlotError> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&theme.background).map_err(draw_err)?;

    let caption = format!(
        "Mode intensity (λ = {:.3} µm, n_eff = {:.3})",
        optical.wavelength_um, optical.neff
    );
    let mut chart = ChartBuilder::on(&root)
        .margin(24)
        .caption(caption.as_str(), ("sans-serif", 24).into_font().color(&theme.foreground))
        .x_label_area_size(46)
        .y_label_area_size(60)
        .build_cartesian_2d(viewport.x_min..viewport.x_max, viewport.z_min..viewport.z_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x (µm)")
        .y_desc("z (µm)")
        .label_style(("sans-serif", 15).into_font().color(&theme.foreground))
        .axis_style(&theme.foreground)
        .draw()
        .map_err(draw_err)?;

    draw_heatmap(&mut chart, optical, viewport, theme)?;
    draw_outlines(&mut chart, shapes, viewport, theme)?;

    root.present().map_err(draw_err)?;
    log::info!("mode figure written to {}", path.display());
    Ok(())
}

type Chart2<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// One filled rectangle per native-grid cell, clamped to the viewport.
fn draw_heatmap(
    chart: &mut Chart2,
    optical: &OpticalModeMap,
    viewport: &Extent2,
    theme: &Theme,
) -> Result<(), PlotError> {
    let x_edges = cell_edges(&optical.x);
    let z_edges = cell_edges(&optical.z);

    let mut cells = Vec::new();
    for ((i, j), &value) in optical.intensity.indexed_iter() {
        let (x0, x1) = (x_edges[i], x_edges[i + 1]);
        let (z0, z1) = (z_edges[j], z_edges[j + 1]);
        if x1 <= viewport.x_min
            || x0 >= viewport.x_max
            || z1 <= viewport.z_min
            || z0 >= viewport.z_max
        {
            continue;
        }
        let x0 = x0.max(viewport.x_min);
        let x1 = x1.min(viewport.x_max);
        let z0 = z0.max(viewport.z_min);
        let z1 = z1.min(viewport.z_max);
        cells.push(Rectangle::new(
            [(x0, z0), (x1, z1)],
            theme.intensity_colour(value).filled(),
        ));
    }
    chart.draw_series(cells).map_err(draw_err)?;
    Ok(())
}

/// Subsampled arrows for the in-plane electrical field.
fn draw_quiver(
    chart: &mut Chart2,
    electrical: &ElectricalFieldMap,
    viewport: &Extent2,
    theme: &Theme,
) -> Result<(), PlotError> {
    let max_mag = electrical
        .magnitude
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !(max_mag > 0.0) {
        log::warn!("electrical field is zero everywhere; skipping quiver layer");
        return Ok(());
    }

    let nx = electrical.x.len();
    let nz = electrical.z.len();
    let step = (nx.max(nz) / QUIVER_TARGET).max(1);
    // An arrow at full field strength spans half an arrow-unit.
    let unit = viewport.width().min(viewport.height()) / QUIVER_TARGET as f64;
    let scale = unit / (QUIVER_SCALE_FACTOR * max_mag);

    let style = ShapeStyle {
        color: theme.quiver.to_rgba(),
        filled: false,
        stroke_width: 1,
    };

    let mut arrows = Vec::new();
    for i in (0..nx).step_by(step) {
        for j in (0..nz).step_by(step) {
            let (x, z) = (electrical.x[i], electrical.z[j]);
            if x < viewport.x_min || x > viewport.x_max || z < viewport.z_min || z > viewport.z_max
            {
                continue;
            }
            let dx = electrical.ex[[i, j]] * scale;
            let dz = electrical.ez[[i, j]] * scale;
            if dx == 0.0 && dz == 0.0 {
                continue;
            }
            arrows.push(PathElement::new(arrow_polyline(x, z, dx, dz), style));
        }
    }
    chart.draw_series(arrows).map_err(draw_err)?;
    Ok(())
}

/// Outline rectangle per resolved structure, clamped to the viewport.
/// Structures entirely outside the viewport are clipped away.
fn draw_outlines(
    chart: &mut Chart2,
    shapes: &ShapeMap,
    viewport: &Extent2,
    theme: &Theme,
) -> Result<(), PlotError> {
    let style = ShapeStyle {
        color: theme.outline.to_rgba(),
        filled: false,
        stroke_width: 2,
    };

    let mut outlines = Vec::new();
    for (name, extent) in shapes {
        let clipped = extent.intersection(viewport);
        if clipped.is_empty() {
            log::debug!("structure '{name}' lies outside the viewport");
            continue;
        }
        outlines.push(Rectangle::new(
            [(clipped.x_min, clipped.z_min), (clipped.x_max, clipped.z_max)],
            style,
        ));
    }
    chart.draw_series(outlines).map_err(draw_err)?;
    Ok(())
}

/// Cell boundaries for a (possibly non-uniform) coordinate axis:
/// midpoints between samples, extrapolated half a step at the ends.
fn cell_edges(coords: &Array1<f64>) -> Vec<f64> {
    let n = coords.len();
    if n == 1 {
        return vec![coords[0] - 0.5, coords[0] + 0.5];
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(coords[0] - (coords[1] - coords[0]) / 2.0);
    for i in 1..n {
        edges.push((coords[i - 1] + coords[i]) / 2.0);
    }
    edges.push(coords[n - 1] + (coords[n - 1] - coords[n - 2]) / 2.0);
    edges
}

/// Shaft plus two head barbs, centred on the sample point.
fn arrow_polyline(x: f64, z: f64, dx: f64, dz: f64) -> Vec<(f64, f64)> {
    let tail = (x - dx / 2.0, z - dz / 2.0);
    let tip = (x + dx / 2.0, z + dz / 2.0);

    // Barbs: the reversed direction rotated by ±30 degrees, 30 % length.
    let (bx, bz) = (-dx * 0.3, -dz * 0.3);
    let (sin, cos) = (30.0_f64.to_radians().sin(), 30.0_f64.to_radians().cos());
    let left = (tip.0 + bx * cos - bz * sin, tip.1 + bx * sin + bz * cos);
    let right = (tip.0 + bx * cos + bz * sin, tip.1 - bx * sin + bz * cos);

    vec![tail, tip, left, tip, right]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};
    use std::collections::BTreeMap;

    fn field_map(extent: Extent2) -> ElectricalFieldMap {
        ElectricalFieldMap {
            x: array![extent.x_min, extent.x_max],
            z: array![extent.z_min, extent.z_max],
            ex: Array2::ones((2, 2)),
            ez: Array2::zeros((2, 2)),
            magnitude: Array2::ones((2, 2)),
            extent,
            bias_index: None,
        }
    }

    fn mode_map(extent: Extent2) -> OpticalModeMap {
        OpticalModeMap {
            x: array![extent.x_min, extent.x_max],
            z: array![extent.z_min, extent.z_max],
            intensity: Array2::ones((2, 2)),
            extent,
            neff: 2.58,
            wavelength_um: 1.55,
        }
    }

    #[test]
    fn disjoint_extents_yield_an_empty_viewport_error() {
        let electrical = field_map(Extent2::new(0.0, 1.0, 0.0, 1.0));
        let optical = mode_map(Extent2::new(2.0, 3.0, 0.0, 1.0));
        let dir = tempfile::tempdir().unwrap();

        let err = render_figures(
            &electrical,
            &optical,
            &BTreeMap::new(),
            None,
            &dir.path().join("overlay.png"),
            &dir.path().join("mode.png"),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::EmptyViewport));
        assert!(!dir.path().join("overlay.png").exists());
    }

    #[test]
    fn z_cap_below_the_viewport_floor_is_an_empty_viewport_error() {
        let extent = Extent2::new(0.0, 1.0, 0.5, 1.0);
        let electrical = field_map(extent);
        let optical = mode_map(extent);
        let dir = tempfile::tempdir().unwrap();

        let err = render_figures(
            &electrical,
            &optical,
            &BTreeMap::new(),
            Some(0.2),
            &dir.path().join("overlay.png"),
            &dir.path().join("mode.png"),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::EmptyViewport));
    }

    #[test]
    fn cell_edges_bracket_every_sample() {
        let coords = array![0.0, 1.0, 3.0];
        let edges = cell_edges(&coords);
        assert_eq!(edges.len(), 4);
        assert_relative_eq!(edges[0], -0.5);
        assert_relative_eq!(edges[1], 0.5);
        assert_relative_eq!(edges[2], 2.0);
        assert_relative_eq!(edges[3], 4.0);
        for (i, &c) in coords.iter().enumerate() {
            assert!(edges[i] <= c && c <= edges[i + 1]);
        }
    }

    #[test]
    fn single_sample_axis_gets_a_unit_cell() {
        let edges = cell_edges(&array![2.0]);
        assert_eq!(edges, vec![1.5, 2.5]);
    }

    #[test]
    fn arrow_polyline_is_centred_on_the_sample() {
        let pts = arrow_polyline(1.0, 2.0, 0.4, 0.0);
        let (tail, tip) = (pts[0], pts[1]);
        assert_relative_eq!(tail.0, 0.8);
        assert_relative_eq!(tip.0, 1.2);
        assert_relative_eq!((tail.0 + tip.0) / 2.0, 1.0);
        assert_relative_eq!((tail.1 + tip.1) / 2.0, 2.0);
        // barbs point back from the tip
        assert!(pts[2].0 < tip.0 && pts[4].0 < tip.0);
    }
}
