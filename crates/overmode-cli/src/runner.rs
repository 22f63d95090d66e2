//! Pipeline runner: drives the device and mode sessions in sequence and
//! hands the results to the plotting layer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use overmode_backend::ReplaySession;
use overmode_core::cache;
use overmode_core::extract::{extract_electrical_field, ElectricalSpec};
use overmode_core::geometry::collect_shapes;
use overmode_core::mode::{solve_mode, ModeSpec};
use overmode_core::session::{SolverKind, SolverSession};
use overmode_core::types::{ElectricalFieldMap, OpticalModeMap, ShapeMap};

use crate::config::JobConfig;

/// Everything the solver stages produce; figures are rendered from this.
pub struct StageOutput {
    pub electrical: ElectricalFieldMap,
    pub optical: OpticalModeMap,
    pub shapes: ShapeMap,
    pub cache_path: PathBuf,
}

/// Run the electrical and optical stages. The two sessions are scoped so
/// the engine handle is always released before the next one opens, and on
/// any error return.
pub fn run_stages(job: &JobConfig, out_dir: &Path) -> Result<StageOutput> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let cache_path = out_dir.join(&job.output.cache_file);

    // Stage 1: charge solve and electrical field extraction.
    println!("[1/3] Electrical field extraction");
    let electrical = {
        let mut session = ReplaySession::new(SolverKind::Device);
        session
            .load_project(&job.projects.device)
            .with_context(|| format!("loading device project {}", job.projects.device.display()))?;
        session.run().context("charge/electrostatic solve")?;

        let spec = ElectricalSpec {
            result: job.electrical.result.clone(),
            attribute: job.electrical.attribute.clone(),
            nx: job.grid.nx,
            nz: job.grid.nz,
            bias_index: job.bias.middle_index(),
        };
        extract_electrical_field(&mut session, &spec).context("electrical field extraction")?
    };
    println!(
        "  field on a {}x{} grid, bias point {} ({:.1} V), extent x=[{:.2}, {:.2}] z=[{:.2}, {:.2}] um",
        job.grid.nx,
        job.grid.nz,
        job.bias.middle_index(),
        job.bias.middle_voltage(),
        electrical.extent.x_min,
        electrical.extent.x_max,
        electrical.extent.z_min,
        electrical.extent.z_max,
    );

    cache::write_field_map(&electrical, &cache_path)
        .with_context(|| format!("writing field cache {}", cache_path.display()))?;
    println!("  cached to {}", cache_path.display());

    // Stage 2: geometry lookup and eigenmode solve on the photonic project.
    println!("[2/3] Geometry and optical mode");
    let (shapes, optical) = {
        let mut session = ReplaySession::new(SolverKind::Mode);
        session
            .load_project(&job.projects.photonic)
            .with_context(|| {
                format!("loading photonic project {}", job.projects.photonic.display())
            })?;

        let shapes = collect_shapes(
            &mut session,
            &job.structures.names,
            job.structures.ferroelectric.as_deref(),
        );
        println!(
            "  resolved {}/{} structure outlines",
            shapes.len(),
            job.structures.names.len() + usize::from(job.structures.ferroelectric.is_some()),
        );

        let spec = ModeSpec {
            wavelength_um: job.optical.wavelength_um,
            target_neff: job.optical.target_neff,
            mode_index: job.optical.mode_index,
            slab_index: job.optical.slab_index,
            bias_field_cache: Some(cache_path.clone()),
        };
        let optical = solve_mode(&mut session, &spec).context("optical mode solve")?;
        (shapes, optical)
    };
    println!(
        "  mode {} solved: n_eff = {:.4} at {:.3} um",
        job.optical.mode_index, optical.neff, optical.wavelength_um
    );

    Ok(StageOutput { electrical, optical, shapes, cache_path })
}

/// Run the full pipeline: both solver stages, then the two figures.
pub fn run_job(job: &JobConfig, out_dir: &Path) -> Result<()> {
    let output = run_stages(job, out_dir)?;
    log::debug!("bias field cache at {}", output.cache_path.display());

    println!("[3/3] Figures");
    let overlay_path = out_dir.join(&job.output.overlay_figure);
    let mode_path = out_dir.join(&job.output.mode_figure);
    overmode_plot::render_figures(
        &output.electrical,
        &output.optical,
        &output.shapes,
        Some(job.optical.z_bound_um),
        &overlay_path,
        &mode_path,
    )
    .context("rendering figures")?;
    println!("  {}", overlay_path.display());
    println!("  {}", mode_path.display());

    Ok(())
}
