//! TOML configuration deserialisation for pipeline jobs.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub projects: ProjectsConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub bias: BiasConfig,
    #[serde(default)]
    pub electrical: ElectricalConfig,
    #[serde(default)]
    pub optical: OpticalConfig,
    #[serde(default)]
    pub structures: StructuresConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Prebuilt solver project files.
#[derive(Debug, Deserialize)]
pub struct ProjectsConfig {
    /// Device model for the charge/electrostatic solve.
    pub device: PathBuf,
    /// Photonic model for the eigenmode solve.
    pub photonic: PathBuf,
}

/// Regular interpolation grid for the electrical field.
#[derive(Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_grid_points")]
    pub nx: usize,
    #[serde(default = "default_grid_points")]
    pub nz: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { nx: default_grid_points(), nz: default_grid_points() }
    }
}

fn default_grid_points() -> usize {
    60
}

/// The precomputed bias sweep of the device project.
#[derive(Debug, Deserialize)]
pub struct BiasConfig {
    #[serde(default = "default_bias_start")]
    pub start_v: f64,
    #[serde(default = "default_bias_stop")]
    pub stop_v: f64,
    #[serde(default = "default_bias_points")]
    pub points: usize,
}

impl BiasConfig {
    /// Operating point the sweep is collapsed to: the middle of the sweep.
    pub fn middle_index(&self) -> usize {
        self.points / 2
    }

    /// Applied voltage at the middle bias point.
    pub fn middle_voltage(&self) -> f64 {
        if self.points < 2 {
            return self.start_v;
        }
        let step = (self.stop_v - self.start_v) / (self.points - 1) as f64;
        self.start_v + step * self.middle_index() as f64
    }
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            start_v: default_bias_start(),
            stop_v: default_bias_stop(),
            points: default_bias_points(),
        }
    }
}

fn default_bias_start() -> f64 {
    1.0
}
fn default_bias_stop() -> f64 {
    5.0
}
fn default_bias_points() -> usize {
    9
}

/// Eigenmode search parameters.
#[derive(Debug, Deserialize)]
pub struct OpticalConfig {
    #[serde(default = "default_wavelength_um")]
    pub wavelength_um: f64,
    #[serde(default = "default_target_neff")]
    pub target_neff: f64,
    /// Which solved mode to extract (0 = dominant).
    #[serde(default)]
    pub mode_index: usize,
    /// Out-of-plane slab layer the field tensor is sliced at.
    #[serde(default)]
    pub slab_index: usize,
    /// Upper z bound of the plotted region (µm).
    #[serde(default = "default_z_bound_um")]
    pub z_bound_um: f64,
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self {
            wavelength_um: default_wavelength_um(),
            target_neff: default_target_neff(),
            mode_index: 0,
            slab_index: 0,
            z_bound_um: default_z_bound_um(),
        }
    }
}

/// What the device stage pulls out of the charge solve.
#[derive(Debug, Deserialize)]
pub struct ElectricalConfig {
    /// Name of the electrostatic result in the device project.
    #[serde(default = "default_field_result")]
    pub result: String,
    /// Name of the vector attribute within that result.
    #[serde(default = "default_field_attribute")]
    pub attribute: String,
}

impl Default for ElectricalConfig {
    fn default() -> Self {
        Self {
            result: default_field_result(),
            attribute: default_field_attribute(),
        }
    }
}

fn default_wavelength_um() -> f64 {
    1.55
}
fn default_target_neff() -> f64 {
    2.6
}
fn default_z_bound_um() -> f64 {
    0.30
}
fn default_field_result() -> String {
    "electrostatics".into()
}
fn default_field_attribute() -> String {
    "E".into()
}

/// Structural regions to outline on the figures.
#[derive(Debug, Deserialize)]
pub struct StructuresConfig {
    #[serde(default = "default_structure_names")]
    pub names: Vec<String>,
    /// The imported ferroelectric layer, looked up with its own schema.
    #[serde(default = "default_ferroelectric")]
    pub ferroelectric: Option<String>,
}

impl Default for StructuresConfig {
    fn default() -> Self {
        Self {
            names: default_structure_names(),
            ferroelectric: default_ferroelectric(),
        }
    }
}

fn default_structure_names() -> Vec<String> {
    ["ridge", "slab", "buried_oxide", "anode", "cathode"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_ferroelectric() -> Option<String> {
    Some("bto_film".into())
}

/// Output locations, all relative to the output directory.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    #[serde(default = "default_overlay_figure")]
    pub overlay_figure: String,
    #[serde(default = "default_mode_figure")]
    pub mode_figure: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            cache_file: default_cache_file(),
            overlay_figure: default_overlay_figure(),
            mode_figure: default_mode_figure(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_cache_file() -> String {
    "electrical_field.json".into()
}
fn default_overlay_figure() -> String {
    "field_overlay_dark.png".into()
}
fn default_mode_figure() -> String {
    "mode_profile_light.png".into()
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &JobConfig) -> anyhow::Result<()> {
    if config.grid.nx < 2 || config.grid.nz < 2 {
        anyhow::bail!(
            "grid must be at least 2x2, got {}x{}",
            config.grid.nx,
            config.grid.nz
        );
    }
    if config.bias.points == 0 {
        anyhow::bail!("bias sweep must have at least one point");
    }
    if config.optical.wavelength_um <= 0.0 {
        anyhow::bail!("wavelength must be positive");
    }
    Ok(())
}
