use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data: DataConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub crops_path: PathBuf,
    pub coconut_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Rows shown per table in the console preview
    pub preview_rows: usize,
    pub write_files: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Defaults, then `dashboard.toml` (or the explicit `path`), then
/// `CROP_DASHBOARD_<SECTION>__<KEY>` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let builder = Config::builder()
        .set_default("data.crops_path", "data/main_crops.csv")?
        .set_default("data.coconut_path", "data/coconut_filtered.csv")?
        .set_default("output.dir", "reports")?
        .set_default("output.preview_rows", 5_i64)?
        .set_default("output.write_files", true)?
        .set_default("logging.level", "info")?;
    let builder = match path {
        Some(p) => builder.add_source(File::from(p)),
        None => builder.add_source(File::with_name("dashboard").required(false)),
    };
    let settings = builder
        .add_source(Environment::with_prefix("CROP_DASHBOARD").prefix_separator("_").separator("__"))
        .build()?
        .try_deserialize()?;
    Ok(settings)
}
