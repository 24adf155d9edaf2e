// Library exports for crop_dashboard

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod output;
pub mod table;
pub mod types;
pub mod util;
pub mod views;

use crate::config::Settings;
use crate::error::Result;
use crate::types::DatasetKind;
use crate::views::{Dashboard, Selection};

/// Re-read both source files and rebuild the dashboard for `selection`.
///
/// Nothing is cached between calls; each interaction sees the files as they
/// are on disk. The selection's year range is clamped to the years the
/// general dataset actually covers.
pub fn render(settings: &Settings, selection: &Selection) -> Result<Dashboard> {
    let (crops, _) = loader::load_dataset(&settings.data.crops_path, DatasetKind::Crops)?;
    let (coconut, _) = loader::load_dataset(&settings.data.coconut_path, DatasetKind::Coconut)?;
    let mut selection = selection.clone();
    if let Some(bounds) = filter::year_bounds(&crops) {
        selection.filter = selection.filter.clamped(bounds);
    }
    Ok(views::build_dashboard(&crops, &coconut, &selection))
}
