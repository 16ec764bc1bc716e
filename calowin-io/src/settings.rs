//! Settings files.
//!
//! A settings file is the JSON form of [`ClusteringSettings`]. Every field
//! is optional and falls back to its default:
//!
//! ```text
//! {"clustering": {"n_eta_window": 7, "n_phi_window": 7}, "detector": {"eta_max": 2.5}}
//! ```

use crate::Result;
use calowin_core::ClusteringSettings;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Loads and validates clustering settings.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid JSON, or
/// describes an invalid configuration.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ClusteringSettings> {
    let text = std::fs::read_to_string(&path)?;
    let settings: ClusteringSettings = serde_json::from_str(&text)?;
    settings.validate().map_err(calowin_core::Error::from)?;
    log::debug!("loaded settings from {}", path.as_ref().display());
    Ok(settings)
}

/// Writes settings as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_settings<P: AsRef<Path>>(path: P, settings: &ClusteringSettings) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, settings)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
