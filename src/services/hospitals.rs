use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::Hospital;

/// Errors that can occur while loading hospital reference data
#[derive(Debug, Error)]
pub enum HospitalError {
    #[error("Failed to read hospital list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid hospital list: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct HospitalFile {
    #[serde(default)]
    hospitals: Vec<Hospital>,
}

/// Parse a `[[hospitals]]` TOML document
pub fn parse_hospitals(raw: &str) -> Result<Vec<Hospital>, HospitalError> {
    let file: HospitalFile = toml::from_str(raw)?;
    Ok(file.hospitals)
}

/// Load the static hospital directory from disk
pub fn load_hospitals<P: AsRef<Path>>(path: P) -> Result<Vec<Hospital>, HospitalError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| HospitalError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let hospitals = parse_hospitals(&raw)?;
    tracing::info!("Loaded {} hospitals from {}", hospitals.len(), path.display());
    Ok(hospitals)
}
