//! Serialized classifier on disk: the forest as JSON plus a SHA-256 of that JSON, checked on load.

use super::RandomForest;
use crate::error::{Error, Result};
use crate::features::FEATURE_COLUMNS;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    features: Vec<String>,
    sha256: String,
    forest: String,
}

fn digest(data: &str) -> String {
    let mut h = Sha256::new();
    h.update(data.as_bytes());
    format!("{:x}", h.finalize())
}

pub fn save_model(path: &Path, forest: &RandomForest) -> Result<()> {
    let body = serde_json::to_string(forest)?;
    let artifact = ModelArtifact {
        format_version: FORMAT_VERSION,
        features: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        sha256: digest(&body),
        forest: body,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
    }
    let bytes = serde_json::to_vec(&artifact)?;
    std::fs::write(path, bytes).map_err(|e| Error::from_io(path, e))
}

pub fn load_model(path: &Path) -> Result<RandomForest> {
    let bytes = std::fs::read(path).map_err(|e| Error::from_io(path, e))?;
    let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
    if artifact.format_version != FORMAT_VERSION {
        return Err(Error::IncompatibleModel(format!(
            "format version {}",
            artifact.format_version
        )));
    }
    if artifact.features != FEATURE_COLUMNS {
        return Err(Error::IncompatibleModel(format!(
            "feature columns {:?}",
            artifact.features
        )));
    }
    if digest(&artifact.forest) != artifact.sha256 {
        return Err(Error::ChecksumMismatch(path.to_path_buf()));
    }
    Ok(serde_json::from_str(&artifact.forest)?)
}
