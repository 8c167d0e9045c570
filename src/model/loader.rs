use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::FEATURE_NAMES;

use super::{IsolationForest, ModelError};

const ARTIFACT_VERSION: u32 = 1;

/// On-disk envelope around a trained forest.
#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    version: u32,
    trained_at: DateTime<Utc>,
    feature_names: Vec<String>,
    forest: IsolationForest,
}

/// Write a trained forest as JSON, creating parent directories.
pub fn save_model(path: &Path, forest: &IsolationForest) -> Result<(), ModelError> {
    let io_err = |source| ModelError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let artifact = ModelArtifact {
        version: ARTIFACT_VERSION,
        trained_at: Utc::now(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        forest: forest.clone(),
    };
    let json = serde_json::to_vec(&artifact)?;
    std::fs::write(path, json).map_err(io_err)?;

    tracing::info!(path = %path.display(), trees = forest.n_trees(), "Model saved");
    Ok(())
}

/// Load and validate a forest artifact. Called once at startup.
pub fn load_model(path: &Path) -> Result<IsolationForest, ModelError> {
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;

    if artifact.version != ARTIFACT_VERSION {
        return Err(ModelError::InvalidArtifact(format!(
            "unsupported artifact version {} (expected {})",
            artifact.version, ARTIFACT_VERSION
        )));
    }
    if artifact.feature_names != FEATURE_NAMES {
        return Err(ModelError::InvalidArtifact(format!(
            "model was trained on features {:?}, expected {:?}",
            artifact.feature_names, FEATURE_NAMES
        )));
    }
    artifact.forest.validate()?;

    tracing::info!(
        path = %path.display(),
        trees = artifact.forest.n_trees(),
        trained_at = %artifact.trained_at,
        "Model loaded"
    );
    Ok(artifact.forest)
}
