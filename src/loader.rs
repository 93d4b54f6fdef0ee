//! Consumer Side - Load and Verify Exported Tables

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::{decode, DecodeError};
use crate::exporter::{manifest_path_for, ExportManifest};
use crate::hashing::{compute_content_hash, sha256_hex};
use crate::snapshot::TileFlagsSnapshot;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse tile flags from {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("cannot read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot hash decoded snapshot {path}: {source}")]
    ContentHash {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest mismatch on {field}: expected {expected}, found {actual}")]
    ManifestMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

pub fn load(path: &Path) -> Result<TileFlagsSnapshot, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = decode(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("loaded {} tile flags from {}", snapshot.tile_count(), path.display());
    Ok(snapshot)
}

/// Check a snapshot file against its manifest sidecar.
pub fn verify(path: &Path) -> Result<ExportManifest, VerifyError> {
    let manifest_path = manifest_path_for(path);
    let manifest_json = fs::read(&manifest_path).map_err(|source| VerifyError::ManifestIo {
        path: manifest_path.clone(),
        source,
    })?;
    let manifest: ExportManifest = serde_json::from_slice(&manifest_json)
        .map_err(|source| VerifyError::ManifestParse { path: manifest_path.clone(), source })?;

    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    check("byte_len", manifest.byte_len.to_string(), bytes.len().to_string())?;
    check("sha256", manifest.sha256.clone(), sha256_hex(&bytes))?;

    let snapshot = decode(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    check("tile_count", manifest.tile_count.to_string(), snapshot.tile_count().to_string())?;
    let content_hash = compute_content_hash(&snapshot)
        .map_err(|source| VerifyError::ContentHash { path: path.to_path_buf(), source })?;
    check("content_hash", manifest.content_hash.clone(), content_hash)?;

    Ok(manifest)
}

fn check(field: &'static str, expected: String, actual: String) -> Result<(), VerifyError> {
    if expected != actual {
        return Err(VerifyError::ManifestMismatch { field, expected, actual });
    }
    Ok(())
}
