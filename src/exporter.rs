//! Export Pipeline - Single Entry Point
//!
//! CRITICAL: every export validates the host tables before anything touches
//! the filesystem. A rejected export leaves the previous file in place.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::codec::{encode, FORMAT_VERSION};
use crate::config::ExportConfig;
use crate::hashing::{compute_content_hash, sha256_hex};
use crate::snapshot::TileFlagsSnapshot;
use crate::validation::{HostTables, ValidationResult, Validator};
use crate::EXPORTER_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sidecar describing one written snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    pub export_id: String,
    pub exporter_version: String,
    pub format_version: u32,
    pub tile_count: u32,
    pub byte_len: usize,
    pub sha256: String,
    pub content_hash: String,
    pub frame_important_count: usize,
    pub solid_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Location of the manifest written next to `target`.
pub fn manifest_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("flags.dat"));
    name.push(".manifest.json");
    target.with_file_name(name)
}

/// Validate, encode, and atomically write host tables to `target_path`.
pub fn export(frame_important: &[bool], solid: &[bool], target_path: &Path) -> Result<(), ExportError> {
    let config = ExportConfig {
        write_manifest: false,
        ..ExportConfig::default()
    };
    Exporter::new(config)
        .export_to(frame_important, solid, target_path)
        .map(|_| ())
}

/// The export pipeline
pub struct Exporter {
    config: ExportConfig,
    validator: Validator,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        let validator = Validator::new(config.empty_policy);
        Self { config, validator }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Validate host tables
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self, frame_important: &[bool], solid: &[bool]) -> ValidationResult {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let result = self.validator.validate(&HostTables::new(frame_important, solid));
        for v in &result.violations {
            log::warn!(
                "tile flags validation [{}]: {} (expected {}, actual {})",
                v.rule,
                v.message,
                v.expected.as_deref().unwrap_or("-"),
                v.actual.as_deref().unwrap_or("-")
            );
            for hint in &v.remediation {
                log::warn!("  remediation: {}", hint);
            }
        }
        result
    }

    /// Export to the configured target.
    pub fn export(&self, frame_important: &[bool], solid: &[bool]) -> Result<ExportManifest, ExportError> {
        let target = self.config.resolved_target();
        self.export_to(frame_important, solid, &target)
    }

    /// Export to an explicit target.
    ///
    /// CRITICAL: This ALWAYS calls validate internally. No bypass possible.
    pub fn export_to(
        &self,
        frame_important: &[bool],
        solid: &[bool],
        target: &Path,
    ) -> Result<ExportManifest, ExportError> {
        let validation = self.validate(frame_important, solid);
        if !validation.valid {
            return Err(ExportError::SchemaViolation(validation.error_summary()));
        }

        let snapshot = TileFlagsSnapshot::from_host(frame_important, solid)
            .map_err(|e| ExportError::SchemaViolation(e.to_string()))?;

        self.write_snapshot(&snapshot, target)
    }

    /// Write an already-built snapshot.
    pub fn write_snapshot(&self, snapshot: &TileFlagsSnapshot, target: &Path) -> Result<ExportManifest, ExportError> {
        let bytes = encode(snapshot);
        log::debug!("encoded {} tiles into {} bytes", snapshot.tile_count(), bytes.len());

        let manifest = ExportManifest {
            export_id: Uuid::new_v4().to_string(),
            exporter_version: EXPORTER_VERSION.to_string(),
            format_version: FORMAT_VERSION,
            tile_count: snapshot.tile_count(),
            byte_len: bytes.len(),
            sha256: sha256_hex(&bytes),
            content_hash: compute_content_hash(snapshot)?,
            frame_important_count: snapshot.frame_important_count(),
            solid_count: snapshot.solid_count(),
            created_at: Utc::now(),
        };

        // Stage every file before committing any of them
        let manifest_path = manifest_path_for(target);
        let staged_snapshot = stage(target, &bytes)?;
        let staged_manifest = if self.config.write_manifest {
            let json = serde_json::to_vec_pretty(&manifest)?;
            Some(stage(&manifest_path, &json)?)
        } else {
            None
        };

        let prior = match fs::read(target) {
            Ok(prior) => Some(prior),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        staged_snapshot.persist(target).map_err(|e| e.error)?;

        if let Some(staged) = staged_manifest {
            if let Err(e) = staged.persist(&manifest_path) {
                log::error!(
                    "manifest write to {} failed, restoring {}: {}",
                    manifest_path.display(),
                    target.display(),
                    e.error
                );
                restore(target, prior.as_deref());
                return Err(e.error.into());
            }
        }

        log::info!(
            "exported {} tile flags to {} ({} bytes, sha256 {})",
            manifest.tile_count,
            target.display(),
            manifest.byte_len,
            manifest.sha256
        );

        Ok(manifest)
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

/// Write `bytes` to a synced temp file next to `path`, ready to persist.
///
/// The temp file lives in the destination directory so the final rename
/// never crosses filesystems. Dropping it unpersisted removes it.
fn stage(path: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    log::debug!("staged {} bytes for {}", bytes.len(), path.display());
    Ok(tmp)
}

/// Replace `path` with `bytes` so readers see either the old or new file.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    stage(path, bytes)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Put back whatever `target` held before a failed export.
fn restore(target: &Path, prior: Option<&[u8]>) {
    let result = match prior {
        Some(bytes) => write_atomic(target, bytes),
        None => fs::remove_file(target),
    };
    if let Err(e) = result {
        log::error!("could not restore {}: {}", target.display(), e);
    }
}
