//! TileFlags Core - Engine Tile Table Exporter
//!
//! # Contract Rules (Non-Negotiable)
//! 1. Index Is Identity: tile `i` means the same tile everywhere
//! 2. Count Comes First
//! 3. Validation Precedes Every Write
//! 4. Writes Are Atomic
//! 5. Decoding Is Strict
//! 6. Manifests Enable Verification

pub mod snapshot;
pub mod codec;
pub mod validation;
pub mod hashing;
pub mod config;
pub mod exporter;
pub mod loader;

pub use snapshot::{SchemaError, TileFlags, TileFlagsSnapshot};
pub use codec::{decode, encode, DecodeError, FORMAT_VERSION, HEADER_LEN};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
pub use hashing::{canonical_json, compute_content_hash, sha256_hex};
pub use config::{ConfigError, EmptyPolicy, ExportConfig};
pub use exporter::{export, ExportError, ExportManifest, Exporter};
pub use loader::{load, verify, LoadError, VerifyError};

pub const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Well-known location of the exported table, relative to the output root.
pub const DEFAULT_TARGET_PATH: &str = "data/tile/flags.dat";
