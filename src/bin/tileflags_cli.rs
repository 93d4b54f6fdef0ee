//! TileFlags CLI - Bridge interface for the host plugin
//!
//! Commands: export, inspect, verify
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on schema violation or manifest mismatch

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use tileflags_core::{
    load, verify, ExportConfig, ExportError, Exporter, VerifyError, FORMAT_VERSION,
};

#[derive(Parser)]
#[command(name = "tileflags-cli")]
#[command(about = "TileFlags CLI - Engine tile table exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to export config (JSON)
    #[arg(short, long, default_value = "tileflags.json")]
    config: PathBuf,

    /// Override the configured output root
    #[arg(short, long)]
    output_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export host tables to the configured target
    Export {
        /// JSON dump of the host tables
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode a snapshot file and summarize it
    Inspect {
        file: PathBuf,
    },

    /// Check a snapshot file against its manifest
    Verify {
        file: PathBuf,
    },
}

/// Host tables as dumped by the engine plugin.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostDump {
    frame_important: Vec<bool>,
    solid: Vec<bool>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match ExportConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
            return ExitCode::FAILURE;
        }
    };
    if let Some(root) = cli.output_root {
        config.output_root = root;
    }

    match cli.command {
        Commands::Export { input } => {
            let dump: HostDump = match fs::read_to_string(&input)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
            {
                Ok(d) => d,
                Err(e) => {
                    print_json(&serde_json::json!({
                        "success": false,
                        "error": format!("Invalid host dump {}: {}", input.display(), e),
                    }));
                    return ExitCode::FAILURE;
                }
            };

            let exporter = Exporter::new(config);
            let target = exporter.config().resolved_target();

            match exporter.export(&dump.frame_important, &dump.solid) {
                Ok(manifest) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "target": target,
                        "manifest": manifest,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("export failed: {}", e);
                    print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                    match e {
                        ExportError::SchemaViolation(_) => ExitCode::from(2),
                        _ => ExitCode::FAILURE,
                    }
                }
            }
        }

        Commands::Inspect { file } => match load(&file) {
            Ok(snapshot) => {
                print_json(&serde_json::json!({
                    "formatVersion": FORMAT_VERSION,
                    "tileCount": snapshot.tile_count(),
                    "frameImportantCount": snapshot.frame_important_count(),
                    "solidCount": snapshot.solid_count(),
                }));
                ExitCode::SUCCESS
            }
            Err(e) => {
                print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                ExitCode::FAILURE
            }
        },

        Commands::Verify { file } => match verify(&file) {
            Ok(manifest) => {
                print_json(&serde_json::json!({ "valid": true, "manifest": manifest }));
                ExitCode::SUCCESS
            }
            Err(e) => {
                print_json(&serde_json::json!({ "valid": false, "error": e.to_string() }));
                match e {
                    VerifyError::ManifestMismatch { .. } => ExitCode::from(2),
                    _ => ExitCode::FAILURE,
                }
            }
        },
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}
