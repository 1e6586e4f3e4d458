//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing and subcommand handlers.

mod args;
mod commands;

use std::path::PathBuf;

pub use args::{Args, Command, ConfigAction};
pub use commands::{build_source, grab, handle_config_action, init_config_file, request_frame, serve};

use crate::camera::CameraError;
use crate::config::ConfigError;
use crate::protocol::ProtocolError;
use crate::session::SessionError;

/// Errors surfaced to the user by the binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Device reported an error: {0}")]
    DeviceReported(String),

    #[error("Config file already exists: {} (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{0}")]
    Unsupported(String),
}
