//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, SourceKind};

/// Parse and validate encoder quality (1-100)
fn parse_quality(s: &str) -> Result<u8, String> {
    let quality: u8 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid quality", s))?;
    if !(1..=100).contains(&quality) {
        return Err(format!("Quality must be between 1 and 100, got {}", quality));
    }
    Ok(quality)
}

/// Parse and validate the idle interval in milliseconds (1-10000)
fn parse_idle_ms(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid interval", s))?;
    if !(1..=10_000).contains(&ms) {
        return Err(format!(
            "Idle interval must be between 1 and 10000 ms, got {}",
            ms
        ));
    }
    Ok(ms)
}

/// Serve on-demand camera frames over a serial link
#[derive(Parser, Debug)]
#[command(name = "capture-serial")]
#[command(version, about = "Serve on-demand camera frames over a serial link", long_about = None)]
#[command(after_help = "PROTOCOL:
    host   -> device   CAPTURE\\n
    device -> host     OK\\n <u32 little-endian length> <JPEG bytes>
    on failure         ERR\\n <u32 little-endian length> <reason>

EXAMPLES:
    capture-serial --device /dev/ttyGS0
    capture-serial --image test.png --quality 80
    capture-serial grab --device /dev/ttyACM0 --output frame.jpg")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Serial device path
    #[arg(long, short)]
    pub device: Option<PathBuf>,

    /// Serial baud rate (ignored by USB-CDC devices)
    #[arg(long)]
    pub baud: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long, short, value_parser = parse_quality)]
    pub quality: Option<u8>,

    /// Pause between polls, in milliseconds
    #[arg(long = "idle-ms", value_parser = parse_idle_ms)]
    pub idle_ms: Option<u64>,

    /// Serve this image file instead of the test pattern
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve capture requests (default)
    Serve,
    /// Host side: request one frame from a device and save it
    Grab {
        /// File to write the received payload to
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    /// Overlay command-line values on a loaded config file.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(device) = &self.device {
            config.transport.device = device.clone();
        }
        if let Some(baud) = self.baud {
            config.transport.baud = baud;
        }
        if let Some(quality) = self.quality {
            config.capture.quality = quality;
        }
        if let Some(ms) = self.idle_ms {
            config.capture.idle_interval_ms = ms;
        }
        if let Some(image) = &self.image {
            config.source.kind = SourceKind::Still;
            config.source.image = Some(image.clone());
        }
        config
    }
}
