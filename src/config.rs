//! Configuration file handling for capture-serial.
//!
//! Loads configuration from `~/.config/capture-serial/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{FrameSize, PixelFormat, Quality, SourceSettings, Window};
use crate::session::SessionConfig;

/// Default serial device (Linux USB gadget serial).
pub const DEFAULT_DEVICE: &str = "/dev/ttyGS0";
pub const DEFAULT_BAUD: u32 = 115_200;
pub const DEFAULT_QUALITY: u8 = 95;
pub const DEFAULT_IDLE_MS: u64 = 50;

/// Contents written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# capture-serial configuration

[transport]
device = "/dev/ttyGS0"
baud = 115200

[capture]
quality = 95
idle_interval_ms = 50
report_errors = true

[source]
kind = "pattern"
pixel_format = "grayscale"
frame_size = "qvga"
window = [0, 30, 320, 160]
"#;

/// Configuration file structure for capture-serial.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransportConfig {
    #[serde(default = "default_device")]
    pub device: PathBuf,
    #[serde(default = "default_baud")]
    pub baud: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud: DEFAULT_BAUD,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_idle_ms")]
    pub idle_interval_ms: u64,
    #[serde(default = "default_true")]
    pub report_errors: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            idle_interval_ms: DEFAULT_IDLE_MS,
            report_errors: true,
        }
    }
}

/// Which built-in frame source to serve.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Pattern,
    Still,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// Image file served by `kind = "still"`
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub frame_size: FrameSize,
    /// `[x, y, width, height]`; set to the full frame size to disable cropping
    #[serde(default = "default_window")]
    pub window: Option<[u32; 4]>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            image: None,
            pixel_format: PixelFormat::default(),
            frame_size: FrameSize::default(),
            window: default_window(),
        }
    }
}

impl SourceConfig {
    pub fn settings(&self) -> SourceSettings {
        SourceSettings {
            pixel_format: self.pixel_format,
            resolution: self.frame_size.resolution(),
            window: self.window.map(|[x, y, w, h]| Window::new(x, y, w, h)),
        }
    }
}

fn default_device() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE)
}

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_idle_ms() -> u64 {
    DEFAULT_IDLE_MS
}

fn default_true() -> bool {
    true
}

fn default_window() -> Option<[u32; 4]> {
    Some([0, 30, 320, 160])
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Check value ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Quality::new(self.capture.quality)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.capture.idle_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "idle_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.source.kind == SourceKind::Still && self.source.image.is_none() {
            return Err(ConfigError::Invalid(
                "source.image is required when source.kind = \"still\"".to_string(),
            ));
        }
        // Still images define their own base resolution, checked when loaded.
        let settings = self.source.settings();
        if self.source.kind == SourceKind::Pattern {
            if let Some(window) = settings.window {
                if !window.fits(settings.resolution) {
                    return Err(ConfigError::Invalid(format!(
                        "window {} does not fit frame size {}",
                        window, settings.resolution
                    )));
                }
            }
        }
        Ok(())
    }

    /// Session settings derived from the `[capture]` section.
    pub fn session(&self) -> Result<SessionConfig, ConfigError> {
        let quality =
            Quality::new(self.capture.quality).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(SessionConfig {
            idle_interval: Duration::from_millis(self.capture.idle_interval_ms),
            quality,
            report_errors: self.capture.report_errors,
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("capture-serial").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/capture-serial/config.toml")
        })
}
