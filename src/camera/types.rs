//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

use serde::Deserialize;

/// Sensor base resolution, before windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// QQVGA (160x120) - fastest
    pub const QQVGA: Resolution = Resolution {
        width: 160,
        height: 120,
    };

    /// QVGA (320x240) - default
    pub const QVGA: Resolution = Resolution {
        width: 320,
        height: 240,
    };

    /// VGA (640x480) - slower, larger payloads
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::QVGA
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Named frame sizes accepted in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSize {
    Qqvga,
    #[default]
    Qvga,
    Vga,
}

impl FrameSize {
    pub fn resolution(self) -> Resolution {
        match self {
            FrameSize::Qqvga => Resolution::QQVGA,
            FrameSize::Qvga => Resolution::QVGA,
            FrameSize::Vga => Resolution::VGA,
        }
    }
}

/// Crop rectangle applied to every sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole frame at `resolution`.
    pub fn full(resolution: Resolution) -> Self {
        Self::new(0, 0, resolution.width, resolution.height)
    }

    /// Whether this window is non-empty and lies inside `resolution`.
    pub fn fits(&self, resolution: Resolution) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= resolution.width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= resolution.height)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 8-bit luma, 1 byte per pixel
    #[default]
    Grayscale,
    /// 8-bit RGB, 3 bytes per pixel
    Rgb,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Grayscale => 1,
            PixelFormat::Rgb => 3,
        }
    }
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, row-major, no padding
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Byte length implied by the dimensions and format.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

/// Sensor setup shared by the built-in sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
    pub pixel_format: PixelFormat,
    pub resolution: Resolution,
    /// Region of interest; `None` keeps the full frame.
    pub window: Option<Window>,
}

impl SourceSettings {
    /// Dimensions of the frames the source will deliver.
    pub fn output_resolution(&self) -> Resolution {
        match self.window {
            Some(w) => Resolution {
                width: w.width,
                height: w.height,
            },
            None => self.resolution,
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Grayscale,
            resolution: Resolution::QVGA,
            window: Some(Window::new(0, 30, 320, 160)),
        }
    }
}

/// Errors that can occur while acquiring or encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Window {window} does not fit a {resolution} frame")]
    WindowOutOfBounds {
        window: Window,
        resolution: Resolution,
    },

    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Failed to load image '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Invalid quality {0}, expected 1-100")]
    InvalidQuality(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_constants() {
        assert_eq!(Resolution::QQVGA, Resolution { width: 160, height: 120 });
        assert_eq!(Resolution::QVGA, Resolution { width: 320, height: 240 });
        assert_eq!(Resolution::VGA, Resolution { width: 640, height: 480 });
        assert_eq!(Resolution::default(), Resolution::QVGA);
        assert_eq!(format!("{}", Resolution::QVGA), "320x240");
    }

    #[test]
    fn test_frame_size_resolution() {
        assert_eq!(FrameSize::Qqvga.resolution(), Resolution::QQVGA);
        assert_eq!(FrameSize::default().resolution(), Resolution::QVGA);
        assert_eq!(FrameSize::Vga.resolution(), Resolution::VGA);
    }

    #[test]
    fn test_window_fits() {
        assert!(Window::new(0, 30, 320, 160).fits(Resolution::QVGA));
        assert!(Window::full(Resolution::QVGA).fits(Resolution::QVGA));
        assert!(!Window::new(0, 100, 320, 160).fits(Resolution::QVGA));
        assert!(!Window::new(1, 0, 320, 10).fits(Resolution::QVGA));
        assert!(!Window::new(0, 0, 0, 10).fits(Resolution::QVGA));
        assert!(!Window::new(u32::MAX, 0, 2, 2).fits(Resolution::QVGA));
    }

    #[test]
    fn test_default_settings_output_resolution() {
        let settings = SourceSettings::default();
        assert_eq!(
            settings.output_resolution(),
            Resolution { width: 320, height: 160 }
        );

        let full = SourceSettings {
            window: None,
            ..SourceSettings::default()
        };
        assert_eq!(full.output_resolution(), Resolution::QVGA);
    }

    #[test]
    fn test_frame_expected_len() {
        let frame = Frame {
            data: vec![0; 12],
            width: 2,
            height: 2,
            format: PixelFormat::Rgb,
            timestamp: Instant::now(),
        };
        assert_eq!(frame.bytes_per_pixel(), 3);
        assert_eq!(frame.expected_len(), 12);
        assert_eq!(PixelFormat::Grayscale.bytes_per_pixel(), 1);
    }

    #[test]
    fn test_camera_error_display() {
        let err = CameraError::WindowOutOfBounds {
            window: Window::new(0, 100, 320, 160),
            resolution: Resolution::QVGA,
        };
        assert_eq!(
            format!("{}", err),
            "Window (0, 100, 320, 160) does not fit a 320x240 frame"
        );
        assert_eq!(
            format!("{}", CameraError::InvalidQuality(0)),
            "Invalid quality 0, expected 1-100"
        );
    }
}
