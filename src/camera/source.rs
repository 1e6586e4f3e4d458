//! Frame sources: the seam between the session and the sensor.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::frame_utils::crop;
use super::types::{CameraError, Frame, PixelFormat, SourceSettings, Window};

/// Produces one raw frame per call.
///
/// Implementations are expected to be fully configured (format, geometry,
/// exposure settled) before the first call; geometry must not change
/// during a run.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, CameraError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        (**self).capture()
    }
}

/// Synthetic sensor producing a diagonal gradient with a moving bar, so
/// consecutive frames differ.
#[derive(Debug)]
pub struct TestPatternSource {
    settings: SourceSettings,
    sequence: u32,
}

const BAR_WIDTH: u32 = 8;

impl TestPatternSource {
    pub fn new(settings: SourceSettings) -> Result<Self, CameraError> {
        validate_window(&settings)?;
        Ok(Self {
            settings,
            sequence: 0,
        })
    }

    /// Frames produced so far.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    fn render(&self) -> Frame {
        let res = self.settings.resolution;
        let format = self.settings.pixel_format;
        let bar_x = self.sequence.wrapping_mul(BAR_WIDTH) % res.width.max(1);
        let shift = self.sequence.wrapping_mul(8);

        let mut data = Vec::with_capacity(
            res.width as usize * res.height as usize * format.bytes_per_pixel(),
        );
        for y in 0..res.height {
            for x in 0..res.width {
                let on_bar = x >= bar_x && x < bar_x + BAR_WIDTH;
                match format {
                    PixelFormat::Grayscale => {
                        let v = if on_bar {
                            255
                        } else {
                            (x.wrapping_add(y).wrapping_add(shift) & 0xFF) as u8
                        };
                        data.push(v);
                    }
                    PixelFormat::Rgb => {
                        if on_bar {
                            data.extend_from_slice(&[255, 255, 255]);
                        } else {
                            data.push((x & 0xFF) as u8);
                            data.push((y & 0xFF) as u8);
                            data.push((shift & 0xFF) as u8);
                        }
                    }
                }
            }
        }

        Frame {
            data,
            width: res.width,
            height: res.height,
            format,
            timestamp: Instant::now(),
        }
    }
}

impl FrameSource for TestPatternSource {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        let full = self.render();
        self.sequence = self.sequence.wrapping_add(1);
        match self.settings.window {
            Some(window) => crop(&full, window),
            None => Ok(full),
        }
    }
}

/// Serves the same image file on every capture.
///
/// The file is decoded once, converted to the configured pixel format and
/// cropped to the configured window. The file's own dimensions replace the
/// configured base resolution.
#[derive(Debug)]
pub struct StillImageSource {
    frame: Frame,
    path: PathBuf,
}

impl StillImageSource {
    pub fn open(path: impl AsRef<Path>, settings: SourceSettings) -> Result<Self, CameraError> {
        let path = path.as_ref().to_path_buf();
        let image = image::open(&path).map_err(|e| CameraError::LoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let (width, height, data) = match settings.pixel_format {
            PixelFormat::Grayscale => {
                let luma = image.to_luma8();
                (luma.width(), luma.height(), luma.into_raw())
            }
            PixelFormat::Rgb => {
                let rgb = image.to_rgb8();
                (rgb.width(), rgb.height(), rgb.into_raw())
            }
        };
        let full = Frame {
            data,
            width,
            height,
            format: settings.pixel_format,
            timestamp: Instant::now(),
        };
        let frame = match settings.window {
            Some(window) => crop(&full, window)?,
            None => full,
        };
        log::debug!(
            "Loaded still image {} ({}x{} after windowing)",
            path.display(),
            frame.width,
            frame.height
        );

        Ok(Self { frame, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for StillImageSource {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        let mut frame = self.frame.clone();
        frame.timestamp = Instant::now();
        Ok(frame)
    }
}

fn validate_window(settings: &SourceSettings) -> Result<(), CameraError> {
    match settings.window {
        Some(window) if !window.fits(settings.resolution) => Err(CameraError::WindowOutOfBounds {
            window,
            resolution: settings.resolution,
        }),
        _ => Ok(()),
    }
}

/// Full-frame window for `settings`, used when none is configured.
pub fn effective_window(settings: &SourceSettings) -> Window {
    settings
        .window
        .unwrap_or_else(|| Window::full(settings.resolution))
}
