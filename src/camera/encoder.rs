//! Frame compression.

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::ExtendedColorType;

use super::types::{CameraError, Frame, PixelFormat};

/// Encoder quality, 1 (smallest) to 100 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Quality = Quality(95);

    pub fn new(value: u8) -> Result<Self, CameraError> {
        if (1..=100).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CameraError::InvalidQuality(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Compresses a frame into a self-describing byte buffer.
pub trait Encoder {
    fn encode(&mut self, frame: &Frame, quality: Quality) -> Result<Vec<u8>, CameraError>;
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&mut self, frame: &Frame, quality: Quality) -> Result<Vec<u8>, CameraError> {
        (**self).encode(frame, quality)
    }
}

/// Baseline JPEG via the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegEncoder;

impl JpegEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for JpegEncoder {
    fn encode(&mut self, frame: &Frame, quality: Quality) -> Result<Vec<u8>, CameraError> {
        if frame.data.len() != frame.expected_len() {
            return Err(CameraError::BufferSize {
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }
        let color = match frame.format {
            PixelFormat::Grayscale => ExtendedColorType::L8,
            PixelFormat::Rgb => ExtendedColorType::Rgb8,
        };

        let mut out = Vec::new();
        ImageJpegEncoder::new_with_quality(&mut out, quality.get())
            .encode(&frame.data, frame.width, frame.height, color)
            .map_err(|e| CameraError::EncodeFailed(e.to_string()))?;
        Ok(out)
    }
}
