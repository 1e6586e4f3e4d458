//! Frame conversion and transformation utilities.

use super::types::{CameraError, Frame, Window};

/// Crop a frame to `window`, keeping format and timestamp.
pub fn crop(frame: &Frame, window: Window) -> Result<Frame, CameraError> {
    if frame.data.len() != frame.expected_len() {
        return Err(CameraError::BufferSize {
            expected: frame.expected_len(),
            actual: frame.data.len(),
        });
    }
    if !window.fits(frame.resolution()) {
        return Err(CameraError::WindowOutOfBounds {
            window,
            resolution: frame.resolution(),
        });
    }

    let bpp = frame.bytes_per_pixel();
    let src_stride = frame.width as usize * bpp;
    let row_len = window.width as usize * bpp;
    let mut data = Vec::with_capacity(row_len * window.height as usize);

    for y in window.y..window.y + window.height {
        let start = y as usize * src_stride + window.x as usize * bpp;
        data.extend_from_slice(&frame.data[start..start + row_len]);
    }

    Ok(Frame {
        data,
        width: window.width,
        height: window.height,
        format: frame.format,
        timestamp: frame.timestamp,
    })
}
