//! Frame acquisition and compression.
//!
//! This module provides the collaborators the capture session calls into:
//! - Frame sources via the [`FrameSource`] trait ([`TestPatternSource`], [`StillImageSource`])
//! - Compression via the [`Encoder`] trait ([`JpegEncoder`])
//! - Geometry via [`SourceSettings`], [`Resolution`] and [`Window`]

mod encoder;
mod frame_utils;
mod source;
mod types;

pub use encoder::{Encoder, JpegEncoder, Quality};
pub use frame_utils::crop;
pub use source::{effective_window, FrameSource, StillImageSource, TestPatternSource};
pub use types::{
    CameraError, Frame, FrameSize, PixelFormat, Resolution, SourceSettings, Window,
};
