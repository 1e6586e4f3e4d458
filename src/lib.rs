//! capture-serial library crate.
//!
//! On-demand frame capture over a serial link: the host sends `CAPTURE\n`,
//! the device answers with `OK\n`, a little-endian `u32` length and a JPEG.
//! This module exposes the internal components for integration testing.

pub mod camera;
pub mod cli;
pub mod config;
pub mod protocol;
pub mod session;
pub mod shutdown;
pub mod transport;
