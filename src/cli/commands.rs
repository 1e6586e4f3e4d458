//! Subcommand handlers for serve, grab and config actions.

use std::io::Write;
use std::path::Path;

use super::args::ConfigAction;
use super::CliError;
use crate::camera::{
    effective_window, FrameSource, JpegEncoder, StillImageSource, TestPatternSource,
};
use crate::config::{default_path, Config, SourceKind, DEFAULT_CONFIG_TOML};
use crate::protocol::{read_response, Response, CAPTURE_TOKEN};
use crate::session::CaptureSession;
use crate::shutdown;

/// Build the frame source described by the `[source]` section.
pub fn build_source(config: &Config) -> Result<Box<dyn FrameSource>, CliError> {
    let settings = config.source.settings();
    let source: Box<dyn FrameSource> = match config.source.kind {
        SourceKind::Pattern => Box::new(TestPatternSource::new(settings)?),
        SourceKind::Still => {
            let path = config.source.image.as_deref().ok_or_else(|| {
                CliError::Config(crate::config::ConfigError::Invalid(
                    "source.image is required when source.kind = \"still\"".to_string(),
                ))
            })?;
            Box::new(StillImageSource::open(path, settings)?)
        }
    };
    Ok(source)
}

/// Run the device service until Ctrl+C or a transport failure.
#[cfg(unix)]
pub fn serve(config: &Config) -> Result<(), CliError> {
    use crate::transport::TtyTransport;

    config.validate()?;
    let session_config = config.session()?;
    let source = build_source(config)?;

    let device = &config.transport.device;
    let transport = TtyTransport::open(device, config.transport.baud)
        .map_err(io_context(format!("opening {}", device.display())))?;
    let settings = config.source.settings();
    log::info!(
        "Listening on {} ({:?} source, {:?} {} frames, window {})",
        device.display(),
        config.source.kind,
        settings.pixel_format,
        settings.output_resolution(),
        effective_window(&settings)
    );

    if let Err(e) = shutdown::setup_ctrlc_handler() {
        log::warn!("Could not set up Ctrl+C handler: {}", e);
    }

    let mut session = CaptureSession::new(transport, source, JpegEncoder::new(), session_config);
    session.run_until(shutdown::requested)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn serve(_config: &Config) -> Result<(), CliError> {
    Err(CliError::Unsupported(
        "serial devices are only supported on Unix".to_string(),
    ))
}

/// Request one frame from a device and write the payload to `output`.
#[cfg(unix)]
pub fn grab(config: &Config, output: &Path) -> Result<u32, CliError> {
    use crate::transport::TtyTransport;

    let device = &config.transport.device;
    let mut transport = TtyTransport::open(device, config.transport.baud)
        .map_err(io_context(format!("opening {}", device.display())))?;
    request_frame(&mut transport, output)
}

#[cfg(not(unix))]
pub fn grab(_config: &Config, _output: &Path) -> Result<u32, CliError> {
    Err(CliError::Unsupported(
        "serial devices are only supported on Unix".to_string(),
    ))
}

/// Send a capture request over `link`, read one response and save the payload.
///
/// Returns the payload length on success.
pub fn request_frame<L>(link: &mut L, output: &Path) -> Result<u32, CliError>
where
    L: std::io::Read + Write + ?Sized,
{
    link.write_all(format!("{}\n", CAPTURE_TOKEN).as_bytes())
        .and_then(|_| link.flush())
        .map_err(io_context("sending capture request"))?;

    match read_response(link)? {
        Response::Ok(payload) => {
            let len = payload.len();
            std::fs::write(output, payload.as_bytes())
                .map_err(io_context(format!("writing {}", output.display())))?;
            log::info!("Saved {} bytes to {}", len, output.display());
            Ok(len)
        }
        Response::Err(reason) => Err(CliError::DeviceReported(reason)),
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: &ConfigAction,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_path);

    match action {
        ConfigAction::Show => {
            let settings = config.source.settings();
            println!("Current configuration:");
            println!("  Device: {}", config.transport.device.display());
            println!("  Baud: {}", config.transport.baud);
            println!("  Quality: {}", config.capture.quality);
            println!("  Idle interval: {} ms", config.capture.idle_interval_ms);
            println!(
                "  Error reports: {}",
                if config.capture.report_errors { "yes" } else { "no" }
            );
            println!("  Source: {:?}", config.source.kind);
            if let Some(image) = &config.source.image {
                println!("  Image: {}", image.display());
            }
            println!("  Pixel format: {:?}", settings.pixel_format);
            println!("  Frame size: {}", settings.resolution);
            println!("  Window: {}", effective_window(&settings));
            println!();

            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            Ok(())
        }
        ConfigAction::Init { force } => {
            init_config_file(&path, *force)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}

/// Write [`DEFAULT_CONFIG_TOML`] to `path`, creating parent directories.
pub fn init_config_file(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(io_context(format!("creating {}", parent.display())))?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML)
        .map_err(io_context(format!("writing {}", path.display())))
}

fn io_context(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> CliError {
    let context = context.into();
    move |source| CliError::Io { context, source }
}
