//! Tracing setup: console layer plus an optional JSON-lines file.

use std::path::Path;

use scalecam_config::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Console level comes from `RUST_LOG`, else `--log-level`. The file layer
/// (if `[logging] file` is set) uses `[logging] level`, defaulting to info.
///
/// The returned guard flushes the file writer on drop; hold it until exit.
pub fn init_tracing(
    cli_level: &str,
    json: bool,
    logging: &Logging,
) -> eyre::Result<Option<WorkerGuard>> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli_level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    let mut guard = None;
    if let Some(file) = logging.file.as_deref() {
        let appender = rolling_appender(Path::new(file), logging.rotation.as_deref())?;
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        let level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))?;
    Ok(guard)
}

fn rolling_appender(path: &Path, rotation: Option<&str>) -> eyre::Result<RollingFileAppender> {
    let rotation = match rotation.unwrap_or("never") {
        "daily" => Rotation::DAILY,
        "hourly" => Rotation::HOURLY,
        _ => Rotation::NEVER,
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .map_err(|e| eyre::eyre!("create log directory {}: {e}", dir.display()))?;
    Ok(RollingFileAppender::new(rotation, dir, name))
}
