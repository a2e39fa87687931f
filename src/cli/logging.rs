use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_LOG_FILE: &str = "./logs/mc.log";

/// Installs the global subscriber: a pretty stderr layer and a plain-text
/// file layer.
///
/// `TRACING_LEVEL` takes any `EnvFilter` directive, e.g.
/// `mistake_clusters::selection=trace,info`. The returned guard flushes the
/// file writer when dropped, so keep it alive until exit.
pub fn init_logger() -> WorkerGuard {
    let directives = env::var("TRACING_LEVEL").unwrap_or_else(|_| DEFAULT_LEVEL.to_string());
    let log_file: PathBuf = env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string())
        .into();

    let (directory, file_name) = split_log_path(&log_file);
    let _ = std::fs::create_dir_all(&directory);
    let file_appender = tracing_appender::rolling::never(&directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::new(directives))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_thread_ids(true)
                .with_target(true)
                .with_ansi(false),
        )
        .init();

    debug!("Logging to stderr and {}", log_file.display());
    guard
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map_or_else(|| PathBuf::from("mc.log"), PathBuf::from);
    (directory, file_name)
}
