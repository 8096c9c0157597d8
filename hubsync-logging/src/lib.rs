//! Tracing subscriber setup, driven by environment variables:
//!
//! - `LOG_LEVEL`: default filter directive (default `info`), overridden by
//!   `RUST_LOG` when set.
//! - `LOG_FORMAT`: `human` (default) or `json`.
//! - `LOG_OUTPUT`: `console` (default), `file`, or `both`.
//! - `LOG_FILE_PATH`: file sink location (default `/tmp/hubsync.log`).

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Initializes the global tracing subscriber.
///
/// Returns the file appender's worker guard when a file sink is active; the
/// caller must keep it alive for the lifetime of the process.
pub fn init_subscriber() -> Option<WorkerGuard> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "human".to_string());
    let log_output = env::var("LOG_OUTPUT").unwrap_or_else(|_| "console".to_string());
    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "/tmp/hubsync.log".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_level))
        .add_directive("hyper=warn".parse().expect("static directive"))
        .add_directive("reqwest=warn".parse().expect("static directive"));

    let use_console = log_output == "console" || log_output == "both";
    let use_file = log_output == "file" || log_output == "both";
    let is_json = log_format == "json";

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;

    if use_console {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);
        layers.push(if is_json {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    if use_file {
        let log_path = Path::new(&log_file_path);
        let log_dir = log_path.parent().unwrap_or_else(|| Path::new("/tmp"));
        let log_filename = log_path.file_name().unwrap_or("hubsync.log".as_ref());

        let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking);
        layers.push(if is_json {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    guard
}
