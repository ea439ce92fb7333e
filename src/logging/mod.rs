/*!
 * Logging Module
 * Daily-rolling file logs plus console output; JSON in production.
 */
pub mod config;
pub mod middleware;

pub use config::{LogLevel, LogSettings};

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system. The returned guards flush the background
/// writers when dropped, so the caller keeps them until shutdown.
pub fn init(environment: &str) -> Vec<WorkerGuard> {
    let settings = LogSettings::from_env(environment);

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&settings.dir).ok();

    // File appender for all logs
    let (file_writer, file_guard) = non_blocking(rolling::daily(&settings.dir, "app.log"));

    // File appender for errors only
    let (error_writer, error_guard) = non_blocking(rolling::daily(&settings.dir, "error.log"));

    // Console writer
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.filter_directives()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if settings.production {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!(
        level = %settings.level,
        dir = ?settings.dir,
        "Logging initialized for {} environment",
        environment
    );

    vec![file_guard, error_guard, console_guard]
}
