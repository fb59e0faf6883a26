use std::{fs, path::Path};

use anyhow::Context;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber: `RUST_LOG` or `default_filter` on stdout, plus a daily
/// rotating file when `logs_dir` is set.
///
/// The returned guard flushes the file writer on drop, keep it alive until exit.
pub fn init(default_filter: &str, logs_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
	let env_filter = match EnvFilter::try_from_default_env() {
		Ok(env_filter) => env_filter,
		Err(_) => EnvFilter::try_new(default_filter)
			.with_context(|| format!("Invalid log filter: {default_filter}"))?,
	};

	let (file_layer, guard) = match logs_dir {
		Some(logs_dir) => {
			fs::create_dir_all(logs_dir).with_context(|| {
				format!("Failed to create logs directory: {}", logs_dir.display())
			})?;

			let (non_blocking, guard) =
				tracing_appender::non_blocking(rolling::daily(logs_dir, "identity-logd.log"));

			(
				Some(
					fmt::layer()
						.with_target(true)
						.with_ansi(false) // No ANSI colors in log files
						.with_writer(non_blocking),
				),
				Some(guard),
			)
		}
		None => (None, None),
	};

	tracing_subscriber::registry()
		.with(env_filter)
		.with(
			fmt::layer()
				.with_target(true)
				.with_thread_ids(true)
				.with_writer(std::io::stdout),
		)
		.with(file_layer)
		.try_init()
		.context("Failed to initialize tracing")?;

	Ok(guard)
}
