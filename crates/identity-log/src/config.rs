//! Pipeline configuration

use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ConfigError;

/// Configuration for the identity log pipeline and its host process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
	/// Database connection url
	pub database_url: String,

	/// Seconds between two batch ticks
	pub batch_interval_secs: u64,

	/// Capacity of the intake queue before producers overflow into spawned senders
	pub queue_capacity: usize,

	/// Tracing filter used when `RUST_LOG` is not set
	pub log_filter: String,

	/// Directory for rotating log files, stdout only when unset
	pub logs_dir: Option<PathBuf>,
}

impl PipelineConfig {
	/// Load configuration from a TOML file, falling back to defaults when the file is missing
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();

		Ok(Self::read(path)?.unwrap_or_else(|| {
			warn!(path = %path.display(), "No config found, using defaults");
			Self::default()
		}))
	}

	/// Like [`PipelineConfig::load_from`] but silent, `None` when the file doesn't exist.
	///
	/// For hosts that can only install their logging once the config is known.
	pub fn read(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
		let path = path.as_ref();

		if !path.exists() {
			return Ok(None);
		}

		let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;

		let config = toml::from_str::<Self>(&contents).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;

		config.validate()?;

		Ok(Some(config))
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.batch_interval_secs == 0 {
			return Err(ConfigError::ZeroBatchInterval);
		}

		if self.queue_capacity == 0 {
			return Err(ConfigError::ZeroQueueCapacity);
		}

		Ok(())
	}

	#[must_use]
	pub const fn batch_interval(&self) -> Duration {
		Duration::from_secs(self.batch_interval_secs)
	}
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			database_url: "sqlite://identity-log.db?mode=rwc".to_string(),
			batch_interval_secs: 10,
			queue_capacity: 1000,
			log_filter: "info,sd_identity_log=info".to_string(),
			logs_dir: None,
		}
	}
}
