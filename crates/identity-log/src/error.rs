use std::{io, path::PathBuf};

use sea_orm::DbErr;
use thiserror::Error;

use super::event::{GuildId, UserId};

#[derive(Debug, Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] DbErr),
	#[error("failed to resolve logging config <guild_id='{guild_id}'>: {source}")]
	ConfigResolution { guild_id: GuildId, source: DbErr },
	#[error("username check failed <user_id='{user_id}'>: {source}")]
	UsernameCheck { user_id: UserId, source: DbErr },
	#[error("nickname check failed <user_id='{user_id}', guild_id='{guild_id}'>: {source}")]
	NicknameCheck {
		user_id: UserId,
		guild_id: GuildId,
		source: DbErr,
	},
	#[error("failed to commit batch transaction: {0}")]
	Commit(DbErr),
	#[error("identity pipeline is not running")]
	PipelineStopped,

	#[error(transparent)]
	Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file <path='{}'>: {source}", .path.display())]
	Read { path: PathBuf, source: io::Error },
	#[error("failed to parse config file <path='{}'>: {source}", .path.display())]
	Parse {
		path: PathBuf,
		source: toml::de::Error,
	},
	#[error("batch interval must be greater than zero")]
	ZeroBatchInterval,
	#[error("intake queue capacity must be greater than zero")]
	ZeroQueueCapacity,
}
