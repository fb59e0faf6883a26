//! Database infrastructure using SeaORM

use std::{path::Path, time::Duration};

use sea_orm::{
	sea_query::OnConflict, ActiveValue::Set, ConnectOptions, ConnectionTrait,
	Database as SeaDatabase, DatabaseConnection, DbErr, EntityTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::event::GuildId;

pub mod entities;
pub mod migration;

use entities::guild_logging_config;

/// Database wrapper for the identity log
#[derive(Debug, Clone)]
pub struct Database {
	conn: DatabaseConnection,
}

impl Database {
	/// Create (or open) a SQLite database at the specified path
	pub async fn create(path: &Path) -> Result<Self, DbErr> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {e}")))?;
		}

		let db = Self::connect(&format!("sqlite://{}?mode=rwc", path.display())).await?;

		info!(path = %path.display(), "Opened identity log database");

		Ok(db)
	}

	/// Connect using a full database url
	pub async fn connect(url: &str) -> Result<Self, DbErr> {
		let mut opt = ConnectOptions::new(url.to_owned());
		opt.max_connections(10)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.sqlx_logging(false); // We use tracing instead

		let conn = SeaDatabase::connect(opt).await?;

		Ok(Self { conn })
	}

	/// Run migrations
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("Database migrations completed successfully");
		Ok(())
	}

	/// Get the database connection
	#[must_use]
	pub const fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}

/// Read a guild's logging switches, guilds without a stored row track everything
pub async fn load_logging_config(
	conn: &impl ConnectionTrait,
	guild_id: GuildId,
) -> Result<guild_logging_config::Model, DbErr> {
	Ok(guild_logging_config::Entity::find_by_id(guild_id)
		.one(conn)
		.await?
		.unwrap_or_else(|| guild_logging_config::Model::default_for(guild_id)))
}

/// Insert or replace a guild's logging switches
pub async fn save_logging_config(
	conn: &impl ConnectionTrait,
	config: &guild_logging_config::Model,
) -> Result<(), DbErr> {
	guild_logging_config::Entity::insert(guild_logging_config::ActiveModel {
		guild_id: Set(config.guild_id),
		username_logging_enabled: Set(config.username_logging_enabled),
		nickname_logging_enabled: Set(config.nickname_logging_enabled),
	})
	.on_conflict(
		OnConflict::column(guild_logging_config::Column::GuildId)
			.update_columns([
				guild_logging_config::Column::UsernameLoggingEnabled,
				guild_logging_config::Column::NicknameLoggingEnabled,
			])
			.to_owned(),
	)
	.exec(conn)
	.await?;

	Ok(())
}
