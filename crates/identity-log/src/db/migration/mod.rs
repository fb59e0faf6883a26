//! Database migrations

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
	fn migrations() -> Vec<Box<dyn MigrationTrait>> {
		vec![
			Box::new(m20240101_000001_create_identity_listings::Migration),
			Box::new(m20240102_000001_create_guild_logging_configs::Migration),
			Box::new(m20240103_000001_create_messages::Migration),
		]
	}
}

mod m20240101_000001_create_identity_listings;
mod m20240102_000001_create_guild_logging_configs;
mod m20240103_000001_create_messages;
