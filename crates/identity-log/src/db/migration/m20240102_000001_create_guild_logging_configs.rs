//! Per guild logging switches

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(GuildLoggingConfigs::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(GuildLoggingConfigs::GuildId)
							.big_integer()
							.not_null()
							.primary_key(),
					)
					.col(
						ColumnDef::new(GuildLoggingConfigs::UsernameLoggingEnabled)
							.boolean()
							.not_null()
							.default(true),
					)
					.col(
						ColumnDef::new(GuildLoggingConfigs::NicknameLoggingEnabled)
							.boolean()
							.not_null()
							.default(true),
					)
					.to_owned(),
			)
			.await
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(GuildLoggingConfigs::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum GuildLoggingConfigs {
	Table,
	GuildId,
	UsernameLoggingEnabled,
	NicknameLoggingEnabled,
}
