//! Message log table, carries the deleted flag

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Messages::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Messages::Id)
							.big_integer()
							.not_null()
							.primary_key(),
					)
					.col(ColumnDef::new(Messages::GuildId).big_integer().not_null())
					.col(ColumnDef::new(Messages::ChannelId).big_integer().not_null())
					.col(ColumnDef::new(Messages::AuthorId).big_integer().not_null())
					.col(ColumnDef::new(Messages::Content).text().not_null())
					.col(
						ColumnDef::new(Messages::Deleted)
							.boolean()
							.not_null()
							.default(false),
					)
					.col(
						ColumnDef::new(Messages::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_messages_guild_id")
					.table(Messages::Table)
					.col(Messages::GuildId)
					.to_owned(),
			)
			.await
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(Messages::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum Messages {
	Table,
	Id,
	GuildId,
	ChannelId,
	AuthorId,
	Content,
	Deleted,
	CreatedAt,
}
