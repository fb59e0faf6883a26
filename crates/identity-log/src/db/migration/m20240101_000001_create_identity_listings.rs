//! Username and nickname history tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(UsernameListings::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(UsernameListings::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(
						ColumnDef::new(UsernameListings::UserId)
							.big_integer()
							.not_null(),
					)
					.col(ColumnDef::new(UsernameListings::Username).text().not_null())
					.col(
						ColumnDef::new(UsernameListings::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_username_listings_user_id")
					.table(UsernameListings::Table)
					.col(UsernameListings::UserId)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(NicknameListings::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(NicknameListings::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(
						ColumnDef::new(NicknameListings::UserId)
							.big_integer()
							.not_null(),
					)
					.col(
						ColumnDef::new(NicknameListings::GuildId)
							.big_integer()
							.not_null(),
					)
					.col(ColumnDef::new(NicknameListings::Nickname).text().not_null())
					.col(
						ColumnDef::new(NicknameListings::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_nickname_listings_user_guild")
					.table(NicknameListings::Table)
					.col(NicknameListings::UserId)
					.col(NicknameListings::GuildId)
					.to_owned(),
			)
			.await
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(NicknameListings::Table).to_owned())
			.await?;

		manager
			.drop_table(Table::drop().table(UsernameListings::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum UsernameListings {
	Table,
	Id,
	UserId,
	Username,
	CreatedAt,
}

#[derive(DeriveIden)]
enum NicknameListings {
	Table,
	Id,
	UserId,
	GuildId,
	Nickname,
	CreatedAt,
}
