//! Read side of the identity history, newest records first.

use sea_orm::{
	ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::{
	db::entities::{nickname_listing, username_listing},
	event::{GuildId, UserId},
};

/// Page size of the full username and nickname history listings
pub const HISTORY_LIMIT: u64 = 25;

/// Page size of the history shown next to a member's profile
pub const WHOIS_HISTORY_LIMIT: u64 = 5;

pub async fn latest_usernames(
	conn: &impl ConnectionTrait,
	user_id: UserId,
	limit: u64,
) -> Result<Vec<username_listing::Model>, DbErr> {
	username_listing::Entity::find()
		.filter(username_listing::Column::UserId.eq(user_id))
		.order_by_desc(username_listing::Column::Id)
		.limit(limit)
		.all(conn)
		.await
}

pub async fn latest_nicknames(
	conn: &impl ConnectionTrait,
	user_id: UserId,
	guild_id: GuildId,
	limit: u64,
) -> Result<Vec<nickname_listing::Model>, DbErr> {
	nickname_listing::Entity::find()
		.filter(nickname_listing::Column::UserId.eq(user_id))
		.filter(nickname_listing::Column::GuildId.eq(guild_id))
		.order_by_desc(nickname_listing::Column::Id)
		.limit(limit)
		.all(conn)
		.await
}
