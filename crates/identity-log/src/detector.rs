//! Change detection against the most recently stored identity values.
//!
//! Both checks read the newest row for the key and only append a new one when the value
//! differs, so the listings never hold two equal consecutive values.

use chrono::Utc;
use sea_orm::{
	ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
	QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use super::{
	db::entities::{nickname_listing, username_listing},
	event::{GuildId, UserId},
};

/// Records `username` for the user unless it already is the last known one.
///
/// A user without history always gets a first record.
pub async fn check_username(
	conn: &impl ConnectionTrait,
	user_id: UserId,
	username: &str,
) -> Result<bool, DbErr> {
	let last = username_listing::Entity::find()
		.select_only()
		.column(username_listing::Column::Username)
		.filter(username_listing::Column::UserId.eq(user_id))
		.order_by_desc(username_listing::Column::Id)
		.into_tuple::<String>()
		.one(conn)
		.await?;

	if last.as_deref() == Some(username) {
		return Ok(false);
	}

	debug!(
		user_id,
		old = last.as_deref().unwrap_or_default(),
		new = username,
		"User changed username;"
	);

	username_listing::ActiveModel {
		user_id: Set(user_id),
		username: Set(username.to_owned()),
		created_at: Set(Utc::now()),
		..Default::default()
	}
	.insert(conn)
	.await?;

	Ok(true)
}

/// Records `nickname` for the member in the guild unless it already is the last known one.
///
/// Members without history are only recorded once they actually set a nickname, but going
/// back to no nickname after that is a change like any other.
pub async fn check_nickname(
	conn: &impl ConnectionTrait,
	user_id: UserId,
	guild_id: GuildId,
	nickname: &str,
) -> Result<bool, DbErr> {
	let last = nickname_listing::Entity::find()
		.select_only()
		.column(nickname_listing::Column::Nickname)
		.filter(nickname_listing::Column::UserId.eq(user_id))
		.filter(nickname_listing::Column::GuildId.eq(guild_id))
		.order_by_desc(nickname_listing::Column::Id)
		.into_tuple::<String>()
		.one(conn)
		.await?;

	match last.as_deref() {
		None if nickname.is_empty() => return Ok(false),
		Some(last) if last == nickname => return Ok(false),
		_ => {}
	}

	debug!(
		user_id,
		guild_id,
		old = last.as_deref().unwrap_or_default(),
		new = nickname,
		"User changed nickname;"
	);

	nickname_listing::ActiveModel {
		user_id: Set(user_id),
		guild_id: Set(guild_id),
		nickname: Set(nickname.to_owned()),
		created_at: Set(Utc::now()),
		..Default::default()
	}
	.insert(conn)
	.await?;

	Ok(true)
}
