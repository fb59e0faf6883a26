//! Append-only history of per-guild nicknames

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nickname_listings")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i64,

	#[sea_orm(indexed)]
	pub user_id: i64,

	#[sea_orm(indexed)]
	pub guild_id: i64,

	/// Empty when the member cleared their nickname
	pub nickname: String,

	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
