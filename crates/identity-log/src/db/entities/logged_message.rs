//! Archived channel messages, only the deleted flag is managed here

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: i64,

	#[sea_orm(indexed)]
	pub guild_id: i64,

	pub channel_id: i64,

	pub author_id: i64,

	#[sea_orm(column_type = "Text")]
	pub content: String,

	pub deleted: bool,

	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
