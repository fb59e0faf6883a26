//! Per guild switches for username and nickname tracking

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guild_logging_configs")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub guild_id: i64,

	pub username_logging_enabled: bool,

	pub nickname_logging_enabled: bool,
}

impl Model {
	/// Config used for guilds that never saved one, everything is tracked
	#[must_use]
	pub const fn default_for(guild_id: i64) -> Self {
		Self {
			guild_id,
			username_logging_enabled: true,
			nickname_logging_enabled: true,
		}
	}

	#[must_use]
	pub const fn tracks_anything(&self) -> bool {
		self.username_logging_enabled || self.nickname_logging_enabled
	}
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
