#![allow(dead_code)]

use sd_identity_log::{
	db::entities::{logged_message, nickname_listing, username_listing},
	Database, GuildId, MemberUpsert, MessageId, PipelineConfig, UserId,
};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, PaginatorTrait};
use tempfile::TempDir;

/// Keep the returned `TempDir` alive for as long as the database is used
pub async fn setup_db() -> (TempDir, Database) {
	let dir = tempfile::tempdir().unwrap();
	let db = Database::create(&dir.path().join("identity.db"))
		.await
		.unwrap();
	db.migrate().await.unwrap();

	(dir, db)
}

/// Ticks are far enough apart that only explicit flushes commit anything
pub fn manual_config(queue_capacity: usize) -> PipelineConfig {
	PipelineConfig {
		batch_interval_secs: 3600,
		queue_capacity,
		..Default::default()
	}
}

pub fn member(guild_id: GuildId, user_id: UserId, username: &str, nickname: &str) -> MemberUpsert {
	MemberUpsert {
		guild_id,
		user_id,
		username: username.to_string(),
		nickname: nickname.to_string(),
	}
}

pub async fn insert_message(db: &Database, id: MessageId, guild_id: GuildId) {
	logged_message::ActiveModel {
		id: Set(id),
		guild_id: Set(guild_id),
		channel_id: Set(10),
		author_id: Set(20),
		content: Set(format!("message {id}")),
		deleted: Set(false),
		created_at: Set(Utc::now()),
	}
	.insert(db.conn())
	.await
	.unwrap();
}

pub async fn is_deleted(db: &Database, id: MessageId) -> bool {
	logged_message::Entity::find_by_id(id)
		.one(db.conn())
		.await
		.unwrap()
		.unwrap()
		.deleted
}

pub async fn count_usernames(db: &Database) -> u64 {
	username_listing::Entity::find()
		.count(db.conn())
		.await
		.unwrap()
}

pub async fn count_nicknames(db: &Database) -> u64 {
	nickname_listing::Entity::find()
		.count(db.conn())
		.await
		.unwrap()
}
