use sd_identity_log::{
	Error, FeedEvent, GuildLoggingConfig, LiveState, MemberSnapshot, MemoryLiveState, Pipeline,
	PipelineConfig, PresenceUpdate, HISTORY_LIMIT,
};

use std::{sync::Arc, time::Duration};

use sea_orm::ConnectionTrait;
use tokio::time::sleep;
use tracing::info;
use tracing_test::traced_test;

mod common;

use common::{count_nicknames, count_usernames, insert_message, is_deleted, manual_config, member};

fn presence(guild_id: i64, user_id: i64, username: &str) -> PresenceUpdate {
	PresenceUpdate {
		guild_id,
		user_id,
		username: username.to_string(),
		nickname: String::new(),
	}
}

#[tokio::test]
#[traced_test]
async fn first_member_event_records_username_only() {
	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", ""));

	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 1);
	assert_eq!(report.nicknames_inserted, 0);

	let usernames = pipeline.latest_usernames(42, HISTORY_LIMIT).await.unwrap();
	assert_eq!(usernames.len(), 1);
	assert_eq!(usernames[0].username, "Alice");

	assert!(pipeline
		.latest_nicknames(42, 1, HISTORY_LIMIT)
		.await
		.unwrap()
		.is_empty());

	assert_eq!(pipeline.stop().await, Some(Default::default()));
}

#[tokio::test]
#[traced_test]
async fn unchanged_identity_writes_nothing() {
	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", "Al"));
	pipeline.flush().await.unwrap();

	pipeline.submit_member_event(member(1, 42, "Alice", "Al"));
	pipeline.submit_presence_event(presence(1, 42, "Alice"));

	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 0);
	assert_eq!(report.nicknames_inserted, 0);

	assert_eq!(count_usernames(&db).await, 1);
	assert_eq!(count_nicknames(&db).await, 1);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn clearing_a_nickname_is_a_change() {
	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Bob", "Bobby"));
	pipeline.flush().await.unwrap();

	pipeline.submit_member_event(member(1, 42, "Bob", ""));
	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.nicknames_inserted, 1);

	let nicknames = pipeline
		.latest_nicknames(42, 1, HISTORY_LIMIT)
		.await
		.unwrap()
		.into_iter()
		.map(|record| record.nickname)
		.collect::<Vec<_>>();

	assert_eq!(nicknames, ["", "Bobby"]);

	// Nicknames are scoped per guild, the same user elsewhere starts from scratch
	pipeline.submit_member_event(member(2, 42, "Bob", ""));
	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.nicknames_inserted, 0);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn member_without_username_only_checks_its_nickname() {
	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", ""));
	pipeline.flush().await.unwrap();

	pipeline.submit_member_event(member(1, 42, "", "Al"));
	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 0);
	assert_eq!(report.nicknames_inserted, 1);

	let usernames = pipeline
		.latest_usernames(42, HISTORY_LIMIT)
		.await
		.unwrap()
		.into_iter()
		.map(|record| record.username)
		.collect::<Vec<_>>();

	assert_eq!(usernames, ["Alice"]);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn disabled_guilds_are_skipped() {
	let (_dir, db) = common::setup_db().await;

	sd_identity_log::save_logging_config(
		db.conn(),
		&GuildLoggingConfig {
			guild_id: 1,
			username_logging_enabled: false,
			nickname_logging_enabled: false,
		},
	)
	.await
	.unwrap();

	sd_identity_log::save_logging_config(
		db.conn(),
		&GuildLoggingConfig {
			guild_id: 2,
			username_logging_enabled: false,
			nickname_logging_enabled: true,
		},
	)
	.await
	.unwrap();

	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Carol", "Caz"));
	pipeline.submit_presence_event(presence(1, 43, "Dave"));
	pipeline.submit_member_event(member(2, 44, "Erin", "Ez"));

	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.guilds_resolved, 2);
	assert_eq!(report.members_skipped, 1);
	assert_eq!(report.users_skipped, 1);
	assert_eq!(report.usernames_inserted, 0);
	assert_eq!(report.nicknames_inserted, 1);

	assert_eq!(count_usernames(&db).await, 0);
	assert_eq!(
		pipeline.latest_nicknames(44, 2, HISTORY_LIMIT).await.unwrap()[0].nickname,
		"Ez"
	);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn presence_matching_live_state_never_reaches_the_queue() {
	let (_dir, db) = common::setup_db().await;

	let live = Arc::new(MemoryLiveState::new());
	live.upsert_member(
		1,
		42,
		MemberSnapshot {
			username: "Alice".to_string(),
			nickname: String::new(),
		},
	);

	let live_state: Arc<dyn LiveState> = Arc::<MemoryLiveState>::clone(&live);
	let pipeline = Pipeline::start(db.conn().clone(), Some(live_state), &manual_config(16));

	pipeline.submit_presence_event(presence(1, 42, "Alice"));
	// Presence without a username is nothing to compare against
	pipeline.submit_presence_event(presence(1, 42, ""));

	assert_eq!(pipeline.flush().await.unwrap(), Default::default());

	pipeline.submit_presence_event(presence(1, 42, "Alicia"));
	// Not loaded in the live state, always forwarded
	pipeline.submit_presence_event(presence(1, 77, "Zed"));

	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 2);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn bursts_above_capacity_lose_nothing() {
	const USERS: i64 = 300;

	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(4));

	for user_id in 0..USERS {
		pipeline.submit_member_event(member(1, user_id, &format!("user-{user_id}"), ""));
	}

	assert!(pipeline.intake().overflowed() > 0);

	let mut stored = 0;
	for round in 0..500 {
		pipeline.flush().await.unwrap();
		stored = count_usernames(&db).await;

		if stored == USERS as u64 {
			info!(round, "all overflowed events delivered");
			break;
		}

		tokio::task::yield_now().await;
	}

	assert_eq!(stored, USERS as u64);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn failed_tick_keeps_its_buffers() {
	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", "Al"));
	pipeline.flush().await.unwrap();

	db.conn()
		.execute_unprepared("DROP TABLE nickname_listings")
		.await
		.unwrap();

	pipeline.submit_member_event(member(1, 42, "Alicia", "Ali"));

	assert!(matches!(
		pipeline.flush().await,
		Err(Error::NicknameCheck { user_id: 42, .. })
	));

	// The username written before the failing nickname check was rolled back
	assert_eq!(count_usernames(&db).await, 1);

	let pending = pipeline.stop().await.unwrap();
	assert_eq!(pending.members, [member(1, 42, "Alicia", "Ali")]);
	assert!(pending.users.is_empty());
}

#[tokio::test]
#[traced_test]
async fn live_config_changes_apply_after_invalidation() {
	let (_dir, db) = common::setup_db().await;

	let live = Arc::new(MemoryLiveState::new());
	live.insert_guild(1);

	let live_state: Arc<dyn LiveState> = Arc::<MemoryLiveState>::clone(&live);
	let pipeline = Pipeline::start(db.conn().clone(), Some(live_state), &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", ""));
	assert_eq!(pipeline.flush().await.unwrap().usernames_inserted, 1);

	sd_identity_log::save_logging_config(
		db.conn(),
		&GuildLoggingConfig {
			guild_id: 1,
			username_logging_enabled: false,
			nickname_logging_enabled: false,
		},
	)
	.await
	.unwrap();

	// Still served from the guild's cached config
	pipeline.submit_member_event(member(1, 42, "Alicia", ""));
	assert_eq!(pipeline.flush().await.unwrap().usernames_inserted, 1);

	live.invalidate_config(1).await;

	pipeline.submit_member_event(member(1, 42, "Ally", ""));
	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 0);
	assert_eq!(report.members_skipped, 1);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn config_change_notification_refreshes_live_cache() {
	let (_dir, db) = common::setup_db().await;

	let live = Arc::new(MemoryLiveState::new());
	live.insert_guild(1);

	let live_state: Arc<dyn LiveState> = Arc::<MemoryLiveState>::clone(&live);
	let pipeline = Pipeline::start(db.conn().clone(), Some(live_state), &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", ""));
	pipeline.flush().await.unwrap();

	sd_identity_log::save_logging_config(
		db.conn(),
		&GuildLoggingConfig {
			guild_id: 1,
			username_logging_enabled: false,
			nickname_logging_enabled: false,
		},
	)
	.await
	.unwrap();

	pipeline
		.dispatch(
			serde_json::from_str::<FeedEvent>(r#"{"type":"logging_config_changed","guild_id":1}"#)
				.unwrap(),
		)
		.await;

	pipeline.submit_member_event(member(1, 42, "Alicia", ""));
	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 0);
	assert_eq!(report.members_skipped, 1);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn dispatches_feed_notifications() {
	let (_dir, db) = common::setup_db().await;
	for id in 1..=3 {
		insert_message(&db, id, 1).await;
	}

	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	let feed = [
		r#"{"type":"presence_update","guild_id":1,"user_id":7,"username":"gus"}"#,
		r#"{"type":"member_add","guild_id":1,"member":{"user_id":8,"username":"hal","nickname":"h"}}"#,
		r#"{"type":"member_fetched","guild_id":1,"member":{"user_id":9,"username":"ivy"}}"#,
		r#"{"type":"message_delete","message_id":1}"#,
		r#"{"type":"message_delete_bulk","message_ids":[2,99]}"#,
		r#"{"type":"typing_start","user_id":7}"#,
	];

	for line in feed {
		pipeline
			.dispatch(serde_json::from_str::<FeedEvent>(line).unwrap())
			.await;
	}

	// Deletions bypass the batching
	assert!(is_deleted(&db, 1).await);
	assert!(is_deleted(&db, 2).await);
	assert!(!is_deleted(&db, 3).await);
	assert_eq!(count_usernames(&db).await, 0);

	let report = pipeline.flush().await.unwrap();
	assert_eq!(report.usernames_inserted, 3);
	assert_eq!(report.nicknames_inserted, 1);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn timer_tick_commits_without_flush() {
	let (_dir, db) = common::setup_db().await;
	let config = PipelineConfig {
		batch_interval_secs: 1,
		..manual_config(16)
	};

	let pipeline = Pipeline::start(db.conn().clone(), None, &config);

	pipeline.submit_member_event(member(1, 42, "Alice", "Al"));

	let mut stored = 0;
	for _ in 0..50 {
		sleep(Duration::from_millis(100)).await;

		stored = count_usernames(&db).await;
		if stored > 0 {
			break;
		}
	}

	assert_eq!(stored, 1);
	assert_eq!(count_nicknames(&db).await, 1);

	pipeline.stop().await;
}

#[tokio::test]
#[traced_test]
async fn stopped_pipeline_rejects_work() {
	let (_dir, db) = common::setup_db().await;
	let pipeline = Pipeline::start(db.conn().clone(), None, &manual_config(16));

	pipeline.submit_member_event(member(1, 42, "Alice", ""));

	let pending = pipeline.stop().await.unwrap();
	assert_eq!(pending.len(), 1);

	assert!(pipeline.intake().is_closed());
	assert!(matches!(pipeline.flush().await, Err(Error::PipelineStopped)));
	assert!(pipeline.stop().await.is_none());

	// Nothing was committed on the way out
	assert_eq!(count_usernames(&db).await, 0);
}
