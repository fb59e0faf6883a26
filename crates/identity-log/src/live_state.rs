use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::{
	db::entities::guild_logging_config,
	error::Error,
	event::{GuildId, UserId},
	feed::FeedEvent,
};

/// Future handed to a [`ConfigCache`] that reads the config from the database on a cache miss
pub type Populate<'fut> = BoxFuture<'fut, Result<guild_logging_config::Model, Error>>;

/// Current identity of a member as seen by the live guild state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberSnapshot {
	pub username: String,
	pub nickname: String,
}

/// Read access to the process' live guild state. The pipeline never owns this state, it only
/// looks things up in it.
pub trait LiveState: Send + Sync + 'static {
	/// Authoritative identity for a member, `None` unless both the member and its presence
	/// are fully loaded.
	fn member_snapshot(&self, guild_id: GuildId, user_id: UserId) -> Option<MemberSnapshot>;

	/// The guild scoped config cache, `None` when the guild isn't live in this process.
	fn config_cache(&self, guild_id: GuildId) -> Option<Arc<dyn ConfigCache>>;
}

#[async_trait::async_trait]
pub trait ConfigCache: Send + Sync {
	/// Returns the cached config, awaiting `populate` and storing its output on a miss.
	async fn get_or_populate(
		&self,
		populate: Populate<'_>,
	) -> Result<guild_logging_config::Model, Error>;

	/// Drops the cached config, the next lookup populates it again.
	async fn invalidate(&self);
}

/// Single slot cache. The lock is held while populating, so concurrent misses only hit the
/// database once.
#[derive(Debug, Default)]
pub struct MemoryConfigCache {
	slot: Mutex<Option<guild_logging_config::Model>>,
}

impl MemoryConfigCache {
	pub async fn cached(&self) -> Option<guild_logging_config::Model> {
		self.slot.lock().await.clone()
	}
}

#[async_trait::async_trait]
impl ConfigCache for MemoryConfigCache {
	async fn get_or_populate(
		&self,
		populate: Populate<'_>,
	) -> Result<guild_logging_config::Model, Error> {
		let mut slot = self.slot.lock().await;

		if let Some(config) = &*slot {
			return Ok(config.clone());
		}

		let config = populate.await?;
		*slot = Some(config.clone());

		Ok(config)
	}

	async fn invalidate(&self) {
		self.slot.lock().await.take();
	}
}

#[derive(Debug, Default)]
struct LiveGuild {
	members: RwLock<HashMap<UserId, MemberSnapshot>>,
	config: Arc<MemoryConfigCache>,
}

/// In-memory [`LiveState`], guilds become live with [`MemoryLiveState::insert_guild`].
#[derive(Debug, Default)]
pub struct MemoryLiveState {
	guilds: RwLock<HashMap<GuildId, Arc<LiveGuild>>>,
}

impl MemoryLiveState {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_guild(&self, guild_id: GuildId) {
		self.guilds.write().entry(guild_id).or_default();
	}

	pub fn remove_guild(&self, guild_id: GuildId) {
		self.guilds.write().remove(&guild_id);
	}

	/// Records a fully loaded member, making the guild live if it wasn't already.
	pub fn upsert_member(&self, guild_id: GuildId, user_id: UserId, snapshot: MemberSnapshot) {
		let guild = Arc::clone(self.guilds.write().entry(guild_id).or_default());
		guild.members.write().insert(user_id, snapshot);
	}

	pub fn remove_member(&self, guild_id: GuildId, user_id: UserId) {
		if let Some(guild) = self.guild(guild_id) {
			guild.members.write().remove(&user_id);
		}
	}

	/// Drops a guild's cached config so the next batch reads it from the database again.
	pub async fn invalidate_config(&self, guild_id: GuildId) {
		if let Some(guild) = self.guild(guild_id) {
			guild.config.invalidate().await;
		}
	}

	pub async fn cached_config(&self, guild_id: GuildId) -> Option<guild_logging_config::Model> {
		match self.guild(guild_id) {
			Some(guild) => guild.config.cached().await,
			None => None,
		}
	}

	/// Keeps member snapshots in step with the feed.
	///
	/// Call it once the event went through the pipeline, the presence pre-filter has to
	/// compare against the state from before the event.
	pub fn observe(&self, event: &FeedEvent) {
		match event {
			FeedEvent::MemberAdd { guild_id, member }
			| FeedEvent::MemberUpdate { guild_id, member }
			| FeedEvent::MemberFetched { guild_id, member } => self.upsert_member(
				*guild_id,
				member.user_id,
				MemberSnapshot {
					username: member.username.clone(),
					nickname: member.nickname.clone(),
				},
			),

			// Presence alone never makes a member fully loaded
			FeedEvent::PresenceUpdate(update) => {
				let Some(guild) = self.guild(update.guild_id) else {
					return;
				};

				if let Some(snapshot) = guild.members.write().get_mut(&update.user_id) {
					if !update.username.is_empty() {
						snapshot.username.clone_from(&update.username);
					}
					snapshot.nickname.clone_from(&update.nickname);
				};
			}

			FeedEvent::LoggingConfigChanged { .. }
			| FeedEvent::MessageDelete { .. }
			| FeedEvent::MessageDeleteBulk { .. }
			| FeedEvent::Unknown => {}
		}
	}

	fn guild(&self, guild_id: GuildId) -> Option<Arc<LiveGuild>> {
		self.guilds.read().get(&guild_id).cloned()
	}
}

impl LiveState for MemoryLiveState {
	fn member_snapshot(&self, guild_id: GuildId, user_id: UserId) -> Option<MemberSnapshot> {
		let guild = self.guild(guild_id)?;
		let members = guild.members.read();

		members.get(&user_id).cloned()
	}

	fn config_cache(&self, guild_id: GuildId) -> Option<Arc<dyn ConfigCache>> {
		let guild = self.guild(guild_id)?;
		let cache: Arc<dyn ConfigCache> = Arc::<MemoryConfigCache>::clone(&guild.config);

		Some(cache)
	}
}
