use std::sync::Arc;

use futures::FutureExt;
use sea_orm::ConnectionTrait;

use super::{
	db::{entities::guild_logging_config, load_logging_config},
	error::Error,
	event::GuildId,
	live_state::LiveState,
};

/// Resolves guild logging switches, going through the live guild's config cache when there is
/// one and straight to the database otherwise.
#[derive(Clone, Default)]
pub struct FlagResolver {
	live: Option<Arc<dyn LiveState>>,
}

impl FlagResolver {
	#[must_use]
	pub fn new(live: Option<Arc<dyn LiveState>>) -> Self {
		Self { live }
	}

	/// `conn` should be the batch transaction, so a cache miss reads the same snapshot the
	/// batch writes against.
	pub async fn resolve<C: ConnectionTrait>(
		&self,
		conn: &C,
		guild_id: GuildId,
	) -> Result<guild_logging_config::Model, Error> {
		let populate = async move {
			load_logging_config(conn, guild_id)
				.await
				.map_err(|source| Error::ConfigResolution { guild_id, source })
		};

		match self
			.live
			.as_ref()
			.and_then(|live| live.config_cache(guild_id))
		{
			Some(cache) => cache.get_or_populate(populate.boxed()).await,
			None => populate.await,
		}
	}

	/// Resolves every distinct guild in `guild_ids` exactly once.
	pub async fn resolve_all<C: ConnectionTrait>(
		&self,
		conn: &C,
		guild_ids: impl IntoIterator<Item = GuildId>,
	) -> Result<ResolvedFlags, Error> {
		let mut resolved = ResolvedFlags::default();

		for guild_id in guild_ids {
			if resolved.get(guild_id).is_none() {
				resolved.0.push(self.resolve(conn, guild_id).await?);
			}
		}

		Ok(resolved)
	}
}

/// Configs resolved for one batch. Batches touch few guilds, so lookups are a linear scan.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFlags(Vec<guild_logging_config::Model>);

impl ResolvedFlags {
	#[must_use]
	pub fn get(&self, guild_id: GuildId) -> Option<&guild_logging_config::Model> {
		self.0.iter().find(|config| config.guild_id == guild_id)
	}

	#[must_use]
	pub fn username_logging(&self, guild_id: GuildId) -> bool {
		self.get(guild_id)
			.is_some_and(|config| config.username_logging_enabled)
	}

	#[must_use]
	pub fn nickname_logging(&self, guild_id: GuildId) -> bool {
		self.get(guild_id)
			.is_some_and(|config| config.nickname_logging_enabled)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tempfile::TempDir;

	use crate::{
		db::{save_logging_config, Database},
		live_state::MemoryLiveState,
	};

	async fn setup() -> (TempDir, Database) {
		let dir = tempfile::tempdir().expect("tempdir");
		let db = Database::create(&dir.path().join("identity.db"))
			.await
			.expect("database");
		db.migrate().await.expect("migrations");

		save_logging_config(
			db.conn(),
			&guild_logging_config::Model {
				guild_id: 1,
				username_logging_enabled: false,
				nickname_logging_enabled: true,
			},
		)
		.await
		.expect("save config");

		(dir, db)
	}

	#[tokio::test]
	async fn unknown_guilds_track_everything() {
		let (_dir, db) = setup().await;

		let config = FlagResolver::default()
			.resolve(db.conn(), 2)
			.await
			.expect("resolve");

		assert_eq!(config, guild_logging_config::Model::default_for(2));
	}

	#[tokio::test]
	async fn resolves_each_guild_once() {
		let (_dir, db) = setup().await;

		let flags = FlagResolver::default()
			.resolve_all(db.conn(), [1, 2, 1, 1, 2])
			.await
			.expect("resolve");

		assert_eq!(flags.len(), 2);
		assert!(!flags.username_logging(1));
		assert!(flags.nickname_logging(1));
		assert!(flags.username_logging(2));
		assert!(!flags.username_logging(3));
	}

	#[tokio::test]
	async fn live_guilds_are_served_from_their_cache() {
		let (_dir, db) = setup().await;
		let live = Arc::new(MemoryLiveState::new());
		live.insert_guild(1);

		let live_state: Arc<dyn LiveState> = Arc::<MemoryLiveState>::clone(&live);
		let resolver = FlagResolver::new(Some(live_state));
		let usernames_tracked = || async {
			resolver
				.resolve(db.conn(), 1)
				.await
				.expect("resolve")
				.username_logging_enabled
		};

		assert!(!usernames_tracked().await);
		assert!(live.cached_config(1).await.is_some());

		// The database changes, but the cached copy wins until invalidated
		save_logging_config(db.conn(), &guild_logging_config::Model::default_for(1))
			.await
			.expect("save config");

		assert!(!usernames_tracked().await);

		live.invalidate_config(1).await;

		assert!(usernames_tracked().await);
	}
}
