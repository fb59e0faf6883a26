use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::instrument;

use super::{
	detector::{check_nickname, check_username},
	error::Error,
	event::{MemberUpsert, PresenceChange},
	flags::FlagResolver,
};

/// What a successful batch tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
	pub guilds_resolved: usize,
	pub usernames_inserted: usize,
	pub nicknames_inserted: usize,
	/// Presence changes skipped because their guild doesn't track usernames
	pub users_skipped: usize,
	/// Member upserts skipped because their guild tracks neither usernames nor nicknames
	pub members_skipped: usize,
}

/// Runs one batch tick inside a single transaction: resolves the logging switches of every
/// guild in the batch, then runs change detection for every buffered item.
///
/// Any error rolls the whole batch back, the caller keeps its buffers and retries them later.
#[instrument(skip_all, fields(users_count = %users.len(), members_count = %members.len()))]
pub async fn process_batch(
	db: &DatabaseConnection,
	resolver: &FlagResolver,
	users: &[PresenceChange],
	members: &[MemberUpsert],
) -> Result<BatchReport, Error> {
	let txn = db.begin().await?;

	let guild_ids = users
		.iter()
		.map(|user| user.guild_id)
		.chain(members.iter().map(|member| member.guild_id))
		.collect::<Vec<_>>();

	let flags = resolver.resolve_all(&txn, guild_ids).await?;

	let mut report = BatchReport {
		guilds_resolved: flags.len(),
		..Default::default()
	};

	for PresenceChange {
		guild_id,
		user_id,
		username,
	} in users
	{
		if !flags.username_logging(*guild_id) {
			report.users_skipped += 1;
			continue;
		}

		if check_username(&txn, *user_id, username)
			.await
			.map_err(|source| Error::UsernameCheck {
				user_id: *user_id,
				source,
			})? {
			report.usernames_inserted += 1;
		}
	}

	for MemberUpsert {
		guild_id,
		user_id,
		username,
		nickname,
	} in members
	{
		let Some(config) = flags
			.get(*guild_id)
			.filter(|config| config.tracks_anything())
		else {
			report.members_skipped += 1;
			continue;
		};

		// Members without a username only carry a nickname worth checking
		if config.username_logging_enabled
			&& !username.is_empty()
			&& check_username(&txn, *user_id, username)
				.await
				.map_err(|source| Error::UsernameCheck {
					user_id: *user_id,
					source,
				})? {
			report.usernames_inserted += 1;
		}

		if config.nickname_logging_enabled
			&& check_nickname(&txn, *user_id, *guild_id, nickname)
				.await
				.map_err(|source| Error::NicknameCheck {
					user_id: *user_id,
					guild_id: *guild_id,
					source,
				})? {
			report.nicknames_inserted += 1;
		}
	}

	txn.commit().await.map_err(Error::Commit)?;

	Ok(report)
}
