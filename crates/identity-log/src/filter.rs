use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
	event::{GuildId, PresenceChange, UserId},
	live_state::LiveState,
};

/// Raw presence notification. An empty `username` means the update didn't carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
	pub guild_id: GuildId,
	pub user_id: UserId,
	#[serde(default)]
	pub username: String,
	#[serde(default)]
	pub nickname: String,
}

impl From<PresenceUpdate> for PresenceChange {
	fn from(
		PresenceUpdate {
			guild_id,
			user_id,
			username,
			..
		}: PresenceUpdate,
	) -> Self {
		Self {
			guild_id,
			user_id,
			username,
		}
	}
}

/// Drops presence updates that the live state proves to carry nothing new.
///
/// Anything the live state can't vouch for is forwarded, a real change must never be missed.
#[derive(Clone, Default)]
pub struct PresenceFilter {
	live: Option<Arc<dyn LiveState>>,
}

impl PresenceFilter {
	#[must_use]
	pub fn new(live: Option<Arc<dyn LiveState>>) -> Self {
		Self { live }
	}

	#[must_use]
	pub fn should_forward(&self, update: &PresenceUpdate) -> bool {
		let Some(snapshot) = self
			.live
			.as_ref()
			.and_then(|live| live.member_snapshot(update.guild_id, update.user_id))
		else {
			return true;
		};

		if !update.username.is_empty() && update.username != snapshot.username {
			return true;
		}

		if update.nickname != snapshot.nickname {
			return true;
		}

		trace!(
			guild_id = update.guild_id,
			user_id = update.user_id,
			"Dropping presence update matching live state;"
		);

		false
	}
}
