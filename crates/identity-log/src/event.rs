use serde::{Deserialize, Serialize};

/// Snowflake ids are stored as signed integers due to SQLite limitations
pub type GuildId = i64;
pub type UserId = i64;
pub type MessageId = i64;

/// A user's global username as reported by a presence update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceChange {
	pub guild_id: GuildId,
	pub user_id: UserId,
	pub username: String,
}

/// A member's username and guild nickname, from member add, update or fetch notifications.
///
/// An empty `nickname` means the member has no nickname set in that guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUpsert {
	pub guild_id: GuildId,
	pub user_id: UserId,
	pub username: String,
	pub nickname: String,
}

/// Events flowing through the intake queue. They only live until the accumulator commits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
	PresenceChange(PresenceChange),
	MemberUpsert(MemberUpsert),
}

impl IdentityEvent {
	#[must_use]
	pub const fn guild_id(&self) -> GuildId {
		match self {
			Self::PresenceChange(PresenceChange { guild_id, .. })
			| Self::MemberUpsert(MemberUpsert { guild_id, .. }) => *guild_id,
		}
	}

	#[must_use]
	pub const fn user_id(&self) -> UserId {
		match self {
			Self::PresenceChange(PresenceChange { user_id, .. })
			| Self::MemberUpsert(MemberUpsert { user_id, .. }) => *user_id,
		}
	}
}

impl From<PresenceChange> for IdentityEvent {
	fn from(change: PresenceChange) -> Self {
		Self::PresenceChange(change)
	}
}

impl From<MemberUpsert> for IdentityEvent {
	fn from(member: MemberUpsert) -> Self {
		Self::MemberUpsert(member)
	}
}
