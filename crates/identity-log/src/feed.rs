use serde::{Deserialize, Serialize};

use super::{
	event::{GuildId, MemberUpsert, MessageId, UserId},
	filter::PresenceUpdate,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMember {
	pub user_id: UserId,
	pub username: String,
	#[serde(default)]
	pub nickname: String,
}

/// Already classified notifications from the gateway that the identity log cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
	PresenceUpdate(PresenceUpdate),
	MemberAdd {
		guild_id: GuildId,
		member: FeedMember,
	},
	MemberUpdate {
		guild_id: GuildId,
		member: FeedMember,
	},
	/// Member loaded on demand, e.g. when resolving a command argument
	MemberFetched {
		guild_id: GuildId,
		member: FeedMember,
	},
	MessageDelete {
		message_id: MessageId,
	},
	MessageDeleteBulk {
		message_ids: Vec<MessageId>,
	},
	/// A guild's logging switches were written, its cached copy is stale
	LoggingConfigChanged {
		guild_id: GuildId,
	},
	#[serde(other)]
	Unknown,
}

impl FeedEvent {
	/// The member carried by add, update and fetch notifications
	#[must_use]
	pub fn into_member_upsert(self) -> Option<MemberUpsert> {
		match self {
			Self::MemberAdd { guild_id, member }
			| Self::MemberUpdate { guild_id, member }
			| Self::MemberFetched { guild_id, member } => Some(MemberUpsert {
				guild_id,
				user_id: member.user_id,
				username: member.username,
				nickname: member.nickname,
			}),
			Self::PresenceUpdate(_)
			| Self::MessageDelete { .. }
			| Self::MessageDeleteBulk { .. }
			| Self::LoggingConfigChanged { .. }
			| Self::Unknown => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_classified_notifications() {
		let presence = serde_json::from_str::<FeedEvent>(
			r#"{"type":"presence_update","guild_id":1,"user_id":2,"username":"alice"}"#,
		)
		.expect("presence");

		assert_eq!(
			presence,
			FeedEvent::PresenceUpdate(PresenceUpdate {
				guild_id: 1,
				user_id: 2,
				username: "alice".to_string(),
				nickname: String::new(),
			})
		);

		let member = serde_json::from_str::<FeedEvent>(
			r#"{"type":"member_update","guild_id":1,"member":{"user_id":2,"username":"alice","nickname":"al"}}"#,
		)
		.expect("member");

		assert_eq!(
			member.into_member_upsert(),
			Some(MemberUpsert {
				guild_id: 1,
				user_id: 2,
				username: "alice".to_string(),
				nickname: "al".to_string(),
			})
		);

		let bulk = serde_json::from_str::<FeedEvent>(
			r#"{"type":"message_delete_bulk","message_ids":[1,2,3]}"#,
		)
		.expect("bulk delete");

		assert_eq!(
			bulk,
			FeedEvent::MessageDeleteBulk {
				message_ids: vec![1, 2, 3]
			}
		);

		let config = serde_json::from_str::<FeedEvent>(
			r#"{"type":"logging_config_changed","guild_id":1}"#,
		)
		.expect("config change");

		assert_eq!(config, FeedEvent::LoggingConfigChanged { guild_id: 1 });
	}

	#[test]
	fn unknown_types_are_kept_apart() {
		let event = serde_json::from_str::<FeedEvent>(r#"{"type":"typing_start","user_id":2}"#)
			.expect("unknown");

		assert_eq!(event, FeedEvent::Unknown);
		assert!(event.into_member_upsert().is_none());
	}
}
