use std::time::Instant;

use sea_orm::DatabaseConnection;
use tracing::{debug, error, trace};

use super::{
	committer::{process_batch, BatchReport},
	error::Error,
	event::{IdentityEvent, MemberUpsert, PresenceChange},
	flags::FlagResolver,
};

/// Events drained from the intake queue and not committed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBatch {
	pub users: Vec<PresenceChange>,
	pub members: Vec<MemberUpsert>,
}

impl PendingBatch {
	/// Classifies an event into its buffer. Presence changes without a username carry nothing
	/// to record and are dropped here.
	pub fn push(&mut self, event: IdentityEvent) {
		match event {
			IdentityEvent::PresenceChange(change) if change.username.is_empty() => {
				trace!(
					guild_id = change.guild_id,
					user_id = change.user_id,
					"Skipping presence change without username;"
				);
			}
			IdentityEvent::PresenceChange(change) => self.users.push(change),
			IdentityEvent::MemberUpsert(member) => self.members.push(member),
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.users.len() + self.members.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.users.is_empty() && self.members.is_empty()
	}

	/// Commits the buffers, clearing them only if the whole batch went through.
	pub(crate) async fn commit(
		&mut self,
		db: &DatabaseConnection,
		resolver: &FlagResolver,
	) -> Result<BatchReport, Error> {
		if self.is_empty() {
			return Ok(BatchReport::default());
		}

		let started = Instant::now();

		match process_batch(db, resolver, &self.users, &self.members).await {
			Ok(report) => {
				debug!(
					members_count = self.members.len(),
					users_count = self.users.len(),
					usernames_inserted = report.usernames_inserted,
					nicknames_inserted = report.nicknames_inserted,
					elapsed = ?started.elapsed(),
					"Updated identity listings;"
				);

				self.users.clear();
				self.members.clear();

				Ok(report)
			}

			Err(e) => {
				error!(
					?e,
					members_count = self.members.len(),
					users_count = self.users.len(),
					"Failed batch updating usernames and nicknames, keeping events for next tick;"
				);

				Err(e)
			}
		}
	}
}
