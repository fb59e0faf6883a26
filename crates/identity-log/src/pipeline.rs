use std::{mem, pin::pin, sync::Arc, time::Duration};

use async_channel as chan;
use futures::{stream, StreamExt};
use futures_concurrency::stream::Merge;
use parking_lot::Mutex;
use sea_orm::DatabaseConnection;
use tokio::{
	spawn,
	sync::oneshot,
	task::JoinHandle,
	time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_stream::wrappers::IntervalStream;
use tracing::{error, info, trace, warn};

use super::{
	accumulator::PendingBatch,
	committer::BatchReport,
	config::PipelineConfig,
	db::entities::{nickname_listing, username_listing},
	deletion,
	error::Error,
	event::{GuildId, IdentityEvent, MemberUpsert, MessageId, PresenceChange, UserId},
	feed::FeedEvent,
	filter::{PresenceFilter, PresenceUpdate},
	flags::FlagResolver,
	intake::{self, Intake},
	live_state::{ConfigCache, LiveState},
	query,
};

enum Control {
	Flush(oneshot::Sender<Result<BatchReport, Error>>),
	Stop(oneshot::Sender<PendingBatch>),
}

/// The identity log pipeline: intake queue, presence pre-filter and the batch accumulator
/// task that owns the buffers.
///
/// Producers only ever enqueue, every buffer mutation happens on the accumulator task, so
/// nothing here needs a lock besides the join handle.
pub struct Pipeline {
	intake: Intake,
	filter: PresenceFilter,
	live: Option<Arc<dyn LiveState>>,
	db: DatabaseConnection,
	control_tx: chan::Sender<Control>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
	/// Spawns the accumulator, must be called from within a tokio runtime.
	#[must_use]
	pub fn start(
		db: DatabaseConnection,
		live: Option<Arc<dyn LiveState>>,
		config: &PipelineConfig,
	) -> Self {
		let (intake, intake_rx) = intake::channel(config.queue_capacity);
		let (control_tx, control_rx) = chan::bounded(8);

		let accumulator = Accumulator {
			db: db.clone(),
			resolver: FlagResolver::new(live.clone()),
			intake_rx,
			batch: PendingBatch::default(),
		};

		let handle = spawn(accumulator.run(control_rx, config.batch_interval()));

		info!(
			batch_interval = ?config.batch_interval(),
			queue_capacity = config.queue_capacity,
			"Identity log pipeline started;"
		);

		Self {
			intake,
			filter: PresenceFilter::new(live.clone()),
			live,
			db,
			control_tx,
			handle: Mutex::new(Some(handle)),
		}
	}

	/// A producer handle to the intake queue, for event sources living on other tasks.
	#[must_use]
	pub fn intake(&self) -> Intake {
		self.intake.clone()
	}

	/// Enqueues a presence update unless the live state proves it changes nothing.
	pub fn submit_presence_event(&self, update: PresenceUpdate) {
		if self.filter.should_forward(&update) {
			self.intake.submit(PresenceChange::from(update));
		}
	}

	pub fn submit_member_event(&self, member: MemberUpsert) {
		self.intake.submit(member);
	}

	/// Marks messages as deleted right away, bypassing the batching. Returns the ids that
	/// failed, each failure is already logged.
	pub async fn mark_messages_deleted(&self, message_ids: &[MessageId]) -> Vec<MessageId> {
		deletion::mark_many_deleted(&self.db, message_ids).await
	}

	/// Routes a classified feed notification to its path through the pipeline.
	pub async fn dispatch(&self, event: FeedEvent) {
		match event {
			FeedEvent::PresenceUpdate(update) => self.submit_presence_event(update),

			event @ (FeedEvent::MemberAdd { .. }
			| FeedEvent::MemberUpdate { .. }
			| FeedEvent::MemberFetched { .. }) => {
				if let Some(member) = event.into_member_upsert() {
					self.submit_member_event(member);
				}
			}

			FeedEvent::MessageDelete { message_id } => {
				self.mark_messages_deleted(&[message_id]).await;
			}

			FeedEvent::MessageDeleteBulk { message_ids } => {
				self.mark_messages_deleted(&message_ids).await;
			}

			FeedEvent::LoggingConfigChanged { guild_id } => {
				self.invalidate_config(guild_id).await;
			}

			FeedEvent::Unknown => warn!("Rejecting feed event of unknown type;"),
		}
	}

	/// Makes a logging config write visible to the next batch touching a live guild. Guilds
	/// that aren't live read the database every batch and need nothing.
	pub async fn invalidate_config(&self, guild_id: GuildId) {
		if let Some(cache) = self
			.live
			.as_ref()
			.and_then(|live| live.config_cache(guild_id))
		{
			trace!(guild_id, "Invalidating cached logging config;");
			cache.invalidate().await;
		}
	}

	pub async fn latest_usernames(
		&self,
		user_id: UserId,
		limit: u64,
	) -> Result<Vec<username_listing::Model>, Error> {
		query::latest_usernames(&self.db, user_id, limit)
			.await
			.map_err(Into::into)
	}

	pub async fn latest_nicknames(
		&self,
		user_id: UserId,
		guild_id: GuildId,
		limit: u64,
	) -> Result<Vec<nickname_listing::Model>, Error> {
		query::latest_nicknames(&self.db, user_id, guild_id, limit)
			.await
			.map_err(Into::into)
	}

	/// Runs a batch tick now, with every event already sitting in the intake queue.
	///
	/// A failed flush keeps the buffers, exactly like a failed timer tick.
	pub async fn flush(&self) -> Result<BatchReport, Error> {
		let (tx, rx) = oneshot::channel();

		self.control_tx
			.send(Control::Flush(tx))
			.await
			.map_err(|_| Error::PipelineStopped)?;

		rx.await.map_err(|_| Error::PipelineStopped)?
	}

	/// Stops the accumulator without committing and hands back whatever it still buffered.
	///
	/// Returns `None` if the pipeline was already stopped.
	pub async fn stop(&self) -> Option<PendingBatch> {
		let (tx, rx) = oneshot::channel();

		if self.control_tx.send(Control::Stop(tx)).await.is_err() {
			warn!("Trying to stop the identity log pipeline that was already stopped");
			return None;
		}

		let pending = rx.await.ok();

		let maybe_handle = self.handle.lock().take();
		if let Some(handle) = maybe_handle {
			if let Err(e) = handle.await {
				error!(?e, "Identity log accumulator failed to stop;");
			}
		}

		self.intake.close();
		self.control_tx.close();

		if let Some(pending) = &pending {
			if !pending.is_empty() {
				warn!(
					users_count = pending.users.len(),
					members_count = pending.members.len(),
					"Identity log pipeline stopped with uncommitted events;"
				);
			}
		}

		pending
	}
}

struct Accumulator {
	db: DatabaseConnection,
	resolver: FlagResolver,
	intake_rx: chan::Receiver<IdentityEvent>,
	batch: PendingBatch,
}

impl Accumulator {
	async fn run(mut self, control_rx: chan::Receiver<Control>, period: Duration) {
		enum StreamMessage {
			Event(IdentityEvent),
			Control(Control),
			/// Every [`Pipeline`] handle is gone
			ControlClosed,
			Tick,
		}

		let mut ticker = interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

		let mut msg_stream = pin!((
			self.intake_rx.clone().map(StreamMessage::Event),
			control_rx
				.map(StreamMessage::Control)
				.chain(stream::once(async { StreamMessage::ControlClosed })),
			IntervalStream::new(ticker).map(|_| StreamMessage::Tick),
		)
			.merge());

		while let Some(msg) = msg_stream.next().await {
			match msg {
				StreamMessage::Event(event) => self.batch.push(event),

				StreamMessage::Tick => {
					if let Ok(report) = self.batch.commit(&self.db, &self.resolver).await {
						trace!(?report, "Batch tick done;");
					}
				}

				StreamMessage::Control(Control::Flush(tx)) => {
					self.drain_intake();

					let res = self.batch.commit(&self.db, &self.resolver).await;
					if tx.send(res).is_err() {
						warn!("Flush requester went away before the batch finished;");
					}
				}

				StreamMessage::Control(Control::Stop(tx)) => {
					self.intake_rx.close();
					self.drain_intake();

					if tx.send(mem::take(&mut self.batch)).is_err() {
						warn!("Stop requester went away, dropping uncommitted events;");
					}

					break;
				}

				StreamMessage::ControlClosed => {
					self.intake_rx.close();
					warn!(
						pending_count = self.batch.len(),
						"Identity log pipeline dropped without being stopped;"
					);

					break;
				}
			}
		}
	}

	fn drain_intake(&mut self) {
		while let Ok(event) = self.intake_rx.try_recv() {
			self.batch.push(event);
		}
	}
}
