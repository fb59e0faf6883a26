use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

use async_channel as chan;
use tokio::runtime::Handle;
use tracing::{trace, warn};

use super::event::IdentityEvent;

/// Producer side of the intake queue, cheap to clone and never blocks.
///
/// When the queue is full the event is handed to a freshly spawned task that waits for room,
/// so bursts above capacity cost memory instead of events. Producers may live on any thread,
/// runtime or not, the sender tasks go to the runtime the queue was created on.
#[derive(Debug, Clone)]
pub struct Intake {
	tx: chan::Sender<IdentityEvent>,
	overflowed: Arc<AtomicU64>,
	runtime: Handle,
}

/// Must be called from within a tokio runtime.
#[must_use]
pub fn channel(capacity: usize) -> (Intake, chan::Receiver<IdentityEvent>) {
	let (tx, rx) = chan::bounded(capacity);

	(
		Intake {
			tx,
			overflowed: Arc::default(),
			runtime: Handle::current(),
		},
		rx,
	)
}

impl Intake {
	pub fn submit(&self, event: impl Into<IdentityEvent>) {
		match self.tx.try_send(event.into()) {
			Ok(()) => {}

			Err(chan::TrySendError::Full(event)) => {
				self.overflowed.fetch_add(1, Ordering::Relaxed);
				trace!(
					guild_id = event.guild_id(),
					user_id = event.user_id(),
					"Intake queue full, spawning a sender;"
				);

				let tx = self.tx.clone();
				self.runtime.spawn(async move {
					if let Err(chan::SendError(event)) = tx.send(event).await {
						warn!(
							guild_id = event.guild_id(),
							user_id = event.user_id(),
							"Intake queue closed before an overflowed event could be delivered;"
						);
					}
				});
			}

			Err(chan::TrySendError::Closed(event)) => {
				warn!(
					guild_id = event.guild_id(),
					user_id = event.user_id(),
					"Identity event submitted after the pipeline stopped, dropping it;"
				);
			}
		}
	}

	/// Number of events that had to wait on a spawned sender since this queue was created
	#[must_use]
	pub fn overflowed(&self) -> u64 {
		self.overflowed.load(Ordering::Relaxed)
	}

	#[must_use]
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}

	pub(crate) fn close(&self) -> bool {
		self.tx.close()
	}
}
