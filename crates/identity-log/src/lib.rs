//!
//! # Identity Log
//!
//! Tracks username and per-guild nickname changes coming from a live event feed, and marks
//! logged messages as deleted.
//!
//! Identity notifications arrive in high volume and most of them carry no actual change, so
//! they are not written straight to the database. Instead they go through a pipeline:
//! - A presence pre-filter drops presence updates that provably match the live state;
//! - A bounded, non-blocking intake queue accepts events from any number of producers;
//! - A single accumulator drains the queue into buffers and commits them on a fixed tick;
//! - Each tick resolves the guilds' logging flags and runs change detection for every buffered
//!   item inside one database transaction, so a failed tick leaves nothing half written and
//!   keeps its buffers for the next one.
//!
//! Message deletions skip the pipeline entirely and go straight to the database.
//!
//! ## Basic example
//!
//! ```no_run
//! use sd_identity_log::{Database, MemberUpsert, Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sd_identity_log::Error> {
//!     let config = PipelineConfig::default();
//!     let db = Database::connect(&config.database_url).await?;
//!     db.migrate().await?;
//!
//!     let pipeline = Pipeline::start(db.conn().clone(), None, &config);
//!
//!     pipeline.submit_member_event(MemberUpsert {
//!         guild_id: 1,
//!         user_id: 42,
//!         username: "Alice".to_string(),
//!         nickname: String::new(),
//!     });
//!
//!     let report = pipeline.flush().await?;
//!     assert_eq!(report.usernames_inserted, 1);
//!
//!     pipeline.stop().await;
//!
//!     Ok(())
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod accumulator;
mod committer;
mod config;
pub mod db;
mod deletion;
mod detector;
mod error;
mod event;
mod feed;
mod filter;
mod flags;
mod intake;
mod live_state;
mod pipeline;
mod query;

pub use accumulator::PendingBatch;
pub use committer::{process_batch, BatchReport};
pub use config::PipelineConfig;
pub use db::{
	entities::{
		guild_logging_config::Model as GuildLoggingConfig,
		nickname_listing::Model as NicknameRecord, username_listing::Model as UsernameRecord,
	},
	load_logging_config, save_logging_config, Database,
};
pub use deletion::{mark_deleted, mark_many_deleted};
pub use detector::{check_nickname, check_username};
pub use error::{ConfigError, Error};
pub use event::{GuildId, IdentityEvent, MemberUpsert, MessageId, PresenceChange, UserId};
pub use feed::{FeedEvent, FeedMember};
pub use filter::{PresenceFilter, PresenceUpdate};
pub use flags::{FlagResolver, ResolvedFlags};
pub use intake::{channel as intake_channel, Intake};
pub use live_state::{
	ConfigCache, LiveState, MemberSnapshot, MemoryConfigCache, MemoryLiveState, Populate,
};
pub use pipeline::Pipeline;
pub use query::{latest_nicknames, latest_usernames, HISTORY_LIMIT, WHOIS_HISTORY_LIMIT};
