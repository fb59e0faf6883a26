use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use sd_identity_log::{
	latest_nicknames, latest_usernames, load_logging_config, save_logging_config, Database,
	FeedEvent, GuildId, GuildLoggingConfig, LiveState, MemoryLiveState, Pipeline, PipelineConfig,
	UserId, HISTORY_LIMIT,
};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "identity-logd", about = "Username and nickname history logger")]
struct Cli {
	/// Path to the TOML configuration file, defaults are used when it doesn't exist
	#[arg(long, default_value = "identity-log.toml")]
	config: PathBuf,

	/// Overrides the configured database url
	#[arg(long)]
	database_url: Option<String>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Read newline delimited feed events from stdin and log identity changes
	Run,
	/// Print a user's most recent usernames
	Usernames {
		user_id: UserId,
		#[arg(long, default_value_t = HISTORY_LIMIT)]
		limit: u64,
	},
	/// Print a user's most recent nicknames in a guild
	Nicknames {
		user_id: UserId,
		guild_id: GuildId,
		#[arg(long, default_value_t = HISTORY_LIMIT)]
		limit: u64,
	},
	/// Print a guild's logging switches
	ShowConfig { guild_id: GuildId },
	/// Turn a guild's username and nickname logging on or off
	SetConfig {
		guild_id: GuildId,
		#[arg(long, action = ArgAction::Set)]
		usernames: bool,
		#[arg(long, action = ArgAction::Set)]
		nicknames: bool,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let maybe_config = PipelineConfig::read(&cli.config)?;
	let found_config = maybe_config.is_some();

	let mut config = maybe_config.unwrap_or_default();
	if let Some(database_url) = cli.database_url {
		config.database_url = database_url;
	}

	let _guard = logging::init(&config.log_filter, config.logs_dir.as_deref())?;

	if found_config {
		info!(path = %cli.config.display(), "Loaded config");
	} else {
		warn!(path = %cli.config.display(), "No config found, using defaults");
	}

	let db = Database::connect(&config.database_url)
		.await
		.with_context(|| format!("Failed to open database: {}", config.database_url))?;
	db.migrate().await.context("Failed to migrate database")?;

	match cli.command {
		Commands::Run => run(&config, &db).await?,

		Commands::Usernames { user_id, limit } => {
			let records = latest_usernames(db.conn(), user_id, limit).await?;
			println!("{}", serde_json::to_string_pretty(&records)?);
		}

		Commands::Nicknames {
			user_id,
			guild_id,
			limit,
		} => {
			let records = latest_nicknames(db.conn(), user_id, guild_id, limit).await?;
			println!("{}", serde_json::to_string_pretty(&records)?);
		}

		Commands::ShowConfig { guild_id } => {
			let config = load_logging_config(db.conn(), guild_id).await?;
			println!("{}", serde_json::to_string_pretty(&config)?);
		}

		Commands::SetConfig {
			guild_id,
			usernames,
			nicknames,
		} => {
			save_logging_config(
				db.conn(),
				&GuildLoggingConfig {
					guild_id,
					username_logging_enabled: usernames,
					nickname_logging_enabled: nicknames,
				},
			)
			.await?;

			// A running daemon picks this up from a `logging_config_changed` feed event
			info!(guild_id, usernames, nicknames, "Updated guild logging config");
		}
	}

	Ok(())
}

async fn run(config: &PipelineConfig, db: &Database) -> Result<()> {
	let live = Arc::new(MemoryLiveState::new());
	let live_state: Arc<dyn LiveState> = Arc::<MemoryLiveState>::clone(&live);

	let pipeline = Pipeline::start(db.conn().clone(), Some(live_state), config);

	let mut lines = BufReader::new(io::stdin()).lines();

	loop {
		tokio::select! {
			line = lines.next_line() => {
				let Some(line) = line.context("Failed to read the event feed")? else {
					info!("Event feed closed");
					break;
				};

				if line.trim().is_empty() {
					continue;
				}

				match serde_json::from_str::<FeedEvent>(&line) {
					Ok(event) => {
						let observed = event.clone();
						pipeline.dispatch(event).await;
						live.observe(&observed);
					}
					Err(e) => warn!(?e, "Skipping malformed feed line;"),
				}
			}

			_ = tokio::signal::ctrl_c() => {
				info!("Received shutdown signal");
				break;
			}
		}
	}

	pipeline.stop().await;

	info!(
		overflowed = pipeline.intake().overflowed(),
		"Identity log daemon stopped"
	);

	Ok(())
}
