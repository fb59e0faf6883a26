//! Database entities

pub mod guild_logging_config;
pub mod logged_message;
pub mod nickname_listing;
pub mod username_listing;

pub use guild_logging_config::Entity as GuildLoggingConfig;
pub use logged_message::Entity as LoggedMessage;
pub use nickname_listing::Entity as NicknameListing;
pub use username_listing::Entity as UsernameListing;
