//! Marks archived messages as deleted, outside of the batching pipeline.

use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use tracing::{error, instrument};

use super::{db::entities::logged_message, event::MessageId};

/// Flags every logged row for `message_id` as deleted. Already deleted or unknown messages
/// are left as they are.
pub async fn mark_deleted(
	conn: &impl ConnectionTrait,
	message_id: MessageId,
) -> Result<u64, DbErr> {
	logged_message::Entity::update_many()
		.col_expr(logged_message::Column::Deleted, Expr::value(true))
		.filter(logged_message::Column::Id.eq(message_id))
		.exec(conn)
		.await
		.map(|res| res.rows_affected)
}

/// Marks each message on its own, a failure is logged and doesn't stop the remaining ones.
///
/// Returns the ids that could not be marked.
#[instrument(skip_all, fields(messages_count = %message_ids.len()))]
pub async fn mark_many_deleted(
	conn: &impl ConnectionTrait,
	message_ids: &[MessageId],
) -> Vec<MessageId> {
	let mut failed = Vec::new();

	for &message_id in message_ids {
		if let Err(e) = mark_deleted(conn, message_id).await {
			error!(?e, message_id, "Failed marking message as deleted;");
			failed.push(message_id);
		}
	}

	failed
}
