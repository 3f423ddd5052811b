use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

/// Append one row to `audit_logs`. Runs after the business write has
/// committed; a failed insert is logged and never fails the request.
pub async fn record(
    pool: &DbPool,
    actor: Option<Uuid>,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    let inserted = sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, resource, metadata) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action)
    .bind(resource)
    .bind(&metadata)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => tracing::debug!(action, resource, "audit recorded"),
        Err(err) => tracing::warn!(error = %err, action, resource, "audit log failed"),
    }
}
