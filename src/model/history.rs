use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One approval-history row. Rows are written once when a transition lands
/// and are never updated or deleted; the table has no `updated_at` on
/// purpose.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ApprovalHistoryEntry {
    pub id: u64,
    pub request_id: u64,
    pub user_id: u64,
    /// Canonical role string of the actor at the time of the action.
    #[schema(example = "MANAGER")]
    pub role: String,
    #[schema(example = "APPROVE")]
    pub action: String,
    pub remark: Option<String>,
    pub user_name: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
