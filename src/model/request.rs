use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A requests-table row. `status` holds the numeric pipeline code (see
/// `workflow::RequestStatus`); the financial columns mirror the invoice
/// breakdown the submission form collects and are all optional.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Request {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "Acme Steel Pvt Ltd")]
    pub vendor_name: String,
    pub invoice_scope: Option<String>,
    pub invoice_reference: Option<String>,
    #[schema(example = "INV-2026-0042")]
    pub invoice_number: String,
    pub comments: Option<String>,
    pub base_value: Option<f64>,
    pub gst: Option<f64>,
    pub freight_insurance: Option<f64>,
    pub ipc_amount: Option<f64>,
    pub tds: Option<f64>,
    pub penalty: Option<f64>,
    pub payment_on_hold: Option<f64>,
    pub mobilization_advance_recovery: Option<f64>,
    pub amount_paid: Option<f64>,
    pub retention_amount: Option<f64>,
    /// Stored attachment filename under the upload dir, if one was supplied.
    pub pdf_path: Option<String>,
    #[schema(example = 1)]
    pub status: u8,
    #[schema(example = "PENDING")]
    pub payment_status: String,
    pub created_by: u64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}
