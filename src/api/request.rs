use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::history::ApprovalHistoryEntry;
use crate::model::request::Request;
use crate::model::role::Role;
use crate::utils::upload;
use crate::workflow::{
    self, INITIAL_PAYMENT_STATUS, INITIAL_STATUS, RequestAction, RequestStatus,
};
use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

/// Submission form. Multipart because of the optional PDF; every numeric
/// field is optional and parsed from its text part.
#[derive(Debug, MultipartForm)]
pub struct SubmitRequestForm {
    pub vendor_name: Text<String>,
    pub invoice_number: Text<String>,
    pub invoice_scope: Option<Text<String>>,
    pub invoice_reference: Option<Text<String>>,
    pub comments: Option<Text<String>>,
    pub base_value: Option<Text<f64>>,
    pub gst: Option<Text<f64>>,
    pub freight_insurance: Option<Text<f64>>,
    pub ipc_amount: Option<Text<f64>>,
    pub tds: Option<Text<f64>>,
    pub penalty: Option<Text<f64>>,
    pub payment_on_hold: Option<Text<f64>>,
    pub mobilization_advance_recovery: Option<Text<f64>>,
    pub amount_paid: Option<Text<f64>>,
    pub retention_amount: Option<Text<f64>>,
    #[multipart(limit = "10MB")]
    pub file: Option<TempFile>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    #[schema(example = 1)]
    /// Filter by pipeline status code
    pub status: Option<u8>,
    #[schema(example = "SCHEDULED")]
    /// Filter by payment status
    pub payment_status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<Request>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct RequestDetailsResponse {
    pub request: Request,
    /// Full audit trail, oldest first.
    pub history: Vec<ApprovalHistoryEntry>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    #[schema(example = "APPROVE")]
    pub action: RequestAction, // enum ensures Swagger dropdown
    #[schema(example = "Verified against the PO")]
    pub remark: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelDto {
    #[schema(example = "Duplicate submission")]
    pub remark: Option<String>,
}

/* =========================
Submit request
========================= */
/// Swagger doc for submit_request endpoint
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body(
        content = Object,
        description = "Multipart form: vendor_name and invoice_number are required; \
                       invoice_scope, invoice_reference, comments, the numeric invoice \
                       breakdown fields and a PDF `file` part are optional",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 201, description = "Request submitted",
         body = Object,
         example = json!({
            "message": "Request submitted",
            "id": 42
         })
        ),
        (status = 400, description = "Missing required fields or non-PDF attachment"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn submit_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    MultipartForm(form): MultipartForm<SubmitRequestForm>,
) -> actix_web::Result<impl Responder> {
    let vendor_name = form.vendor_name.trim().to_string();
    let invoice_number = form.invoice_number.trim().to_string();

    // 1️⃣ validate required fields
    if vendor_name.is_empty() || invoice_number.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "vendor_name and invoice_number are required"
        })));
    }

    // 2️⃣ store the attachment, if any
    let pdf_path = match &form.file {
        Some(file) => {
            let content_type = file.content_type.as_ref().map(|m| m.essence_str());
            if !upload::is_pdf(file.file_name.as_deref(), content_type) {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Only PDF attachments are accepted"
                })));
            }
            let stored = upload::store_pdf(file.file.path(), &config.upload_dir).map_err(|e| {
                tracing::error!(error = %e, "Failed to store attachment");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
            Some(stored)
        }
        None => None,
    };

    // a stored attachment must not outlive a failed insert
    let discard_stored = || {
        if let Some(name) = &pdf_path {
            upload::discard(&config.upload_dir, name);
        }
    };

    // 3️⃣ insert request + its SUBMIT history row in one transaction
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        discard_stored();
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO requests
            (vendor_name, invoice_scope, invoice_reference, invoice_number, comments,
             base_value, gst, freight_insurance, ipc_amount, tds, penalty,
             payment_on_hold, mobilization_advance_recovery, amount_paid, retention_amount,
             pdf_path, status, payment_status, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&vendor_name)
    .bind(form.invoice_scope.as_deref())
    .bind(form.invoice_reference.as_deref())
    .bind(&invoice_number)
    .bind(form.comments.as_deref())
    .bind(form.base_value.as_deref())
    .bind(form.gst.as_deref())
    .bind(form.freight_insurance.as_deref())
    .bind(form.ipc_amount.as_deref())
    .bind(form.tds.as_deref())
    .bind(form.penalty.as_deref())
    .bind(form.payment_on_hold.as_deref())
    .bind(form.mobilization_advance_recovery.as_deref())
    .bind(form.amount_paid.as_deref())
    .bind(form.retention_amount.as_deref())
    .bind(&pdf_path)
    .bind(INITIAL_STATUS.code())
    .bind(INITIAL_PAYMENT_STATUS.to_string())
    .bind(auth.user_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create request");
        discard_stored();
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request_id = result.last_insert_id();

    sqlx::query(
        r#"
        INSERT INTO approval_history
            (request_id, user_id, role, action, remark, user_name)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request_id)
    .bind(auth.user_id)
    .bind(auth.role.to_string())
    .bind(RequestAction::Submit.to_string())
    .bind("Request created")
    .bind(&auth.name)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to write submit history");
        discard_stored();
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to commit request");
        discard_stored();
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Request submitted",
        "id": request_id
    })))
}

/* =========================
List requests (role scoped)
========================= */
/// Swagger doc for list_requests endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    // Employees see their own requests; approvers see their work queue
    // (their stage plus anything parked on hold); admins see everything.
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    match auth.role {
        Role::Employee => {
            where_sql.push_str(" AND created_by = ?");
            args.push(FilterValue::U64(auth.user_id));
        }
        Role::Manager => {
            where_sql.push_str(" AND status IN (?, ?)");
            args.push(FilterValue::U64(RequestStatus::PendingManager.code() as u64));
            args.push(FilterValue::U64(RequestStatus::OnHold.code() as u64));
        }
        Role::Purchase => {
            where_sql.push_str(" AND status IN (?, ?)");
            args.push(FilterValue::U64(RequestStatus::PendingPurchase.code() as u64));
            args.push(FilterValue::U64(RequestStatus::OnHold.code() as u64));
        }
        Role::Admin => {}
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::U64(status as u64));
    }

    if let Some(payment_status) = query.payment_status.as_deref() {
        where_sql.push_str(" AND payment_status = ?");
        args.push(FilterValue::Str(payment_status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT *
        FROM requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Request>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch request list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = RequestListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Request details + audit trail
========================= */
/// Swagger doc for get_request endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the request to fetch")
    ),
    responses(
        (status = 200, description = "Request with its approval history", body = RequestDetailsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "Request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = ?")
        .bind(request_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id, "Failed to fetch request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Request not found"
            })));
        }
    };

    let history = sqlx::query_as::<_, ApprovalHistoryEntry>(
        r#"
        SELECT *
        FROM approval_history
        WHERE request_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(request_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to fetch approval history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(RequestDetailsResponse { request, history }))
}

/* =========================
Update status (approvers)
========================= */
/// Swagger doc for update_status endpoint
#[utoipa::path(
    put,
    path = "/api/v1/requests/{request_id}/status",
    params(
        ("request_id" = u64, Path, description = "ID of the request to act on")
    ),
    request_body(
        content = UpdateStatusDto,
        description = "Action to apply plus an optional remark for the audit trail",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "Status updated",
            "status": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Acting role may not act on this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is closed or was modified concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    dto: web::Json<UpdateStatusDto>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    // 1️⃣ load the current stage
    let row = sqlx::query_as::<_, (u8, u64)>("SELECT status, created_by FROM requests WHERE id = ?")
        .bind(request_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id, "Failed to fetch request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let (status_code, created_by) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Request not found"
            })));
        }
    };

    let status = RequestStatus::from_code(status_code).ok_or_else(|| {
        tracing::error!(request_id, status_code, "Unknown status code in requests table");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // 2️⃣ run the state machine
    let is_owner = created_by == auth.user_id;
    let transition = match workflow::apply(status, auth.role, dto.action, is_owner) {
        Ok(t) => t,
        Err(denied) => {
            return Ok(HttpResponse::build(denied.http_status()).json(json!({
                "message": denied.to_string()
            })));
        }
    };

    // 3️⃣ write the transition + its history row atomically
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // status in the WHERE guards against a concurrent transition
    let result = sqlx::query(
        r#"
        UPDATE requests
        SET status = ?, payment_status = COALESCE(?, payment_status), updated_at = NOW()
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(transition.next_status.code())
    .bind(transition.payment_status.map(|p| p.to_string()))
    .bind(request_id)
    .bind(status.code())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to update request status");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Request was modified concurrently, please retry"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO approval_history
            (request_id, user_id, role, action, remark, user_name)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request_id)
    .bind(auth.user_id)
    .bind(auth.role.to_string())
    .bind(dto.action.to_string())
    .bind(&dto.remark)
    .bind(&auth.name)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to write approval history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to commit status update");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::info!(
        request_id,
        actor = auth.user_id,
        action = %dto.action,
        from = %status,
        to = %transition.next_status,
        "Request transitioned"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Status updated",
        "status": transition.next_status.code()
    })))
}

/* =========================
Cancel request (owner)
========================= */
/// Swagger doc for cancel_request endpoint
#[utoipa::path(
    put,
    path = "/api/v1/requests/{request_id}/cancel",
    params(
        ("request_id" = u64, Path, description = "ID of the request to cancel")
    ),
    request_body(
        content = CancelDto,
        description = "Optional remark for the audit trail",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request cancelled", body = Object, example = json!({
            "message": "Request cancelled successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the owner can cancel"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is no longer cancellable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn cancel_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    dto: web::Json<CancelDto>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let row = sqlx::query_as::<_, (u8, u64)>("SELECT status, created_by FROM requests WHERE id = ?")
        .bind(request_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id, "Failed to fetch request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let (status_code, created_by) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Request not found"
            })));
        }
    };

    let status = RequestStatus::from_code(status_code).ok_or_else(|| {
        tracing::error!(request_id, status_code, "Unknown status code in requests table");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let is_owner = created_by == auth.user_id;
    let transition = match workflow::apply(status, auth.role, RequestAction::Cancel, is_owner) {
        Ok(t) => t,
        Err(denied) => {
            return Ok(HttpResponse::build(denied.http_status()).json(json!({
                "message": denied.to_string()
            })));
        }
    };

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        UPDATE requests
        SET status = ?, updated_at = NOW()
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(transition.next_status.code())
    .bind(request_id)
    .bind(status.code())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to cancel request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Request was modified concurrently, please retry"
        })));
    }

    let remark = dto
        .remark
        .clone()
        .unwrap_or_else(|| "Request cancelled by employee".to_string());

    sqlx::query(
        r#"
        INSERT INTO approval_history
            (request_id, user_id, role, action, remark, user_name)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request_id)
    .bind(auth.user_id)
    .bind(auth.role.to_string())
    .bind(RequestAction::Cancel.to_string())
    .bind(&remark)
    .bind(&auth.name)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to write cancel history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to commit cancellation");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::info!(request_id, actor = auth.user_id, "Request cancelled");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request cancelled successfully"
    })))
}
