use crate::auth::auth::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: u64,
    name: String,
    email: String,
    role_id: u8,
    designation: Option<String>,
    department: Option<String>,
    is_active: bool,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "EMPLOYEE")]
    pub role: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<AccountRow> for AccountResponse {
    fn from(row: AccountRow) -> Self {
        let role = Role::from_id(row.role_id)
            .map(|r| r.to_string())
            .unwrap_or_else(|| row.role_id.to_string());
        AccountResponse {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            designation: row.designation,
            department: row.department,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AccountUpdateDto {
    #[schema(example = "Asha Verma")]
    pub name: String,
    /// All three password fields must be supplied together to change the
    /// password; omit them all to update the profile only.
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

const ACCOUNT_COLS: &str = "id, name, email, role_id, designation, department, is_active, created_at";

/* =========================
Current user (token identity)
========================= */
/// Swagger doc for me endpoint
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = Object, example = json!({
            "id": 7,
            "name": "Asha Verma",
            "email": "asha@example.com",
            "role": "EMPLOYEE"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Account"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let row = sqlx::query_as::<_, (u64, String, String, u8)>(
        "SELECT id, name, email, role_id FROM users WHERE id = ?",
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch current user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (id, name, email, role_id) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
        }
    };

    let role = Role::from_id(role_id)
        .map(|r| r.to_string())
        .unwrap_or_else(|| role_id.to_string());

    Ok(HttpResponse::Ok().json(json!({
        "id": id,
        "name": name,
        "email": email,
        "role": role
    })))
}

/* =========================
Account details
========================= */
/// Swagger doc for get_account endpoint
#[utoipa::path(
    get,
    path = "/api/v1/account",
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Account"
)]
pub async fn get_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", ACCOUNT_COLS);
    let row = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch account");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match row {
        Some(row) => Ok(HttpResponse::Ok().json(AccountResponse::from(row))),
        None => Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" }))),
    }
}

/* =========================
Update account (name, optional password change)
========================= */
/// Swagger doc for update_account endpoint
#[utoipa::path(
    put,
    path = "/api/v1/account",
    request_body(
        content = AccountUpdateDto,
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Account updated", body = Object, example = json!({
            "message": "Profile updated successfully",
            "user": {
                "id": 7,
                "name": "Asha Verma",
                "email": "asha@example.com",
                "role": "EMPLOYEE",
                "designation": null,
                "department": null,
                "is_active": true,
                "created_at": "2026-01-01T00:00:00Z"
            }
        })),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Account"
)]
pub async fn update_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    dto: web::Json<AccountUpdateDto>,
) -> actix_web::Result<impl Responder> {
    let name = dto.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "Name is required" })));
    }

    let stored_hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = ?")
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch account");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let stored_hash = match stored_hash {
        Some(h) => h,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
        }
    };

    // Password change is all-or-nothing across the three fields.
    let wants_password_change = dto.current_password.is_some()
        || dto.new_password.is_some()
        || dto.confirm_password.is_some();

    let new_hash = if wants_password_change {
        let (current, new, confirm) = match (
            dto.current_password.as_deref(),
            dto.new_password.as_deref(),
            dto.confirm_password.as_deref(),
        ) {
            (Some(c), Some(n), Some(f)) => (c, n, f),
            _ => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Please fill all password fields"
                })));
            }
        };

        if new != confirm {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "New passwords do not match"
            })));
        }

        if verify_password(current, &stored_hash).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Current password is incorrect"
            })));
        }

        Some(hash_password(new))
    } else {
        None
    };

    let result = match &new_hash {
        Some(hash) => {
            sqlx::query("UPDATE users SET name = ?, password = ? WHERE id = ?")
                .bind(name)
                .bind(hash)
                .bind(auth.user_id)
                .execute(pool.get_ref())
                .await
        }
        None => {
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind(name)
                .bind(auth.user_id)
                .execute(pool.get_ref())
                .await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to update account");
        return Err(actix_web::error::ErrorInternalServerError("Internal Server Error"));
    }

    let sql = format!("SELECT {} FROM users WHERE id = ?", ACCOUNT_COLS);
    let updated = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(auth.user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to re-fetch account");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let message = if new_hash.is_some() {
        "Profile and password updated successfully"
    } else {
        "Profile updated successfully"
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "user": AccountResponse::from(updated)
    })))
}
