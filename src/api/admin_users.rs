use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::utils::db_utils;
use crate::utils::email_cache;
use crate::utils::email_filter;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Columns an admin user-update may touch.
const USER_UPDATE_COLS: &[&str] = &[
    "name",
    "role_id",
    "designation",
    "department",
    "rm_id",
    "rm_name",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateUserDto {
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "changeme1")]
    pub password: String,
    #[schema(example = "EMPLOYEE")]
    pub role: Role,
    pub designation: Option<String>,
    pub department: Option<String>,
    /// Reporting manager, denormalized as id + display name
    pub rm_id: Option<u64>,
    pub rm_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserDto {
    pub name: String,
    #[schema(example = "MANAGER")]
    pub role: Role,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub rm_id: Option<u64>,
    pub rm_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UserStatusDto {
    pub is_active: bool,
}

#[derive(sqlx::FromRow)]
struct UserListRow {
    id: u64,
    name: String,
    email: String,
    role_id: u8,
    designation: Option<String>,
    department: Option<String>,
    rm_name: Option<String>,
    is_active: bool,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListItem {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[schema(example = "EMPLOYEE")]
    pub role: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub rm_name: Option<String>,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<UserListRow> for UserListItem {
    fn from(row: UserListRow) -> Self {
        let role = Role::from_id(row.role_id)
            .map(|r| r.to_string())
            .unwrap_or_else(|| row.role_id.to_string());
        UserListItem {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            designation: row.designation,
            department: row.department,
            rm_name: row.rm_name,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const USER_LIST_COLS: &str =
    "id, name, email, role_id, designation, department, rm_name, is_active, created_at";

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.to_lowercase();

    // 1️⃣ Cuckoo filter — fast negative
    // if filter says not exist then it is saying true, else it may exist or not.
    if !email_filter::might_exist(&email) {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // 3️⃣ Database fallback
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)")
            .bind(&email)
            .fetch_one(pool)
            .await
            .unwrap_or(true); // fail-safe

    !exists
}

/// Inserts a new user and keeps the email filter + cache in step
async fn insert_user(dto: &CreateUserDto, pool: &MySqlPool) -> Result<u64, HttpResponse> {
    let hashed = hash_password(&dto.password);
    let email = dto.email.trim().to_lowercase();

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (name, email, password, role_id, designation, department, rm_id, rm_name)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(dto.name.trim())
    .bind(&email)
    .bind(&hashed)
    .bind(dto.role.id())
    .bind(&dto.designation)
    .bind(&dto.department)
    .bind(dto.rm_id)
    .bind(&dto.rm_name)
    .execute(pool)
    .await;

    match result {
        Ok(r) => {
            // if insert success, populate filter and cache with the new email.
            email_filter::insert(&email);
            email_cache::mark_taken(&email).await;
            Ok(r.last_insert_id())
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Err(HttpResponse::Conflict().json(json!({
                        "message": "Email already exists"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create user");
            Err(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to create user"
            })))
        }
    }
}

/* =========================
List active users (dropdowns)
========================= */
/// Swagger doc for list_users endpoint
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "Active users, name order", body = [UserListItem]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let sql = format!(
        "SELECT {} FROM users WHERE is_active = TRUE ORDER BY name ASC",
        USER_LIST_COLS
    );
    let rows = sqlx::query_as::<_, UserListRow>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch users");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let users: Vec<UserListItem> = rows.into_iter().map(UserListItem::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

/* =========================
List all users (dashboard)
========================= */
/// Swagger doc for list_all_users endpoint
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/all",
    responses(
        (status = 200, description = "Every user, newest first", body = [UserListItem]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_all_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_LIST_COLS);
    let rows = sqlx::query_as::<_, UserListRow>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch users");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let users: Vec<UserListItem> = rows.into_iter().map(UserListItem::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

/* =========================
Create user
========================= */
/// Swagger doc for create_user endpoint
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    request_body(content = CreateUserDto, content_type = "application/json"),
    responses(
        (status = 201, description = "User created", body = Object, example = json!({
            "message": "User created successfully",
            "user_id": 12
        })),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    dto: web::Json<CreateUserDto>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if dto.name.trim().is_empty() || dto.email.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name and email are required"
        })));
    }

    if dto.password.len() < 6 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Password must be at least 6 characters"
        })));
    }

    if !is_email_available(&dto.email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Email already exists"
        })));
    }

    // Safe to insert after the availability funnel; the unique index still
    // backstops a race.
    match insert_user(&dto, pool.get_ref()).await {
        Ok(user_id) => Ok(HttpResponse::Created().json(json!({
            "message": "User created successfully",
            "user_id": user_id
        }))),
        Err(err_resp) => Ok(err_resp),
    }
}

/* =========================
Update user
========================= */
/// Swagger doc for update_user endpoint
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user to update")
    ),
    request_body(content = UpdateUserDto, content_type = "application/json"),
    responses(
        (status = 200, description = "User updated", body = Object, example = json!({
            "message": "User updated successfully"
        })),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    dto: web::Json<UpdateUserDto>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    if dto.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name and role are required"
        })));
    }

    // Full replace of the editable profile columns, driven through the
    // allowlisted dynamic-update builder.
    let payload = json!({
        "name": dto.name.trim(),
        "role_id": dto.role.id(),
        "designation": dto.designation,
        "department": dto.department,
        "rm_id": dto.rm_id,
        "rm_name": dto.rm_name,
    });

    let update = db_utils::build_update_sql("users", &payload, USER_UPDATE_COLS, "id", user_id as i64)?;

    let rows = db_utils::execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to update user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if rows == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "User updated successfully" })))
}

/* =========================
Toggle user status
========================= */
/// Swagger doc for set_user_status endpoint
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}/status",
    params(
        ("user_id" = u64, Path, description = "ID of the user to enable/disable")
    ),
    request_body(content = UserStatusDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "User status updated successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn set_user_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    dto: web::Json<UserStatusDto>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(dto.is_active)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to update user status");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "User status updated successfully" })))
}

/* =========================
Delete user
========================= */
/// Swagger doc for delete_user endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted", body = Object, example = json!({
            "message": "User deleted successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User has linked records")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    // fetch the email first so the filter and cache can be cleaned up
    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to fetch user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let email = match email {
        Some(e) => e,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
        }
    };

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            email_filter::remove(&email);
            email_cache::unmark(&email).await;
            Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                // foreign keys keep users with requests around
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "User has linked records and cannot be deleted; deactivate instead"
                    })));
                }
            }
            tracing::error!(error = %e, user_id, "Failed to delete user");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}
