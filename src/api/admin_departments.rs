use crate::auth::auth::AuthUser;
use crate::model::department::Department;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DepartmentDto {
    #[schema(example = "Procurement")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DepartmentStatusDto {
    pub is_active: bool,
}

/// Lean shape for dropdowns
#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct DepartmentOption {
    pub id: u64,
    #[schema(example = "Procurement")]
    pub name: String,
}

/* =========================
Active departments (dropdowns)
========================= */
/// Swagger doc for list_departments endpoint
#[utoipa::path(
    get,
    path = "/api/v1/admin/departments",
    responses(
        (status = 200, description = "Active departments, name order", body = [DepartmentOption]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let departments = sqlx::query_as::<_, DepartmentOption>(
        "SELECT id, name FROM departments WHERE is_active = TRUE ORDER BY name ASC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch departments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(departments))
}

/* =========================
All departments (dashboard)
========================= */
/// Swagger doc for list_all_departments endpoint
#[utoipa::path(
    get,
    path = "/api/v1/admin/departments/all",
    responses(
        (status = 200, description = "Every department, newest first", body = [Department]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_all_departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, is_active, created_at FROM departments ORDER BY created_at DESC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch departments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(departments))
}

/* =========================
Create department
========================= */
/// Swagger doc for create_department endpoint
#[utoipa::path(
    post,
    path = "/api/v1/admin/departments",
    request_body(content = DepartmentDto, content_type = "application/json"),
    responses(
        (status = 201, description = "Department created", body = Object, example = json!({
            "message": "Department created successfully"
        })),
        (status = 400, description = "Name missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Department already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    dto: web::Json<DepartmentDto>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = dto.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Department name is required"
        })));
    }

    let result = sqlx::query("INSERT INTO departments (name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Department created successfully"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Department already exists"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create department");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Rename department
========================= */
/// Swagger doc for update_department endpoint
#[utoipa::path(
    put,
    path = "/api/v1/admin/departments/{department_id}",
    params(
        ("department_id" = u64, Path, description = "ID of the department to rename")
    ),
    request_body(content = DepartmentDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Department updated", body = Object, example = json!({
            "message": "Department updated successfully"
        })),
        (status = 400, description = "Name missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Name already in use")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    dto: web::Json<DepartmentDto>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let department_id = path.into_inner();
    let name = dto.name.trim();

    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Department name is required"
        })));
    }

    let result = sqlx::query("UPDATE departments SET name = ? WHERE id = ?")
        .bind(name)
        .bind(department_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            Ok(HttpResponse::NotFound().json(json!({ "message": "Department not found" })))
        }
        Ok(_) => Ok(HttpResponse::Ok().json(json!({ "message": "Department updated successfully" }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Department already exists"
                    })));
                }
            }
            tracing::error!(error = %e, department_id, "Failed to update department");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Toggle department status
========================= */
/// Swagger doc for set_department_status endpoint
#[utoipa::path(
    put,
    path = "/api/v1/admin/departments/{department_id}/status",
    params(
        ("department_id" = u64, Path, description = "ID of the department to enable/disable")
    ),
    request_body(content = DepartmentStatusDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "message": "Department status updated successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn set_department_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    dto: web::Json<DepartmentStatusDto>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let department_id = path.into_inner();

    let result = sqlx::query("UPDATE departments SET is_active = ? WHERE id = ?")
        .bind(dto.is_active)
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, department_id, "Failed to update department status");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Department not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department status updated successfully" })))
}

/* =========================
Delete department
========================= */
/// Swagger doc for delete_department endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/admin/departments/{department_id}",
    params(
        ("department_id" = u64, Path, description = "ID of the department to delete")
    ),
    responses(
        (status = 200, description = "Department deleted", body = Object, example = json!({
            "message": "Department deleted successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let department_id = path.into_inner();

    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, department_id, "Failed to delete department");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Department not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department deleted successfully" })))
}
