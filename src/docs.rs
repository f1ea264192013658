use crate::api::account::{AccountResponse, AccountUpdateDto};
use crate::api::admin_departments::{DepartmentDto, DepartmentOption, DepartmentStatusDto};
use crate::api::admin_users::{
    CreateUserDto, UpdateUserDto, UserListItem, UserStatusDto,
};
use crate::api::request::{
    CancelDto, RequestDetailsResponse, RequestFilter, RequestListResponse, UpdateStatusDto,
};
use crate::model::department::Department;
use crate::model::history::ApprovalHistoryEntry;
use crate::model::request::Request;
use crate::model::role::Role;
use crate::workflow::{PaymentStatus, RequestAction, RequestStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PRM System API",
        version = "1.0.0",
        description = r#"
## Purchase Request Management (PRM) System

This API powers a **Purchase Request Management (PRM)** system for routing invoice and material-purchase requests through a sequential approval chain.

### 🔹 Key Features
- **Request Submission**
  - Employees file requests with invoice financials and an optional PDF attachment
- **Approval Workflow**
  - Manager → purchase chain with approve, reject, hold, send-back and cancel
- **Audit Trail**
  - Append-only approval history on every request
- **Administration**
  - User and department management for admins

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Approval actions are gated to the role whose stage the request sits in; admin endpoints require the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for the request list

### 🚀 Usage
Use this API to build:
- Request submission portals
- Approval dashboards
- Finance/payment scheduling integrations

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::request::submit_request,
        crate::api::request::list_requests,
        crate::api::request::get_request,
        crate::api::request::update_status,
        crate::api::request::cancel_request,

        crate::api::account::me,
        crate::api::account::get_account,
        crate::api::account::update_account,

        crate::api::admin_departments::list_departments,
        crate::api::admin_departments::list_all_departments,
        crate::api::admin_departments::create_department,
        crate::api::admin_departments::update_department,
        crate::api::admin_departments::set_department_status,
        crate::api::admin_departments::delete_department,

        crate::api::admin_users::list_users,
        crate::api::admin_users::list_all_users,
        crate::api::admin_users::create_user,
        crate::api::admin_users::update_user,
        crate::api::admin_users::set_user_status,
        crate::api::admin_users::delete_user
    ),
    components(
        schemas(
            Request,
            ApprovalHistoryEntry,
            RequestFilter,
            RequestListResponse,
            RequestDetailsResponse,
            UpdateStatusDto,
            CancelDto,
            RequestAction,
            RequestStatus,
            PaymentStatus,
            AccountResponse,
            AccountUpdateDto,
            CreateUserDto,
            UpdateUserDto,
            UserStatusDto,
            UserListItem,
            Department,
            DepartmentDto,
            DepartmentStatusDto,
            DepartmentOption,
            Role
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Requests", description = "Request submission and approval workflow APIs"),
        (name = "Account", description = "Current-user profile APIs"),
        (name = "Admin", description = "User and department management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
