pub mod account;
pub mod admin_departments;
pub mod admin_users;
pub mod request;
