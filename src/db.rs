use anyhow::Result;
use sqlx::MySqlPool;

use crate::auth::password::hash_password;
use crate::model::role::Role;

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Table DDL executed on every boot. No migration tooling: the schema is
/// additive-only and `IF NOT EXISTS` keeps restarts idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        role_id TINYINT UNSIGNED NOT NULL,
        designation VARCHAR(255) NULL,
        department VARCHAR(255) NULL,
        rm_id BIGINT UNSIGNED NULL,
        rm_name VARCHAR(255) NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        last_login_at TIMESTAMP NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS departments (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS requests (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        vendor_name VARCHAR(255) NOT NULL,
        invoice_scope VARCHAR(255) NULL,
        invoice_reference VARCHAR(255) NULL,
        invoice_number VARCHAR(255) NOT NULL,
        comments TEXT NULL,
        base_value DOUBLE NULL,
        gst DOUBLE NULL,
        freight_insurance DOUBLE NULL,
        ipc_amount DOUBLE NULL,
        tds DOUBLE NULL,
        penalty DOUBLE NULL,
        payment_on_hold DOUBLE NULL,
        mobilization_advance_recovery DOUBLE NULL,
        amount_paid DOUBLE NULL,
        retention_amount DOUBLE NULL,
        pdf_path VARCHAR(255) NULL,
        status TINYINT UNSIGNED NOT NULL DEFAULT 1,
        payment_status VARCHAR(50) NOT NULL DEFAULT 'PENDING',
        created_by BIGINT UNSIGNED NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
        FOREIGN KEY (created_by) REFERENCES users(id)
    )
    "#,
    // Append-only: no updated_at column, rows are never touched again.
    r#"
    CREATE TABLE IF NOT EXISTS approval_history (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        request_id BIGINT UNSIGNED NOT NULL,
        user_id BIGINT UNSIGNED NOT NULL,
        role VARCHAR(50) NOT NULL,
        action VARCHAR(50) NOT NULL,
        remark TEXT NULL,
        user_name VARCHAR(255) NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (request_id) REFERENCES requests(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        jti VARCHAR(64) NOT NULL,
        expires_at TIMESTAMP NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT FALSE,
        INDEX idx_refresh_jti (jti)
    )
    "#,
];

pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// First-run convenience: one account per role so the pipeline is usable
/// out of the box. Skipped as soon as any user exists.
pub async fn seed_default_users(pool: &MySqlPool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let hash = hash_password("password");
    let seed = [
        ("Default Admin", "admin@example.com", Role::Admin),
        ("Default Manager", "manager@example.com", Role::Manager),
        ("Default Purchase", "purchase@example.com", Role::Purchase),
        ("Default Employee", "emp@example.com", Role::Employee),
    ];

    for (name, email, role) in seed {
        sqlx::query(
            r#"INSERT INTO users (name, email, password, role_id) VALUES (?, ?, ?, ?)"#,
        )
        .bind(name)
        .bind(email)
        .bind(&hash)
        .bind(role.id())
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded default users (password = 'password')");
    Ok(())
}
