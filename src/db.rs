use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveTime};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::config::Config;

const DEV_ADMIN_PASSWORD: &str = "Admin123!";

pub async fn init_db(config: &Config) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("Invalid DATABASE_URL {}", config.database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let filename = options.clone().get_filename();
    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    migrate(&pool).await?;
    seed(&pool, config).await?;

    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to apply migrations")
}

/// Populates an empty directory with default areas, job roles and an administrator.
pub async fn seed(pool: &SqlitePool, config: &Config) -> Result<()> {
    let existing: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM areas) + (SELECT COUNT(*) FROM job_roles) + (SELECT COUNT(*) FROM employees)",
    )
    .fetch_one(pool)
    .await?;

    if existing > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    let admin_area = Uuid::new_v4();
    for (id, name) in [
        (admin_area, "Administration"),
        (Uuid::new_v4(), "IT"),
        (Uuid::new_v4(), "Finance"),
    ] {
        sqlx::query("INSERT INTO areas (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    let admin_role = Uuid::new_v4();
    for (id, name) in [
        (admin_role, "Administrator"),
        (Uuid::new_v4(), "Developer"),
        (Uuid::new_v4(), "Manager"),
        (Uuid::new_v4(), "Analyst"),
    ] {
        sqlx::query("INSERT INTO job_roles (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    let password = match &config.admin_default_password {
        Some(p) => p.clone(),
        None => {
            warn!("ADMIN_DEFAULT_PASSWORD not set, seeding admin with the development password");
            DEV_ADMIN_PASSWORD.to_string()
        }
    };
    let password_hash = hash_password(&password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    let admin_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO employees
        (id, employee_code, name, email, phone, is_active, is_admin, password_hash, area_id, job_role_id)
        VALUES (?, 'admin', 'System Administrator', 'admin@example.com', '123-456-7890', 1, 1, ?, ?, ?)
        "#,
    )
    .bind(admin_id)
    .bind(password_hash)
    .bind(admin_area)
    .bind(admin_role)
    .execute(&mut *tx)
    .await?;

    let nine = NaiveTime::from_hms_opt(9, 0, 0).context("invalid time")?;
    let six_pm = NaiveTime::from_hms_opt(18, 0, 0).context("invalid time")?;
    // Monday to Wednesday
    for weekday in 1u8..=3 {
        sqlx::query(
            "INSERT INTO work_schedules (id, employee_id, weekday, start_time, end_time) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(admin_id)
        .bind(weekday)
        .bind(nine)
        .bind(six_pm)
        .execute(&mut *tx)
        .await?;
    }

    if config.seed_sample_attendance {
        let today = Local::now().date_naive();
        let check_out = NaiveTime::from_hms_opt(17, 30, 0).context("invalid time")?;
        for offset in 0..5 {
            sqlx::query(
                "INSERT INTO attendance_records (id, employee_id, date, check_in, check_out) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(admin_id)
            .bind(today - Duration::days(offset))
            .bind(nine)
            .bind(check_out)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    info!("Seeded default areas, job roles and administrator");
    Ok(())
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Fresh in-memory database with the schema applied.
    pub async fn memory_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    /// Inserts an employee and returns its id.
    pub async fn insert_employee(pool: &SqlitePool, code: &str, name: &str, active: bool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO employees (id, employee_code, name, is_active, is_admin) VALUES (?, ?, ?, ?, 0)",
        )
        .bind(id)
        .bind(code)
        .bind(name)
        .bind(active)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    pub async fn insert_record(
        pool: &SqlitePool,
        employee_id: Uuid,
        date: chrono::NaiveDate,
        check_in: Option<NaiveTime>,
        check_out: Option<NaiveTime>,
    ) {
        sqlx::query(
            "INSERT INTO attendance_records (id, employee_id, date, check_in, check_out) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(date)
        .bind(check_in)
        .bind(check_out)
        .execute(pool)
        .await
        .unwrap();
    }
}
