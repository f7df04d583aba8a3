//! Database pool plumbing.
//!
//! One shared `PgPool`; every multi-statement lifecycle operation checks out
//! a connection through `pool.begin()` and holds it for the duration of the
//! transaction. Dropping an uncommitted transaction rolls it back.

use crate::error::{AppError, AppResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::OnceLock;
use std::time::Duration;

static POOL: OnceLock<PgPool> = OnceLock::new();

/// Connect and store the global pool. Called once from the bootstrap (or a
/// CLI command) before any handler runs.
pub async fn init_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await?;
    let _ = POOL.set(pool.clone());
    Ok(pool)
}

pub fn get_pool() -> AppResult<&'static PgPool> {
    POOL.get()
        .ok_or_else(|| AppError::database("Chưa khởi tạo kết nối cơ sở dữ liệu"))
}
