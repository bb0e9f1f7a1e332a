//! Driver profile access
//!
//! `last_seen_at` is the liveness signal: driver API calls refresh it and
//! the liveness sweep clears `is_available` when it goes stale.

use sqlx::SqlitePool;

use shared::models::Driver;

use super::RepoResult;

const COLUMNS: &str = "id, name, phone, is_available, last_seen_at, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Driver>> {
    let driver = sqlx::query_as::<_, Driver>(&format!(
        "SELECT {COLUMNS} FROM drivers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(driver)
}

/// Insert or refresh a driver profile (id = user id)
pub async fn upsert(pool: &SqlitePool, id: i64, name: &str, now: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO drivers (id, name, is_available, last_seen_at, created_at, updated_at) \
         VALUES (?, ?, 1, ?, ?, ?) \
         ON CONFLICT (id) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(name)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record driver activity: refresh `last_seen_at` and restore availability
pub async fn touch_last_seen(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<()> {
    sqlx::query(
        "UPDATE drivers SET last_seen_at = ?, is_available = 1, updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear `is_available` for drivers silent since before `cutoff`; returns
/// the number of drivers marked unavailable.
pub async fn mark_stale_unavailable(pool: &SqlitePool, cutoff: i64, now: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE drivers SET is_available = 0, updated_at = ? \
         WHERE is_available = 1 AND last_seen_at < ?",
    )
    .bind(now)
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
