//! Menu item reads plus a write helper for seeding

use sqlx::SqlitePool;

use shared::models::MenuItem;

use super::RepoResult;

const COLUMNS: &str =
    "id, restaurant_id, name, description, price, is_available, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub is_available: bool,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

pub async fn create(pool: &SqlitePool, item: &NewMenuItem, now: i64) -> RepoResult<i64> {
    let result = sqlx::query(
        "INSERT INTO menu_items (restaurant_id, name, description, price, is_available, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.restaurant_id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.is_available)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn set_available(pool: &SqlitePool, id: i64, available: bool, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE menu_items SET is_available = ?, updated_at = ? WHERE id = ?")
        .bind(available)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
