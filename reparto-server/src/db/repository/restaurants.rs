//! Restaurant reads plus a write helper for seeding
//!
//! Restaurant CRUD has no HTTP surface here; the pipeline only consults
//! these records as the source of truth at order-creation time.

use sqlx::SqlitePool;

use shared::models::Restaurant;

use super::RepoResult;

const COLUMNS: &str =
    "id, owner_id, name, address, phone, is_active, approval_status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub owner_id: i64,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub approval_status: String,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Restaurant>> {
    let restaurant = sqlx::query_as::<_, Restaurant>(&format!(
        "SELECT {COLUMNS} FROM restaurants WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(restaurant)
}

/// Ids of all restaurants managed by a vendor
pub async fn list_ids_by_owner(pool: &SqlitePool, owner_id: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM restaurants WHERE owner_id = ? ORDER BY id",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn create(pool: &SqlitePool, restaurant: &NewRestaurant, now: i64) -> RepoResult<i64> {
    let result = sqlx::query(
        "INSERT INTO restaurants (owner_id, name, address, phone, is_active, approval_status, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(restaurant.owner_id)
    .bind(&restaurant.name)
    .bind(&restaurant.address)
    .bind(&restaurant.phone)
    .bind(restaurant.is_active)
    .bind(&restaurant.approval_status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}
