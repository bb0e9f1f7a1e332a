//! Customer address reads plus a write helper for seeding

use sqlx::SqlitePool;

use shared::models::CustomerAddress;

use super::RepoResult;

const COLUMNS: &str = "id, customer_id, label, street, city, postal_code, is_default, created_at";

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub customer_id: i64,
    pub label: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<CustomerAddress>> {
    let address = sqlx::query_as::<_, CustomerAddress>(&format!(
        "SELECT {COLUMNS} FROM customer_addresses WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(address)
}

/// Whether the address exists and belongs to the customer
pub async fn verify_ownership(
    pool: &SqlitePool,
    address_id: i64,
    customer_id: i64,
) -> RepoResult<bool> {
    let row: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM customer_addresses WHERE id = ? AND customer_id = ?",
    )
    .bind(address_id)
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub async fn create(pool: &SqlitePool, address: &NewAddress, now: i64) -> RepoResult<i64> {
    let result = sqlx::query(
        "INSERT INTO customer_addresses (customer_id, label, street, city, postal_code, \
         is_default, created_at) VALUES (?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(address.customer_id)
    .bind(&address.label)
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.postal_code)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}
