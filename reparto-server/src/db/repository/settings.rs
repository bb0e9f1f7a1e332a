//! Platform settings (key/value with code defaults)
//!
//! The pricing pipeline reads these per order so operators can adjust
//! rates without a restart. Missing or unparsable rows fall back to the
//! compiled defaults below.

use sqlx::SqlitePool;

use super::RepoResult;

pub const KEY_TAX_RATE: &str = "tax_rate";
pub const KEY_DELIVERY_FEE: &str = "delivery_fee";
pub const KEY_MINIMUM_ORDER_AMOUNT: &str = "minimum_order_amount";

pub const DEFAULT_TAX_RATE: f64 = 0.085;
pub const DEFAULT_DELIVERY_FEE: f64 = 5.00;
pub const DEFAULT_MINIMUM_ORDER_AMOUNT: f64 = 10.00;

pub async fn get(pool: &SqlitePool, key: &str) -> RepoResult<Option<String>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM platform_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value)
}

/// Numeric setting with a fallback default
pub async fn get_f64(pool: &SqlitePool, key: &str, default: f64) -> RepoResult<f64> {
    match get(pool, key).await? {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(key, raw, "Unparsable platform setting, using default");
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

pub async fn set(pool: &SqlitePool, key: &str, value: &str, now: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO platform_settings (key, value, updated_at) VALUES (?, ?, ?) \
         ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Write the default rows if absent so operators see explicit values
pub async fn seed_defaults(pool: &SqlitePool) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let defaults = [
        (KEY_TAX_RATE, DEFAULT_TAX_RATE),
        (KEY_DELIVERY_FEE, DEFAULT_DELIVERY_FEE),
        (KEY_MINIMUM_ORDER_AMOUNT, DEFAULT_MINIMUM_ORDER_AMOUNT),
    ];
    for (key, value) in defaults {
        sqlx::query(
            "INSERT INTO platform_settings (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(value.to_string())
        .bind(now)
        .execute(pool)
        .await?;
    }
    tracing::debug!("Platform settings seeded");
    Ok(())
}
