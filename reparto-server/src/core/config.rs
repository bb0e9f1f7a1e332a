//! Server configuration
//!
//! Everything comes from environment variables with code defaults, loaded
//! once at startup. `.env` is read best-effort by main before this runs.
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | ./reparto_data | 数据目录 (SQLite 数据库所在) |
//! | HTTP_PORT | 8080 | HTTP 监听端口 |
//! | ENVIRONMENT | development | development / staging / production |
//! | JWT_SECRET | (dev fallback) | 生产环境必须设置 |
//! | JWT_ISSUER | reparto-server | 令牌签发者 |
//! | JWT_AUDIENCE | reparto-clients | 令牌受众 |
//! | TOKEN_DURATION_HOURS | 72 | 令牌有效期 |
//! | STALE_PENDING_MINUTES | 30 | 未确认订单超时阈值 |
//! | STALE_SWEEP_SECS | 60 | 超时扫描间隔 |
//! | ARCHIVE_AFTER_DAYS | 90 | 终态订单归档阈值 |
//! | ARCHIVE_SWEEP_SECS | 86400 | 归档扫描间隔 |
//! | DRIVER_STALE_MINUTES | 30 | 司机活跃超时阈值 |
//! | DRIVER_SWEEP_SECS | 300 | 司机可用性扫描间隔 |

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory; the SQLite database lives under `{work_dir}/data/`
    pub work_dir: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT signing secret (HS256)
    pub jwt_secret: String,
    /// JWT issuer claim
    pub jwt_issuer: String,
    /// JWT audience claim
    pub jwt_audience: String,
    /// Token lifetime in hours
    pub token_duration_hours: i64,
    /// Pending orders older than this are cancelled by the sweep
    pub stale_pending_minutes: i64,
    /// Stale-pending sweep interval
    pub stale_sweep_secs: u64,
    /// Terminal orders older than this are archived
    pub archive_after_days: i64,
    /// Archive sweep interval
    pub archive_sweep_secs: u64,
    /// Drivers silent longer than this are marked unavailable
    pub driver_stale_minutes: i64,
    /// Driver availability sweep interval
    pub driver_sweep_secs: u64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./reparto_data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "reparto-server".into()),
            jwt_audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "reparto-clients".into()),
            token_duration_hours: std::env::var("TOKEN_DURATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(72),
            stale_pending_minutes: std::env::var("STALE_PENDING_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            stale_sweep_secs: std::env::var("STALE_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            archive_after_days: std::env::var("ARCHIVE_AFTER_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
            archive_sweep_secs: std::env::var("ARCHIVE_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86400),
            driver_stale_minutes: std::env::var("DRIVER_STALE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            driver_sweep_secs: std::env::var("DRIVER_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            environment,
        })
    }

    /// Directory holding the SQLite database files
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.work_dir).join("data")
    }

    /// Stale-pending threshold in epoch milliseconds
    pub fn stale_pending_ms(&self) -> i64 {
        self.stale_pending_minutes * 60 * 1000
    }

    /// Archive threshold in epoch milliseconds
    pub fn archive_after_ms(&self) -> i64 {
        self.archive_after_days * 24 * 60 * 60 * 1000
    }

    /// Driver liveness threshold in epoch milliseconds
    pub fn driver_stale_ms(&self) -> i64 {
        self.driver_stale_minutes * 60 * 1000
    }
}
