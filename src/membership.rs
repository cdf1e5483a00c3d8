//! Membership persistence.
//!
//! SQLite-backed store for premium subscriptions, one-shot trials, and
//! per-command cooldowns. The chat layer gates commands on this; the
//! engine itself only warms the schema and reports counts.
//!
//! Tables:
//! - `premium_users (user_id INTEGER PRIMARY KEY, expires_at TEXT)` —
//!   RFC 3339 expiry, active while `now < expires_at`.
//! - `cooldowns (user_id, command, last_used REAL)` — unix seconds of
//!   last use, keyed by (user_id, command).

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

/// Default database file path.
const DEFAULT_DB_FILE: &str = "locksmith.db";

/// Subscription, trial, and cooldown store.
pub struct MembershipStore {
    pool: SqlitePool,
}

impl MembershipStore {
    /// Open (creating if missing) the store at the given path, or the
    /// default path when `None`.
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_DB_FILE);
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to open membership DB at {path}"))?;

        let store = Self { pool };
        store.init().await?;
        info!(path, "Membership store opened");
        Ok(store)
    }

    /// Open an in-memory store (tests). A single connection keeps the
    /// whole pool on one memory database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open in-memory membership DB")?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create tables if they don't exist yet.
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS premium_users (
                user_id INTEGER PRIMARY KEY,
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create premium_users table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cooldowns (
                user_id INTEGER NOT NULL,
                command TEXT NOT NULL,
                last_used REAL NOT NULL,
                PRIMARY KEY (user_id, command)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create cooldowns table")?;

        Ok(())
    }

    // -- Subscriptions ---------------------------------------------------

    /// Grant (or extend) premium until the given instant.
    pub async fn grant_until(&self, user_id: i64, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO premium_users (user_id, expires_at) VALUES (?1, ?2)
             ON CONFLICT (user_id) DO UPDATE SET expires_at = excluded.expires_at",
        )
        .bind(user_id)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to grant premium")?;

        debug!(user_id, expires_at = %expires_at, "Premium granted");
        Ok(())
    }

    /// Start a free trial of `days` days. Returns false if the user has
    /// ever held a subscription or trial — one trial per user, and an
    /// active subscription isn't downgraded to a trial.
    pub async fn start_trial(&self, user_id: i64, days: i64) -> Result<bool> {
        let expires_at = Utc::now() + Duration::days(days);
        let result = sqlx::query(
            "INSERT INTO premium_users (user_id, expires_at) VALUES (?1, ?2)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to start trial")?;

        let started = result.rows_affected() > 0;
        if started {
            info!(user_id, days, "Trial started");
        }
        Ok(started)
    }

    /// The user's subscription expiry, if they have one on record.
    pub async fn expiry(&self, user_id: i64) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT expires_at FROM premium_users WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query premium expiry")?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("expires_at")?;
                let parsed = DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("Bad expires_at for user {user_id}: {raw}"))?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            None => Ok(None),
        }
    }

    /// Whether the user's subscription or trial is currently active.
    pub async fn is_active(&self, user_id: i64) -> Result<bool> {
        Ok(self
            .expiry(user_id)
            .await?
            .is_some_and(|expires| Utc::now() < expires))
    }

    /// Remove a user's subscription record entirely.
    pub async fn revoke(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM premium_users WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to revoke premium")?;
        Ok(())
    }

    /// Count of currently-active subscriptions.
    pub async fn active_count(&self) -> Result<u64> {
        let rows = sqlx::query("SELECT expires_at FROM premium_users")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list subscriptions")?;

        let now = Utc::now();
        let mut active = 0u64;
        for row in rows {
            let raw: String = row.try_get("expires_at")?;
            if let Ok(expires) = DateTime::parse_from_rfc3339(&raw) {
                if now < expires.with_timezone(&Utc) {
                    active += 1;
                }
            }
        }
        Ok(active)
    }

    // -- Cooldowns -------------------------------------------------------

    /// Record that the user just used a command.
    pub async fn mark_used(&self, user_id: i64, command: &str) -> Result<()> {
        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        sqlx::query(
            "INSERT INTO cooldowns (user_id, command, last_used) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, command) DO UPDATE SET last_used = excluded.last_used",
        )
        .bind(user_id)
        .bind(command)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to record command use")?;
        Ok(())
    }

    /// Time left before the user may use a command again, given the
    /// cooldown window. `None` means the command is available.
    pub async fn cooldown_remaining(
        &self,
        user_id: i64,
        command: &str,
        window: std::time::Duration,
    ) -> Result<Option<std::time::Duration>> {
        let row = sqlx::query(
            "SELECT last_used FROM cooldowns WHERE user_id = ?1 AND command = ?2",
        )
        .bind(user_id)
        .bind(command)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query cooldown")?;

        let Some(row) = row else { return Ok(None) };
        let last_used: f64 = row.try_get("last_used")?;

        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        let elapsed = now - last_used;
        if elapsed >= window.as_secs_f64() {
            Ok(None)
        } else {
            Ok(Some(std::time::Duration::from_secs_f64(
                window.as_secs_f64() - elapsed,
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
