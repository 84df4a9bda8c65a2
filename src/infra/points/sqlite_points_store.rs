// SQLite implementation of the PointsStore trait

use crate::core::points::{Activity, PointsError, PointsStore, Transaction, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

pub struct SqlitePointsStore {
    pool: SqlitePool,
}

impl SqlitePointsStore {
    /// Open (or create) the database and run migrations.
    ///
    /// Accepts either a bare file path or a `sqlite://` URL.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                discord_id TEXT PRIMARY KEY NOT NULL CHECK (length(discord_id) > 0),
                points INTEGER NOT NULL DEFAULT 0 CHECK (typeof(points) = 'integer'),
                level INTEGER NOT NULL DEFAULT 1,
                recorded_msgs INTEGER NOT NULL DEFAULT 0,
                last_msg TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_points ON users(points DESC)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                delta_points INTEGER NOT NULL,
                reason TEXT NOT NULL CHECK (length(reason) > 0),
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_user
            ON transactions(user_id, id DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL CHECK (length(kind) > 0),
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn storage_err(e: sqlx::Error) -> PointsError {
    PointsError::StorageError(e.to_string())
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        discord_id: row.get("discord_id"),
        points: row.get("points"),
        level: row.get("level"),
        recorded_msgs: row.get("recorded_msgs"),
        last_msg: row.get("last_msg"),
    }
}

#[async_trait]
impl PointsStore for SqlitePointsStore {
    async fn record_message(
        &self,
        discord_id: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, PointsError> {
        // One statement, so the create-or-increment is atomic.
        let row = sqlx::query(
            r#"
            INSERT INTO users (discord_id, points, level, recorded_msgs, last_msg)
            VALUES (?, 1, 1, 1, ?)
            ON CONFLICT(discord_id) DO UPDATE SET
                points = points + 1,
                recorded_msgs = recorded_msgs + 1,
                last_msg = excluded.last_msg
            RETURNING points
            "#,
        )
        .bind(discord_id)
        .bind(at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.get::<i64, _>("points"))
    }

    async fn add_points(&self, discord_id: &str, delta: i64) -> Result<i64, PointsError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (discord_id, points, level, recorded_msgs)
            VALUES (?, ?, 1, 0)
            ON CONFLICT(discord_id) DO UPDATE SET
                points = points + excluded.points
            RETURNING points
            "#,
        )
        .bind(discord_id)
        .bind(delta)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.get::<i64, _>("points"))
    }

    async fn get_user(&self, discord_id: &str) -> Result<Option<User>, PointsError> {
        let row = sqlx::query(
            r#"
            SELECT discord_id, points, level, recorded_msgs, last_msg
            FROM users
            WHERE discord_id = ?
            "#,
        )
        .bind(discord_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<User>, PointsError> {
        let rows = sqlx::query(
            r#"
            SELECT discord_id, points, level, recorded_msgs, last_msg
            FROM users
            ORDER BY points DESC, discord_id ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn log_transaction(&self, transaction: Transaction) -> Result<(), PointsError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (user_id, delta_points, reason, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(transaction.user_id)
        .bind(transaction.delta_points)
        .bind(transaction.reason)
        .bind(transaction.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn recent_transactions(
        &self,
        discord_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, PointsError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, delta_points, reason, timestamp
            FROM transactions
            WHERE user_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(discord_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let transactions = rows
            .iter()
            .filter_map(|row| {
                let timestamp_str: String = row.get("timestamp");
                let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                    .ok()?
                    .with_timezone(&Utc);

                Some(Transaction {
                    user_id: row.get("user_id"),
                    delta_points: row.get("delta_points"),
                    reason: row.get("reason"),
                    timestamp,
                })
            })
            .collect();

        Ok(transactions)
    }

    async fn record_activity(&self, activity: Activity) -> Result<(), PointsError> {
        sqlx::query("INSERT INTO activities (kind, content, timestamp) VALUES (?, ?, ?)")
            .bind(activity.kind)
            .bind(activity.content)
            .bind(activity.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}
