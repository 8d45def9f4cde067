use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection};
use tokio::sync::Mutex;

use crate::model::Bookmarks;
use crate::store::{BookmarkStore, StoreError};

const SYSTEM_MIGRATIONS: &[(&str, &str)] = &[(
    "system/000_migrations_table.sql",
    include_str!("migrations/system/000_migrations_table.sql"),
)];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

/// Durable [`BookmarkStore`] on top of a local libsql database.
///
/// The connection is process-wide and shared across all request tasks;
/// `tx_lock` serializes every write so the compare-and-swap in
/// `swap_payload` is atomic and no other write can land inside its
/// transaction window.
pub struct Database {
    conn: Connection,
    tx_lock: Mutex<()>,
}

fn bookmarks_key(id: &str) -> String {
    format!("bookmarks:{id}")
}

fn backend<E: Into<anyhow::Error>>(e: E) -> StoreError {
    StoreError::Backend(e.into())
}

impl Database {
    pub async fn new(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            conn,
            tx_lock: Mutex::new(()),
        })
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    async fn put_internal(&self, b: &Bookmarks) -> Result<(), StoreError> {
        let value = serde_json::to_string(b).map_err(backend)?;
        let query = r#"
            INSERT INTO kv (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
        "#;
        self.conn
            .execute(query, libsql::params![bookmarks_key(&b.id), value])
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_internal(&self, id: &str) -> Result<Bookmarks, StoreError> {
        let query = "SELECT value FROM kv WHERE key = ?";
        let mut rows = self
            .conn
            .query(query, libsql::params![bookmarks_key(id)])
            .await
            .map_err(backend)?;

        let row = rows.next().await.map_err(backend)?.ok_or(StoreError::NotFound)?;
        let value: String = row.get(0).map_err(backend)?;

        // A value that fails to deserialize or is only partially
        // populated is indistinguishable from an absent record.
        let b: Bookmarks = serde_json::from_str(&value).map_err(|_| StoreError::NotFound)?;
        if !b.is_complete() {
            return Err(StoreError::NotFound);
        }
        Ok(b)
    }
}

impl BookmarkStore for Database {
    async fn put(&self, b: Bookmarks) -> Result<(), StoreError> {
        // Writes share one connection with swap_payload's explicit
        // transaction; an unguarded INSERT landing inside that window
        // would be discarded by the transaction's ROLLBACK.
        let _guard = self.tx_lock.lock().await;
        self.put_internal(&b).await
    }

    async fn get(&self, id: &str) -> Result<Bookmarks, StoreError> {
        self.get_internal(id).await
    }

    async fn swap_payload(
        &self,
        id: &str,
        expected: DateTime<Utc>,
        payload: String,
        now: DateTime<Utc>,
    ) -> Result<Bookmarks, StoreError> {
        let _guard = self.tx_lock.lock().await;

        self.conn
            .execute("BEGIN TRANSACTION", ())
            .await
            .map_err(backend)?;

        let result = async {
            let existing = self.get_internal(id).await?;
            if existing.last_updated != expected {
                return Err(StoreError::StaleVersion);
            }

            let updated = Bookmarks {
                id: existing.id,
                bookmarks: payload,
                last_updated: now,
                version: existing.version,
            };
            self.put_internal(&updated).await?;
            Ok(updated)
        }
        .await;

        match result {
            Ok(updated) => {
                self.conn.execute("COMMIT", ()).await.map_err(backend)?;
                Ok(updated)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }
}
