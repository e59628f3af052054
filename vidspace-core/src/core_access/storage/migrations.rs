//! Database migrations for the access store
//!
//! Each migration is applied atomically and tracked in the schema_version table.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

use super::super::types::Timestamp;
use super::StoreResult;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Tenant, channel, space and video relations",
            up_sql: r#"
                CREATE TABLE IF NOT EXISTS tenant_members (
                    tenant_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    role TEXT NOT NULL CHECK(role IN ('member', 'super_admin')),
                    joined_at INTEGER NOT NULL,
                    PRIMARY KEY (tenant_id, user_id)
                );

                CREATE INDEX IF NOT EXISTS idx_tenant_members_user ON tenant_members(user_id);

                CREATE TABLE IF NOT EXISTS channels (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    UNIQUE (id, tenant_id)
                );

                CREATE INDEX IF NOT EXISTS idx_channels_tenant ON channels(tenant_id);

                -- Owner is never implicit: it is always a row here
                CREATE TABLE IF NOT EXISTS channel_members (
                    channel_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    role TEXT NOT NULL CHECK(role IN ('owner', 'uploader', 'viewer')),
                    joined_at INTEGER NOT NULL,
                    PRIMARY KEY (channel_id, user_id),
                    FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_channel_members_user ON channel_members(user_id);

                -- Space owner is positional (owner_id) and has no membership row
                CREATE TABLE IF NOT EXISTS spaces (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    created_at INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_spaces_owner ON spaces(owner_id);

                CREATE TABLE IF NOT EXISTS space_members (
                    space_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    access_level TEXT NOT NULL CHECK(access_level IN ('view', 'edit', 'admin')),
                    joined_at INTEGER NOT NULL,
                    granted_by TEXT NOT NULL,
                    PRIMARY KEY (space_id, user_id),
                    FOREIGN KEY (space_id) REFERENCES spaces(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_space_members_user ON space_members(user_id);

                CREATE TABLE IF NOT EXISTS videos (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    uploaded_by TEXT NOT NULL,
                    channel_id TEXT,
                    title TEXT NOT NULL,
                    description TEXT,
                    deleted INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    FOREIGN KEY (channel_id, tenant_id) REFERENCES channels(id, tenant_id)
                );

                CREATE INDEX IF NOT EXISTS idx_videos_tenant ON videos(tenant_id, deleted, created_at);
                CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel_id);
            "#,
        },
        Migration {
            version: 2,
            description: "Videos shared into spaces",
            up_sql: r#"
                CREATE TABLE IF NOT EXISTS space_videos (
                    space_id TEXT NOT NULL,
                    video_id TEXT NOT NULL,
                    added_by TEXT NOT NULL,
                    added_at INTEGER NOT NULL,
                    PRIMARY KEY (space_id, video_id),
                    FOREIGN KEY (space_id) REFERENCES spaces(id) ON DELETE CASCADE,
                    FOREIGN KEY (video_id) REFERENCES videos(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_space_videos_video ON space_videos(video_id);
            "#,
        },
    ]
}

/// Get current schema version from database
pub fn get_current_version(pool: &Pool<SqliteConnectionManager>) -> StoreResult<i32> {
    let conn = pool.get()?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> StoreResult<()> {
    let current_version = get_current_version(pool)?;
    let pending: Vec<_> =
        get_migrations().into_iter().filter(|m| m.version > current_version).collect();

    if pending.is_empty() {
        return Ok(());
    }

    let conn = pool.get()?;

    for migration in pending {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.up_sql)?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, Timestamp::now().as_millis() as i64],
        )?;

        tx.commit()?;

        info!(version = migration.version, "Applied migration: {}", migration.description);
    }

    Ok(())
}

/// Get the latest migration version available
pub fn get_latest_version() -> i32 {
    get_migrations().iter().map(|m| m.version).max().unwrap_or(0)
}
