//! SQLite implementation of the access store traits

use super::super::channel::Channel;
use super::super::roles::{AccessLevel, ChannelRole, SpaceAccess, TenantRole};
use super::super::space::{Space, SpaceMembership, SpaceWithAccess};
use super::super::types::{ChannelId, SpaceId, TenantId, Timestamp, UserId, VideoId};
use super::super::video::Video;
use super::{
    migrations, ChannelStore, SpaceStore, StoreResult, TenantStore, VideoChanges, VideoStore,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const VIDEO_COLUMNS: &str = "v.id, v.tenant_id, v.uploaded_by, v.channel_id, v.title, \
                             v.description, v.deleted, v.created_at, v.updated_at";

/// Default number of pooled connections for on-disk databases
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// SQL-based storage for tenants, channels, spaces and videos.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct AccessSqlStore {
    pool: Pool<SqliteConnectionManager>,
}

impl fmt::Debug for AccessSqlStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("AccessSqlStore")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_secs(5))
}

impl AccessSqlStore {
    /// Wrap an existing pool and bring its schema up to date
    pub fn new(pool: Pool<SqliteConnectionManager>) -> StoreResult<Self> {
        migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open (or create) an on-disk database
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_pool_size(path, DEFAULT_POOL_SIZE)
    }

    pub fn open_with_pool_size(path: impl AsRef<Path>, pool_size: u32) -> StoreResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Self::new(pool)
    }

    /// Create a new in-memory store.
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection.
    pub fn memory() -> StoreResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::new(pool)
    }

    /// Schema version currently applied to the database
    pub fn schema_version(&self) -> StoreResult<i32> {
        migrations::get_current_version(&self.pool)
    }
}

fn millis(ts: Timestamp) -> i64 {
    ts.as_millis() as i64
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    Ok(Timestamp::from_millis(row.get::<_, i64>(idx)?.max(0) as u64))
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: VideoId::from(row.get::<_, String>(0)?),
        tenant_id: TenantId::from(row.get::<_, String>(1)?),
        uploaded_by: UserId::from(row.get::<_, String>(2)?),
        channel_id: row.get::<_, Option<String>>(3)?.map(ChannelId::from),
        title: row.get(4)?,
        description: row.get(5)?,
        deleted: row.get(6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
    })
}

fn space_from_row(row: &Row<'_>) -> rusqlite::Result<Space> {
    Ok(Space {
        id: SpaceId::from(row.get::<_, String>(0)?),
        owner_id: UserId::from(row.get::<_, String>(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: timestamp(row, 4)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<SpaceMembership> {
    Ok(SpaceMembership {
        space_id: SpaceId::from(row.get::<_, String>(0)?),
        user_id: UserId::from(row.get::<_, String>(1)?),
        level: parse_column(row, 2)?,
        joined_at: timestamp(row, 3)?,
        granted_by: UserId::from(row.get::<_, String>(4)?),
    })
}

/// Conditional channel update shared by moves and removals. A target channel
/// must exist in the video's tenant.
fn move_video(
    conn: &Connection,
    video_id: &VideoId,
    tenant_id: &TenantId,
    channel_id: Option<&ChannelId>,
    now: i64,
) -> StoreResult<bool> {
    let changed = conn.execute(
        "UPDATE videos SET channel_id = ?1, updated_at = ?2
         WHERE id = ?3 AND tenant_id = ?4 AND deleted = 0
           AND (?1 IS NULL OR EXISTS (SELECT 1 FROM channels c
                                      WHERE c.id = ?1 AND c.tenant_id = ?4))",
        params![channel_id.map(ChannelId::as_str), now, video_id.as_str(), tenant_id.as_str()],
    )?;

    Ok(changed > 0)
}

impl TenantStore for AccessSqlStore {
    fn tenant_role(&self, tenant_id: &TenantId, user_id: &UserId) -> StoreResult<Option<TenantRole>> {
        let conn = self.pool.get()?;

        let role = conn
            .query_row(
                "SELECT role FROM tenant_members WHERE tenant_id = ? AND user_id = ?",
                params![tenant_id.as_str(), user_id.as_str()],
                |row| parse_column(row, 0),
            )
            .optional()?;

        Ok(role)
    }

    fn add_tenant_member(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        role: TenantRole,
    ) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO tenant_members (tenant_id, user_id, role, joined_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(tenant_id, user_id) DO UPDATE SET role = excluded.role",
            params![tenant_id.as_str(), user_id.as_str(), role.as_str(), millis(Timestamp::now())],
        )?;

        Ok(())
    }
}

impl ChannelStore for AccessSqlStore {
    fn create_channel(&self, channel: &Channel) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO channels (id, tenant_id, name, created_at) VALUES (?, ?, ?, ?)",
            params![
                channel.id.as_str(),
                channel.tenant_id.as_str(),
                &channel.name,
                millis(channel.created_at),
            ],
        )?;

        Ok(())
    }

    fn get_channel(&self, channel_id: &ChannelId, tenant_id: &TenantId) -> StoreResult<Option<Channel>> {
        let conn = self.pool.get()?;

        let channel = conn
            .query_row(
                "SELECT id, tenant_id, name, created_at FROM channels WHERE id = ? AND tenant_id = ?",
                params![channel_id.as_str(), tenant_id.as_str()],
                |row| {
                    Ok(Channel {
                        id: ChannelId::from(row.get::<_, String>(0)?),
                        tenant_id: TenantId::from(row.get::<_, String>(1)?),
                        name: row.get(2)?,
                        created_at: timestamp(row, 3)?,
                    })
                },
            )
            .optional()?;

        Ok(channel)
    }

    fn channel_role(
        &self,
        channel_id: &ChannelId,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> StoreResult<Option<ChannelRole>> {
        let conn = self.pool.get()?;

        let role = conn
            .query_row(
                "SELECT cm.role FROM channel_members cm
                 JOIN channels c ON c.id = cm.channel_id
                 WHERE cm.channel_id = ? AND c.tenant_id = ? AND cm.user_id = ?",
                params![channel_id.as_str(), tenant_id.as_str(), user_id.as_str()],
                |row| parse_column(row, 0),
            )
            .optional()?;

        Ok(role)
    }

    fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        role: ChannelRole,
    ) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO channel_members (channel_id, user_id, role, joined_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(channel_id, user_id) DO UPDATE SET role = excluded.role",
            params![channel_id.as_str(), user_id.as_str(), role.as_str(), millis(Timestamp::now())],
        )?;

        Ok(())
    }
}

impl SpaceStore for AccessSqlStore {
    fn create_space(&self, space: &Space) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO spaces (id, owner_id, name, description, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                space.id.as_str(),
                space.owner_id.as_str(),
                &space.name,
                &space.description,
                millis(space.created_at),
            ],
        )?;

        Ok(())
    }

    fn get_space(&self, space_id: &SpaceId) -> StoreResult<Option<Space>> {
        let conn = self.pool.get()?;

        let space = conn
            .query_row(
                "SELECT id, owner_id, name, description, created_at FROM spaces WHERE id = ?",
                params![space_id.as_str()],
                space_from_row,
            )
            .optional()?;

        Ok(space)
    }

    fn upsert_space_member(&self, membership: &SpaceMembership) -> StoreResult<SpaceMembership> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        // joined_at is deliberately left alone on conflict
        tx.execute(
            "INSERT INTO space_members (space_id, user_id, access_level, joined_at, granted_by)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(space_id, user_id) DO UPDATE SET
                access_level = excluded.access_level,
                granted_by = excluded.granted_by",
            params![
                membership.space_id.as_str(),
                membership.user_id.as_str(),
                membership.level.as_str(),
                millis(membership.joined_at),
                membership.granted_by.as_str(),
            ],
        )?;

        let stored = tx.query_row(
            "SELECT space_id, user_id, access_level, joined_at, granted_by
             FROM space_members WHERE space_id = ? AND user_id = ?",
            params![membership.space_id.as_str(), membership.user_id.as_str()],
            membership_from_row,
        )?;

        tx.commit()?;

        Ok(stored)
    }

    fn space_member_level(&self, space_id: &SpaceId, user_id: &UserId) -> StoreResult<Option<AccessLevel>> {
        let conn = self.pool.get()?;

        let level = conn
            .query_row(
                "SELECT access_level FROM space_members WHERE space_id = ? AND user_id = ?",
                params![space_id.as_str(), user_id.as_str()],
                |row| parse_column(row, 0),
            )
            .optional()?;

        Ok(level)
    }

    fn list_space_members(&self, space_id: &SpaceId) -> StoreResult<Vec<SpaceMembership>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT space_id, user_id, access_level, joined_at, granted_by
             FROM space_members WHERE space_id = ?
             ORDER BY joined_at, user_id",
        )?;

        let members = stmt
            .query_map(params![space_id.as_str()], membership_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(members)
    }

    fn list_spaces_for_user(&self, user_id: &UserId) -> StoreResult<Vec<SpaceWithAccess>> {
        let conn = self.pool.get()?;

        // At most one membership row per (space, user), so the join never duplicates
        let mut stmt = conn.prepare(
            "SELECT s.id, s.owner_id, s.name, s.description, s.created_at, m.access_level
             FROM spaces s
             LEFT JOIN space_members m ON m.space_id = s.id AND m.user_id = ?1
             WHERE s.owner_id = ?1 OR m.user_id IS NOT NULL
             ORDER BY s.created_at DESC, s.id",
        )?;

        let spaces = stmt
            .query_map(params![user_id.as_str()], |row| {
                let space = space_from_row(row)?;
                let access = if &space.owner_id == user_id {
                    SpaceAccess::Owner
                } else {
                    SpaceAccess::Member(parse_column(row, 5)?)
                };
                Ok(SpaceWithAccess { space, access })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(spaces)
    }

    fn add_space_video(&self, space_id: &SpaceId, video_id: &VideoId, added_by: &UserId) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO space_videos (space_id, video_id, added_by, added_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(space_id, video_id) DO NOTHING",
            params![space_id.as_str(), video_id.as_str(), added_by.as_str(), millis(Timestamp::now())],
        )?;

        Ok(())
    }

    fn list_space_videos(&self, space_id: &SpaceId, tenant_id: &TenantId) -> StoreResult<Vec<Video>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {VIDEO_COLUMNS} FROM space_videos sv
             JOIN videos v ON v.id = sv.video_id
             WHERE sv.space_id = ? AND v.tenant_id = ? AND v.deleted = 0
             ORDER BY sv.added_at DESC, v.id"
        ))?;

        let videos = stmt
            .query_map(params![space_id.as_str(), tenant_id.as_str()], video_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(videos)
    }
}

impl VideoStore for AccessSqlStore {
    fn insert_video(&self, video: &Video) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO videos (id, tenant_id, uploaded_by, channel_id, title, description,
                                 deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                video.id.as_str(),
                video.tenant_id.as_str(),
                video.uploaded_by.as_str(),
                video.channel_id.as_ref().map(ChannelId::as_str),
                &video.title,
                &video.description,
                video.deleted,
                millis(video.created_at),
                millis(video.updated_at),
            ],
        )?;

        Ok(())
    }

    fn get_video(&self, video_id: &VideoId, tenant_id: &TenantId) -> StoreResult<Option<Video>> {
        let conn = self.pool.get()?;

        let video = conn
            .query_row(
                &format!("SELECT {VIDEO_COLUMNS} FROM videos v WHERE v.id = ? AND v.tenant_id = ?"),
                params![video_id.as_str(), tenant_id.as_str()],
                video_from_row,
            )
            .optional()?;

        Ok(video)
    }

    fn list_readable_videos(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Video>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos v
             WHERE v.tenant_id = ?1 AND v.deleted = 0
               AND (v.channel_id IS NULL
                    OR v.uploaded_by = ?2
                    OR EXISTS (SELECT 1 FROM channel_members cm
                               WHERE cm.channel_id = v.channel_id AND cm.user_id = ?2))
             ORDER BY v.created_at DESC, v.id
             LIMIT ?3 OFFSET ?4"
        ))?;

        let videos = stmt
            .query_map(
                params![tenant_id.as_str(), user_id.as_str(), limit as i64, offset as i64],
                video_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(videos)
    }

    fn update_video(&self, video_id: &VideoId, tenant_id: &TenantId, changes: VideoChanges<'_>) -> StoreResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let now = millis(Timestamp::now());

        // Returning early drops `tx`, which rolls back whatever ran before
        if let Some((title, description)) = changes.metadata {
            let changed = tx.execute(
                "UPDATE videos SET title = ?, description = ?, updated_at = ?
                 WHERE id = ? AND tenant_id = ? AND deleted = 0",
                params![title, description, now, video_id.as_str(), tenant_id.as_str()],
            )?;
            if changed == 0 {
                return Ok(false);
            }
        }

        if let Some(channel_id) = changes.move_to {
            if !move_video(&tx, video_id, tenant_id, Some(channel_id), now)? {
                return Ok(false);
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn set_video_channel(
        &self,
        video_id: &VideoId,
        tenant_id: &TenantId,
        channel_id: Option<&ChannelId>,
    ) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        move_video(&conn, video_id, tenant_id, channel_id, millis(Timestamp::now()))
    }

    fn soft_delete_video(&self, video_id: &VideoId, tenant_id: &TenantId) -> StoreResult<bool> {
        let conn = self.pool.get()?;

        let changed = conn.execute(
            "UPDATE videos SET deleted = 1, updated_at = ?
             WHERE id = ? AND tenant_id = ? AND deleted = 0",
            params![millis(Timestamp::now()), video_id.as_str(), tenant_id.as_str()],
        )?;

        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tenant() -> TenantId {
        TenantId::from("acme")
    }

    fn channel_in(store: &AccessSqlStore, tenant: &TenantId, name: &str) -> Channel {
        let channel = Channel::new(tenant.clone(), name.to_string());
        store.create_channel(&channel).unwrap();
        channel
    }

    fn video_at(uploader: &str, channel: Option<&Channel>, created_at: u64) -> Video {
        let mut video = Video::new(
            tenant(),
            UserId::from(uploader),
            channel.map(|c| c.id.clone()),
            format!("video by {uploader}"),
            None,
        );
        video.created_at = Timestamp::from_millis(created_at);
        video.updated_at = video.created_at;
        video
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access.db");

        {
            let store = AccessSqlStore::open(&path).unwrap();
            store.add_tenant_member(&tenant(), &UserId::from("alice"), TenantRole::Member).unwrap();
            assert_eq!(store.schema_version().unwrap(), migrations::CURRENT_SCHEMA_VERSION);
        }

        let reopened = AccessSqlStore::open(&path).unwrap();
        assert_eq!(
            reopened.tenant_role(&tenant(), &UserId::from("alice")).unwrap(),
            Some(TenantRole::Member)
        );
    }

    #[test]
    fn test_video_channel_must_share_tenant() {
        let store = AccessSqlStore::memory().unwrap();
        let foreign = channel_in(&store, &TenantId::from("globex"), "theirs");

        let video = video_at("alice", Some(&foreign), 1);
        assert!(store.insert_video(&video).is_err());
    }

    #[test]
    fn test_set_video_channel_rejects_foreign_channel() {
        let store = AccessSqlStore::memory().unwrap();
        let home = channel_in(&store, &tenant(), "home");
        let foreign = channel_in(&store, &TenantId::from("globex"), "theirs");

        let video = video_at("alice", None, 1);
        store.insert_video(&video).unwrap();

        assert!(!store.set_video_channel(&video.id, &tenant(), Some(&foreign.id)).unwrap());
        assert!(store.set_video_channel(&video.id, &tenant(), Some(&home.id)).unwrap());

        let stored = store.get_video(&video.id, &tenant()).unwrap().unwrap();
        assert_eq!(stored.channel_id, Some(home.id));

        assert!(store.set_video_channel(&video.id, &tenant(), None).unwrap());
        let stored = store.get_video(&video.id, &tenant()).unwrap().unwrap();
        assert!(stored.is_tenant_level());
    }

    #[test]
    fn test_update_video_rolls_back_on_failed_move() {
        let store = AccessSqlStore::memory().unwrap();
        let home = channel_in(&store, &tenant(), "home");
        let foreign = channel_in(&store, &TenantId::from("globex"), "theirs");
        let video = video_at("alice", None, 1);
        store.insert_video(&video).unwrap();

        let changes = VideoChanges {
            metadata: Some(("Renamed", Some("moved along"))),
            move_to: Some(&foreign.id),
        };
        assert!(!store.update_video(&video.id, &tenant(), changes).unwrap());

        let stored = store.get_video(&video.id, &tenant()).unwrap().unwrap();
        assert_eq!(stored.title, video.title);
        assert_eq!(stored.description, None);
        assert!(stored.is_tenant_level());
        assert_eq!(stored.updated_at, video.updated_at);

        let changes = VideoChanges { move_to: Some(&home.id), ..changes };
        assert!(store.update_video(&video.id, &tenant(), changes).unwrap());

        let stored = store.get_video(&video.id, &tenant()).unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.description.as_deref(), Some("moved along"));
        assert_eq!(stored.channel_id, Some(home.id));
    }

    #[test]
    fn test_soft_delete_is_terminal() {
        let store = AccessSqlStore::memory().unwrap();
        let home = channel_in(&store, &tenant(), "home");
        let video = video_at("alice", None, 1);
        store.insert_video(&video).unwrap();

        assert!(store.soft_delete_video(&video.id, &tenant()).unwrap());
        assert!(!store.soft_delete_video(&video.id, &tenant()).unwrap());
        let rename = VideoChanges { metadata: Some(("new", None)), move_to: None };
        assert!(!store.update_video(&video.id, &tenant(), rename).unwrap());
        assert!(!store.set_video_channel(&video.id, &tenant(), Some(&home.id)).unwrap());

        let stored = store.get_video(&video.id, &tenant()).unwrap().unwrap();
        assert!(stored.deleted);
        assert!(stored.is_tenant_level());
    }

    #[test]
    fn test_get_video_is_tenant_scoped() {
        let store = AccessSqlStore::memory().unwrap();
        let video = video_at("alice", None, 1);
        store.insert_video(&video).unwrap();

        assert!(store.get_video(&video.id, &TenantId::from("globex")).unwrap().is_none());
    }

    #[test]
    fn test_list_readable_videos() {
        let store = AccessSqlStore::memory().unwrap();
        let mine = channel_in(&store, &tenant(), "mine");
        let other = channel_in(&store, &tenant(), "other");
        let bob = UserId::from("bob");
        store.add_channel_member(&mine.id, &bob, ChannelRole::Viewer).unwrap();

        let tenant_level = video_at("alice", None, 1);
        let in_mine = video_at("alice", Some(&mine), 2);
        let in_other = video_at("alice", Some(&other), 3);
        let uploaded_by_bob = video_at("bob", Some(&other), 4);
        let deleted = video_at("alice", None, 5);
        for video in [&tenant_level, &in_mine, &in_other, &uploaded_by_bob, &deleted] {
            store.insert_video(video).unwrap();
        }
        store.soft_delete_video(&deleted.id, &tenant()).unwrap();

        let ids: Vec<_> = store
            .list_readable_videos(&tenant(), &bob, 10, 0)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![uploaded_by_bob.id.clone(), in_mine.id.clone(), tenant_level.id.clone()]);

        let page: Vec<_> = store
            .list_readable_videos(&tenant(), &bob, 2, 2)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(page, vec![tenant_level.id]);
    }

    #[test]
    fn test_list_spaces_newest_first() {
        let store = AccessSqlStore::memory().unwrap();
        let bob = UserId::from("bob");

        let mut older = Space::new(bob.clone(), "older".to_string(), None);
        older.created_at = Timestamp::from_millis(10);
        let mut newer = Space::new(UserId::from("olivia"), "newer".to_string(), None);
        newer.created_at = Timestamp::from_millis(20);
        store.create_space(&older).unwrap();
        store.create_space(&newer).unwrap();

        store
            .upsert_space_member(&SpaceMembership {
                space_id: newer.id.clone(),
                user_id: bob.clone(),
                level: AccessLevel::Admin,
                joined_at: Timestamp::now(),
                granted_by: UserId::from("olivia"),
            })
            .unwrap();

        let spaces = store.list_spaces_for_user(&bob).unwrap();
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].space.id, newer.id);
        assert_eq!(spaces[0].access, SpaceAccess::Member(AccessLevel::Admin));
        assert_eq!(spaces[1].space.id, older.id);
        assert_eq!(spaces[1].access, SpaceAccess::Owner);
    }

    #[test]
    fn test_space_videos_skip_deleted_and_foreign_tenants() {
        let store = AccessSqlStore::memory().unwrap();
        let owner = UserId::from("olivia");
        let space = Space::new(owner.clone(), "reels".to_string(), None);
        store.create_space(&space).unwrap();

        let live = video_at("alice", None, 1);
        let gone = video_at("alice", None, 2);
        store.insert_video(&live).unwrap();
        store.insert_video(&gone).unwrap();
        store.add_space_video(&space.id, &live.id, &owner).unwrap();
        store.add_space_video(&space.id, &live.id, &owner).unwrap();
        store.add_space_video(&space.id, &gone.id, &owner).unwrap();
        store.soft_delete_video(&gone.id, &tenant()).unwrap();

        let videos = store.list_space_videos(&space.id, &tenant()).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, live.id);

        assert!(store.list_space_videos(&space.id, &TenantId::from("globex")).unwrap().is_empty());
    }
}
