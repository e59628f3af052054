//! Storage layer for the access engine
//!
//! The engine only talks to the narrow store traits below. `AccessSqlStore`
//! implements all of them on top of SQLite; tests may substitute their own.

pub mod migrations;
pub mod sql_store;

pub use migrations::{migrate, CURRENT_SCHEMA_VERSION};
pub use sql_store::AccessSqlStore;

use super::channel::Channel;
use super::roles::{AccessLevel, ChannelRole, TenantRole};
use super::space::{Space, SpaceMembership, SpaceWithAccess};
use super::types::{ChannelId, SpaceId, TenantId, UserId, VideoId};
use super::video::Video;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Writes applied together by [`VideoStore::update_video`]
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoChanges<'a> {
    /// New title and description
    pub metadata: Option<(&'a str, Option<&'a str>)>,
    pub move_to: Option<&'a ChannelId>,
}

impl VideoChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_none() && self.move_to.is_none()
    }
}

/// Backing store failures. Never shown to callers verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Tenant membership rows
pub trait TenantStore: Send + Sync {
    fn tenant_role(&self, tenant_id: &TenantId, user_id: &UserId) -> StoreResult<Option<TenantRole>>;

    fn add_tenant_member(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        role: TenantRole,
    ) -> StoreResult<()>;
}

/// Channels and channel membership rows
pub trait ChannelStore: Send + Sync {
    fn create_channel(&self, channel: &Channel) -> StoreResult<()>;

    /// Look up a channel, scoped to its tenant
    fn get_channel(&self, channel_id: &ChannelId, tenant_id: &TenantId) -> StoreResult<Option<Channel>>;

    /// Role of `user_id` on a channel that belongs to `tenant_id`
    fn channel_role(
        &self,
        channel_id: &ChannelId,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> StoreResult<Option<ChannelRole>>;

    fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        role: ChannelRole,
    ) -> StoreResult<()>;
}

/// Spaces, space grants and the videos shared into spaces
pub trait SpaceStore: Send + Sync {
    fn create_space(&self, space: &Space) -> StoreResult<()>;

    fn get_space(&self, space_id: &SpaceId) -> StoreResult<Option<Space>>;

    /// Insert or overwrite the grant for `(space, user)`; returns the stored row
    fn upsert_space_member(&self, membership: &SpaceMembership) -> StoreResult<SpaceMembership>;

    fn space_member_level(&self, space_id: &SpaceId, user_id: &UserId) -> StoreResult<Option<AccessLevel>>;

    fn list_space_members(&self, space_id: &SpaceId) -> StoreResult<Vec<SpaceMembership>>;

    /// Owned spaces unioned with granted spaces, most recently created first
    fn list_spaces_for_user(&self, user_id: &UserId) -> StoreResult<Vec<SpaceWithAccess>>;

    fn add_space_video(&self, space_id: &SpaceId, video_id: &VideoId, added_by: &UserId) -> StoreResult<()>;

    /// Live videos shared into a space that belong to `tenant_id`
    fn list_space_videos(&self, space_id: &SpaceId, tenant_id: &TenantId) -> StoreResult<Vec<Video>>;
}

/// Video rows, always scoped by tenant
pub trait VideoStore: Send + Sync {
    fn insert_video(&self, video: &Video) -> StoreResult<()>;

    /// Point lookup. Soft-deleted rows are returned with `deleted = true`.
    fn get_video(&self, video_id: &VideoId, tenant_id: &TenantId) -> StoreResult<Option<Video>>;

    /// Live videos `user_id` can read in the tenant, newest first: tenant-level
    /// videos, videos the user uploaded, and videos of channels where the user
    /// holds any role.
    fn list_readable_videos(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Video>>;

    /// Apply `changes` in one transaction. Returns `false`, with nothing
    /// written, if no live video matched or the move target is not a channel
    /// of the same tenant.
    fn update_video(&self, video_id: &VideoId, tenant_id: &TenantId, changes: VideoChanges<'_>) -> StoreResult<bool>;

    /// Re-home a live video. A target channel must belong to the same tenant;
    /// otherwise nothing is updated and `false` is returned.
    fn set_video_channel(
        &self,
        video_id: &VideoId,
        tenant_id: &TenantId,
        channel_id: Option<&ChannelId>,
    ) -> StoreResult<bool>;

    /// Returns `false` if no live video matched
    fn soft_delete_video(&self, video_id: &VideoId, tenant_id: &TenantId) -> StoreResult<bool>;
}
