//! Access control for multi-tenant video sharing
//!
//! Three independent grouping mechanisms decide who may touch a video:
//!
//! - **Tenants**: every request is scoped to one tenant and the caller must
//!   hold a tenant membership row ([`TenantMembership`]).
//! - **Channels**: explicit `owner` / `uploader` / `viewer` rows
//!   ([`ChannelRoleResolver`]).
//! - **Spaces**: owner-created collections shared at `view < edit < admin`
//!   ([`SpaceAccessResolver`]). The owner is positional and has no row.
//!
//! [`VideoPolicyEngine`] composes them into per-operation checks and
//! [`AccessService`] runs those checks in front of every store mutation.

pub mod channel;
pub mod context;
pub mod errors;
pub mod policy;
pub mod roles;
pub mod service;
pub mod space;
pub mod storage;
pub mod tenant;
pub mod types;
pub mod video;

pub use channel::{Channel, ChannelRoleResolver};
pub use context::{
    IdentityResolver, MetadataTenantExtractor, RequestContext, TenantExtractor, VerifiedIdentity,
};
pub use errors::{AccessError, AccessResult, ErrorKind};
pub use policy::{convert_video, VideoPolicyEngine};
pub use roles::{AccessLevel, ChannelRole, ParseRoleError, SpaceAccess, TenantRole};
pub use service::{AccessService, NewVideo, VideoUpdate};
pub use space::{Space, SpaceAccessResolver, SpaceMembership, SpaceWithAccess};
pub use storage::{
    AccessSqlStore, ChannelStore, SpaceStore, StoreError, TenantStore, VideoChanges, VideoStore,
};
pub use tenant::TenantMembership;
pub use types::{ChannelId, SpaceId, TenantId, Timestamp, UserId, VideoId};
pub use video::{Video, VideoView, Visibility};
