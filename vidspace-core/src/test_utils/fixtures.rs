//! Test fixtures for seeding stores and building requests
//!
//! `AccessFixture` wraps an in-memory store scoped to one tenant. Seeding
//! goes straight to the store, bypassing access checks.

use crate::config::ListingConfig;
use crate::core_access::context::{AUTHORIZATION_HEADER, DEFAULT_TENANT_HEADER};
use crate::core_access::{
    AccessError, AccessResult, AccessService, AccessSqlStore, Channel, ChannelRole, ChannelStore,
    IdentityResolver, MetadataTenantExtractor, RequestContext, TenantId, TenantRole, TenantStore,
    Timestamp, UserId, VerifiedIdentity, Video, VideoPolicyEngine, VideoStore,
};

/// Metadata key read by [`TrustedHeaderIdentity`]
pub const USER_HEADER: &str = "x-user-id";

/// Identity resolver that trusts an `x-user-id` header. Tests only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaderIdentity;

impl IdentityResolver for TrustedHeaderIdentity {
    fn resolve(&self, ctx: &RequestContext) -> AccessResult<VerifiedIdentity> {
        let user = ctx
            .get(USER_HEADER)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AccessError::unauthenticated("missing user header"))?;

        Ok(VerifiedIdentity {
            user_id: UserId::from(user),
            display_name: user.to_string(),
            email: format!("{user}@example.test"),
        })
    }
}

pub type TestEngine = VideoPolicyEngine<TrustedHeaderIdentity, MetadataTenantExtractor, AccessSqlStore>;
pub type TestService = AccessService<TrustedHeaderIdentity, MetadataTenantExtractor, AccessSqlStore>;

/// In-memory store plus the tenant every helper seeds into
pub struct AccessFixture {
    pub store: AccessSqlStore,
    pub tenant: TenantId,
}

impl Default for AccessFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessFixture {
    pub fn new() -> Self {
        Self::for_tenant("acme")
    }

    pub fn for_tenant(tenant: &str) -> Self {
        Self {
            store: AccessSqlStore::memory().expect("in-memory store"),
            tenant: TenantId::from(tenant),
        }
    }

    /// Another tenant sharing this fixture's store
    pub fn sibling(&self, tenant: &str) -> Self {
        Self {
            store: self.store.clone(),
            tenant: TenantId::from(tenant),
        }
    }

    /// Add `user` to the tenant as a plain member
    pub fn member(&self, user: &str) -> UserId {
        self.tenant_member(user, TenantRole::Member)
    }

    pub fn super_admin(&self, user: &str) -> UserId {
        self.tenant_member(user, TenantRole::SuperAdmin)
    }

    fn tenant_member(&self, user: &str, role: TenantRole) -> UserId {
        let user_id = UserId::from(user);
        self.store
            .add_tenant_member(&self.tenant, &user_id, role)
            .expect("add tenant member");
        user_id
    }

    pub fn channel(&self, name: &str) -> Channel {
        self.channel_in(&self.tenant, name)
    }

    pub fn channel_in(&self, tenant: &TenantId, name: &str) -> Channel {
        let channel = Channel::new(tenant.clone(), name.to_string());
        self.store.create_channel(&channel).expect("create channel");
        channel
    }

    /// Give `user` a role on `channel`, replacing any previous role
    pub fn grant(&self, channel: &Channel, user: &UserId, role: ChannelRole) {
        self.store
            .add_channel_member(&channel.id, user, role)
            .expect("add channel member");
    }

    pub fn video(&self, uploader: &UserId, channel: Option<&Channel>) -> Video {
        let video = Video::new(
            self.tenant.clone(),
            uploader.clone(),
            channel.map(|c| c.id.clone()),
            format!("clip by {uploader}"),
            None,
        );
        self.store.insert_video(&video).expect("insert video");
        video
    }

    /// Like [`AccessFixture::video`] with a fixed creation time, for ordering
    pub fn video_at(&self, uploader: &UserId, channel: Option<&Channel>, created_at: u64) -> Video {
        let mut video = Video::new(
            self.tenant.clone(),
            uploader.clone(),
            channel.map(|c| c.id.clone()),
            format!("clip {created_at} by {uploader}"),
            None,
        );
        video.created_at = Timestamp::from_millis(created_at);
        video.updated_at = video.created_at;
        self.store.insert_video(&video).expect("insert video");
        video
    }

    /// Request context for `user` in this fixture's tenant
    pub fn ctx(&self, user: &UserId) -> RequestContext {
        RequestContext::new()
            .with_metadata(USER_HEADER, user.as_str())
            .with_metadata(DEFAULT_TENANT_HEADER, self.tenant.as_str())
    }

    /// Request context carrying a bearer token instead of a trusted header
    pub fn bearer_ctx(&self, token: &str) -> RequestContext {
        RequestContext::new()
            .with_metadata(AUTHORIZATION_HEADER, format!("Bearer {token}"))
            .with_metadata(DEFAULT_TENANT_HEADER, self.tenant.as_str())
    }

    pub fn engine(&self) -> TestEngine {
        VideoPolicyEngine::new(TrustedHeaderIdentity, MetadataTenantExtractor::default(), self.store.clone())
    }

    pub fn service(&self) -> TestService {
        AccessService::new(
            TrustedHeaderIdentity,
            MetadataTenantExtractor::default(),
            self.store.clone(),
            ListingConfig::default(),
        )
    }
}
