//! Video policy engine
//!
//! Composes tenant membership, channel roles and the video store into the
//! checks that gate every video operation. A video moves through
//!
//! ```text
//! tenant-level --move--> in-channel(C) --move--> in-channel(C')
//!                        in-channel(C) --remove--> tenant-level
//! either state --delete--> deleted (terminal)
//! ```
//!
//! Every check is a read. Callers mutate through the store afterwards; the
//! store's conditional updates re-check tenancy and the deleted flag, which
//! narrows (but does not close) the window between check and write.

use super::channel::ChannelRoleResolver;
use super::context::{IdentityResolver, RequestContext, TenantExtractor, VerifiedIdentity};
use super::errors::{AccessError, AccessResult, ErrorKind};
use super::roles::ChannelRole;
use super::storage::{ChannelStore, TenantStore, VideoStore};
use super::tenant::TenantMembership;
use super::types::{ChannelId, TenantId, UserId, VideoId};
use super::video::{Video, VideoView, Visibility};
use crate::metrics::{record_decision, Decision};

/// Roles allowed to bring a video into a channel
pub const MOVE_TARGET_ROLES: &[ChannelRole] = &[ChannelRole::Owner, ChannelRole::Uploader];

/// Authorizes video operations for a tenant-scoped caller
#[derive(Debug, Clone)]
pub struct VideoPolicyEngine<I, X, S> {
    identity: I,
    tenants: X,
    membership: TenantMembership<S>,
    channels: ChannelRoleResolver<S>,
    videos: S,
}

impl<I, X, S> VideoPolicyEngine<I, X, S>
where
    I: IdentityResolver,
    X: TenantExtractor,
    S: TenantStore + ChannelStore + VideoStore + Clone,
{
    pub fn new(identity: I, tenants: X, store: S) -> Self {
        Self {
            identity,
            tenants,
            membership: TenantMembership::new(store.clone()),
            channels: ChannelRoleResolver::new(store.clone()),
            videos: store,
        }
    }

    /// Verify the caller, resolve their tenant and confirm membership
    #[tracing::instrument(level = "debug", name = "policy::basic_request", skip_all)]
    pub fn validate_basic_request(&self, ctx: &RequestContext) -> AccessResult<(VerifiedIdentity, TenantId)> {
        observe("basic_request", self.resolve_member(ctx))
    }

    /// Live video in the tenant, or NotFound
    pub fn get_and_validate_video(&self, video_id: &VideoId, tenant_id: &TenantId) -> AccessResult<Video> {
        match self.videos.get_video(video_id, tenant_id) {
            Ok(Some(video)) if !video.deleted => Ok(video),
            Ok(_) => Err(AccessError::not_found("video not found")),
            Err(e) => {
                tracing::error!(video.id = %video_id, tenant.id = %tenant_id, error = %e, "video lookup failed");
                Err(e.into())
            }
        }
    }

    /// Caller must hold `owner` on the channel
    #[tracing::instrument(
        level = "debug",
        name = "policy::channel_ownership",
        skip_all,
        fields(channel.id = %channel_id, user.id = %user_id, tenant.id = %tenant_id)
    )]
    pub fn validate_channel_ownership(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AccessResult<()> {
        observe(
            "channel_ownership",
            self.require_role(channel_id, user_id, tenant_id, &[ChannelRole::Owner]).map(|_| ()),
        )
    }

    /// Caller's role must be one of `required`. Membership in the set, not
    /// rank: `&[Viewer]` rejects owners.
    #[tracing::instrument(
        level = "debug",
        name = "policy::channel_access",
        skip_all,
        fields(channel.id = %channel_id, user.id = %user_id, tenant.id = %tenant_id)
    )]
    pub fn validate_channel_access(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        tenant_id: &TenantId,
        required: &[ChannelRole],
    ) -> AccessResult<ChannelRole> {
        observe("channel_access", self.require_role(channel_id, user_id, tenant_id, required))
    }

    /// Owner or uploader on the target; owner on the source channel if any
    #[tracing::instrument(
        level = "debug",
        name = "policy::move",
        skip_all,
        fields(video.id = %video.id, user.id = %user_id, target.id = %target_channel_id)
    )]
    pub fn validate_video_move_permissions(
        &self,
        video: &Video,
        user_id: &UserId,
        tenant_id: &TenantId,
        target_channel_id: &ChannelId,
    ) -> AccessResult<()> {
        observe("move", self.move_allowed(video, user_id, tenant_id, target_channel_id))
    }

    /// Only the owner of the video's current channel may detach it
    #[tracing::instrument(level = "debug", name = "policy::removal", skip_all, fields(video.id = %video.id, user.id = %user_id))]
    pub fn validate_video_removal_permissions(
        &self,
        video: &Video,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AccessResult<()> {
        observe("removal", self.removal_allowed(video, user_id, tenant_id))
    }

    /// Channel owner for channel videos; the uploader for tenant-level videos.
    /// No tenant role stands in for uploader identity.
    #[tracing::instrument(level = "debug", name = "policy::deletion", skip_all, fields(video.id = %video.id, user.id = %user_id))]
    pub fn validate_video_deletion_permissions(
        &self,
        video: &Video,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AccessResult<()> {
        observe("deletion", self.owner_or_uploader(video, user_id, tenant_id))
    }

    /// Metadata edits follow the deletion rule
    #[tracing::instrument(level = "debug", name = "policy::mutation", skip_all, fields(video.id = %video.id, user.id = %user_id))]
    pub fn validate_video_mutation_permissions(
        &self,
        video: &Video,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AccessResult<()> {
        observe("mutation", self.owner_or_uploader(video, user_id, tenant_id))
    }

    /// Tenant-level videos are readable by any tenant member. Channel videos
    /// need some role on the channel, or uploader identity.
    #[tracing::instrument(level = "debug", name = "policy::read", skip_all, fields(video.id = %video.id, user.id = %user_id))]
    pub fn validate_video_read_permissions(
        &self,
        video: &Video,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AccessResult<()> {
        let result = match &video.channel_id {
            None => Ok(()),
            Some(_) if &video.uploaded_by == user_id => Ok(()),
            Some(channel_id) => self.channels.get_role(channel_id, user_id, tenant_id).map(|_| ()),
        };
        observe("read", result)
    }

    pub fn convert_video(&self, video: &Video) -> VideoView {
        convert_video(video)
    }

    fn resolve_member(&self, ctx: &RequestContext) -> AccessResult<(VerifiedIdentity, TenantId)> {
        let identity = self.identity.resolve(ctx)?;
        let tenant_id = self.tenants.tenant_id(ctx)?;
        self.membership.validate(&tenant_id, &identity.user_id)?;
        Ok((identity, tenant_id))
    }

    fn move_allowed(
        &self,
        video: &Video,
        user_id: &UserId,
        tenant_id: &TenantId,
        target_channel_id: &ChannelId,
    ) -> AccessResult<()> {
        self.require_role(target_channel_id, user_id, tenant_id, MOVE_TARGET_ROLES)?;
        if let Some(source) = &video.channel_id {
            self.require_role(source, user_id, tenant_id, &[ChannelRole::Owner])?;
        }
        Ok(())
    }

    fn removal_allowed(&self, video: &Video, user_id: &UserId, tenant_id: &TenantId) -> AccessResult<()> {
        let channel_id = video
            .channel_id
            .as_ref()
            .ok_or_else(|| AccessError::invalid_argument("video is not in a channel"))?;
        self.require_role(channel_id, user_id, tenant_id, &[ChannelRole::Owner])?;
        Ok(())
    }

    fn owner_or_uploader(&self, video: &Video, user_id: &UserId, tenant_id: &TenantId) -> AccessResult<()> {
        match &video.channel_id {
            Some(channel_id) => {
                self.require_role(channel_id, user_id, tenant_id, &[ChannelRole::Owner]).map(|_| ())
            }
            None if &video.uploaded_by == user_id => Ok(()),
            None => {
                tracing::debug!(uploader.id = %video.uploaded_by, "caller is not the uploader");
                Err(AccessError::permission_denied("only the uploader may modify a tenant-level video"))
            }
        }
    }

    fn require_role(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        tenant_id: &TenantId,
        required: &[ChannelRole],
    ) -> AccessResult<ChannelRole> {
        let role = self.channels.get_role(channel_id, user_id, tenant_id)?;

        if required.contains(&role) {
            Ok(role)
        } else {
            tracing::debug!(channel.id = %channel_id, %role, ?required, "channel role not accepted");
            Err(AccessError::permission_denied("insufficient channel role"))
        }
    }
}

/// Stored record to external shape. Visibility is always the private default.
pub fn convert_video(video: &Video) -> VideoView {
    VideoView {
        id: video.id.clone(),
        tenant_id: video.tenant_id.clone(),
        uploaded_by: video.uploaded_by.clone(),
        channel_id: video.channel_id.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        visibility: Visibility::Private,
        created_at: video.created_at,
        updated_at: video.updated_at,
    }
}

fn observe<T>(check: &'static str, result: AccessResult<T>) -> AccessResult<T> {
    let decision = match &result {
        Ok(_) => Decision::Allowed,
        Err(e) if e.kind() == ErrorKind::Internal => {
            tracing::error!(check, error = %e, "access check aborted");
            Decision::Failed
        }
        Err(e) => Decision::Denied(e.kind().as_str()),
    };
    record_decision(check, decision);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::AccessFixture;

    const CHANNEL_ROLES: [ChannelRole; 3] = [ChannelRole::Owner, ChannelRole::Uploader, ChannelRole::Viewer];

    #[test]
    fn test_basic_request_requires_tenant_membership() {
        let fx = AccessFixture::new();
        let engine = fx.engine();
        let stranger = UserId::from("mallory");

        let err = engine.validate_basic_request(&fx.ctx(&stranger)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.public_message(), "user not in tenant");
    }

    #[test]
    fn test_basic_request_resolves_identity_and_tenant() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");

        let (identity, tenant) = fx.engine().validate_basic_request(&fx.ctx(&alice)).unwrap();
        assert_eq!(identity.user_id, alice);
        assert_eq!(tenant, fx.tenant);
    }

    #[test]
    fn test_basic_request_missing_tenant_is_invalid_argument() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let ctx = RequestContext::new().with_metadata(crate::test_utils::USER_HEADER, alice.as_str());

        let err = fx.engine().validate_basic_request(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_basic_request_without_identity_is_unauthenticated() {
        let fx = AccessFixture::new();
        let ctx = RequestContext::new().with_metadata("x-tenant-id", fx.tenant.as_str());

        let err = fx.engine().validate_basic_request(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn test_get_and_validate_video() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let video = fx.video(&alice, None);
        let engine = fx.engine();

        assert_eq!(engine.get_and_validate_video(&video.id, &fx.tenant).unwrap().id, video.id);

        let err = engine.get_and_validate_video(&video.id, &TenantId::from("globex")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        fx.store.soft_delete_video(&video.id, &fx.tenant).unwrap();
        let err = engine.get_and_validate_video(&video.id, &fx.tenant).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_channel_access_is_set_membership() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let owner = fx.member("olivia");
        fx.grant(&channel, &owner, ChannelRole::Owner);
        let engine = fx.engine();

        let err = engine
            .validate_channel_access(&channel.id, &owner, &fx.tenant, &[ChannelRole::Viewer])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let role = engine
            .validate_channel_access(&channel.id, &owner, &fx.tenant, &[ChannelRole::Viewer, ChannelRole::Owner])
            .unwrap();
        assert_eq!(role, ChannelRole::Owner);
    }

    #[test]
    fn test_channel_ownership() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let engine = fx.engine();

        for role in CHANNEL_ROLES {
            let user = fx.member(&format!("user-{role}"));
            fx.grant(&channel, &user, role);
            let result = engine.validate_channel_ownership(&channel.id, &user, &fx.tenant);
            assert_eq!(result.is_ok(), role == ChannelRole::Owner, "role {role}");
        }

        let outsider = fx.member("outsider");
        let err = engine.validate_channel_ownership(&channel.id, &outsider, &fx.tenant).unwrap_err();
        assert_eq!(err.public_message(), "not a channel member");
    }

    #[test]
    fn test_channel_video_removal_and_deletion_need_owner() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let uploader = fx.member("uma");
        fx.grant(&channel, &uploader, ChannelRole::Uploader);
        let video = fx.video(&uploader, Some(&channel));
        let engine = fx.engine();

        for role in CHANNEL_ROLES {
            let user = fx.member(&format!("user-{role}"));
            fx.grant(&channel, &user, role);

            let removal = engine.validate_video_removal_permissions(&video, &user, &fx.tenant);
            let deletion = engine.validate_video_deletion_permissions(&video, &user, &fx.tenant);
            assert_eq!(removal.is_ok(), role == ChannelRole::Owner, "removal as {role}");
            assert_eq!(deletion.is_ok(), role == ChannelRole::Owner, "deletion as {role}");
        }

        // Uploading the video grants nothing once it sits in a channel
        assert!(engine.validate_video_deletion_permissions(&video, &uploader, &fx.tenant).is_err());
    }

    #[test]
    fn test_removal_of_tenant_level_video_is_invalid_argument() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let video = fx.video(&alice, None);

        let err = fx
            .engine()
            .validate_video_removal_permissions(&video, &alice, &fx.tenant)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_tenant_level_deletion_needs_uploader() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let bob = fx.member("bob");
        let root = fx.super_admin("root");
        let video = fx.video(&alice, None);
        let engine = fx.engine();

        assert!(engine.validate_video_deletion_permissions(&video, &alice, &fx.tenant).is_ok());

        for other in [&bob, &root] {
            let err = engine.validate_video_deletion_permissions(&video, other, &fx.tenant).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PermissionDenied);
            let err = engine.validate_video_mutation_permissions(&video, other, &fx.tenant).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        }
    }

    #[test]
    fn test_move_tenant_level_video_checks_target_only() {
        let fx = AccessFixture::new();
        let target = fx.channel("target");
        let alice = fx.member("alice");
        let video = fx.video(&alice, None);
        let engine = fx.engine();

        for role in CHANNEL_ROLES {
            let user = fx.member(&format!("user-{role}"));
            fx.grant(&target, &user, role);
            let result = engine.validate_video_move_permissions(&video, &user, &fx.tenant, &target.id);
            assert_eq!(result.is_ok(), role != ChannelRole::Viewer, "move as {role}");
        }
    }

    #[test]
    fn test_move_channel_video_needs_source_ownership() {
        let fx = AccessFixture::new();
        let source = fx.channel("source");
        let target = fx.channel("target");
        let user = fx.member("uma");
        fx.grant(&target, &user, ChannelRole::Uploader);
        let video = fx.video(&user, Some(&source));
        let engine = fx.engine();

        for role in [ChannelRole::Uploader, ChannelRole::Viewer] {
            fx.grant(&source, &user, role);
            let err = engine
                .validate_video_move_permissions(&video, &user, &fx.tenant, &target.id)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PermissionDenied, "source role {role}");
        }

        fx.grant(&source, &user, ChannelRole::Owner);
        assert!(engine.validate_video_move_permissions(&video, &user, &fx.tenant, &target.id).is_ok());

        fx.grant(&target, &user, ChannelRole::Viewer);
        assert!(engine.validate_video_move_permissions(&video, &user, &fx.tenant, &target.id).is_err());
    }

    #[test]
    fn test_move_into_channel_of_other_tenant_is_denied() {
        let fx = AccessFixture::new();
        let foreign = fx.channel_in(&TenantId::from("globex"), "theirs");
        let alice = fx.member("alice");
        fx.grant(&foreign, &alice, ChannelRole::Owner);
        let video = fx.video(&alice, None);

        let err = fx
            .engine()
            .validate_video_move_permissions(&video, &alice, &fx.tenant, &foreign.id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_read_permissions() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let alice = fx.member("alice");
        let viewer = fx.member("vic");
        let outsider = fx.member("otto");
        fx.grant(&channel, &viewer, ChannelRole::Viewer);
        let engine = fx.engine();

        let tenant_level = fx.video(&alice, None);
        assert!(engine.validate_video_read_permissions(&tenant_level, &outsider, &fx.tenant).is_ok());

        let in_channel = fx.video(&alice, Some(&channel));
        assert!(engine.validate_video_read_permissions(&in_channel, &alice, &fx.tenant).is_ok());
        assert!(engine.validate_video_read_permissions(&in_channel, &viewer, &fx.tenant).is_ok());
        let err = engine
            .validate_video_read_permissions(&in_channel, &outsider, &fx.tenant)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_convert_video_is_private() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let channel = fx.channel("launches");
        let video = fx.video(&alice, Some(&channel));

        let view = fx.engine().convert_video(&video);
        assert_eq!(view.visibility, Visibility::Private);
        assert_eq!(view.id, video.id);
        assert_eq!(view.channel_id, Some(channel.id));
        assert_eq!(view.title, video.title);
    }
}
