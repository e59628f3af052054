//! Access-gated operations
//!
//! One method per externally exposed call. Each runs the basic request
//! validation, then the operation-specific checks, and only then touches
//! stored state.

use super::context::{IdentityResolver, RequestContext, TenantExtractor};
use super::errors::{AccessError, AccessResult};
use super::policy::{VideoPolicyEngine, MOVE_TARGET_ROLES};
use super::roles::AccessLevel;
use super::space::{Space, SpaceAccessResolver, SpaceMembership, SpaceWithAccess};
use super::storage::{ChannelStore, SpaceStore, TenantStore, VideoChanges, VideoStore};
use super::types::{ChannelId, SpaceId, UserId, VideoId};
use super::video::{Video, VideoView};
use crate::config::ListingConfig;

/// Maximum length of a video title, in characters
pub const MAX_TITLE_LEN: usize = 255;

/// Input for a new video
#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    /// `None` uploads at tenant level
    pub channel_id: Option<ChannelId>,
}

/// Partial update. A `channel_id` different from the current one is a move.
#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    /// `Some("")` clears the description
    pub description: Option<String>,
    pub channel_id: Option<ChannelId>,
}

impl VideoUpdate {
    fn touches_metadata(&self) -> bool {
        self.title.is_some() || self.description.is_some()
    }
}

/// All access-gated operations over one store
#[derive(Debug, Clone)]
pub struct AccessService<I, X, S> {
    policy: VideoPolicyEngine<I, X, S>,
    spaces: SpaceAccessResolver<S>,
    store: S,
    listing: ListingConfig,
}

fn validate_title(title: &str) -> AccessResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AccessError::invalid_argument("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AccessError::invalid_argument(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

impl<I, X, S> AccessService<I, X, S>
where
    I: IdentityResolver,
    X: TenantExtractor,
    S: TenantStore + ChannelStore + SpaceStore + VideoStore + Clone,
{
    pub fn new(identity: I, tenants: X, store: S, listing: ListingConfig) -> Self {
        Self {
            policy: VideoPolicyEngine::new(identity, tenants, store.clone()),
            spaces: SpaceAccessResolver::new(store.clone()),
            store,
            listing,
        }
    }

    pub fn policy(&self) -> &VideoPolicyEngine<I, X, S> {
        &self.policy
    }

    // ===== Space Operations =====

    pub fn create_space(
        &self,
        ctx: &RequestContext,
        name: &str,
        description: Option<&str>,
    ) -> AccessResult<Space> {
        let (identity, _) = self.policy.validate_basic_request(ctx)?;
        self.spaces.create_space(&identity.user_id, name, description)
    }

    pub fn add_user_to_space(
        &self,
        ctx: &RequestContext,
        space_id: &SpaceId,
        user_id: &UserId,
        level: AccessLevel,
    ) -> AccessResult<SpaceMembership> {
        let (identity, _) = self.policy.validate_basic_request(ctx)?;
        let membership = self.spaces.add_member(&identity.user_id, space_id, user_id, level)?;

        tracing::info!(space.id = %space_id, user.id = %user_id, %level, "space access granted");
        Ok(membership)
    }

    pub fn list_space_members(
        &self,
        ctx: &RequestContext,
        space_id: &SpaceId,
    ) -> AccessResult<Vec<SpaceMembership>> {
        let (identity, _) = self.policy.validate_basic_request(ctx)?;
        self.spaces.list_members(&identity.user_id, space_id)
    }

    pub fn list_spaces(&self, ctx: &RequestContext) -> AccessResult<Vec<SpaceWithAccess>> {
        let (identity, _) = self.policy.validate_basic_request(ctx)?;
        self.spaces.list_spaces_for_user(&identity.user_id)
    }

    /// Share a video into a space. Needs edit access on the space and read
    /// access on the video.
    pub fn add_video_to_space(
        &self,
        ctx: &RequestContext,
        space_id: &SpaceId,
        video_id: &VideoId,
    ) -> AccessResult<()> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;
        let user_id = &identity.user_id;

        self.spaces.require_level(space_id, user_id, AccessLevel::Edit)?;
        let video = self.policy.get_and_validate_video(video_id, &tenant_id)?;
        self.policy.validate_video_read_permissions(&video, user_id, &tenant_id)?;

        self.store.add_space_video(space_id, &video.id, user_id)?;

        tracing::info!(space.id = %space_id, video.id = %video.id, "video shared into space");
        Ok(())
    }

    /// Videos shared into a space, limited to the caller's tenant
    pub fn list_space_videos(&self, ctx: &RequestContext, space_id: &SpaceId) -> AccessResult<Vec<VideoView>> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;

        self.spaces.require_level(space_id, &identity.user_id, AccessLevel::View)?;
        let videos = self.store.list_space_videos(space_id, &tenant_id)?;

        Ok(videos.iter().map(|v| self.policy.convert_video(v)).collect())
    }

    // ===== Video Operations =====

    /// Upload at tenant level, or into a channel where the caller may upload
    pub fn create_video(&self, ctx: &RequestContext, input: NewVideo) -> AccessResult<VideoView> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;
        let title = validate_title(&input.title)?;

        if let Some(channel_id) = &input.channel_id {
            self.policy
                .validate_channel_access(channel_id, &identity.user_id, &tenant_id, MOVE_TARGET_ROLES)?;
        }

        let video = Video::new(
            tenant_id,
            identity.user_id,
            input.channel_id,
            title,
            normalize_description(input.description),
        );
        self.store.insert_video(&video)?;

        tracing::info!(video.id = %video.id, channel.id = ?video.channel_id, "video created");
        Ok(self.policy.convert_video(&video))
    }

    pub fn get_video(&self, ctx: &RequestContext, video_id: &VideoId) -> AccessResult<VideoView> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;

        let video = self.policy.get_and_validate_video(video_id, &tenant_id)?;
        self.policy.validate_video_read_permissions(&video, &identity.user_id, &tenant_id)?;

        Ok(self.policy.convert_video(&video))
    }

    /// One page of the videos the caller can read. Pages are 1-based.
    pub fn list_videos(
        &self,
        ctx: &RequestContext,
        page_size: u32,
        page_number: u32,
    ) -> AccessResult<Vec<VideoView>> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;

        let (limit, offset) = self.listing.page_bounds(page_size, page_number);
        let videos = self.store.list_readable_videos(&tenant_id, &identity.user_id, limit, offset)?;

        Ok(videos.iter().map(|v| self.policy.convert_video(v)).collect())
    }

    /// Edit metadata and/or move the video. Every check runs before any write.
    pub fn update_video(
        &self,
        ctx: &RequestContext,
        video_id: &VideoId,
        update: VideoUpdate,
    ) -> AccessResult<VideoView> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;
        let user_id = &identity.user_id;

        if !update.touches_metadata() && update.channel_id.is_none() {
            return Err(AccessError::invalid_argument("nothing to update"));
        }

        let video = self.policy.get_and_validate_video(video_id, &tenant_id)?;

        let target = update
            .channel_id
            .as_ref()
            .filter(|target| video.channel_id.as_ref() != Some(*target));

        if let Some(target) = target {
            self.policy.validate_video_move_permissions(&video, user_id, &tenant_id, target)?;
        }
        if update.touches_metadata() || target.is_none() {
            self.policy.validate_video_mutation_permissions(&video, user_id, &tenant_id)?;
        }

        let title = match &update.title {
            Some(title) => validate_title(title)?,
            None => video.title.clone(),
        };
        let description = match &update.description {
            Some(description) => normalize_description(Some(description.clone())),
            None => video.description.clone(),
        };

        let changes = VideoChanges {
            metadata: update
                .touches_metadata()
                .then(|| (title.as_str(), description.as_deref())),
            move_to: target,
        };
        if !changes.is_empty() && !self.store.update_video(&video.id, &tenant_id, changes)? {
            return Err(AccessError::not_found("video not found"));
        }
        if let Some(target) = target {
            tracing::info!(video.id = %video.id, from = ?video.channel_id, to = %target, "video moved");
        }

        let updated = self.policy.get_and_validate_video(&video.id, &tenant_id)?;
        Ok(self.policy.convert_video(&updated))
    }

    /// Detach a video from its channel, making it tenant-level
    pub fn remove_video_from_channel(&self, ctx: &RequestContext, video_id: &VideoId) -> AccessResult<VideoView> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;

        let video = self.policy.get_and_validate_video(video_id, &tenant_id)?;
        self.policy.validate_video_removal_permissions(&video, &identity.user_id, &tenant_id)?;

        if !self.store.set_video_channel(&video.id, &tenant_id, None)? {
            return Err(AccessError::not_found("video not found"));
        }
        tracing::info!(video.id = %video.id, from = ?video.channel_id, "video removed from channel");

        let updated = self.policy.get_and_validate_video(&video.id, &tenant_id)?;
        Ok(self.policy.convert_video(&updated))
    }

    /// Soft-delete. Terminal: the video is gone from every read path.
    pub fn delete_video(&self, ctx: &RequestContext, video_id: &VideoId) -> AccessResult<()> {
        let (identity, tenant_id) = self.policy.validate_basic_request(ctx)?;

        let video = self.policy.get_and_validate_video(video_id, &tenant_id)?;
        self.policy.validate_video_deletion_permissions(&video, &identity.user_id, &tenant_id)?;

        if !self.store.soft_delete_video(&video.id, &tenant_id)? {
            return Err(AccessError::not_found("video not found"));
        }

        tracing::info!(video.id = %video.id, "video deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_access::errors::ErrorKind;
    use crate::core_access::roles::ChannelRole;
    use crate::test_utils::AccessFixture;

    #[test]
    fn test_create_video_in_channel_needs_upload_role() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let uploader = fx.member("uma");
        let viewer = fx.member("vic");
        fx.grant(&channel, &uploader, ChannelRole::Uploader);
        fx.grant(&channel, &viewer, ChannelRole::Viewer);
        let service = fx.service();

        let input = NewVideo {
            title: "Launch day".to_string(),
            description: Some("  ".to_string()),
            channel_id: Some(channel.id.clone()),
        };

        let view = service.create_video(&fx.ctx(&uploader), input.clone()).unwrap();
        assert_eq!(view.channel_id, Some(channel.id.clone()));
        assert_eq!(view.description, None);
        assert_eq!(view.uploaded_by, uploader);

        let err = service.create_video(&fx.ctx(&viewer), input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_create_video_rejects_blank_title() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");

        let err = fx
            .service()
            .create_video(&fx.ctx(&alice), NewVideo { title: " ".to_string(), ..NewVideo::default() })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_update_metadata_and_move() {
        let fx = AccessFixture::new();
        let target = fx.channel("target");
        let alice = fx.member("alice");
        fx.grant(&target, &alice, ChannelRole::Uploader);
        let video = fx.video(&alice, None);
        let service = fx.service();

        let view = service
            .update_video(
                &fx.ctx(&alice),
                &video.id,
                VideoUpdate {
                    title: Some("Renamed".to_string()),
                    description: Some("now in a channel".to_string()),
                    channel_id: Some(target.id.clone()),
                },
            )
            .unwrap();

        assert_eq!(view.title, "Renamed");
        assert_eq!(view.description.as_deref(), Some("now in a channel"));
        assert_eq!(view.channel_id, Some(target.id));
    }

    #[test]
    fn test_update_with_current_channel_is_metadata_only() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let owner = fx.member("olivia");
        let uploader = fx.member("uma");
        fx.grant(&channel, &owner, ChannelRole::Owner);
        fx.grant(&channel, &uploader, ChannelRole::Uploader);
        let video = fx.video(&uploader, Some(&channel));
        let service = fx.service();

        let update = VideoUpdate {
            title: Some("Edited".to_string()),
            channel_id: Some(channel.id.clone()),
            ..VideoUpdate::default()
        };

        // An uploader could pass the move target check, but this is an edit
        let err = service.update_video(&fx.ctx(&uploader), &video.id, update.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let view = service.update_video(&fx.ctx(&owner), &video.id, update).unwrap();
        assert_eq!(view.title, "Edited");
    }

    #[test]
    fn test_empty_update_is_invalid() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let video = fx.video(&alice, None);

        let err = fx
            .service()
            .update_video(&fx.ctx(&alice), &video.id, VideoUpdate::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_denied_move_leaves_metadata_untouched() {
        let fx = AccessFixture::new();
        let source = fx.channel("source");
        let target = fx.channel("target");
        let user = fx.member("uma");
        fx.grant(&source, &user, ChannelRole::Uploader);
        fx.grant(&target, &user, ChannelRole::Owner);
        let video = fx.video(&user, Some(&source));
        let service = fx.service();

        let err = service
            .update_video(
                &fx.ctx(&user),
                &video.id,
                VideoUpdate {
                    title: Some("Hijacked".to_string()),
                    channel_id: Some(target.id.clone()),
                    ..VideoUpdate::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let stored = fx.store.get_video(&video.id, &fx.tenant).unwrap().unwrap();
        assert_eq!(stored.title, video.title);
        assert_eq!(stored.channel_id, Some(source.id));
    }

    #[test]
    fn test_remove_from_channel() {
        let fx = AccessFixture::new();
        let channel = fx.channel("launches");
        let owner = fx.member("olivia");
        fx.grant(&channel, &owner, ChannelRole::Owner);
        let video = fx.video(&owner, Some(&channel));
        let service = fx.service();

        let view = service.remove_video_from_channel(&fx.ctx(&owner), &video.id).unwrap();
        assert_eq!(view.channel_id, None);

        let err = service.remove_video_from_channel(&fx.ctx(&owner), &video.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_deleted_video_is_gone() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        let video = fx.video(&alice, None);
        let service = fx.service();
        let ctx = fx.ctx(&alice);

        service.delete_video(&ctx, &video.id).unwrap();

        assert_eq!(service.get_video(&ctx, &video.id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(service.delete_video(&ctx, &video.id).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(service.list_videos(&ctx, 0, 1).unwrap().is_empty());
    }

    #[test]
    fn test_list_videos_pages() {
        let fx = AccessFixture::new();
        let alice = fx.member("alice");
        for n in 0..5 {
            fx.video_at(&alice, None, n);
        }
        let service = fx.service();
        let ctx = fx.ctx(&alice);

        assert_eq!(service.list_videos(&ctx, 2, 1).unwrap().len(), 2);
        assert_eq!(service.list_videos(&ctx, 2, 3).unwrap().len(), 1);
        assert!(service.list_videos(&ctx, 2, 4).unwrap().is_empty());
        assert_eq!(service.list_videos(&ctx, 0, 0).unwrap().len(), 5);
    }

    #[test]
    fn test_space_video_sharing() {
        let fx = AccessFixture::new();
        let owner = fx.member("olivia");
        let editor = fx.member("eddie");
        let viewer = fx.member("vic");
        let service = fx.service();

        let space = service.create_space(&fx.ctx(&owner), "Reels", None).unwrap();
        service.add_user_to_space(&fx.ctx(&owner), &space.id, &editor, AccessLevel::Edit).unwrap();
        service.add_user_to_space(&fx.ctx(&owner), &space.id, &viewer, AccessLevel::View).unwrap();

        let video = fx.video(&editor, None);

        let err = service.add_video_to_space(&fx.ctx(&viewer), &space.id, &video.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        service.add_video_to_space(&fx.ctx(&editor), &space.id, &video.id).unwrap();

        let shared = service.list_space_videos(&fx.ctx(&viewer), &space.id).unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, video.id);

        let outsider = fx.member("otto");
        let err = service.list_space_videos(&fx.ctx(&outsider), &space.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_space_operations_require_tenant_membership() {
        let fx = AccessFixture::new();
        let stranger = UserId::from("mallory");

        let err = fx.service().create_space(&fx.ctx(&stranger), "Reels", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
