use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::instrument;
use vidspace_core::core_access::{
    AccessResult, AccessService, AccessSqlStore, IdentityResolver, NewVideo, RequestContext,
    SpaceAccess, SpaceId, TenantExtractor, UserId, VideoId, VideoUpdate,
};
use vidspace_core::metrics::Timer;

use super::convert::{grantable_level, optional_channel, request_context, required, space_message};
use crate::error::ApiError;
use crate::proto::video_access_server::VideoAccess;
use crate::proto::*;

type Service<I, X> = AccessService<I, X, AccessSqlStore>;

/// gRPC front for [`AccessService`]
///
/// Every RPC copies call metadata into a [`RequestContext`] and runs the
/// access-gated operation on the blocking pool.
pub struct VideoAccessApi<I, X> {
    service: Arc<Service<I, X>>,
}

impl<I, X> VideoAccessApi<I, X>
where
    I: IdentityResolver + 'static,
    X: TenantExtractor + 'static,
{
    pub fn new(service: Service<I, X>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    async fn run<T, F>(&self, method: &'static str, ctx: RequestContext, op: F) -> Result<T, Status>
    where
        T: Send + 'static,
        F: FnOnce(&Service<I, X>, &RequestContext) -> AccessResult<T> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let timer = Timer::new(method);

        let joined = tokio::task::spawn_blocking(move || op(service.as_ref(), &ctx)).await;
        timer.stop();

        match joined {
            Ok(result) => result.map_err(|e| Status::from(ApiError::from(e))),
            Err(e) => Err(Status::from(ApiError::from(e))),
        }
    }
}

#[tonic::async_trait]
impl<I, X> VideoAccess for VideoAccessApi<I, X>
where
    I: IdentityResolver + 'static,
    X: TenantExtractor + 'static,
{
    #[instrument(skip_all)]
    async fn create_space(
        &self,
        request: Request<CreateSpaceRequest>,
    ) -> Result<Response<CreateSpaceResponse>, Status> {
        let ctx = request_context(request.metadata());
        let req = request.into_inner();

        let space = self
            .run("create_space", ctx, move |svc, ctx| {
                svc.create_space(ctx, &req.name, req.description.as_deref())
            })
            .await?;

        Ok(Response::new(CreateSpaceResponse {
            space: Some(space_message(space, SpaceAccess::Owner)),
        }))
    }

    #[instrument(skip_all)]
    async fn add_user_to_space(
        &self,
        request: Request<AddUserToSpaceRequest>,
    ) -> Result<Response<AddUserToSpaceResponse>, Status> {
        let ctx = request_context(request.metadata());
        let req = request.into_inner();

        let space_id = SpaceId::from(required("space_id", &req.space_id)?);
        let user_id = UserId::from(required("user_id", &req.user_id)?);
        let level = grantable_level(req.access_level)?;

        let member = self
            .run("add_user_to_space", ctx, move |svc, ctx| {
                svc.add_user_to_space(ctx, &space_id, &user_id, level)
            })
            .await?;

        Ok(Response::new(AddUserToSpaceResponse {
            member: Some(member.into()),
        }))
    }

    #[instrument(skip_all)]
    async fn list_space_members(
        &self,
        request: Request<ListSpaceMembersRequest>,
    ) -> Result<Response<ListSpaceMembersResponse>, Status> {
        let ctx = request_context(request.metadata());
        let space_id = SpaceId::from(required("space_id", &request.get_ref().space_id)?);

        let members = self
            .run("list_space_members", ctx, move |svc, ctx| svc.list_space_members(ctx, &space_id))
            .await?;

        Ok(Response::new(ListSpaceMembersResponse {
            members: members.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip_all)]
    async fn list_spaces(
        &self,
        request: Request<ListSpacesRequest>,
    ) -> Result<Response<ListSpacesResponse>, Status> {
        let ctx = request_context(request.metadata());

        let spaces = self
            .run("list_spaces", ctx, |svc, ctx| svc.list_spaces(ctx))
            .await?;

        Ok(Response::new(ListSpacesResponse {
            spaces: spaces.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip_all)]
    async fn add_video_to_space(
        &self,
        request: Request<AddVideoToSpaceRequest>,
    ) -> Result<Response<AddVideoToSpaceResponse>, Status> {
        let ctx = request_context(request.metadata());
        let req = request.into_inner();

        let space_id = SpaceId::from(required("space_id", &req.space_id)?);
        let video_id = VideoId::from(required("video_id", &req.video_id)?);

        self.run("add_video_to_space", ctx, move |svc, ctx| {
            svc.add_video_to_space(ctx, &space_id, &video_id)
        })
        .await?;

        Ok(Response::new(AddVideoToSpaceResponse {}))
    }

    #[instrument(skip_all)]
    async fn list_space_videos(
        &self,
        request: Request<ListSpaceVideosRequest>,
    ) -> Result<Response<ListSpaceVideosResponse>, Status> {
        let ctx = request_context(request.metadata());
        let space_id = SpaceId::from(required("space_id", &request.get_ref().space_id)?);

        let videos = self
            .run("list_space_videos", ctx, move |svc, ctx| svc.list_space_videos(ctx, &space_id))
            .await?;

        Ok(Response::new(ListSpaceVideosResponse {
            videos: videos.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip_all)]
    async fn create_video(
        &self,
        request: Request<CreateVideoRequest>,
    ) -> Result<Response<CreateVideoResponse>, Status> {
        let ctx = request_context(request.metadata());
        let req = request.into_inner();

        let input = NewVideo {
            channel_id: optional_channel(req.channel_id.as_deref())?,
            title: req.title,
            description: req.description,
        };

        let video = self
            .run("create_video", ctx, move |svc, ctx| svc.create_video(ctx, input))
            .await?;

        Ok(Response::new(CreateVideoResponse {
            video: Some(video.into()),
        }))
    }

    #[instrument(skip_all)]
    async fn get_video(
        &self,
        request: Request<GetVideoRequest>,
    ) -> Result<Response<GetVideoResponse>, Status> {
        let ctx = request_context(request.metadata());
        let video_id = VideoId::from(required("video_id", &request.get_ref().video_id)?);

        let video = self
            .run("get_video", ctx, move |svc, ctx| svc.get_video(ctx, &video_id))
            .await?;

        Ok(Response::new(GetVideoResponse {
            video: Some(video.into()),
        }))
    }

    #[instrument(skip_all)]
    async fn list_videos(
        &self,
        request: Request<ListVideosRequest>,
    ) -> Result<Response<ListVideosResponse>, Status> {
        let ctx = request_context(request.metadata());
        let ListVideosRequest { page_size, page_number } = *request.get_ref();

        let videos = self
            .run("list_videos", ctx, move |svc, ctx| svc.list_videos(ctx, page_size, page_number))
            .await?;

        Ok(Response::new(ListVideosResponse {
            videos: videos.into_iter().map(Into::into).collect(),
        }))
    }

    #[instrument(skip_all)]
    async fn update_video(
        &self,
        request: Request<UpdateVideoRequest>,
    ) -> Result<Response<UpdateVideoResponse>, Status> {
        let ctx = request_context(request.metadata());
        let req = request.into_inner();

        let video_id = VideoId::from(required("video_id", &req.video_id)?);
        let update = VideoUpdate {
            channel_id: optional_channel(req.channel_id.as_deref())?,
            title: req.title,
            description: req.description,
        };

        let video = self
            .run("update_video", ctx, move |svc, ctx| svc.update_video(ctx, &video_id, update))
            .await?;

        Ok(Response::new(UpdateVideoResponse {
            video: Some(video.into()),
        }))
    }

    #[instrument(skip_all)]
    async fn remove_video_from_channel(
        &self,
        request: Request<RemoveVideoFromChannelRequest>,
    ) -> Result<Response<RemoveVideoFromChannelResponse>, Status> {
        let ctx = request_context(request.metadata());
        let video_id = VideoId::from(required("video_id", &request.get_ref().video_id)?);

        let video = self
            .run("remove_video_from_channel", ctx, move |svc, ctx| {
                svc.remove_video_from_channel(ctx, &video_id)
            })
            .await?;

        Ok(Response::new(RemoveVideoFromChannelResponse {
            video: Some(video.into()),
        }))
    }

    #[instrument(skip_all)]
    async fn delete_video(
        &self,
        request: Request<DeleteVideoRequest>,
    ) -> Result<Response<DeleteVideoResponse>, Status> {
        let ctx = request_context(request.metadata());
        let video_id = VideoId::from(required("video_id", &request.get_ref().video_id)?);

        self.run("delete_video", ctx, move |svc, ctx| svc.delete_video(ctx, &video_id))
            .await?;

        Ok(Response::new(DeleteVideoResponse {}))
    }
}
