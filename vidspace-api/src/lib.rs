//! gRPC surface of vidspace
//!
//! [`services::VideoAccessApi`] adapts the synchronous access engine to the
//! `vidspace.v1.VideoAccess` service; [`auth`] verifies bearer tokens.

pub mod auth;
pub mod error;
pub mod proto;
pub mod services;

pub use auth::{JwtIdentityResolver, TokenIssuer};
pub use error::{ApiError, ApiResult};
pub use proto::video_access_server::{VideoAccess, VideoAccessServer};
pub use services::VideoAccessApi;
