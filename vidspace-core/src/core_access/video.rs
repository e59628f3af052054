//! Video records and their external shape

use super::types::{ChannelId, TenantId, Timestamp, UserId, VideoId};
use serde::{Deserialize, Serialize};

/// Stored video record.
///
/// `channel_id == None` means the video is tenant-level. Once `deleted` is set
/// the record is terminal and every store mutation skips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub tenant_id: TenantId,
    pub uploaded_by: UserId,
    pub channel_id: Option<ChannelId>,
    pub title: String,
    pub description: Option<String>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    pub fn new(
        tenant_id: TenantId,
        uploaded_by: UserId,
        channel_id: Option<ChannelId>,
        title: String,
        description: Option<String>,
    ) -> Self {
        let now = Timestamp::now();
        Video {
            id: VideoId::generate(),
            tenant_id,
            uploaded_by,
            channel_id,
            title,
            description,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_tenant_level(&self) -> bool {
        self.channel_id.is_none()
    }
}

/// Visibility exposed to callers. Only the private default exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
        }
    }
}

/// Externally exposed projection of a [`Video`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoView {
    pub id: VideoId,
    pub tenant_id: TenantId,
    pub uploaded_by: UserId,
    pub channel_id: Option<ChannelId>,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
