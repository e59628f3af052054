//! Conversions between access-engine types and wire messages

use tonic::metadata::{KeyAndValueRef, MetadataMap};
use vidspace_core::core_access::{
    AccessLevel, ChannelId, RequestContext, Space, SpaceAccess, SpaceMembership, SpaceWithAccess,
    VideoView, Visibility,
};

use crate::error::{ApiError, ApiResult};
use crate::proto;

/// Copy ASCII call metadata into a [`RequestContext`]. Binary entries are dropped.
pub fn request_context(metadata: &MetadataMap) -> RequestContext {
    let mut ctx = RequestContext::new();
    for entry in metadata.iter() {
        if let KeyAndValueRef::Ascii(key, value) = entry {
            if let Ok(value) = value.to_str() {
                ctx.insert(key.as_str(), value);
            }
        }
    }
    ctx
}

/// Trimmed value of a required string field
pub fn required<'a>(field: &'static str, value: &'a str) -> ApiResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::missing(field));
    }
    Ok(value)
}

/// A present-but-blank channel id is rejected rather than read as "no channel"
pub fn optional_channel(value: Option<&str>) -> ApiResult<Option<ChannelId>> {
    value
        .map(|v| required("channel_id", v).map(ChannelId::from))
        .transpose()
}

/// Grantable level from the wire enum. `OWNER` is positional and never granted.
pub fn grantable_level(raw: i32) -> ApiResult<AccessLevel> {
    match proto::AccessLevel::try_from(raw) {
        Ok(proto::AccessLevel::View) => Ok(AccessLevel::View),
        Ok(proto::AccessLevel::Edit) => Ok(AccessLevel::Edit),
        Ok(proto::AccessLevel::Admin) => Ok(AccessLevel::Admin),
        Ok(level) => Err(ApiError::invalid("access_level", format!("{} cannot be granted", level.as_str_name()))),
        Err(_) => Err(ApiError::invalid("access_level", format!("unknown value {raw}"))),
    }
}

impl From<AccessLevel> for proto::AccessLevel {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::View => proto::AccessLevel::View,
            AccessLevel::Edit => proto::AccessLevel::Edit,
            AccessLevel::Admin => proto::AccessLevel::Admin,
        }
    }
}

impl From<SpaceAccess> for proto::AccessLevel {
    fn from(access: SpaceAccess) -> Self {
        match access {
            SpaceAccess::Owner => proto::AccessLevel::Owner,
            SpaceAccess::Member(level) => level.into(),
        }
    }
}

impl From<Visibility> for proto::Visibility {
    fn from(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Private => proto::Visibility::Private,
        }
    }
}

pub fn space_message(space: Space, access: SpaceAccess) -> proto::Space {
    proto::Space {
        id: space.id.to_string(),
        name: space.name,
        description: space.description,
        owner_id: space.owner_id.to_string(),
        created_at: space.created_at.as_millis() as i64,
        access_level: proto::AccessLevel::from(access) as i32,
    }
}

impl From<SpaceWithAccess> for proto::Space {
    fn from(entry: SpaceWithAccess) -> Self {
        space_message(entry.space, entry.access)
    }
}

impl From<SpaceMembership> for proto::SpaceMember {
    fn from(m: SpaceMembership) -> Self {
        proto::SpaceMember {
            space_id: m.space_id.to_string(),
            user_id: m.user_id.to_string(),
            access_level: proto::AccessLevel::from(m.level) as i32,
            joined_at: m.joined_at.as_millis() as i64,
            granted_by: m.granted_by.to_string(),
        }
    }
}

impl From<VideoView> for proto::Video {
    fn from(v: VideoView) -> Self {
        proto::Video {
            id: v.id.to_string(),
            tenant_id: v.tenant_id.to_string(),
            uploaded_by: v.uploaded_by.to_string(),
            channel_id: v.channel_id.map(|c| c.to_string()),
            title: v.title,
            description: v.description,
            visibility: proto::Visibility::from(v.visibility) as i32,
            created_at: v.created_at.as_millis() as i64,
            updated_at: v.updated_at.as_millis() as i64,
        }
    }
}
