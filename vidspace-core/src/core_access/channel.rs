//! Channels and channel role resolution

use super::errors::{AccessError, AccessResult};
use super::roles::ChannelRole;
use super::storage::ChannelStore;
use super::types::{ChannelId, TenantId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A named grouping of videos inside exactly one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub tenant_id: TenantId,
    pub name: String,
    pub created_at: Timestamp,
}

impl Channel {
    pub fn new(tenant_id: TenantId, name: String) -> Self {
        Channel {
            id: ChannelId::generate(),
            tenant_id,
            name,
            created_at: Timestamp::now(),
        }
    }
}

/// Resolves a user's role on a channel of a given tenant
#[derive(Debug, Clone)]
pub struct ChannelRoleResolver<S> {
    store: S,
}

impl<S: ChannelStore> ChannelRoleResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Pure lookup. A channel of another tenant resolves exactly like a
    /// channel the user has no row on.
    #[tracing::instrument(
        level = "debug",
        name = "access::channel_role",
        skip_all,
        fields(channel.id = %channel_id, user.id = %user_id, tenant.id = %tenant_id)
    )]
    pub fn get_role(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AccessResult<ChannelRole> {
        self.store
            .channel_role(channel_id, tenant_id, user_id)?
            .ok_or_else(|| AccessError::permission_denied("not a channel member"))
    }
}
