//! Tenant membership validation

use super::errors::{AccessError, AccessResult};
use super::roles::TenantRole;
use super::storage::TenantStore;
use super::types::{TenantId, UserId};

/// Confirms a user belongs to a tenant and reports their tenant role.
///
/// Read-only. Resolving the tenant id from the request is the caller's job.
#[derive(Debug, Clone)]
pub struct TenantMembership<S> {
    store: S,
}

impl<S: TenantStore> TenantMembership<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(level = "debug", name = "access::tenant", skip_all, fields(tenant.id = %tenant_id, user.id = %user_id))]
    pub fn validate(&self, tenant_id: &TenantId, user_id: &UserId) -> AccessResult<TenantRole> {
        match self.store.tenant_role(tenant_id, user_id)? {
            Some(role) => Ok(role),
            None => {
                tracing::debug!("user is not a tenant member");
                Err(AccessError::permission_denied("user not in tenant"))
            }
        }
    }
}
