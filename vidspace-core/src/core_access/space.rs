//! Spaces and space sharing resolution
//!
//! A space's creator holds implicit top-level access and never appears as a
//! membership row. Everyone else needs an explicit grant. This is the
//! opposite of channels, where the owner role is always an explicit row.

use super::errors::{AccessError, AccessResult};
use super::roles::{AccessLevel, SpaceAccess};
use super::storage::SpaceStore;
use super::types::{SpaceId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Maximum length of a space name, in characters
pub const MAX_SPACE_NAME_LEN: usize = 255;

/// An owner-created shareable collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Unique identifier
    pub id: SpaceId,

    /// Creator of the Space (has full control)
    pub owner_id: UserId,

    /// Human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// When the Space was created
    pub created_at: Timestamp,
}

impl Space {
    pub fn new(owner_id: UserId, name: String, description: Option<String>) -> Self {
        Space {
            id: SpaceId::generate(),
            owner_id,
            name,
            description,
            created_at: Timestamp::now(),
        }
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }
}

/// An explicit grant on a space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceMembership {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub level: AccessLevel,
    /// When the user was first granted access; kept across level changes
    pub joined_at: Timestamp,
    pub granted_by: UserId,
}

/// A space as seen by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceWithAccess {
    pub space: Space,
    pub access: SpaceAccess,
}

/// Manages spaces and computes space visibility for users
#[derive(Debug, Clone)]
pub struct SpaceAccessResolver<S> {
    store: S,
}

impl<S: SpaceStore> SpaceAccessResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a space owned by `owner_id`. No membership row is written.
    #[tracing::instrument(level = "debug", name = "access::create_space", skip_all, fields(owner.id = %owner_id))]
    pub fn create_space(
        &self,
        owner_id: &UserId,
        name: &str,
        description: Option<&str>,
    ) -> AccessResult<Space> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccessError::invalid_argument("space name must not be empty"));
        }
        if name.chars().count() > MAX_SPACE_NAME_LEN {
            return Err(AccessError::invalid_argument(format!(
                "space name must be at most {MAX_SPACE_NAME_LEN} characters"
            )));
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string);
        let space = Space::new(owner_id.clone(), name.to_string(), description);
        self.store.create_space(&space)?;

        tracing::info!(space.id = %space.id, "space created");
        Ok(space)
    }

    /// Grant `target` the given level. Only the owner may grant; an existing
    /// grant for the same user is overwritten.
    #[tracing::instrument(
        level = "debug",
        name = "access::add_space_member",
        skip_all,
        fields(actor.id = %actor, space.id = %space_id, target.id = %target, level = %level)
    )]
    pub fn add_member(
        &self,
        actor: &UserId,
        space_id: &SpaceId,
        target: &UserId,
        level: AccessLevel,
    ) -> AccessResult<SpaceMembership> {
        let space = self.require_owner(actor, space_id)?;

        if target.as_str().is_empty() {
            return Err(AccessError::invalid_argument("user id must not be empty"));
        }
        if space.is_owner(target) {
            return Err(AccessError::invalid_argument("space owner already has full access"));
        }

        let membership = SpaceMembership {
            space_id: space.id,
            user_id: target.clone(),
            level,
            joined_at: Timestamp::now(),
            granted_by: actor.clone(),
        };

        Ok(self.store.upsert_space_member(&membership)?)
    }

    /// Every explicit grant on the space. Owner only.
    #[tracing::instrument(level = "debug", name = "access::list_space_members", skip_all, fields(actor.id = %actor, space.id = %space_id))]
    pub fn list_members(&self, actor: &UserId, space_id: &SpaceId) -> AccessResult<Vec<SpaceMembership>> {
        let space = self.require_owner(actor, space_id)?;
        Ok(self.store.list_space_members(&space.id)?)
    }

    /// Owned spaces unioned with granted spaces, newest first
    pub fn list_spaces_for_user(&self, user_id: &UserId) -> AccessResult<Vec<SpaceWithAccess>> {
        Ok(self.store.list_spaces_for_user(user_id)?)
    }

    /// The user's standing on `space`, if any
    pub fn effective_access(&self, space: &Space, user_id: &UserId) -> AccessResult<Option<SpaceAccess>> {
        if space.is_owner(user_id) {
            return Ok(Some(SpaceAccess::Owner));
        }

        Ok(self.store.space_member_level(&space.id, user_id)?.map(SpaceAccess::Member))
    }

    /// Load the space and check the user holds at least `minimum`
    pub fn require_level(
        &self,
        space_id: &SpaceId,
        user_id: &UserId,
        minimum: AccessLevel,
    ) -> AccessResult<(Space, SpaceAccess)> {
        let space = self.get_space(space_id)?;

        match self.effective_access(&space, user_id)? {
            Some(access) if access.satisfies(minimum) => Ok((space, access)),
            Some(access) => {
                tracing::debug!(space.id = %space_id, user.id = %user_id, %access, required = %minimum, "space access level too low");
                Err(AccessError::permission_denied(format!("requires {minimum} access to space")))
            }
            None => Err(AccessError::permission_denied("no access to space")),
        }
    }

    fn get_space(&self, space_id: &SpaceId) -> AccessResult<Space> {
        self.store
            .get_space(space_id)?
            .ok_or_else(|| AccessError::not_found("space not found"))
    }

    fn require_owner(&self, actor: &UserId, space_id: &SpaceId) -> AccessResult<Space> {
        let space = self.get_space(space_id)?;

        if !space.is_owner(actor) {
            tracing::debug!(space.id = %space_id, actor.id = %actor, "actor is not the space owner");
            return Err(AccessError::permission_denied("only the space owner can manage members"));
        }

        Ok(space)
    }
}
