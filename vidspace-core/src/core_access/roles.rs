//! Roles and access levels for the three grouping mechanisms
//!
//! Tenant roles and channel roles are unordered sets: checks always name the
//! roles they accept. Space access levels are totally ordered
//! (`View < Edit < Admin`), and a space owner sits above every level without
//! holding a membership row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a stored or requested role string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseRoleError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseRoleError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Tenant-level role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantRole {
    Member,
    SuperAdmin,
}

impl TenantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantRole::Member => "member",
            TenantRole::SuperAdmin => "super_admin",
        }
    }
}

impl FromStr for TenantRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(TenantRole::Member),
            "super_admin" => Ok(TenantRole::SuperAdmin),
            other => Err(ParseRoleError::new("tenant role", other)),
        }
    }
}

impl fmt::Display for TenantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel-level role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    /// Full authority over the channel's videos
    Owner,
    /// Can publish videos into the channel
    Uploader,
    /// Read-only member
    Viewer,
}

impl ChannelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelRole::Owner => "owner",
            ChannelRole::Uploader => "uploader",
            ChannelRole::Viewer => "viewer",
        }
    }
}

impl FromStr for ChannelRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(ChannelRole::Owner),
            "uploader" => Ok(ChannelRole::Uploader),
            "viewer" => Ok(ChannelRole::Viewer),
            other => Err(ParseRoleError::new("channel role", other)),
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granted access level on a space. Variant order is the grant order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    View,
    Edit,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
            AccessLevel::Admin => "admin",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(AccessLevel::View),
            "edit" => Ok(AccessLevel::Edit),
            "admin" => Ok(AccessLevel::Admin),
            other => Err(ParseRoleError::new("access level", other)),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's effective standing on a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceAccess {
    /// Creator of the space; implicit, never stored as a membership row
    Owner,
    /// Explicit grant
    Member(AccessLevel),
}

impl SpaceAccess {
    pub fn is_owner(&self) -> bool {
        matches!(self, SpaceAccess::Owner)
    }

    /// Whether this standing satisfies `minimum`. Owners satisfy every level.
    pub fn satisfies(&self, minimum: AccessLevel) -> bool {
        match self {
            SpaceAccess::Owner => true,
            SpaceAccess::Member(level) => *level >= minimum,
        }
    }

    /// External label: `owner` for creators, otherwise the stored level
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceAccess::Owner => "owner",
            SpaceAccess::Member(level) => level.as_str(),
        }
    }
}

impl fmt::Display for SpaceAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
