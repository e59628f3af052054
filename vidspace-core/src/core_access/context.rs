//! Per-request context and the collaborators that interpret it
//!
//! The transport layer copies inbound call metadata into a [`RequestContext`].
//! Identity verification and tenant extraction are pluggable so the engine
//! never depends on a particular credential format.

use super::errors::{AccessError, AccessResult};
use super::types::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key carrying the tenant id unless configured otherwise
pub const DEFAULT_TENANT_HEADER: &str = "x-tenant-id";

/// Metadata key carrying the caller's credentials
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Inbound call metadata. Keys are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    metadata: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_metadata(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.metadata.insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// Token from an `authorization: Bearer <token>` entry
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.get(AUTHORIZATION_HEADER)?;
        let (scheme, token) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }
}

/// A caller whose credentials have been verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
}

/// Turns request credentials into a verified identity
pub trait IdentityResolver: Send + Sync {
    /// Fails `Unauthenticated` when the credentials are missing or invalid
    fn resolve(&self, ctx: &RequestContext) -> AccessResult<VerifiedIdentity>;
}

/// Pulls the tenant id out of request metadata
pub trait TenantExtractor: Send + Sync {
    /// Fails `InvalidArgument` when no tenant id is present
    fn tenant_id(&self, ctx: &RequestContext) -> AccessResult<TenantId>;
}

/// Reads the tenant id from a single metadata key
#[derive(Debug, Clone)]
pub struct MetadataTenantExtractor {
    key: String,
}

impl MetadataTenantExtractor {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into().to_ascii_lowercase() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for MetadataTenantExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT_HEADER)
    }
}

impl TenantExtractor for MetadataTenantExtractor {
    fn tenant_id(&self, ctx: &RequestContext) -> AccessResult<TenantId> {
        match ctx.get(&self.key).map(str::trim) {
            Some(tenant) if !tenant.is_empty() => Ok(TenantId::from(tenant)),
            _ => Err(AccessError::invalid_argument("tenant id missing from request")),
        }
    }
}
