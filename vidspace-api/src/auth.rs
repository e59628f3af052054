//! Bearer-token authentication
//!
//! Callers present `authorization: Bearer <jwt>`. Tokens are HS256-signed
//! with the shared secret from `[auth]`; the `sub` claim is the user id.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use vidspace_core::config::AuthConfig;
use vidspace_core::core_access::{
    AccessError, AccessResult, IdentityResolver, RequestContext, UserId, VerifiedIdentity,
};

use crate::error::{ApiError, ApiResult};

/// Claims carried by a vidspace access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: u64,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

fn secret_from(auth: &AuthConfig) -> ApiResult<&[u8]> {
    match auth.jwt_secret.as_deref() {
        Some(secret) if !secret.is_empty() => Ok(secret.as_bytes()),
        _ => Err(ApiError::AuthConfig("auth.jwt_secret is not set".to_string())),
    }
}

/// Verifies bearer tokens and turns their claims into a [`VerifiedIdentity`]
#[derive(Clone)]
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &[u8], issuer: Option<&str>, audience: Option<&str>, leeway: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway.as_secs();
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> ApiResult<Self> {
        Ok(Self::new(
            secret_from(auth)?,
            auth.jwt_issuer.as_deref(),
            auth.jwt_audience.as_deref(),
            auth.leeway,
        ))
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, ctx: &RequestContext) -> AccessResult<VerifiedIdentity> {
        let token = ctx
            .bearer_token()
            .ok_or_else(|| AccessError::unauthenticated("missing bearer token"))?;

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AccessError::unauthenticated("invalid token")
            })?
            .claims;

        let sub = claims.sub.trim();
        if sub.is_empty() {
            return Err(AccessError::unauthenticated("token has no subject"));
        }

        Ok(VerifiedIdentity {
            user_id: UserId::from(sub),
            display_name: claims.name.unwrap_or_else(|| sub.to_string()),
            email: claims.email.unwrap_or_default(),
        })
    }
}

/// Signs access tokens. Used by the admin CLI and tests.
pub struct TokenIssuer {
    key: EncodingKey,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], issuer: Option<String>, audience: Option<String>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            issuer,
            audience,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> ApiResult<Self> {
        Ok(Self::new(secret_from(auth)?, auth.jwt_issuer.clone(), auth.jwt_audience.clone()))
    }

    /// Claims for `user` valid for `ttl` from now
    pub fn claims_for(&self, user: &str, name: Option<&str>, email: Option<&str>, ttl: Duration) -> Claims {
        let now = jsonwebtoken::get_current_timestamp();
        Claims {
            sub: user.to_string(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            iat: now,
            exp: now + ttl.as_secs(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        }
    }

    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| ApiError::AuthConfig(format!("failed to sign token: {e}")))
    }

    pub fn issue(&self, user: &str, name: Option<&str>, email: Option<&str>, ttl: Duration) -> ApiResult<String> {
        self.sign(&self.claims_for(user, name, email, ttl))
    }
}
