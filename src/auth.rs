//! Password hashing, access tokens, and the extractors that turn a request's
//! credentials into an explicit caller identity.
//!
//! Tokens are HS256 JWTs. They are read from `Authorization: Bearer <token>`
//! first and from the `access_token` cookie second, so browser sessions and
//! API clients share one mechanism.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::AppError};

pub const TOKEN_COOKIE: &str = "access_token";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn issue_token(
    user_id: i32,
    username: &str,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = jiff::Timestamp::now().as_second();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: now + ttl_minutes * 60,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// The authenticated caller. Using it as a handler argument makes the route
/// require a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

/// The caller if credentials were sent, `None` for anonymous requests.
/// Credentials that are present but invalid are still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

fn credentials(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(header) = parts.headers.get("authorization") {
        let header = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("invalid Authorization header".into()))?;
        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("invalid Authorization format, expected: Bearer <token>".into())
        })?;
        return Ok(Some(token.trim().to_string()));
    }

    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()))
}

/// A well-signed token whose user has since been deleted is rejected like
/// any other bad credential.
async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = credentials(parts)? else {
        return Ok(None);
    };
    let claims = validate_token(&token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".into()))?;
    let user = state
        .accounts
        .find(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".into()))?;
    Ok(Some(AuthUser { user_id: user.id, username: user.username }))
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await?.ok_or_else(|| {
            AppError::Unauthorized("authentication credentials were not provided".into())
        })
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(MaybeUser)
    }
}
