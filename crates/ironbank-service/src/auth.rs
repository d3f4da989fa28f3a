//! Authentication extractor.
//!
//! The service consumes authentication as an opaque capability: an inbound
//! request either carries a valid HS256-signed JWT whose `sub` claim names
//! the acting user, or it is rejected before any handler logic runs. Token
//! issuance lives with the identity provider, not here.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use ironbank_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated user extracted from a bearer JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// The raw subject claim from the JWT.
    pub subject: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Extract the Authorization header
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            // Extract the Bearer token
            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            let secret = state
                .config
                .auth_jwt_secret
                .as_deref()
                .ok_or(ApiError::Unauthorized)?;

            let claims = validate_token(token, secret)?;

            let user_id = claims
                .sub
                .parse::<UserId>()
                .map_err(|_| ApiError::Unauthorized)?;

            Ok(AuthUser {
                user_id,
                subject: claims.sub,
            })
        })
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    #[serde(default)]
    pub iat: i64,
}

/// Validate a JWT against the shared secret.
fn validate_token(token: &str, secret: &str) -> Result<JwtClaims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, sub: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: sub.to_string(),
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_claims() {
        let user_id = UserId::generate();
        let token = mint("s3cret", &user_id.to_string(), 3600);

        let claims = validate_token(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = mint("s3cret", &UserId::generate().to_string(), 3600);
        assert!(matches!(
            validate_token(&token, "other"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let token = mint("s3cret", &UserId::generate().to_string(), -3600);
        assert!(matches!(
            validate_token(&token, "s3cret"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(matches!(
            validate_token("not-a-jwt", "s3cret"),
            Err(ApiError::Unauthorized)
        ));
    }
}
