/*!
 * # Access control
 *
 * Bearer-token authentication for the print-order API. Tokens are HS256 JWTs
 * carrying the user id and one of two roles. The middleware resolves the
 * token into an [`AuthUser`] request extension that handlers extract; the
 * ownership and admin rules themselves live in the order service.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;

/// The two kinds of caller the API knows about.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorRole {
    Client,
    Admin,
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub role: ActorRole,
    pub jti: String,    // JWT ID
    pub iat: i64,       // Issued at
    pub exp: i64,       // Expiration time
    pub iss: String,    // Issuer
    pub aud: String,    // Audience
}

/// Authenticated caller resolved from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub role: ActorRole,
}

impl AuthUser {
    pub fn new(user_id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }

    /// Admins may act on any order; clients only on their own.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )
    }
}

/// Issues and verifies bearer tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Signs a token for `user_id` valid for the configured lifetime.
    pub fn issue_token(&self, user_id: &str, role: ActorRole) -> Result<String, AuthError> {
        let lifetime = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        self.issue_token_with_lifetime(user_id, role, lifetime)
    }

    pub fn issue_token_with_lifetime(
        &self,
        user_id: &str,
        role: ActorRole,
        lifetime: ChronoDuration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => {
                debug!("token rejected: {}", e);
                AuthError::InvalidToken
            }
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING_TOKEN",
                "No authentication token provided".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Authentication failed".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Resolves the bearer token into an [`AuthUser`] extension or answers 401.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    auth_service.validate_token(token).map(AuthUser::from)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "unit_test_secret_with_enough_entropy_42".into(),
            "printshop-clients".into(),
            "printshop-api".into(),
            Duration::from_secs(3600),
        ))
    }

    #[test]
    fn issued_tokens_validate() {
        let auth = service();
        let token = auth.issue_token("user-1", ActorRole::Admin).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, ActorRole::Admin);
        assert!(AuthUser::from(claims).is_admin());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let auth = service();
        let token = auth
            .issue_token_with_lifetime("user-1", ActorRole::Client, ChronoDuration::minutes(-10))
            .unwrap();
        assert_matches!(auth.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn foreign_secret_or_audience_is_rejected() {
        let token = service().issue_token("user-1", ActorRole::Client).unwrap();

        let other_secret = AuthService::new(AuthConfig::new(
            "another_secret_value_that_is_long_enough".into(),
            "printshop-clients".into(),
            "printshop-api".into(),
            Duration::from_secs(3600),
        ));
        assert_matches!(other_secret.validate_token(&token), Err(AuthError::InvalidToken));

        let other_audience = AuthService::new(AuthConfig::new(
            "unit_test_secret_with_enough_entropy_42".into(),
            "someone-else".into(),
            "printshop-api".into(),
            Duration::from_secs(3600),
        ));
        assert_matches!(other_audience.validate_token(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn header_parsing() {
        let auth = service();
        let token = auth.issue_token("u-9", ActorRole::Client).unwrap();

        let mut headers = HeaderMap::new();
        assert_matches!(
            extract_auth_from_headers(&headers, &auth),
            Err(AuthError::MissingToken)
        );

        headers.insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        let user = extract_auth_from_headers(&headers, &auth).unwrap();
        assert_eq!(user, AuthUser::new("u-9", ActorRole::Client));

        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_matches!(
            extract_auth_from_headers(&headers, &auth),
            Err(AuthError::MissingToken)
        );
    }

    #[test]
    fn ownership_rule() {
        let client = AuthUser::new("alice", ActorRole::Client);
        assert!(client.can_access("alice"));
        assert!(!client.can_access("bob"));
        assert!(AuthUser::new("root", ActorRole::Admin).can_access("bob"));
    }
}
