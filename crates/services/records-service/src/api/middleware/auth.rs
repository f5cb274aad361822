//! Bearer token authentication.
//!
//! Tokens are issued by the external auth provider and signed with a shared
//! HS256 secret. This service only verifies them.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult, JwtConfig};
use domain::UserRole;

use crate::api::state::AppState;

/// Claims read from the provider's access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<AppMetadata>,
    pub exp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    /// Application role, preferring the provider's app metadata over the top-level claim.
    pub fn user_role(&self) -> UserRole {
        self.app_metadata
            .as_ref()
            .and_then(|m| m.role.as_deref())
            .or(self.role.as_deref())
            .map(UserRole::from)
            .unwrap_or(UserRole::Staff)
    }
}

/// Verifies provider tokens against the shared secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Current authenticated user extracted from the token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        let role = claims.user_role();
        Self {
            id: claims.sub,
            email: claims.email,
            role,
        }
    }
}

/// Check if user has admin privileges.
pub fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Authentication middleware that validates bearer tokens.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)?;
    let claims = state.verifier.verify(token)?;

    request.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract bearer token from Authorization header.
fn extract_token(request: &Request<Body>) -> AppResult<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-key-for-testing-only-32chars";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&JwtConfig {
            secret: SECRET.to_string(),
            leeway_seconds: 0,
        })
    }

    fn token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(role: Option<&str>, app_role: Option<&str>, exp: i64) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: Some("teacher@example.com".to_string()),
            role: role.map(str::to_string),
            app_metadata: app_role.map(|r| AppMetadata {
                role: Some(r.to_string()),
            }),
            exp,
        }
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let issued = claims(Some("teacher"), None, in_an_hour());
        let verified = verifier().verify(&token(&issued, SECRET)).unwrap();

        assert_eq!(verified.sub, issued.sub);
        assert_eq!(verified.user_role(), UserRole::Teacher);
    }

    #[test]
    fn test_app_metadata_role_wins() {
        let c = claims(Some("authenticated"), Some("admin"), in_an_hour());
        assert_eq!(c.user_role(), UserRole::Admin);
    }

    #[test]
    fn test_unknown_role_is_staff() {
        assert_eq!(claims(Some("authenticated"), None, in_an_hour()).user_role(), UserRole::Staff);
        assert_eq!(claims(None, None, in_an_hour()).user_role(), UserRole::Staff);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let t = token(&claims(None, None, in_an_hour()), "another-secret");
        assert!(matches!(verifier().verify(&t), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let t = token(&claims(None, None, chrono::Utc::now().timestamp() - 60), SECRET);
        assert!(verifier().verify(&t).is_err());
    }

    #[test]
    fn test_require_admin() {
        let mut user = CurrentUser {
            id: Uuid::new_v4(),
            email: None,
            role: UserRole::Teacher,
        };
        assert!(matches!(require_admin(&user), Err(AppError::Forbidden)));

        user.role = UserRole::Admin;
        assert!(require_admin(&user).is_ok());
    }
}
