/// Request authentication context
///
/// Turns an `Authorization: Bearer <token>` header into an [`AuthContext`]
/// carrying the caller's identity and role. The API server runs this from
/// its middleware layer for protected routes, and directly from handlers
/// that share a path with a public method.
///
/// # Example
///
/// ```
/// use canvass_shared::auth::jwt::{create_token, Claims, TokenType};
/// use canvass_shared::auth::middleware::authenticate_headers;
/// use canvass_shared::models::user::Role;
/// use axum::http::{header, HeaderMap};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "example-secret-key-at-least-32-bytes";
/// let claims = Claims::new(Uuid::new_v4(), Role::Pillar, TokenType::Access);
/// let token = create_token(&claims, secret)?;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, format!("Bearer {}", token).parse()?);
///
/// let auth = authenticate_headers(&headers, secret)?;
/// assert_eq!(auth.role, Role::Pillar);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::Role;

/// Authentication context added to request extensions
///
/// Carries just what authorization decisions need: who is calling and with
/// what role. The caller's visibility scope is resolved separately because
/// it costs a database lookup most handlers don't need.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Account role from the token
    pub role: Role,
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("Invalid authorization header format: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Token validation failed: {0}")]
    InvalidToken(String),
}

/// Authenticates a request from its headers
///
/// Expects an access token; a refresh token presented here is rejected.
///
/// # Errors
///
/// Returns an error if the header is missing, the token is malformed,
/// validation fails or the token has expired.
pub fn authenticate_headers(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_authenticate_headers() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Role::Candidate, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let auth = authenticate_headers(&bearer(&token), SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, Role::Candidate);
    }

    #[test]
    fn test_authenticate_missing_header() {
        let result = authenticate_headers(&HeaderMap::new(), SECRET);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_authenticate_not_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());

        let result = authenticate_headers(&headers, SECRET);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let claims = Claims::new(Uuid::new_v4(), Role::Pillar, TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        let result = authenticate_headers(&bearer(&token), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_authenticate_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), Role::Admin, TokenType::Access);
        let token = create_token(&claims, "another-secret-key-32-bytes-long!!").unwrap();

        let result = authenticate_headers(&bearer(&token), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
