//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == permissions::ADMIN)
}

/// Rejects the request unless the caller holds `permission`
pub fn require(claims: &Claims, permission: &str) -> Result<(), ApiError> {
    if has_role(claims, permission) {
        Ok(())
    } else {
        tracing::warn!(user = %claims.sub, permission, "Permission denied");
        Err(ApiError::Forbidden(
            AuthError::MissingPermission(permission.to_string()).to_string(),
        ))
    }
}

/// Permission definitions
pub mod permissions {
    pub const ADMIN: &str = "admin";
    pub const INVOICE_READ: &str = "invoice:read";
    pub const INVOICE_WRITE: &str = "invoice:write";
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_token("user-1", vec![permissions::INVOICE_READ.to_string()], SECRET, 60).unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(has_role(&claims, permissions::INVOICE_READ));
        assert!(!has_role(&claims, permissions::INVOICE_WRITE));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token("user-1", vec![], SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_admin_has_every_permission() {
        let claims = Claims {
            sub: "root".to_string(),
            roles: vec![permissions::ADMIN.to_string()],
            exp: 0,
            iat: 0,
        };

        assert!(require(&claims, permissions::INVOICE_WRITE).is_ok());
    }

    #[test]
    fn test_missing_permission_is_forbidden() {
        let claims = Claims {
            sub: "reader".to_string(),
            roles: vec![permissions::INVOICE_READ.to_string()],
            exp: 0,
            iat: 0,
        };

        assert!(matches!(
            require(&claims, permissions::INVOICE_WRITE),
            Err(ApiError::Forbidden(_))
        ));
    }
}
