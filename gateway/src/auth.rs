//! Connection-time authentication: a JWT whose claims carry a positive
//! numeric `id`, coerced to a string for all internal use (§4.6).

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token id must be a positive integer")]
    NonPositiveId,
}

/// Decodes and validates the handshake auth token, returning the caller's
/// `userId` as a string (§4.6: "coerce to string for all internal use").
pub fn authenticate(token: &str, jwt_secret: &str) -> Result<String, AuthError> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    if data.claims.id <= 0 {
        return Err(AuthError::NonPositiveId);
    }

    Ok(data.claims.id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_with_id(id: i64, secret: &str) -> String {
        let claims = TokenClaims {
            id,
            username: None,
            email: None,
            provider: None,
            exp: 9_999_999_999,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_stringified_id() {
        let token = token_with_id(42, "secret");
        assert_eq!(authenticate(&token, "secret").unwrap(), "42");
    }

    #[test]
    fn non_positive_id_is_rejected() {
        let token = token_with_id(0, "secret");
        assert!(matches!(authenticate(&token, "secret"), Err(AuthError::NonPositiveId)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = token_with_id(1, "secret");
        assert!(matches!(authenticate(&token, "other"), Err(AuthError::InvalidToken)));
    }
}
