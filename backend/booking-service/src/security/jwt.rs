/// HS256 access tokens carrying the account id and role.
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

static JWT_KEYS: Lazy<RwLock<Option<SigningKeys>>> = Lazy::new(|| RwLock::new(None));

/// Install the signing secret. Must run at startup before any token work.
pub fn initialize_secret(secret: &str, ttl_secs: i64) -> Result<()> {
    if secret.is_empty() {
        return Err(anyhow!("JWT secret must not be empty"));
    }

    let mut keys = JWT_KEYS
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock on JWT keys: {}", e))?;
    *keys = Some(SigningKeys {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        ttl_secs,
    });
    Ok(())
}

pub fn generate_token(user_id: Uuid, email: &str, role: Role) -> Result<TokenResponse> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {}", e))?;
    let keys = keys
        .as_ref()
        .ok_or_else(|| anyhow!("JWT keys not initialized"))?;

    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(keys.ttl_secs)).timestamp(),
    };

    let access_token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|e| anyhow!("Failed to generate access token: {}", e))?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: keys.ttl_secs,
    })
}

pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {}", e))?;
    let keys = keys
        .as_ref()
        .ok_or_else(|| anyhow!("JWT keys not initialized"))?;

    decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))
        .map_err(|e| anyhow!("Token validation failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_generate_and_validate() {
        initialize_secret(SECRET, 3600).unwrap();
        let user_id = Uuid::new_v4();

        let token = generate_token(user_id, "owner@example.com", Role::Hotel).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.access_token.matches('.').count(), 2);

        let data = validate_token(&token.access_token).unwrap();
        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.role, Role::Hotel);
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
    }

    #[test]
    fn test_rejects_garbage() {
        initialize_secret(SECRET, 3600).unwrap();
        assert!(validate_token("not.a.token").is_err());
    }

    #[test]
    fn test_rejects_foreign_signature() {
        initialize_secret(SECRET, 3600).unwrap();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "x@example.com".into(),
            role: Role::Admin,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"someone-else"),
        )
        .unwrap();
        assert!(validate_token(&forged).is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(initialize_secret("", 60).is_err());
    }
}
