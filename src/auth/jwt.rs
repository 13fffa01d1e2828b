use anyhow::{Result, bail};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::models::{Claims, TokenType, UserInfo};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn sign(user_info: UserInfo, token_type: TokenType, secret: &str, ttl: usize) -> Result<String> {
    let claims = Claims {
        user_info,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn generate_access_token(user_info: UserInfo, secret: &str, ttl: usize) -> Result<String> {
    sign(user_info, TokenType::Access, secret, ttl)
}

pub fn generate_refresh_token(user_info: UserInfo, secret: &str, ttl: usize) -> Result<String> {
    sign(user_info, TokenType::Refresh, secret, ttl)
}

/// Checks signature and expiry, then that the token is of the expected kind.
pub fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;

    if claims.token_type != expected {
        bail!("expected {:?} token, got {:?}", expected, claims.token_type);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn info() -> UserInfo {
        UserInfo {
            user_id: 7,
            username: "Dave".into(),
            roles: vec![Role::Manager],
        }
    }

    #[test]
    fn access_token_round_trips_identity() {
        let token = generate_access_token(info(), "secret", 60).unwrap();
        let claims = verify_token(&token, "secret", TokenType::Access).unwrap();

        assert_eq!(claims.user_info, info());
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(info(), "secret", 60).unwrap();
        assert!(verify_token(&token, "other", TokenType::Access).is_err());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let token = generate_refresh_token(info(), "secret", 60).unwrap();
        assert!(verify_token(&token, "secret", TokenType::Access).is_err());
        assert!(verify_token(&token, "secret", TokenType::Refresh).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        // exp in the past, beyond the default 60s leeway
        let claims = Claims {
            user_info: info(),
            exp: now() - 3600,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verify_token(&token, "secret", TokenType::Access).is_err());
    }
}
