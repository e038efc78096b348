//! Session token service
//!
//! Issues and verifies the signed, stateless session token. The signing
//! secret is injected at construction from [`crate::config::ServerConfig`];
//! there is no key rotation or server-side revocation, tokens expire on
//! their own.

use crate::error::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 15;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_days: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Sign a token binding `user_id` until the configured expiry.
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let expiration = Utc::now() + self.ttl;
        let claims = Claims {
            sub: user_id.to_owned(),
            exp: expiration.timestamp().max(0) as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| Error::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    /// Verify a token and return the user id it binds. Fails on malformed
    /// input, a bad signature, or an expired `exp` claim.
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )
        .map_err(|_| Error::AuthFailInvalidToken)?;

        Ok(data.claims.sub)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_roundtrip() {
        let tokens = TokenService::new(b"test-secret".to_vec(), SESSION_TTL_DAYS);
        let token = tokens.issue("user-1").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "user-1");
    }

    #[test]
    fn garbage_token_rejected() {
        let tokens = TokenService::new(b"test-secret".to_vec(), SESSION_TTL_DAYS);
        assert!(matches!(
            tokens.verify("not-a-token"),
            Err(Error::AuthFailInvalidToken)
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let signer = TokenService::new(b"secret-a".to_vec(), SESSION_TTL_DAYS);
        let verifier = TokenService::new(b"secret-b".to_vec(), SESSION_TTL_DAYS);
        let token = signer.issue("user-1").unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(Error::AuthFailInvalidToken)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        // Negative TTL puts the expiry well past the default leeway.
        let tokens = TokenService::new(b"test-secret".to_vec(), -1);
        let token = tokens.issue("user-1").unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(Error::AuthFailInvalidToken)
        ));
    }

    #[test]
    fn tampered_token_rejected() {
        let tokens = TokenService::new(b"test-secret".to_vec(), SESSION_TTL_DAYS);
        let mut token = tokens.issue("user-1").unwrap();
        token.push('x');
        assert!(tokens.verify(&token).is_err());
    }
}
