//! JWT access-token utilities.
//!
//! Access tokens are HS256-signed, self-contained claim sets that are never
//! stored server side. Verification accepts HS256 only and treats a token
//! whose expiry is not strictly in the future as expired.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// JWT claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID, stringified
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Absent on tokens minted from a refresh grant, since the refresh store
    /// only records the user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// Numeric user id encoded in `sub`.
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub.parse().map_err(|_| JwtError::Invalid)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("Token expired")]
    Expired,
    #[error("Token invalid")]
    Invalid,
}

/// JWT utility for minting and validating access tokens.
#[derive(Clone)]
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
}

impl JwtUtils {
    pub fn new(secret: &[u8], access_ttl: Duration) -> Self {
        let encoding_key = EncodingKey::from_secret(secret);
        let decoding_key = DecodingKey::from_secret(secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            access_ttl,
        }
    }

    /// Access token lifetime in whole seconds, as reported in `expires_in`.
    pub fn expires_in(&self) -> u64 {
        self.access_ttl.as_secs()
    }

    /// Mints an access token for `user_id` valid from now.
    pub fn generate_access_token(
        &self,
        user_id: i64,
        email: Option<&str>,
    ) -> Result<String, JwtError> {
        self.generate_access_token_at(user_id, email, Utc::now())
    }

    /// Mints an access token as if the current time were `now`.
    pub fn generate_access_token_at(
        &self,
        user_id: i64,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(self.access_ttl.as_secs()).unwrap_or(i64::MAX)),
            email: email.map(str::to_owned),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Validates signature, algorithm and expiry, returning the claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })?;

        // The library accepts exp == now; a zero-lifetime token must not be.
        if claims.exp <= Utc::now().timestamp() || claims.exp <= claims.iat {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-testing-minimum-32-chars";

    fn utils(ttl_secs: u64) -> JwtUtils {
        JwtUtils::new(TEST_SECRET, Duration::from_secs(ttl_secs))
    }

    #[test]
    fn test_generate_and_validate_token() {
        let jwt = utils(900);
        let token = jwt.generate_access_token(1, Some("ann@x.com")).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.user_id().unwrap(), 1);
        assert_eq!(claims.email.as_deref(), Some("ann@x.com"));
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(jwt.expires_in(), 900);
    }

    #[test]
    fn test_deterministic_for_same_clock_and_key() {
        let jwt = utils(900);
        let now = Utc::now();
        let first = jwt.generate_access_token_at(7, Some("a@b.c"), now).unwrap();
        let second = jwt.generate_access_token_at(7, Some("a@b.c"), now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_ttl_is_rejected_immediately() {
        let jwt = utils(0);
        let token = jwt.generate_access_token(1, None).unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_oversized_ttl_saturates_instead_of_expiring() {
        let jwt = utils(u64::MAX);
        let token = jwt.generate_access_token(1, None).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = utils(60);
        let issued = Utc::now() - chrono::Duration::hours(1);
        let token = jwt.generate_access_token_at(1, None, issued).unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = utils(900).generate_access_token(1, None).unwrap();
        let other = JwtUtils::new(
            b"another-secret-key-for-jwt-testing-32-chars!",
            Duration::from_secs(900),
        );
        assert!(matches!(other.validate_token(&token), Err(JwtError::Invalid)));
    }

    #[test]
    fn test_unexpected_algorithm_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            iat: now,
            exp: now + 900,
            email: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        assert!(matches!(utils(900).validate_token(&token), Err(JwtError::Invalid)));
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let now = Utc::now().timestamp();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD
            .encode(format!(r#"{{"sub":"1","iat":{now},"exp":{}}}"#, now + 900));
        let token = format!("{header}.{payload}.");

        assert!(utils(900).validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            utils(900).validate_token("invalid.token.here"),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "abc".to_string(),
            iat: 0,
            exp: 1,
            email: None,
        };
        assert!(claims.user_id().is_err());
    }
}
