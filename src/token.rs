use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Default lifetime for tokens issued at login.
pub fn default_ttl() -> Duration {
    Duration::days(3)
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // subject (user email)
    exp: usize,  // expiration time as UTC timestamp
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Issues and verifies HS256-signed bearer tokens.
///
/// The keys are derived once from the server secret at startup; verification
/// is pinned to HS256 so tokens carrying any other algorithm are rejected
/// outright.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No grace period: a token is expired the moment `exp` passes.
        validation.leeway = 0;
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Encode a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration) -> String {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .expect("valid timestamp")
            .timestamp() as usize;

        let claims = Claims {
            sub: subject.to_owned(),
            exp: expiration,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .expect("HS256 signing of serializable claims cannot fail")
    }

    /// Decode a token, checking signature and expiry, and return its subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
