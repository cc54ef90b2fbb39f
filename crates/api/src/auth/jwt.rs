use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthConfig, AuthUser, Role};
use crate::error::AppError;

/// Upper bound on token lifetime, one year.
const MAX_TTL_MINUTES: u64 = 60 * 24 * 365;

/// Access token payload issued by the identity provider.
///
/// `sub` and `role` are typed so a token naming something other than a user
/// id fails to decode instead of surfacing later as a bad argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub address: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &AuthUser, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            address: user.address.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            address: claims.address,
            role: claims.role,
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        let ttl_minutes = config.access_token_expiration_minutes.min(MAX_TTL_MINUTES) as i64;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Tokens are normally minted by the identity provider; this exists for
    /// operator tooling and tests that share the signing secret.
    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AppError> {
        let claims = Claims::for_user(user, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify signature and expiry and return the user the token was issued to.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| AuthUser::from(data.claims))
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
    }
}
