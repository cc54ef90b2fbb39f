use anyhow::{Context, Result};
use std::env;

use crate::config::parse_or;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration_minutes: u64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_expiration_minutes: parse_or("ACCESS_TOKEN_EXPIRATION_MINUTES", 60)?,
        })
    }
}
