use async_graphql::{Context, ErrorExtensions, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gql::error::GqlError;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    // Unknown roles get the least privileges
    #[serde(other)]
    Trader,
}

/// The caller as vouched for by the identity provider's token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub address: String,
    pub role: Role,
}

/// Resolve the authenticated caller from the request context.
pub fn require_user(ctx: &Context<'_>) -> Result<AuthUser> {
    ctx.data_opt::<AuthUser>()
        .cloned()
        .ok_or_else(|| GqlError::Unauthenticated.extend())
}

/// Resolve the caller and check they hold `required_role`.
pub fn require_role(ctx: &Context<'_>, required_role: Role) -> Result<AuthUser> {
    let user = require_user(ctx)?;

    if !has_required_role(user.role, required_role) {
        return Err(GqlError::Forbidden(format!(
            "{:?} privileges required, your current role is {:?}",
            required_role, user.role
        ))
        .extend());
    }

    Ok(user)
}

fn has_required_role(user_role: Role, required_role: Role) -> bool {
    match required_role {
        Role::Admin => user_role == Role::Admin,
        Role::Trader => true, // Everyone can trade
    }
}
