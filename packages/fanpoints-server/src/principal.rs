//! Authenticated caller as forwarded by the trusted gateway.

use crate::Error;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fanpoints_types::{Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Who is calling. Passed explicitly into every core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn fan(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::Fan)
    }

    /// CREATOR or ADMIN.
    pub fn require_campaign_manager(&self) -> Result<(), Error> {
        if self.role.can_manage_campaigns() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), Error> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(Error::Unauthenticated)?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::default(),
            Some(raw) => raw
                .to_str()
                .map_err(|_| Error::BadInput("x-user-role is not valid text".into()))?
                .parse::<Role>()
                .map_err(|e| Error::BadInput(e.to_string()))?,
        };

        Ok(Principal::new(user_id, role))
    }
}
