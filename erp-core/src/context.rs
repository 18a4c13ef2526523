//! Request-scoped identity context.
//!
//! Built once per request by the authentication middleware and passed
//! explicitly to every component that needs to know who is acting. Nothing
//! in the service reads identity from ambient state.

use crate::authz::Role;
use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub locale: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Permission gate. Returns `Forbidden` without side effects when the
    /// current role does not carry the permission.
    pub fn authorize(&self, permission: &str) -> Result<(), AppError> {
        if self.role.is_authorized(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "permission denied: {}",
                permission
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> RequestContext {
        RequestContext {
            user_id: Uuid::new_v4(),
            username: "tester".to_string(),
            role,
            locale: "en".to_string(),
            ip: None,
            user_agent: None,
        }
    }

    #[test]
    fn authorize_maps_denial_to_forbidden() {
        assert!(ctx(Role::Manager).authorize("sales.view").is_ok());
        let err = ctx(Role::Employee).authorize("users.delete").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
