use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use super::AuthUser;
use crate::entities::{branch, user};
use crate::errors::ServiceError;
use crate::AppState;

/// The user behind the current request, resolved from the bearer token and
/// the `users` table. Branch data feeds [`super::BranchAccessPolicy`].
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub name: String,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl Actor {
    /// Loads the user and branch behind an authenticated token. Unknown and
    /// deactivated users are rejected.
    pub async fn load(db: &DatabaseConnection, auth: &AuthUser) -> Result<Self, ServiceError> {
        let user_id = Uuid::parse_str(&auth.user_id)
            .map_err(|_| ServiceError::Unauthorized("token subject is not a user id".into()))?;

        let (user, branch) = user::Entity::find_by_id(user_id)
            .find_also_related(branch::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("unknown user".into()))?;

        if !user.active {
            return Err(ServiceError::Unauthorized("user is deactivated".into()));
        }

        Ok(Self {
            user_id: user.id,
            name: user.name,
            branch_id: user.branch_id,
            branch_name: branch.map(|b| b.name),
            roles: auth.roles.clone(),
            permissions: auth.permissions.clone(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthUser>()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".into()))?;

        Actor::load(&state.db, auth).await
    }
}
