use crate::schemas::{ApiError, AppState, ErrorResponse};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user::{self, Role};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bearer token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a string.
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Issue a signed token for a user.
pub fn issue_token(
    user: &user::Model,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.as_str().to_string(),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(ttl_hours)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn unauthorized(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message, "UNAUTHORIZED")),
    )
}

/// The acting user, resolved from the bearer token. Extracting this
/// fails with 401 on a missing/invalid/expired token or unknown
/// subject, and 403 when the account has been deactivated.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
}

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("Missing authorization header"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid authorization header"))?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            warn!("Token verification failed: {}", e);
            unauthorized("Invalid or expired token")
        })?;

        let user_id: i32 = token_data
            .claims
            .sub
            .parse()
            .map_err(|_| unauthorized("Invalid token subject"))?;

        let user_model = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(|e| {
                warn!("Failed to load user {} for token: {}", user_id, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "Internal server error during authentication",
                        "DATABASE_ERROR",
                    )),
                )
            })?
            .ok_or_else(|| unauthorized("Unknown user"))?;

        if !user_model.is_active {
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new("Account is deactivated", "INACTIVE_USER")),
            ));
        }

        Ok(AuthUser { user: user_model })
    }
}

/// Gate a handler to a set of roles. Returns 403 when the acting user's
/// role is not in the list.
pub fn require_role(auth: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&auth.role()) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                format!("Role '{}' is not allowed to perform this action", auth.role().as_str()),
                "FORBIDDEN",
            )),
        ))
    }
}

/// Admin-or-superadmin gate used by most management endpoints.
pub fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    require_role(auth, &[Role::Superadmin, Role::Admin])
}
