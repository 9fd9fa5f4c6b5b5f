use crate::auth::{issue_token, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::user::{self, Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::users::UserResponse;

/// Request body for self-registration. Creates a shopkeeper account;
/// other roles are provisioned by admins through the users endpoints.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub name: String,
    /// Email (must be unique)
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with bearer token and profile
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

fn internal_error(context: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(context, "DATABASE_ERROR")),
    )
}

/// Register a new shopkeeper account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResponse>>), ApiError> {
    debug!("Registering shopkeeper account for email: {}", request.email);

    if let Err(e) = request.validate() {
        warn!("Registration rejected, invalid payload: {}", e);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string(), "VALIDATION_ERROR")),
        ));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to check for existing email: {}", e);
            internal_error("Internal server error during registration")
        })?;
    if existing.is_some() {
        warn!("Registration rejected, email already in use: {}", request.email);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Email '{}' is already registered", request.email),
                "EMAIL_ALREADY_EXISTS",
            )),
        ));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal_error("Internal server error during registration")
    })?;

    let new_user = user::ActiveModel {
        name: Set(request.name),
        email: Set(request.email),
        phone: Set(request.phone),
        password_hash: Set(password_hash),
        role: Set(Role::Shopkeeper),
        is_active: Set(true),
        pending_amount: Set(rust_decimal::Decimal::ZERO),
        address: Set(request.address),
        city: Set(request.city),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_user.insert(&state.db).await {
        Ok(user_model) => {
            info!("Shopkeeper registered with ID: {}", user_model.id);
            let token = issue_token(
                &user_model,
                &state.config.jwt_secret,
                state.config.token_ttl_hours,
            )
            .map_err(|e| {
                error!("Failed to issue token after registration: {}", e);
                internal_error("Internal server error during registration")
            })?;
            let response = ApiResponse::new(
                LoginResponse {
                    token,
                    user: UserResponse::from(user_model),
                },
                "Account created successfully",
            );
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create account: {}", db_error);
            Err(internal_error("Internal server error during registration"))
        }
    }
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account deactivated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    debug!("Login attempt for email: {}", request.email);

    let invalid_credentials = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid email or password", "INVALID_CREDENTIALS")),
        )
    };

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up user for login: {}", e);
            internal_error("Internal server error during login")
        })?
        .ok_or_else(|| {
            warn!("Login failed, unknown email: {}", request.email);
            invalid_credentials()
        })?;

    let verified = bcrypt::verify(&request.password, &user_model.password_hash).map_err(|e| {
        error!("Password verification error: {}", e);
        internal_error("Internal server error during login")
    })?;
    if !verified {
        warn!("Login failed, wrong password for user {}", user_model.id);
        return Err(invalid_credentials());
    }

    if !user_model.is_active {
        warn!("Login rejected for deactivated user {}", user_model.id);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Account is deactivated", "INACTIVE_USER")),
        ));
    }

    let token = issue_token(
        &user_model,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )
    .map_err(|e| {
        error!("Failed to issue token: {}", e);
        internal_error("Internal server error during login")
    })?;

    info!("User {} logged in as {}", user_model.id, user_model.role.as_str());
    Ok(Json(ApiResponse::new(
        LoginResponse {
            token,
            user: UserResponse::from(user_model),
        },
        "Login successful",
    )))
}

/// Return the acting user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Profile retrieved", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth))]
pub async fn me(auth: AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::new(
        UserResponse::from(auth.user),
        "Profile retrieved successfully",
    ))
}
