use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::user::{self, Role};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a user (admin provisioning)
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1))]
    pub name: String,
    /// Email (must be unique)
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    /// One of superadmin, admin, salesman, shopkeeper
    pub role: String,
    pub phone: Option<String>,
    /// Commission percentage for salesmen
    pub commission_rate: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Request body for updating a user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Request body for activating/deactivating a user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetUserStatusRequest {
    pub is_active: bool,
}

/// Optional role filter for user listings
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
}

/// User response model (never exposes the password hash)
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub commission_rate: Option<Decimal>,
    pub pending_amount: Decimal,
    pub credit_limit: Option<Decimal>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role: model.role.as_str().to_string(),
            is_active: model.is_active,
            commission_rate: model.commission_rate,
            pending_amount: model.pending_amount,
            credit_limit: model.credit_limit,
            address: model.address,
            city: model.city,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request))]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    require_admin(&auth)?;
    debug!("Creating user with email: {}", request.email);

    if let Err(e) = request.validate() {
        warn!("User creation rejected, invalid payload: {}", e);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string(), "VALIDATION_ERROR")),
        ));
    }

    let role = Role::from_str(&request.role).map_err(|_| {
        warn!("Rejected unknown role '{}'", request.role);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Unknown role '{}'", request.role),
                "INVALID_ROLE",
            )),
        )
    })?;

    // Only a superadmin may mint admins or other superadmins.
    if role.is_admin() && auth.role() != Role::Superadmin {
        warn!("User {} attempted to create a privileged account", auth.id());
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "Only a superadmin can create admin accounts",
                "FORBIDDEN",
            )),
        ));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!("Failed to hash password: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Internal server error while creating user", "HASH_ERROR")),
        )
    })?;

    let new_user = user::ActiveModel {
        name: Set(request.name),
        email: Set(request.email.clone()),
        phone: Set(request.phone),
        password_hash: Set(password_hash),
        role: Set(role),
        is_active: Set(true),
        commission_rate: Set(request.commission_rate),
        pending_amount: Set(Decimal::ZERO),
        credit_limit: Set(request.credit_limit),
        address: Set(request.address),
        city: Set(request.city),
        assigned_by: Set(Some(auth.id())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_user.insert(&state.db).await {
        Ok(user_model) => {
            info!("User created with ID: {}, role: {}", user_model.id, user_model.role.as_str());
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    UserResponse::from(user_model),
                    "User created successfully",
                )),
            ))
        }
        Err(db_error) => {
            error!("Failed to create user '{}': {}", request.email, db_error);
            let message = db_error.to_string().to_lowercase();
            if message.contains("unique") || message.contains("constraint") {
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(
                        format!("Email '{}' is already registered", request.email),
                        "EMAIL_ALREADY_EXISTS",
                    )),
                ))
            } else {
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "Internal server error while creating user",
                        "DATABASE_ERROR",
                    )),
                ))
            }
        }
    }
}

/// Get all users, optionally filtered by role
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(
        ("role" = Option<String>, Query, description = "Filter by role"),
    ),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_users(
    auth: AuthUser,
    Query(query): Query<UsersQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    require_admin(&auth)?;
    debug!("Fetching users, role filter: {:?}", query.role);

    let mut finder = user::Entity::find().order_by_asc(user::Column::Id);
    if let Some(role) = &query.role {
        let role = Role::from_str(role).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Unknown role '{}'", role), "INVALID_ROLE")),
            )
        })?;
        finder = finder.filter(user::Column::Role.eq(role));
    }

    match finder.all(&state.db).await {
        Ok(users) => {
            info!("Retrieved {} users", users.len());
            Ok(Json(ApiResponse::new(
                users.into_iter().map(UserResponse::from).collect(),
                "Users retrieved successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to retrieve users: {}", db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ))
        }
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    require_admin(&auth)?;
    debug!("Fetching user with ID: {}", user_id);

    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(user_model)) => Ok(Json(ApiResponse::new(
            UserResponse::from(user_model),
            "User retrieved successfully",
        ))),
        Ok(None) => {
            warn!("User with ID {} not found", user_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("User {} not found", user_id),
                    "USER_NOT_FOUND",
                )),
            ))
        }
        Err(db_error) => {
            error!("Failed to retrieve user {}: {}", user_id, db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ))
        }
    }
}

/// Update a user's profile fields
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request))]
pub async fn update_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    require_admin(&auth)?;
    debug!("Updating user with ID: {}", user_id);

    let existing = match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(user_model)) => user_model,
        Ok(None) => {
            warn!("User with ID {} not found for update", user_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("User {} not found", user_id),
                    "USER_NOT_FOUND",
                )),
            ));
        }
        Err(db_error) => {
            error!("Failed to look up user {} for update: {}", user_id, db_error);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ));
        }
    };

    let mut active: user::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(phone) = request.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(rate) = request.commission_rate {
        active.commission_rate = Set(Some(rate));
    }
    if let Some(limit) = request.credit_limit {
        active.credit_limit = Set(Some(limit));
    }
    if let Some(address) = request.address {
        active.address = Set(Some(address));
    }
    if let Some(city) = request.city {
        active.city = Set(Some(city));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("User {} updated", user_id);
            Ok(Json(ApiResponse::new(
                UserResponse::from(updated),
                "User updated successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to update user {}: {}", user_id, db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ))
        }
    }
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn delete_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    require_admin(&auth)?;
    debug!("Deleting user with ID: {}", user_id);

    match user::Entity::delete_by_id(user_id).exec(&state.db).await {
        Ok(delete_result) if delete_result.rows_affected > 0 => {
            info!("User {} deleted", user_id);
            Ok(Json(ApiResponse::new(
                format!("User {} deleted", user_id),
                "User deleted successfully",
            )))
        }
        Ok(_) => {
            warn!("User with ID {} not found for deletion", user_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("User {} not found", user_id),
                    "USER_NOT_FOUND",
                )),
            ))
        }
        Err(db_error) => {
            error!("Failed to delete user {}: {}", user_id, db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ))
        }
    }
}

/// Activate or deactivate a user account
#[utoipa::path(
    patch,
    path = "/api/users/{user_id}/status",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = SetUserStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn set_user_status(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<SetUserStatusRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    require_admin(&auth)?;
    debug!("Setting user {} active = {}", user_id, request.is_active);

    let existing = match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(user_model)) => user_model,
        Ok(None) => {
            warn!("User with ID {} not found for status change", user_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("User {} not found", user_id),
                    "USER_NOT_FOUND",
                )),
            ));
        }
        Err(db_error) => {
            error!("Failed to look up user {}: {}", user_id, db_error);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ));
        }
    };

    let mut active: user::ActiveModel = existing.into();
    active.is_active = Set(request.is_active);

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("User {} active flag set to {}", user_id, request.is_active);
            Ok(Json(ApiResponse::new(
                UserResponse::from(updated),
                "User status updated successfully",
            )))
        }
        Err(db_error) => {
            error!("Failed to update status for user {}: {}", user_id, db_error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            ))
        }
    }
}
