use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{assignment, user, user::Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAssignmentRequest {
    pub salesman_id: i32,
    pub shopkeeper_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    pub salesman_id: Option<i32>,
    pub shopkeeper_id: Option<i32>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub salesman_id: i32,
    pub shopkeeper_id: i32,
    pub assigned_by: i32,
    pub is_active: bool,
    pub created_at: String,
}

impl From<assignment::Model> for AssignmentResponse {
    fn from(model: assignment::Model) -> Self {
        Self {
            id: model.id,
            salesman_id: model.salesman_id,
            shopkeeper_id: model.shopkeeper_id,
            assigned_by: model.assigned_by,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

async fn load_user_with_role(
    state: &AppState,
    user_id: i32,
    expected: Role,
) -> Result<user::Model, ApiError> {
    let user_model = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up user {}: {}", user_id, e);
            db_error()
        })?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("User {} not found", user_id),
                    "USER_NOT_FOUND",
                )),
            )
        })?;
    if user_model.role != expected {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!(
                    "User {} is a {}, expected {}",
                    user_id,
                    user_model.role.as_str(),
                    expected.as_str()
                ),
                "ROLE_MISMATCH",
            )),
        ));
    }
    Ok(user_model)
}

/// Assign a salesman to a shopkeeper. Any previously active assignment
/// for the shopkeeper is deactivated first, so at most one is active.
#[utoipa::path(
    post,
    path = "/api/assignments",
    tag = "assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = ApiResponse<AssignmentResponse>),
        (status = 400, description = "Role mismatch", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn create_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssignmentResponse>>), ApiError> {
    require_admin(&auth)?;
    debug!(
        "Assigning salesman {} to shopkeeper {}",
        request.salesman_id, request.shopkeeper_id
    );

    load_user_with_role(&state, request.salesman_id, Role::Salesman).await?;
    load_user_with_role(&state, request.shopkeeper_id, Role::Shopkeeper).await?;

    // Replace rather than stack: deactivate the shopkeeper's current
    // active assignment, if any.
    let current = assignment::Entity::find()
        .filter(assignment::Column::ShopkeeperId.eq(request.shopkeeper_id))
        .filter(assignment::Column::IsActive.eq(true))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up current assignment: {}", e);
            db_error()
        })?;
    if let Some(previous) = current {
        info!(
            "Deactivating previous assignment {} for shopkeeper {}",
            previous.id, request.shopkeeper_id
        );
        let mut active: assignment::ActiveModel = previous.into();
        active.is_active = Set(false);
        active.update(&state.db).await.map_err(|e| {
            error!("Failed to deactivate previous assignment: {}", e);
            db_error()
        })?;
    }

    let new_assignment = assignment::ActiveModel {
        salesman_id: Set(request.salesman_id),
        shopkeeper_id: Set(request.shopkeeper_id),
        assigned_by: Set(auth.id()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_assignment.insert(&state.db).await {
        Ok(model) => {
            info!("Assignment created with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    AssignmentResponse::from(model),
                    "Assignment created successfully",
                )),
            ))
        }
        Err(e) => {
            error!("Failed to create assignment: {}", e);
            Err(db_error())
        }
    }
}

/// List assignments with optional filters
#[utoipa::path(
    get,
    path = "/api/assignments",
    tag = "assignments",
    params(
        ("salesman_id" = Option<i32>, Query, description = "Filter by salesman"),
        ("shopkeeper_id" = Option<i32>, Query, description = "Filter by shopkeeper"),
        ("active_only" = Option<bool>, Query, description = "Only active assignments"),
    ),
    responses(
        (status = 200, description = "Assignments retrieved", body = ApiResponse<Vec<AssignmentResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_assignments(
    auth: AuthUser,
    Query(query): Query<AssignmentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AssignmentResponse>>>, ApiError> {
    require_admin(&auth)?;

    let mut finder = assignment::Entity::find().order_by_asc(assignment::Column::Id);
    if let Some(salesman_id) = query.salesman_id {
        finder = finder.filter(assignment::Column::SalesmanId.eq(salesman_id));
    }
    if let Some(shopkeeper_id) = query.shopkeeper_id {
        finder = finder.filter(assignment::Column::ShopkeeperId.eq(shopkeeper_id));
    }
    if query.active_only.unwrap_or(false) {
        finder = finder.filter(assignment::Column::IsActive.eq(true));
    }

    match finder.all(&state.db).await {
        Ok(assignments) => Ok(Json(ApiResponse::new(
            assignments.into_iter().map(AssignmentResponse::from).collect(),
            "Assignments retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to retrieve assignments: {}", e);
            Err(db_error())
        }
    }
}

/// Deactivate an assignment
#[utoipa::path(
    patch,
    path = "/api/assignments/{assignment_id}/deactivate",
    tag = "assignments",
    params(
        ("assignment_id" = i32, Path, description = "Assignment ID"),
    ),
    responses(
        (status = 200, description = "Assignment deactivated", body = ApiResponse<AssignmentResponse>),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn deactivate_assignment(
    auth: AuthUser,
    Path(assignment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AssignmentResponse>>, ApiError> {
    require_admin(&auth)?;

    let existing = match assignment::Entity::find_by_id(assignment_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("Assignment {} not found for deactivation", assignment_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("Assignment {} not found", assignment_id),
                    "ASSIGNMENT_NOT_FOUND",
                )),
            ));
        }
        Err(e) => {
            error!("Failed to look up assignment {}: {}", assignment_id, e);
            return Err(db_error());
        }
    };

    let mut active: assignment::ActiveModel = existing.into();
    active.is_active = Set(false);

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Assignment {} deactivated", assignment_id);
            Ok(Json(ApiResponse::new(
                AssignmentResponse::from(updated),
                "Assignment deactivated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to deactivate assignment {}: {}", assignment_id, e);
            Err(db_error())
        }
    }
}
