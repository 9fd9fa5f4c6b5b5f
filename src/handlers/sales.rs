use crate::auth::{require_role, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, RangeQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use common::CommissionSummary;
use model::entities::user::Role;
use model::entities::{assignment, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{debug, error, instrument};

use super::users::UserResponse;

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

/// List the shopkeepers actively assigned to the acting salesman
#[utoipa::path(
    get,
    path = "/api/sales/shopkeepers",
    tag = "sales",
    responses(
        (status = 200, description = "Shopkeepers retrieved", body = ApiResponse<Vec<UserResponse>>),
        (status = 403, description = "Not a salesman", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_my_shopkeepers(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    require_role(&auth, &[Role::Salesman])?;
    debug!("Listing shopkeepers for salesman {}", auth.id());

    let assignments = assignment::Entity::find()
        .filter(assignment::Column::SalesmanId.eq(auth.id()))
        .filter(assignment::Column::IsActive.eq(true))
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to list assignments for salesman {}: {}", auth.id(), e);
            db_error()
        })?;

    let shopkeeper_ids: Vec<i32> = assignments.iter().map(|a| a.shopkeeper_id).collect();
    let shopkeepers = user::Entity::find()
        .filter(user::Column::Id.is_in(shopkeeper_ids))
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load shopkeepers: {}", e);
            db_error()
        })?;

    Ok(Json(ApiResponse::new(
        shopkeepers.into_iter().map(UserResponse::from).collect(),
        "Shopkeepers retrieved successfully",
    )))
}

/// Commission earned by the acting salesman over a date range
#[utoipa::path(
    get,
    path = "/api/sales/commission",
    tag = "sales",
    params(
        ("start_date" = Option<String>, Query, description = "Range start (YYYY-MM-DD), defaults to 30 days ago"),
        ("end_date" = Option<String>, Query, description = "Range end (YYYY-MM-DD), defaults to today"),
    ),
    responses(
        (status = 200, description = "Commission summary", body = ApiResponse<CommissionSummary>),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 403, description = "Not a salesman", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_my_commission(
    auth: AuthUser,
    Query(query): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CommissionSummary>>, ApiError> {
    require_role(&auth, &[Role::Salesman])?;

    let range = query.resolve();
    if !range.is_valid() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("start_date must not be after end_date", "INVALID_RANGE")),
        ));
    }

    let summary = compute::analytics::commission_summary(&state.db, auth.id(), range)
        .await
        .map_err(|e| {
            error!("Failed to compute commission for salesman {}: {}", auth.id(), e);
            db_error()
        })?;

    Ok(Json(ApiResponse::new(
        summary,
        "Commission summary retrieved successfully",
    )))
}
