use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use common::SalesmanOverviewRow;
use tracing::{error, info, instrument};

/// Per-salesman distribution overview: how many shopkeepers each
/// salesman covers, what they have sold and what is outstanding.
#[utoipa::path(
    get,
    path = "/api/distribution/overview",
    tag = "distribution",
    responses(
        (status = 200, description = "Overview computed", body = ApiResponse<Vec<SalesmanOverviewRow>>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_distribution_overview(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SalesmanOverviewRow>>>, ApiError> {
    require_admin(&auth)?;

    let rows = compute::analytics::distribution_overview(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to compute distribution overview: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            )
        })?;

    info!("Distribution overview computed for {} salesmen", rows.len());
    Ok(Json(ApiResponse::new(
        rows,
        "Distribution overview retrieved successfully",
    )))
}
