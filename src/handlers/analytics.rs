use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, CachedData, ErrorResponse, RangeQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use common::AnalyticsSummary;
use tracing::{debug, error, info, instrument};

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

/// Revenue, outstanding, commission and recovery totals over a date
/// range, with per-shopkeeper rows. The three source queries (orders,
/// recoveries, receipts) run independently and are merged in memory.
/// Responses are cached for a few minutes per range.
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "analytics",
    params(
        ("start_date" = Option<String>, Query, description = "Range start (YYYY-MM-DD), defaults to 30 days ago"),
        ("end_date" = Option<String>, Query, description = "Range end (YYYY-MM-DD), defaults to today"),
    ),
    responses(
        (status = 200, description = "Summary computed", body = ApiResponse<AnalyticsSummary>),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_summary(
    auth: AuthUser,
    Query(query): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AnalyticsSummary>>, ApiError> {
    require_admin(&auth)?;

    let range = query.resolve();
    if !range.is_valid() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("start_date must not be after end_date", "INVALID_RANGE")),
        ));
    }

    let cache_key = format!("analytics:{}:{}", range.start, range.end);
    if let Some(CachedData::Analytics(summary)) = state.cache.get(&cache_key).await {
        debug!("Analytics cache hit for {}", cache_key);
        return Ok(Json(ApiResponse::new(summary, "Analytics summary retrieved (cached)")));
    }

    debug!("Computing analytics summary for {} to {}", range.start, range.end);
    let summary = compute::analytics::summary(&state.db, range).await.map_err(|e| {
        error!("Failed to compute analytics summary: {}", e);
        db_error()
    })?;

    state
        .cache
        .insert(cache_key, CachedData::Analytics(summary.clone()))
        .await;

    info!(
        "Analytics summary computed: {} shopkeeper rows, revenue {}",
        summary.rows.len(),
        summary.revenue
    );
    Ok(Json(ApiResponse::new(summary, "Analytics summary retrieved successfully")))
}
