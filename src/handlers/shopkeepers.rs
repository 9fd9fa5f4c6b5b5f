use crate::auth::{require_role, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::shopkeeper_order;
use model::entities::user::Role;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::shopkeeper_orders::OrderResponse;

/// The acting shopkeeper's running balance
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub shopkeeper_id: i32,
    /// Outstanding amount owed across all orders
    pub pending_amount: Decimal,
    pub credit_limit: Option<Decimal>,
}

/// The acting shopkeeper's balance
#[utoipa::path(
    get,
    path = "/api/shopkeepers/balance",
    tag = "shopkeepers",
    responses(
        (status = 200, description = "Balance retrieved", body = ApiResponse<BalanceResponse>),
        (status = 403, description = "Not a shopkeeper", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth))]
pub async fn get_my_balance(auth: AuthUser) -> Result<Json<ApiResponse<BalanceResponse>>, ApiError> {
    require_role(&auth, &[Role::Shopkeeper])?;

    Ok(Json(ApiResponse::new(
        BalanceResponse {
            shopkeeper_id: auth.id(),
            pending_amount: auth.user.pending_amount,
            credit_limit: auth.user.credit_limit,
        },
        "Balance retrieved successfully",
    )))
}

/// The acting shopkeeper's orders, newest first
#[utoipa::path(
    get,
    path = "/api/shopkeepers/orders",
    tag = "shopkeepers",
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<OrderResponse>>),
        (status = 403, description = "Not a shopkeeper", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_my_orders(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ApiError> {
    require_role(&auth, &[Role::Shopkeeper])?;

    let orders = shopkeeper_order::Entity::find()
        .filter(shopkeeper_order::Column::ShopkeeperId.eq(auth.id()))
        .order_by_desc(shopkeeper_order::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve orders for shopkeeper {}: {}", auth.id(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
            )
        })?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        let items = super::shopkeeper_orders::load_items(&state, order.id).await?;
        responses.push(OrderResponse::from_parts(order, items));
    }

    Ok(Json(ApiResponse::new(responses, "Orders retrieved successfully")))
}
