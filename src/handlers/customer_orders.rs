use crate::auth::{require_role, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use compute::pricing::OrderItemInput;
use model::entities::shopkeeper_order::OrderStatus;
use model::entities::user::Role;
use model::entities::{customer_order, customer_order_item};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use super::shopkeeper_orders::OrderItemRequest;

/// Request body for a direct customer order
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCustomerOrderRequest {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub items: Vec<OrderItemRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerOrderResponse {
    pub id: i32,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub total_amount: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub items: Vec<super::shopkeeper_orders::OrderItemResponse>,
}

impl CustomerOrderResponse {
    fn from_parts(order: customer_order::Model, items: Vec<customer_order_item::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            delivery_address: order.delivery_address,
            total_amount: order.total_amount,
            status: order.status.as_str().to_string(),
            notes: order.notes,
            created_at: order.created_at.to_rfc3339(),
            items: items
                .into_iter()
                .map(|item| super::shopkeeper_orders::OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
        }
    }
}

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

fn not_found(order_id: i32) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            format!("Customer order {} not found", order_id),
            "ORDER_NOT_FOUND",
        )),
    )
}

/// Staff roles that handle walk-in customers.
const STAFF: &[Role] = &[Role::Superadmin, Role::Admin, Role::Salesman];

/// Create a direct customer order. Same pricing as shopkeeper orders
/// but with no commission and no balance accounting.
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body = CreateCustomerOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<CustomerOrderResponse>),
        (status = 400, description = "Invalid items or insufficient stock", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request))]
pub async fn create_customer_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerOrderResponse>>), ApiError> {
    require_role(&auth, STAFF)?;
    debug!("Creating customer order for {}", request.customer_name);

    let inputs: Vec<OrderItemInput> = request
        .items
        .iter()
        .map(|item| OrderItemInput {
            product_id: item.product_id,
            quantity: item.quantity,
            custom_price: item.custom_price,
        })
        .collect();

    let priced = compute::pricing::price_items(&state.db, &inputs)
        .await
        .map_err(super::shopkeeper_orders::map_compute_error)?;

    let order_number = compute::numbering::next_customer_order_number(&state.db)
        .await
        .map_err(super::shopkeeper_orders::map_compute_error)?;

    let order = customer_order::ActiveModel {
        order_number: Set(order_number),
        customer_name: Set(request.customer_name),
        customer_phone: Set(request.customer_phone),
        delivery_address: Set(request.delivery_address),
        total_amount: Set(priced.total_amount),
        status: Set(OrderStatus::Pending),
        notes: Set(request.notes),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let order = order.insert(&state.db).await.map_err(|e| {
        error!("Failed to insert customer order: {}", e);
        db_error()
    })?;

    let mut items = Vec::with_capacity(priced.items.len());
    for line in &priced.items {
        let item = customer_order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: Set(line.total_price),
            ..Default::default()
        };
        let item = item.insert(&state.db).await.map_err(|e| {
            error!("Failed to insert customer order item: {}", e);
            db_error()
        })?;
        items.push(item);
    }

    info!(
        "Customer order {} created, total {}",
        order.order_number, order.total_amount
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CustomerOrderResponse::from_parts(order, items),
            "Customer order created successfully",
        )),
    ))
}

async fn load_items(
    state: &AppState,
    order_id: i32,
) -> Result<Vec<customer_order_item::Model>, ApiError> {
    customer_order_item::Entity::find()
        .filter(customer_order_item::Column::OrderId.eq(order_id))
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load items for customer order {}: {}", order_id, e);
            db_error()
        })
}

/// List customer orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<CustomerOrderResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_customer_orders(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CustomerOrderResponse>>>, ApiError> {
    require_role(&auth, STAFF)?;

    let orders = customer_order::Entity::find()
        .order_by_desc(customer_order::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve customer orders: {}", e);
            db_error()
        })?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        let items = load_items(&state, order.id).await?;
        responses.push(CustomerOrderResponse::from_parts(order, items));
    }

    Ok(Json(ApiResponse::new(
        responses,
        "Customer orders retrieved successfully",
    )))
}

/// Get a specific customer order
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Customer order ID"),
    ),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<CustomerOrderResponse>),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_customer_order(
    auth: AuthUser,
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CustomerOrderResponse>>, ApiError> {
    require_role(&auth, STAFF)?;

    let order = customer_order::Entity::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve customer order {}: {}", order_id, e);
            db_error()
        })?
        .ok_or_else(|| not_found(order_id))?;

    let items = load_items(&state, order.id).await?;
    Ok(Json(ApiResponse::new(
        CustomerOrderResponse::from_parts(order, items),
        "Customer order retrieved successfully",
    )))
}

/// Update a customer order's status
#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/status",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Customer order ID"),
    ),
    request_body = super::shopkeeper_orders::UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<CustomerOrderResponse>),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn update_customer_order_status(
    auth: AuthUser,
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<super::shopkeeper_orders::UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<CustomerOrderResponse>>, ApiError> {
    require_role(&auth, STAFF)?;

    let status = OrderStatus::from_str(&request.status).map_err(|_| {
        warn!("Unknown customer order status '{}'", request.status);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Unknown status '{}'", request.status),
                "INVALID_STATUS",
            )),
        )
    })?;

    let order = customer_order::Entity::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve customer order {}: {}", order_id, e);
            db_error()
        })?
        .ok_or_else(|| not_found(order_id))?;

    let mut active: customer_order::ActiveModel = order.into();
    active.status = Set(status);

    let updated = active.update(&state.db).await.map_err(|e| {
        error!("Failed to update customer order {}: {}", order_id, e);
        db_error()
    })?;

    info!("Customer order {} status set to {}", order_id, status.as_str());
    let items = load_items(&state, updated.id).await?;
    Ok(Json(ApiResponse::new(
        CustomerOrderResponse::from_parts(updated, items),
        "Customer order status updated successfully",
    )))
}
