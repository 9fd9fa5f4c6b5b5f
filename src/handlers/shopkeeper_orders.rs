use crate::auth::AuthUser;
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use compute::error::ComputeError;
use compute::pricing::OrderItemInput;
use model::entities::notification::NotificationKind;
use model::entities::shopkeeper_order::{self, OrderStatus};
use model::entities::user::{self, Role};
use model::entities::{assignment, shopkeeper_order_item};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// One requested line item
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
    /// Negotiated price per unit, overrides the catalog price
    pub custom_price: Option<Decimal>,
}

/// Request body for placing a shopkeeper order
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PlaceOrderRequest {
    /// Required for salesmen and admins; ignored for shopkeepers, who
    /// always order for themselves
    pub shopkeeper_id: Option<i32>,
    pub items: Vec<OrderItemRequest>,
    /// Amount paid up front, defaults to zero
    pub amount_paid: Option<Decimal>,
    pub payment_method: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of pending, confirmed, delivered, cancelled
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<shopkeeper_order_item::Model> for OrderItemResponse {
    fn from(model: shopkeeper_order_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            total_price: model.total_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub order_number: String,
    pub shopkeeper_id: i32,
    pub salesman_id: i32,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub pending_amount: Decimal,
    pub commission: Decimal,
    pub payment_status: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub(crate) fn from_parts(order: shopkeeper_order::Model, items: Vec<shopkeeper_order_item::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            shopkeeper_id: order.shopkeeper_id,
            salesman_id: order.salesman_id,
            total_amount: order.total_amount,
            amount_paid: order.amount_paid,
            pending_amount: order.pending_amount,
            commission: order.commission,
            payment_status: order.payment_status.as_str().to_string(),
            status: order.status.as_str().to_string(),
            payment_method: order.payment_method,
            delivery_address: order.delivery_address,
            notes: order.notes,
            created_at: order.created_at.to_rfc3339(),
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

fn order_not_found(order_id: i32) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            format!("Order {} not found", order_id),
            "ORDER_NOT_FOUND",
        )),
    )
}

fn assignment_denied(message: &str) -> ApiError {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new(message, "NO_ACTIVE_ASSIGNMENT")),
    )
}

/// Map pricing/balance failures onto the API error taxonomy.
pub(crate) fn map_compute_error(e: ComputeError) -> ApiError {
    match &e {
        ComputeError::ProductNotFound(_) | ComputeError::UserNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string(), "NOT_FOUND")),
        ),
        ComputeError::InsufficientStock { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string(), "INSUFFICIENT_STOCK")),
        ),
        ComputeError::InvalidQuantity { .. } | ComputeError::Amount(_) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string(), "INVALID_ORDER")),
        ),
        ComputeError::Database(db_err) => {
            error!("Order computation failed on the database: {}", db_err);
            db_error()
        }
    }
}

async fn active_assignment_for_shopkeeper(
    state: &AppState,
    shopkeeper_id: i32,
) -> Result<Option<assignment::Model>, ApiError> {
    assignment::Entity::find()
        .filter(assignment::Column::ShopkeeperId.eq(shopkeeper_id))
        .filter(assignment::Column::IsActive.eq(true))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up assignment for shopkeeper {}: {}", shopkeeper_id, e);
            db_error()
        })
}

/// Who the order is for and who gets the commission, derived from the
/// acting role and the assignment table.
async fn resolve_order_parties(
    auth: &AuthUser,
    state: &AppState,
    requested_shopkeeper: Option<i32>,
) -> Result<(i32, i32), ApiError> {
    match auth.role() {
        Role::Shopkeeper => {
            let assignment = active_assignment_for_shopkeeper(state, auth.id())
                .await?
                .ok_or_else(|| {
                    warn!("Shopkeeper {} has no active assignment", auth.id());
                    assignment_denied("You have no active salesman assignment")
                })?;
            Ok((auth.id(), assignment.salesman_id))
        }
        Role::Salesman => {
            let shopkeeper_id = requested_shopkeeper.ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("shopkeeper_id is required", "MISSING_SHOPKEEPER")),
                )
            })?;
            let assigned = assignment::Entity::find()
                .filter(assignment::Column::SalesmanId.eq(auth.id()))
                .filter(assignment::Column::ShopkeeperId.eq(shopkeeper_id))
                .filter(assignment::Column::IsActive.eq(true))
                .one(&state.db)
                .await
                .map_err(|e| {
                    error!("Failed to check assignment: {}", e);
                    db_error()
                })?;
            if assigned.is_none() {
                warn!(
                    "Salesman {} tried to order for unassigned shopkeeper {}",
                    auth.id(),
                    shopkeeper_id
                );
                return Err(assignment_denied("You are not assigned to this shopkeeper"));
            }
            Ok((shopkeeper_id, auth.id()))
        }
        Role::Admin | Role::Superadmin => {
            let shopkeeper_id = requested_shopkeeper.ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("shopkeeper_id is required", "MISSING_SHOPKEEPER")),
                )
            })?;
            let assignment = active_assignment_for_shopkeeper(state, shopkeeper_id)
                .await?
                .ok_or_else(|| {
                    warn!("Shopkeeper {} has no active assignment", shopkeeper_id);
                    assignment_denied("Shopkeeper has no active salesman assignment")
                })?;
            Ok((shopkeeper_id, assignment.salesman_id))
        }
    }
}

/// Place a shopkeeper order.
///
/// Prices each line against the catalog (custom price wins when given),
/// derives commission and payment status, writes the order and its
/// items, then folds the order's pending amount into the shopkeeper's
/// balance with a separate write and notifies admins in the background.
/// Stock is not decremented here.
#[utoipa::path(
    post,
    path = "/api/shopkeeper-orders",
    tag = "shopkeeper-orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid items or insufficient stock", body = ErrorResponse),
        (status = 403, description = "No active assignment", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request))]
pub async fn place_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ApiError> {
    debug!("Placing order as {} ({})", auth.id(), auth.role().as_str());

    let (shopkeeper_id, salesman_id) =
        resolve_order_parties(&auth, &state, request.shopkeeper_id).await?;

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
        .map_err(map_compute_error)?;

    let salesman = user::Entity::find_by_id(salesman_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load salesman {}: {}", salesman_id, e);
            db_error()
        })?
        .ok_or_else(|| {
            error!("Assignment references missing salesman {}", salesman_id);
            db_error()
        })?;

    let commission = compute::pricing::commission_for(priced.total_amount, salesman.commission_rate);
    let amount_paid = request.amount_paid.unwrap_or(Decimal::ZERO);
    if amount_paid < Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("amount_paid cannot be negative", "INVALID_ORDER")),
        ));
    }
    let (pending_amount, payment_status) =
        compute::pricing::derive_payment(priced.total_amount, amount_paid);

    let order_number = compute::numbering::next_order_number(&state.db)
        .await
        .map_err(map_compute_error)?;

    let order = shopkeeper_order::ActiveModel {
        order_number: Set(order_number.clone()),
        shopkeeper_id: Set(shopkeeper_id),
        salesman_id: Set(salesman_id),
        total_amount: Set(priced.total_amount),
        amount_paid: Set(amount_paid),
        pending_amount: Set(pending_amount),
        commission: Set(commission),
        payment_status: Set(payment_status),
        status: Set(OrderStatus::Pending),
        payment_method: Set(request.payment_method),
        delivery_address: Set(request.delivery_address),
        notes: Set(request.notes),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let order = order.insert(&state.db).await.map_err(|e| {
        error!("Failed to insert order: {}", e);
        db_error()
    })?;

    let mut items = Vec::with_capacity(priced.items.len());
    for line in &priced.items {
        let item = shopkeeper_order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: Set(line.total_price),
            ..Default::default()
        };
        // The order row is already committed; an item failure here
        // leaves a partial order behind rather than rolling back.
        let item = item.insert(&state.db).await.map_err(|e| {
            error!("Failed to insert order item for order {}: {}", order.id, e);
            db_error()
        })?;
        items.push(item);
    }

    // Second, unrelated write: fold the pending amount into the
    // shopkeeper's running balance.
    compute::balance::charge_shopkeeper(&state.db, shopkeeper_id, pending_amount)
        .await
        .map_err(map_compute_error)?;

    info!(
        "Order {} placed for shopkeeper {} by user {}, total {}",
        order_number, shopkeeper_id, auth.id(), priced.total_amount
    );

    let db = state.db.clone();
    let title = format!("New order {}", order.order_number);
    let body = format!(
        "Order {} placed for shopkeeper {} (total {})",
        order.order_number, shopkeeper_id, order.total_amount
    );
    let reference_id = Some(order.id);
    tokio::spawn(async move {
        crate::handlers::notifications::notify_admins(db, NotificationKind::Order, title, body, reference_id)
            .await;
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            OrderResponse::from_parts(order, items),
            "Order placed successfully",
        )),
    ))
}

pub(crate) async fn load_items(
    state: &AppState,
    order_id: i32,
) -> Result<Vec<shopkeeper_order_item::Model>, ApiError> {
    shopkeeper_order_item::Entity::find()
        .filter(shopkeeper_order_item::Column::OrderId.eq(order_id))
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load items for order {}: {}", order_id, e);
            db_error()
        })
}

/// List orders, scoped by role: shopkeepers see their own, salesmen see
/// orders they brokered, admins see everything.
#[utoipa::path(
    get,
    path = "/api/shopkeeper-orders",
    tag = "shopkeeper-orders",
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<OrderResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_shopkeeper_orders(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ApiError> {
    let mut finder = shopkeeper_order::Entity::find().order_by_desc(shopkeeper_order::Column::Id);
    match auth.role() {
        Role::Shopkeeper => {
            finder = finder.filter(shopkeeper_order::Column::ShopkeeperId.eq(auth.id()));
        }
        Role::Salesman => {
            finder = finder.filter(shopkeeper_order::Column::SalesmanId.eq(auth.id()));
        }
        Role::Admin | Role::Superadmin => {}
    }

    let orders = finder.all(&state.db).await.map_err(|e| {
        error!("Failed to retrieve orders: {}", e);
        db_error()
    })?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        let items = load_items(&state, order.id).await?;
        responses.push(OrderResponse::from_parts(order, items));
    }

    info!("Retrieved {} orders for user {}", responses.len(), auth.id());
    Ok(Json(ApiResponse::new(responses, "Orders retrieved successfully")))
}

fn may_view_order(auth: &AuthUser, order: &shopkeeper_order::Model) -> bool {
    match auth.role() {
        Role::Shopkeeper => order.shopkeeper_id == auth.id(),
        Role::Salesman => order.salesman_id == auth.id(),
        Role::Admin | Role::Superadmin => true,
    }
}

/// Get a specific order
#[utoipa::path(
    get,
    path = "/api/shopkeeper-orders/{order_id}",
    tag = "shopkeeper-orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_shopkeeper_order(
    auth: AuthUser,
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let order = shopkeeper_order::Entity::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve order {}: {}", order_id, e);
            db_error()
        })?
        .ok_or_else(|| order_not_found(order_id))?;

    // Out-of-scope orders read as missing rather than forbidden.
    if !may_view_order(&auth, &order) {
        warn!("User {} denied access to order {}", auth.id(), order_id);
        return Err(order_not_found(order_id));
    }

    let items = load_items(&state, order.id).await?;
    Ok(Json(ApiResponse::new(
        OrderResponse::from_parts(order, items),
        "Order retrieved successfully",
    )))
}

/// Update an order's fulfilment status
#[utoipa::path(
    patch,
    path = "/api/shopkeeper-orders/{order_id}/status",
    tag = "shopkeeper-orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn update_order_status(
    auth: AuthUser,
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let status = OrderStatus::from_str(&request.status).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Unknown status '{}'", request.status),
                "INVALID_STATUS",
            )),
        )
    })?;

    let order = shopkeeper_order::Entity::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve order {}: {}", order_id, e);
            db_error()
        })?
        .ok_or_else(|| order_not_found(order_id))?;

    // Only the brokering salesman or an admin may move the order along.
    let allowed = match auth.role() {
        Role::Salesman => order.salesman_id == auth.id(),
        Role::Admin | Role::Superadmin => true,
        Role::Shopkeeper => false,
    };
    if !allowed {
        warn!("User {} denied status update on order {}", auth.id(), order_id);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "You are not allowed to update this order",
                "FORBIDDEN",
            )),
        ));
    }

    let mut active: shopkeeper_order::ActiveModel = order.into();
    active.status = Set(status);

    let updated = active.update(&state.db).await.map_err(|e| {
        error!("Failed to update status of order {}: {}", order_id, e);
        db_error()
    })?;

    info!("Order {} status set to {}", order_id, status.as_str());
    let items = load_items(&state, updated.id).await?;
    Ok(Json(ApiResponse::new(
        OrderResponse::from_parts(updated, items),
        "Order status updated successfully",
    )))
}

/// Record a payment against an order. The payment is added to the
/// order's paid amount, payment status is re-derived, and the same
/// amount is credited against the shopkeeper's balance as a second
/// write.
#[utoipa::path(
    post,
    path = "/api/shopkeeper-orders/{order_id}/payments",
    tag = "shopkeeper-orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn record_order_payment(
    auth: AuthUser,
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    if request.amount <= Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Payment amount must be positive", "INVALID_AMOUNT")),
        ));
    }

    let order = shopkeeper_order::Entity::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve order {}: {}", order_id, e);
            db_error()
        })?
        .ok_or_else(|| order_not_found(order_id))?;

    let allowed = match auth.role() {
        Role::Salesman => order.salesman_id == auth.id(),
        Role::Admin | Role::Superadmin => true,
        Role::Shopkeeper => false,
    };
    if !allowed {
        warn!("User {} denied payment on order {}", auth.id(), order_id);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "You are not allowed to record payments for this order",
                "FORBIDDEN",
            )),
        ));
    }

    let shopkeeper_id = order.shopkeeper_id;
    let new_paid = order.amount_paid + request.amount;
    let (pending_amount, payment_status) =
        compute::pricing::derive_payment(order.total_amount, new_paid);

    let mut active: shopkeeper_order::ActiveModel = order.into();
    active.amount_paid = Set(new_paid);
    active.pending_amount = Set(pending_amount);
    active.payment_status = Set(payment_status);
    if let Some(method) = request.payment_method {
        active.payment_method = Set(Some(method));
    }

    let updated = active.update(&state.db).await.map_err(|e| {
        error!("Failed to record payment on order {}: {}", order_id, e);
        db_error()
    })?;

    compute::balance::credit_shopkeeper(&state.db, shopkeeper_id, request.amount)
        .await
        .map_err(map_compute_error)?;

    info!(
        "Payment of {} recorded on order {}, payment status now {}",
        request.amount,
        order_id,
        payment_status.as_str()
    );

    let items = load_items(&state, updated.id).await?;
    Ok(Json(ApiResponse::new(
        OrderResponse::from_parts(updated, items),
        "Payment recorded successfully",
    )))
}
