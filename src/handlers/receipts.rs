use crate::auth::{require_role, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::receipt;
use model::entities::user::Role;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for issuing a receipt
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReceiptRequest {
    pub shopkeeper_id: i32,
    /// Order this receipt settles, when applicable
    pub order_id: Option<i32>,
    pub amount: Decimal,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptResponse {
    pub id: i32,
    pub receipt_number: String,
    pub shopkeeper_id: i32,
    pub order_id: Option<i32>,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub issued_by: i32,
    pub created_at: String,
}

impl From<receipt::Model> for ReceiptResponse {
    fn from(model: receipt::Model) -> Self {
        Self {
            id: model.id,
            receipt_number: model.receipt_number,
            shopkeeper_id: model.shopkeeper_id,
            order_id: model.order_id,
            amount: model.amount,
            payment_method: model.payment_method,
            issued_by: model.issued_by,
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

const ISSUERS: &[Role] = &[Role::Superadmin, Role::Admin, Role::Salesman];

/// Issue a receipt. The receipt number is derived from the current row
/// count, so it reflects creation order rather than a reserved sequence.
#[utoipa::path(
    post,
    path = "/api/receipts",
    tag = "receipts",
    request_body = CreateReceiptRequest,
    responses(
        (status = 201, description = "Receipt issued", body = ApiResponse<ReceiptResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request))]
pub async fn create_receipt(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateReceiptRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReceiptResponse>>), ApiError> {
    require_role(&auth, ISSUERS)?;
    debug!(
        "Issuing receipt of {} for shopkeeper {}",
        request.amount, request.shopkeeper_id
    );

    if request.amount <= Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Receipt amount must be positive", "INVALID_AMOUNT")),
        ));
    }

    let receipt_number = compute::numbering::next_receipt_number(&state.db)
        .await
        .map_err(super::shopkeeper_orders::map_compute_error)?;

    let record = receipt::ActiveModel {
        receipt_number: Set(receipt_number.clone()),
        shopkeeper_id: Set(request.shopkeeper_id),
        order_id: Set(request.order_id),
        amount: Set(request.amount),
        payment_method: Set(request.payment_method),
        issued_by: Set(auth.id()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match record.insert(&state.db).await {
        Ok(model) => {
            info!("Receipt {} issued by user {}", receipt_number, auth.id());
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    ReceiptResponse::from(model),
                    "Receipt issued successfully",
                )),
            ))
        }
        Err(e) => {
            error!("Failed to insert receipt {}: {}", receipt_number, e);
            Err(db_error())
        }
    }
}

/// List receipts, scoped by role: shopkeepers see receipts issued to
/// them, salesmen see receipts they issued, admins see everything.
#[utoipa::path(
    get,
    path = "/api/receipts",
    tag = "receipts",
    responses(
        (status = 200, description = "Receipts retrieved", body = ApiResponse<Vec<ReceiptResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_receipts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ReceiptResponse>>>, ApiError> {
    let mut finder = receipt::Entity::find().order_by_desc(receipt::Column::Id);
    match auth.role() {
        Role::Shopkeeper => {
            finder = finder.filter(receipt::Column::ShopkeeperId.eq(auth.id()));
        }
        Role::Salesman => {
            finder = finder.filter(receipt::Column::IssuedBy.eq(auth.id()));
        }
        Role::Admin | Role::Superadmin => {}
    }

    match finder.all(&state.db).await {
        Ok(receipts) => Ok(Json(ApiResponse::new(
            receipts.into_iter().map(ReceiptResponse::from).collect(),
            "Receipts retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to retrieve receipts: {}", e);
            Err(db_error())
        }
    }
}

/// Get a specific receipt
#[utoipa::path(
    get,
    path = "/api/receipts/{receipt_id}",
    tag = "receipts",
    params(
        ("receipt_id" = i32, Path, description = "Receipt ID"),
    ),
    responses(
        (status = 200, description = "Receipt retrieved", body = ApiResponse<ReceiptResponse>),
        (status = 404, description = "Receipt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_receipt(
    auth: AuthUser,
    Path(receipt_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReceiptResponse>>, ApiError> {
    let receipt_model = receipt::Entity::find_by_id(receipt_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve receipt {}: {}", receipt_id, e);
            db_error()
        })?
        .ok_or_else(|| {
            warn!("Receipt {} not found", receipt_id);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("Receipt {} not found", receipt_id),
                    "RECEIPT_NOT_FOUND",
                )),
            )
        })?;

    let visible = match auth.role() {
        Role::Shopkeeper => receipt_model.shopkeeper_id == auth.id(),
        Role::Salesman => receipt_model.issued_by == auth.id(),
        Role::Admin | Role::Superadmin => true,
    };
    if !visible {
        warn!("User {} denied access to receipt {}", auth.id(), receipt_id);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("Receipt {} not found", receipt_id),
                "RECEIPT_NOT_FOUND",
            )),
        ));
    }

    Ok(Json(ApiResponse::new(
        ReceiptResponse::from(receipt_model),
        "Receipt retrieved successfully",
    )))
}
