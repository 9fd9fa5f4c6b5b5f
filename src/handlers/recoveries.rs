use crate::auth::AuthUser;
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::notification::NotificationKind;
use model::entities::user::Role;
use model::entities::{assignment, recovery};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for recording a payment collection
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateRecoveryRequest {
    pub shopkeeper_id: i32,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// Day the money changed hands, defaults to today
    pub recovered_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RecoveriesQuery {
    pub shopkeeper_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecoveryResponse {
    pub id: i32,
    pub shopkeeper_id: i32,
    pub salesman_id: i32,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub recovered_at: String,
    pub created_at: String,
}

impl From<recovery::Model> for RecoveryResponse {
    fn from(model: recovery::Model) -> Self {
        Self {
            id: model.id,
            shopkeeper_id: model.shopkeeper_id,
            salesman_id: model.salesman_id,
            amount: model.amount,
            payment_method: model.payment_method,
            notes: model.notes,
            recovered_at: model.recovered_at.to_string(),
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

/// Record a recovery: a salesman collecting money from a shopkeeper.
/// Inserts the record, then reduces the shopkeeper's balance with a
/// separate write and notifies admins in the background.
#[utoipa::path(
    post,
    path = "/api/recoveries",
    tag = "recoveries",
    request_body = CreateRecoveryRequest,
    responses(
        (status = 201, description = "Recovery recorded", body = ApiResponse<RecoveryResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Not assigned to this shopkeeper", body = ErrorResponse),
        (status = 404, description = "Shopkeeper not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, request))]
pub async fn create_recovery(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateRecoveryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecoveryResponse>>), ApiError> {
    debug!(
        "Recording recovery of {} from shopkeeper {}",
        request.amount, request.shopkeeper_id
    );

    if request.amount <= Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Recovery amount must be positive", "INVALID_AMOUNT")),
        ));
    }

    // Which salesman gets credited with the collection.
    let salesman_id = match auth.role() {
        Role::Salesman => {
            let assigned = assignment::Entity::find()
                .filter(assignment::Column::SalesmanId.eq(auth.id()))
                .filter(assignment::Column::ShopkeeperId.eq(request.shopkeeper_id))
                .filter(assignment::Column::IsActive.eq(true))
                .one(&state.db)
                .await
                .map_err(|e| {
                    error!("Failed to check assignment: {}", e);
                    db_error()
                })?;
            if assigned.is_none() {
                warn!(
                    "Salesman {} tried to record recovery for unassigned shopkeeper {}",
                    auth.id(),
                    request.shopkeeper_id
                );
                return Err((
                    StatusCode::FORBIDDEN,
                    Json(ErrorResponse::new(
                        "You are not assigned to this shopkeeper",
                        "NO_ACTIVE_ASSIGNMENT",
                    )),
                ));
            }
            auth.id()
        }
        Role::Admin | Role::Superadmin => {
            // Admins record on behalf of the assigned salesman.
            let assigned = assignment::Entity::find()
                .filter(assignment::Column::ShopkeeperId.eq(request.shopkeeper_id))
                .filter(assignment::Column::IsActive.eq(true))
                .one(&state.db)
                .await
                .map_err(|e| {
                    error!("Failed to check assignment: {}", e);
                    db_error()
                })?;
            match assigned {
                Some(assignment) => assignment.salesman_id,
                None => {
                    warn!(
                        "Shopkeeper {} has no active assignment for recovery",
                        request.shopkeeper_id
                    );
                    return Err((
                        StatusCode::FORBIDDEN,
                        Json(ErrorResponse::new(
                            "Shopkeeper has no active salesman assignment",
                            "NO_ACTIVE_ASSIGNMENT",
                        )),
                    ));
                }
            }
        }
        Role::Shopkeeper => {
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new(
                    "Shopkeepers cannot record recoveries",
                    "FORBIDDEN",
                )),
            ));
        }
    };

    let record = recovery::ActiveModel {
        shopkeeper_id: Set(request.shopkeeper_id),
        salesman_id: Set(salesman_id),
        amount: Set(request.amount),
        payment_method: Set(request.payment_method),
        notes: Set(request.notes),
        recovered_at: Set(request
            .recovered_at
            .unwrap_or_else(|| chrono::Utc::now().date_naive())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let recovery_model = record.insert(&state.db).await.map_err(|e| {
        error!("Failed to insert recovery: {}", e);
        db_error()
    })?;

    // Second write against the users table; no shared transaction.
    compute::balance::credit_shopkeeper(&state.db, request.shopkeeper_id, request.amount)
        .await
        .map_err(super::shopkeeper_orders::map_compute_error)?;

    info!(
        "Recovery {} of {} recorded for shopkeeper {}",
        recovery_model.id, request.amount, request.shopkeeper_id
    );

    let db = state.db.clone();
    let title = "Payment recovered".to_string();
    let body = format!(
        "Salesman {} recovered {} from shopkeeper {}",
        salesman_id, recovery_model.amount, recovery_model.shopkeeper_id
    );
    let reference_id = Some(recovery_model.id);
    tokio::spawn(async move {
        crate::handlers::notifications::notify_admins(
            db,
            NotificationKind::Recovery,
            title,
            body,
            reference_id,
        )
        .await;
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            RecoveryResponse::from(recovery_model),
            "Recovery recorded successfully",
        )),
    ))
}

/// List recoveries, scoped by role: salesmen see their own collections,
/// shopkeepers see payments collected from them, admins see everything.
#[utoipa::path(
    get,
    path = "/api/recoveries",
    tag = "recoveries",
    params(
        ("shopkeeper_id" = Option<i32>, Query, description = "Filter by shopkeeper"),
    ),
    responses(
        (status = 200, description = "Recoveries retrieved", body = ApiResponse<Vec<RecoveryResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_recoveries(
    auth: AuthUser,
    Query(query): Query<RecoveriesQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RecoveryResponse>>>, ApiError> {
    let mut finder = recovery::Entity::find().order_by_desc(recovery::Column::Id);
    match auth.role() {
        Role::Salesman => {
            finder = finder.filter(recovery::Column::SalesmanId.eq(auth.id()));
        }
        Role::Shopkeeper => {
            finder = finder.filter(recovery::Column::ShopkeeperId.eq(auth.id()));
        }
        Role::Admin | Role::Superadmin => {}
    }
    if let Some(shopkeeper_id) = query.shopkeeper_id {
        finder = finder.filter(recovery::Column::ShopkeeperId.eq(shopkeeper_id));
    }

    match finder.all(&state.db).await {
        Ok(recoveries) => Ok(Json(ApiResponse::new(
            recoveries.into_iter().map(RecoveryResponse::from).collect(),
            "Recoveries retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to retrieve recoveries: {}", e);
            Err(db_error())
        }
    }
}
