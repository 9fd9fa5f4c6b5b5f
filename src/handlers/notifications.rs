use crate::auth::AuthUser;
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::notification::{self, NotificationKind};
use model::entities::user::{self, Role};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub reference_id: Option<i32>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            body: model.body,
            kind: model.kind.as_str().to_string(),
            reference_id: model.reference_id,
            is_read: model.is_read,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Best-effort fan-out to every admin and superadmin. Run under
/// `tokio::spawn`; failures are logged and never reach the caller.
pub async fn notify_admins(
    db: DatabaseConnection,
    kind: NotificationKind,
    title: String,
    body: String,
    reference_id: Option<i32>,
) {
    let admins = match user::Entity::find()
        .filter(user::Column::Role.is_in([Role::Admin, Role::Superadmin]))
        .filter(user::Column::IsActive.eq(true))
        .all(&db)
        .await
    {
        Ok(admins) => admins,
        Err(e) => {
            warn!("Notification fan-out could not list admins: {}", e);
            return;
        }
    };

    debug!("Notifying {} admins: {}", admins.len(), title);
    for admin in admins {
        let record = notification::ActiveModel {
            recipient_id: Set(admin.id),
            title: Set(title.clone()),
            body: Set(body.clone()),
            kind: Set(kind),
            reference_id: Set(reference_id),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        if let Err(e) = record.insert(&db).await {
            warn!("Failed to write notification for admin {}: {}", admin.id, e);
        }
    }
}

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

/// List the acting user's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Notifications retrieved", body = ApiResponse<Vec<NotificationResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn get_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NotificationResponse>>>, ApiError> {
    match notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(auth.id()))
        .order_by_desc(notification::Column::CreatedAt)
        .all(&state.db)
        .await
    {
        Ok(notifications) => Ok(Json(ApiResponse::new(
            notifications.into_iter().map(NotificationResponse::from).collect(),
            "Notifications retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to retrieve notifications for user {}: {}", auth.id(), e);
            Err(db_error())
        }
    }
}

/// Mark one of the acting user's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{notification_id}/read",
    tag = "notifications",
    params(
        ("notification_id" = i32, Path, description = "Notification ID"),
    ),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<NotificationResponse>),
        (status = 404, description = "Notification not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn mark_notification_read(
    auth: AuthUser,
    Path(notification_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationResponse>>, ApiError> {
    // Scoped to the recipient so users cannot touch each other's rows.
    let existing = match notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::RecipientId.eq(auth.id()))
        .one(&state.db)
        .await
    {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!(
                "Notification {} not found for user {}",
                notification_id,
                auth.id()
            );
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("Notification {} not found", notification_id),
                    "NOTIFICATION_NOT_FOUND",
                )),
            ));
        }
        Err(e) => {
            error!("Failed to look up notification {}: {}", notification_id, e);
            return Err(db_error());
        }
    };

    let mut active: notification::ActiveModel = existing.into();
    active.is_read = Set(true);

    match active.update(&state.db).await {
        Ok(updated) => Ok(Json(ApiResponse::new(
            NotificationResponse::from(updated),
            "Notification marked as read",
        ))),
        Err(e) => {
            error!("Failed to mark notification {} read: {}", notification_id, e);
            Err(db_error())
        }
    }
}

/// Mark all of the acting user's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "All notifications marked read", body = ApiResponse<String>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn mark_all_notifications_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    use sea_orm::sea_query::Expr;

    match notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::RecipientId.eq(auth.id()))
        .filter(notification::Column::IsRead.eq(false))
        .exec(&state.db)
        .await
    {
        Ok(result) => {
            info!(
                "Marked {} notifications read for user {}",
                result.rows_affected,
                auth.id()
            );
            Ok(Json(ApiResponse::new(
                format!("{} notifications marked as read", result.rows_affected),
                "All notifications marked as read",
            )))
        }
        Err(e) => {
            error!(
                "Failed to mark notifications read for user {}: {}",
                auth.id(),
                e
            );
            Err(db_error())
        }
    }
}
