use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::category;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    /// Category name (must be unique)
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Name already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    require_admin(&auth)?;
    debug!("Creating category: {}", request.name);

    let new_category = category::ActiveModel {
        name: Set(request.name.clone()),
        description: Set(request.description),
        ..Default::default()
    };

    match new_category.insert(&state.db).await {
        Ok(model) => {
            info!("Category created with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    CategoryResponse::from(model),
                    "Category created successfully",
                )),
            ))
        }
        Err(e) => {
            error!("Failed to create category '{}': {}", request.name, e);
            let message = e.to_string().to_lowercase();
            if message.contains("unique") || message.contains("constraint") {
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(
                        format!("Category '{}' already exists", request.name),
                        "CATEGORY_ALREADY_EXISTS",
                    )),
                ))
            } else {
                Err(db_error())
            }
        }
    }
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Categories retrieved", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    match category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await
    {
        Ok(categories) => Ok(Json(ApiResponse::new(
            categories.into_iter().map(CategoryResponse::from).collect(),
            "Categories retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to retrieve categories: {}", e);
            Err(db_error())
        }
    }
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn update_category(
    auth: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    require_admin(&auth)?;

    let existing = match category::Entity::find_by_id(category_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("Category {} not found for update", category_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("Category {} not found", category_id),
                    "CATEGORY_NOT_FOUND",
                )),
            ));
        }
        Err(e) => {
            error!("Failed to look up category {}: {}", category_id, e);
            return Err(db_error());
        }
    };

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Category {} updated", category_id);
            Ok(Json(ApiResponse::new(
                CategoryResponse::from(updated),
                "Category updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update category {}: {}", category_id, e);
            Err(db_error())
        }
    }
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<String>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn delete_category(
    auth: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    require_admin(&auth)?;

    match category::Entity::delete_by_id(category_id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => {
            info!("Category {} deleted", category_id);
            Ok(Json(ApiResponse::new(
                format!("Category {} deleted", category_id),
                "Category deleted successfully",
            )))
        }
        Ok(_) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("Category {} not found", category_id),
                "CATEGORY_NOT_FOUND",
            )),
        )),
        Err(e) => {
            error!("Failed to delete category {}: {}", category_id, e);
            Err(db_error())
        }
    }
}
