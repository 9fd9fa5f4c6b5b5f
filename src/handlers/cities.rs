use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::city;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCityRequest {
    /// City name (must be unique)
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCityRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CityResponse {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
}

impl From<city::Model> for CityResponse {
    fn from(model: city::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            is_active: model.is_active,
        }
    }
}

fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "DATABASE_ERROR")),
    )
}

/// Create a city
#[utoipa::path(
    post,
    path = "/api/cities",
    tag = "cities",
    request_body = CreateCityRequest,
    responses(
        (status = 201, description = "City created", body = ApiResponse<CityResponse>),
        (status = 400, description = "Name already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn create_city(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateCityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CityResponse>>), ApiError> {
    require_admin(&auth)?;
    debug!("Creating city: {}", request.name);

    let new_city = city::ActiveModel {
        name: Set(request.name.clone()),
        is_active: Set(true),
        ..Default::default()
    };

    match new_city.insert(&state.db).await {
        Ok(model) => {
            info!("City created with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(CityResponse::from(model), "City created successfully")),
            ))
        }
        Err(e) => {
            error!("Failed to create city '{}': {}", request.name, e);
            let message = e.to_string().to_lowercase();
            if message.contains("unique") || message.contains("constraint") {
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(
                        format!("City '{}' already exists", request.name),
                        "CITY_ALREADY_EXISTS",
                    )),
                ))
            } else {
                Err(db_error())
            }
        }
    }
}

/// List cities
#[utoipa::path(
    get,
    path = "/api/cities",
    tag = "cities",
    responses(
        (status = 200, description = "Cities retrieved", body = ApiResponse<Vec<CityResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_cities(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CityResponse>>>, ApiError> {
    match city::Entity::find()
        .order_by_asc(city::Column::Name)
        .all(&state.db)
        .await
    {
        Ok(cities) => Ok(Json(ApiResponse::new(
            cities.into_iter().map(CityResponse::from).collect(),
            "Cities retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to retrieve cities: {}", e);
            Err(db_error())
        }
    }
}

/// Update a city
#[utoipa::path(
    put,
    path = "/api/cities/{city_id}",
    tag = "cities",
    params(
        ("city_id" = i32, Path, description = "City ID"),
    ),
    request_body = UpdateCityRequest,
    responses(
        (status = 200, description = "City updated", body = ApiResponse<CityResponse>),
        (status = 404, description = "City not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn update_city(
    auth: AuthUser,
    Path(city_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCityRequest>,
) -> Result<Json<ApiResponse<CityResponse>>, ApiError> {
    require_admin(&auth)?;

    let existing = match city::Entity::find_by_id(city_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("City {} not found for update", city_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!("City {} not found", city_id), "CITY_NOT_FOUND")),
            ));
        }
        Err(e) => {
            error!("Failed to look up city {}: {}", city_id, e);
            return Err(db_error());
        }
    };

    let mut active: city::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("City {} updated", city_id);
            Ok(Json(ApiResponse::new(
                CityResponse::from(updated),
                "City updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update city {}: {}", city_id, e);
            Err(db_error())
        }
    }
}

/// Delete a city
#[utoipa::path(
    delete,
    path = "/api/cities/{city_id}",
    tag = "cities",
    params(
        ("city_id" = i32, Path, description = "City ID"),
    ),
    responses(
        (status = 200, description = "City deleted", body = ApiResponse<String>),
        (status = 404, description = "City not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn delete_city(
    auth: AuthUser,
    Path(city_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    require_admin(&auth)?;

    match city::Entity::delete_by_id(city_id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => {
            info!("City {} deleted", city_id);
            Ok(Json(ApiResponse::new(
                format!("City {} deleted", city_id),
                "City deleted successfully",
            )))
        }
        Ok(_) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("City {} not found", city_id), "CITY_NOT_FOUND")),
        )),
        Err(e) => {
            error!("Failed to delete city {}: {}", city_id, e);
            Err(db_error())
        }
    }
}
