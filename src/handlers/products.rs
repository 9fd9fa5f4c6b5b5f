use crate::auth::{require_admin, AuthUser};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::product;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for creating a product
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<i32>,
}

/// Request body for updating a product
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<i32>,
    pub is_active: Option<bool>,
}

/// Request body for adjusting stock. Positive delta restocks, negative
/// delta writes off.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateStockRequest {
    pub delta: i32,
}

/// Optional filters for product listings
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<i32>,
    /// Include inactive products (admin use)
    pub include_inactive: Option<bool>,
}

/// Product response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            category_id: model.category_id,
            image_url: model.image_url,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

fn db_error(context: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(context, "DATABASE_ERROR")),
    )
}

fn not_found(product_id: i32) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            format!("Product {} not found", product_id),
            "PRODUCT_NOT_FOUND",
        )),
    )
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created successfully", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn create_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ApiError> {
    require_admin(&auth)?;
    debug!("Creating product: {}", request.name);

    if request.price < Decimal::ZERO || request.stock < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Price and stock must be non-negative",
                "INVALID_PRODUCT",
            )),
        ));
    }

    let new_product = product::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        price: Set(request.price),
        stock: Set(request.stock),
        category_id: Set(request.category_id),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_product.insert(&state.db).await {
        Ok(model) => {
            info!("Product created with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    ProductResponse::from(model),
                    "Product created successfully",
                )),
            ))
        }
        Err(e) => {
            error!("Failed to create product: {}", e);
            Err(db_error("Internal server error while creating product"))
        }
    }
}

/// List products (active only unless include_inactive)
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(
        ("category_id" = Option<i32>, Query, description = "Filter by category"),
        ("include_inactive" = Option<bool>, Query, description = "Include inactive products"),
    ),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ApiResponse<Vec<ProductResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_products(
    Query(query): Query<ProductsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    debug!("Fetching products, filter: {:?}", query);

    let mut finder = product::Entity::find().order_by_asc(product::Column::Id);
    if let Some(category_id) = query.category_id {
        finder = finder.filter(product::Column::CategoryId.eq(category_id));
    }
    if !query.include_inactive.unwrap_or(false) {
        finder = finder.filter(product::Column::IsActive.eq(true));
    }

    match finder.all(&state.db).await {
        Ok(products) => {
            info!("Retrieved {} products", products.len());
            Ok(Json(ApiResponse::new(
                products.into_iter().map(ProductResponse::from).collect(),
                "Products retrieved successfully",
            )))
        }
        Err(e) => {
            error!("Failed to retrieve products: {}", e);
            Err(db_error("Internal server error"))
        }
    }
}

/// Get a specific product by ID
#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    tag = "products",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_product(
    Path(product_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    match product::Entity::find_by_id(product_id).one(&state.db).await {
        Ok(Some(model)) => Ok(Json(ApiResponse::new(
            ProductResponse::from(model),
            "Product retrieved successfully",
        ))),
        Ok(None) => {
            warn!("Product {} not found", product_id);
            Err(not_found(product_id))
        }
        Err(e) => {
            error!("Failed to retrieve product {}: {}", product_id, e);
            Err(db_error("Internal server error"))
        }
    }
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/products/{product_id}",
    tag = "products",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated successfully", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn update_product(
    auth: AuthUser,
    Path(product_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    require_admin(&auth)?;
    debug!("Updating product {}", product_id);

    let existing = match product::Entity::find_by_id(product_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => return Err(not_found(product_id)),
        Err(e) => {
            error!("Failed to look up product {}: {}", product_id, e);
            return Err(db_error("Internal server error"));
        }
    };

    let mut active: product::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = request.price {
        if price < Decimal::ZERO {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Price must be non-negative", "INVALID_PRODUCT")),
            ));
        }
        active.price = Set(price);
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Product {} updated", product_id);
            Ok(Json(ApiResponse::new(
                ProductResponse::from(updated),
                "Product updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update product {}: {}", product_id, e);
            Err(db_error("Internal server error"))
        }
    }
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/products/{product_id}",
    tag = "products",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn delete_product(
    auth: AuthUser,
    Path(product_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    require_admin(&auth)?;

    match product::Entity::delete_by_id(product_id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => {
            info!("Product {} deleted", product_id);
            Ok(Json(ApiResponse::new(
                format!("Product {} deleted", product_id),
                "Product deleted successfully",
            )))
        }
        Ok(_) => {
            warn!("Product {} not found for deletion", product_id);
            Err(not_found(product_id))
        }
        Err(e) => {
            error!("Failed to delete product {}: {}", product_id, e);
            Err(db_error("Internal server error"))
        }
    }
}

/// Adjust product stock by a delta. Order placement does not touch
/// stock; restocks and write-offs flow through here.
#[utoipa::path(
    patch,
    path = "/api/products/{product_id}/stock",
    tag = "products",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
    ),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Stock would go negative", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state))]
pub async fn update_stock(
    auth: AuthUser,
    Path(product_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateStockRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    require_admin(&auth)?;
    debug!("Adjusting stock for product {} by {}", product_id, request.delta);

    let existing = match product::Entity::find_by_id(product_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => return Err(not_found(product_id)),
        Err(e) => {
            error!("Failed to look up product {}: {}", product_id, e);
            return Err(db_error("Internal server error"));
        }
    };

    let new_stock = existing.stock + request.delta;
    if new_stock < 0 {
        warn!(
            "Rejected stock adjustment for product {}: {} + {} < 0",
            product_id, existing.stock, request.delta
        );
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!(
                    "Stock cannot go negative (current {}, delta {})",
                    existing.stock, request.delta
                ),
                "INVALID_STOCK_ADJUSTMENT",
            )),
        ));
    }

    let mut active: product::ActiveModel = existing.into();
    active.stock = Set(new_stock);

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Product {} stock set to {}", product_id, new_stock);
            Ok(Json(ApiResponse::new(
                ProductResponse::from(updated),
                "Stock updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update stock for product {}: {}", product_id, e);
            Err(db_error("Internal server error"))
        }
    }
}

/// Upload a product image. The file is forwarded to the configured
/// external image host and the returned URL is stored on the product.
#[utoipa::path(
    post,
    path = "/api/products/{product_id}/image",
    tag = "products",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Image uploaded", body = ApiResponse<ProductResponse>),
        (status = 400, description = "No file in request", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 502, description = "Image host unreachable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state, multipart))]
pub async fn upload_product_image(
    auth: AuthUser,
    Path(product_id): Path<i32>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    require_admin(&auth)?;
    debug!("Uploading image for product {}", product_id);

    let existing = match product::Entity::find_by_id(product_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => return Err(not_found(product_id)),
        Err(e) => {
            error!("Failed to look up product {}: {}", product_id, e);
            return Err(db_error("Internal server error"));
        }
    };

    let mut file_bytes: Option<(String, Vec<u8>)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let filename = field
                .file_name()
                .unwrap_or("upload.bin")
                .to_string();
            match field.bytes().await {
                Ok(bytes) => file_bytes = Some((filename, bytes.to_vec())),
                Err(e) => {
                    warn!("Failed to read multipart field: {}", e);
                }
            }
            break;
        }
    }
    let (filename, bytes) = file_bytes.ok_or_else(|| {
        warn!("Image upload for product {} had no file", product_id);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No image file in request", "MISSING_FILE")),
        )
    })?;

    let upstream_url = state.config.image_service_url.clone().ok_or_else(|| {
        error!("Image upload requested but no image service is configured");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(
                "Image hosting is not configured",
                "IMAGE_SERVICE_UNAVAILABLE",
            )),
        )
    })?;

    let image_url = forward_to_image_host(
        &upstream_url,
        state.config.image_service_key.as_deref(),
        filename,
        bytes,
    )
    .await
    .map_err(|e| {
        error!("Image host rejected upload for product {}: {}", product_id, e);
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(
                "Failed to upload image to hosting service",
                "IMAGE_UPLOAD_FAILED",
            )),
        )
    })?;

    let mut active: product::ActiveModel = existing.into();
    active.image_url = Set(Some(image_url));

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Image stored for product {}", product_id);
            Ok(Json(ApiResponse::new(
                ProductResponse::from(updated),
                "Image uploaded successfully",
            )))
        }
        Err(e) => {
            error!("Failed to persist image URL for product {}: {}", product_id, e);
            Err(db_error("Internal server error"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageHostResponse {
    url: String,
}

async fn forward_to_image_host(
    upstream_url: &str,
    api_key: Option<&str>,
    filename: String,
    bytes: Vec<u8>,
) -> anyhow::Result<String> {
    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
    let form = reqwest::multipart::Form::new().part("image", part);

    let client = reqwest::Client::new();
    let mut request = client.post(upstream_url).multipart(form);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?.error_for_status()?;
    let body: ImageHostResponse = response.json().await?;
    Ok(body.url)
}
