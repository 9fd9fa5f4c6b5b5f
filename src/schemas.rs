use crate::config::AppConfig;
use chrono::{Duration, NaiveDate, Utc};
use common::{
    AnalyticsSummary, CommissionSummary, DateRange, SalesmanOverviewRow, ShopkeeperLedgerRow,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Environment-driven configuration
    pub config: std::sync::Arc<AppConfig>,
    /// Cache for expensive analytics queries
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Analytics(AnalyticsSummary),
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Rejection type shared by all handlers: status plus JSON error body.
pub type ApiError = (axum::http::StatusCode, axum::response::Json<ErrorResponse>);

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
    /// Server time (RFC 3339)
    pub timestamp: String,
}

/// Query parameters for date-ranged reports (YYYY-MM-DD)
#[derive(Debug, Deserialize, ToSchema)]
pub struct RangeQuery {
    /// Start date, defaults to 30 days ago
    pub start_date: Option<NaiveDate>,
    /// End date, defaults to today
    pub end_date: Option<NaiveDate>,
}

impl RangeQuery {
    /// Resolve missing bounds against today.
    pub fn resolve(&self) -> DateRange {
        let today = Utc::now().date_naive();
        let start = self.start_date.unwrap_or(today - Duration::days(30));
        let end = self.end_date.unwrap_or(today);
        DateRange::new(start, end)
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::users::create_user,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::set_user_status,
        crate::handlers::products::create_product,
        crate::handlers::products::get_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::update_stock,
        crate::handlers::products::upload_product_image,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::cities::create_city,
        crate::handlers::cities::get_cities,
        crate::handlers::cities::update_city,
        crate::handlers::cities::delete_city,
        crate::handlers::assignments::create_assignment,
        crate::handlers::assignments::get_assignments,
        crate::handlers::assignments::deactivate_assignment,
        crate::handlers::shopkeeper_orders::place_order,
        crate::handlers::shopkeeper_orders::get_shopkeeper_orders,
        crate::handlers::shopkeeper_orders::get_shopkeeper_order,
        crate::handlers::shopkeeper_orders::update_order_status,
        crate::handlers::shopkeeper_orders::record_order_payment,
        crate::handlers::customer_orders::create_customer_order,
        crate::handlers::customer_orders::get_customer_orders,
        crate::handlers::customer_orders::get_customer_order,
        crate::handlers::customer_orders::update_customer_order_status,
        crate::handlers::recoveries::create_recovery,
        crate::handlers::recoveries::get_recoveries,
        crate::handlers::receipts::create_receipt,
        crate::handlers::receipts::get_receipts,
        crate::handlers::receipts::get_receipt,
        crate::handlers::notifications::get_notifications,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::notifications::mark_all_notifications_read,
        crate::handlers::analytics::get_summary,
        crate::handlers::sales::get_my_shopkeepers,
        crate::handlers::sales::get_my_commission,
        crate::handlers::distribution::get_distribution_overview,
        crate::handlers::shopkeepers::get_my_balance,
        crate::handlers::shopkeepers::get_my_orders,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            RangeQuery,
            AnalyticsSummary,
            ShopkeeperLedgerRow,
            CommissionSummary,
            SalesmanOverviewRow,
            DateRange,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,
            crate::handlers::users::SetUserStatusRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::products::UpdateStockRequest,
            crate::handlers::products::ProductResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::cities::CreateCityRequest,
            crate::handlers::cities::UpdateCityRequest,
            crate::handlers::cities::CityResponse,
            crate::handlers::assignments::CreateAssignmentRequest,
            crate::handlers::assignments::AssignmentResponse,
            crate::handlers::shopkeeper_orders::PlaceOrderRequest,
            crate::handlers::shopkeeper_orders::OrderItemRequest,
            crate::handlers::shopkeeper_orders::UpdateOrderStatusRequest,
            crate::handlers::shopkeeper_orders::RecordPaymentRequest,
            crate::handlers::shopkeeper_orders::OrderResponse,
            crate::handlers::shopkeeper_orders::OrderItemResponse,
            crate::handlers::customer_orders::CreateCustomerOrderRequest,
            crate::handlers::customer_orders::CustomerOrderResponse,
            crate::handlers::recoveries::CreateRecoveryRequest,
            crate::handlers::recoveries::RecoveryResponse,
            crate::handlers::receipts::CreateReceiptRequest,
            crate::handlers::receipts::ReceiptResponse,
            crate::handlers::notifications::NotificationResponse,
            crate::handlers::shopkeepers::BalanceResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, registration and profile"),
        (name = "users", description = "User administration"),
        (name = "products", description = "Product catalog"),
        (name = "categories", description = "Product categories"),
        (name = "cities", description = "Serviced cities"),
        (name = "assignments", description = "Salesman/shopkeeper assignments"),
        (name = "shopkeeper-orders", description = "Shopkeeper order placement and lifecycle"),
        (name = "orders", description = "Direct customer orders"),
        (name = "recoveries", description = "Payment collection"),
        (name = "receipts", description = "Receipts"),
        (name = "notifications", description = "In-app notifications"),
        (name = "analytics", description = "Revenue and outstanding reports"),
        (name = "sales", description = "Salesman dashboard"),
        (name = "distribution", description = "Admin distribution overview"),
        (name = "shopkeepers", description = "Shopkeeper dashboard"),
    ),
    info(
        title = "Saleflow API",
        description = "Order and distribution management backend with role-based access",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
