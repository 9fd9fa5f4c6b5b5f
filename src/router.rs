use crate::handlers::{
    analytics::get_summary,
    assignments::{create_assignment, deactivate_assignment, get_assignments},
    auth::{login, me, register},
    categories::{create_category, delete_category, get_categories, update_category},
    cities::{create_city, delete_city, get_cities, update_city},
    customer_orders::{
        create_customer_order, get_customer_order, get_customer_orders,
        update_customer_order_status,
    },
    distribution::get_distribution_overview,
    health::health_check,
    notifications::{get_notifications, mark_all_notifications_read, mark_notification_read},
    products::{
        create_product, delete_product, get_product, get_products, update_product, update_stock,
        upload_product_image,
    },
    receipts::{create_receipt, get_receipt, get_receipts},
    recoveries::{create_recovery, get_recoveries},
    sales::{get_my_commission, get_my_shopkeepers},
    shopkeeper_orders::{
        get_shopkeeper_order, get_shopkeeper_orders, place_order, record_order_payment,
        update_order_status,
    },
    shopkeepers::{get_my_balance, get_my_orders},
    users::{create_user, delete_user, get_user, get_users, set_user_status, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// CORS allow-list built from configuration. Origins that fail to parse
/// are skipped with a warning rather than taking the server down.
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring unparseable CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        // User administration
        .route("/api/users", post(create_user))
        .route("/api/users", get(get_users))
        .route("/api/users/:user_id", get(get_user))
        .route("/api/users/:user_id", put(update_user))
        .route("/api/users/:user_id", delete(delete_user))
        .route("/api/users/:user_id/status", patch(set_user_status))
        // Admin aliases for user management
        .route("/api/admin/users", get(get_users))
        .route("/api/admin/users/:user_id/status", patch(set_user_status))
        // Product catalog
        .route("/api/products", post(create_product))
        .route("/api/products", get(get_products))
        .route("/api/products/:product_id", get(get_product))
        .route("/api/products/:product_id", put(update_product))
        .route("/api/products/:product_id", delete(delete_product))
        .route("/api/products/:product_id/stock", patch(update_stock))
        .route("/api/products/:product_id/image", post(upload_product_image))
        // Categories and cities
        .route("/api/categories", post(create_category))
        .route("/api/categories", get(get_categories))
        .route("/api/categories/:category_id", put(update_category))
        .route("/api/categories/:category_id", delete(delete_category))
        .route("/api/cities", post(create_city))
        .route("/api/cities", get(get_cities))
        .route("/api/cities/:city_id", put(update_city))
        .route("/api/cities/:city_id", delete(delete_city))
        // Assignments
        .route("/api/assignments", post(create_assignment))
        .route("/api/assignments", get(get_assignments))
        .route(
            "/api/assignments/:assignment_id/deactivate",
            patch(deactivate_assignment),
        )
        // Shopkeeper orders
        .route("/api/shopkeeper-orders", post(place_order))
        .route("/api/shopkeeper-orders", get(get_shopkeeper_orders))
        .route("/api/shopkeeper-orders/:order_id", get(get_shopkeeper_order))
        .route(
            "/api/shopkeeper-orders/:order_id/status",
            patch(update_order_status),
        )
        .route(
            "/api/shopkeeper-orders/:order_id/payments",
            post(record_order_payment),
        )
        // Direct customer orders
        .route("/api/orders", post(create_customer_order))
        .route("/api/orders", get(get_customer_orders))
        .route("/api/orders/:order_id", get(get_customer_order))
        .route("/api/orders/:order_id/status", patch(update_customer_order_status))
        // Recoveries and receipts
        .route("/api/recoveries", post(create_recovery))
        .route("/api/recoveries", get(get_recoveries))
        .route("/api/receipts", post(create_receipt))
        .route("/api/receipts", get(get_receipts))
        .route("/api/receipts/:receipt_id", get(get_receipt))
        // Notifications
        .route("/api/notifications", get(get_notifications))
        .route(
            "/api/notifications/read-all",
            patch(mark_all_notifications_read),
        )
        .route(
            "/api/notifications/:notification_id/read",
            patch(mark_notification_read),
        )
        // Analytics and dashboards
        .route("/api/analytics/summary", get(get_summary))
        .route("/api/sales/shopkeepers", get(get_my_shopkeepers))
        .route("/api/sales/commission", get(get_my_commission))
        .route("/api/distribution/overview", get(get_distribution_overview))
        .route("/api/shopkeepers/balance", get(get_my_balance))
        .route("/api/shopkeepers/orders", get(get_my_orders))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(cors),
        )
        .with_state(state)
}
