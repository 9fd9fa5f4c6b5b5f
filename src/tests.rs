#[cfg(test)]
mod integration_tests {
    use crate::handlers::assignments::CreateAssignmentRequest;
    use crate::handlers::auth::{LoginRequest, RegisterRequest};
    use crate::handlers::categories::CreateCategoryRequest;
    use crate::handlers::cities::CreateCityRequest;
    use crate::handlers::customer_orders::CreateCustomerOrderRequest;
    use crate::handlers::products::{CreateProductRequest, UpdateStockRequest};
    use crate::handlers::receipts::CreateReceiptRequest;
    use crate::handlers::recoveries::CreateRecoveryRequest;
    use crate::handlers::shopkeeper_orders::{
        OrderItemRequest, PlaceOrderRequest, RecordPaymentRequest, UpdateOrderStatusRequest,
    };
    use crate::handlers::users::CreateUserRequest;
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        seed_assignment, seed_product, seed_user, setup_test_app,
    };
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::{TestRequest, TestServer};
    use model::entities::user::{self, Role};
    use model::entities::{notification, shopkeeper_order};
    use rust_decimal::Decimal;
    use sea_orm::EntityTrait;

    fn with_token(request: TestRequest, token: &str) -> TestRequest {
        request.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/login")
            .json(&LoginRequest {
                email: "sam@test.local".to_string(),
                password: "password123".to_string(),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        let token = body.data["token"].as_str().unwrap().to_string();
        assert_eq!(body.data["user"]["role"], "salesman");

        let me = with_token(server.get("/api/auth/me"), &token).await;
        me.assert_status(StatusCode::OK);
        let me_body: ApiResponse<serde_json::Value> = me.json();
        assert_eq!(me_body.data["id"], env.salesman.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (app, _env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/login")
            .json(&LoginRequest {
                email: "sam@test.local".to_string(),
                password: "not-the-password".to_string(),
            })
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_creates_shopkeeper() {
        let (app, _env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/register")
            .json(&RegisterRequest {
                name: "New Shop".to_string(),
                email: "newshop@test.local".to_string(),
                password: "hunter22".to_string(),
                phone: None,
                address: None,
                city: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["user"]["role"], "shopkeeper");

        // The returned token is immediately usable.
        let token = body.data["token"].as_str().unwrap().to_string();
        let me = with_token(server.get("/api/auth/me"), &token).await;
        me.assert_status(StatusCode::OK);

        // Malformed email and short password are rejected up front.
        let bad = server
            .post("/api/auth/register")
            .json(&RegisterRequest {
                name: "Bad Shop".to_string(),
                email: "not-an-email".to_string(),
                password: "short".to_string(),
                phone: None,
                address: None,
                city: None,
            })
            .await;
        bad.assert_status(StatusCode::BAD_REQUEST);

        // Duplicate email is rejected.
        let again = server
            .post("/api/auth/register")
            .json(&RegisterRequest {
                name: "New Shop".to_string(),
                email: "newshop@test.local".to_string(),
                password: "hunter22".to_string(),
                phone: None,
                address: None,
                city: None,
            })
            .await;
        again.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_users_endpoint_requires_admin() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // No token at all.
        let response = server.get("/api/users").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Shopkeeper token.
        let token = env.token_for(&env.shopkeeper);
        let response = with_token(server.get("/api/users"), &token).await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Admin token.
        let token = env.token_for(&env.admin);
        let response = with_token(server.get("/api/users"), &token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 4);
    }

    #[tokio::test]
    async fn test_only_superadmin_creates_admins() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let request = CreateUserRequest {
            name: "Second Admin".to_string(),
            email: "admin2@test.local".to_string(),
            password: "password123".to_string(),
            role: "admin".to_string(),
            phone: None,
            commission_rate: None,
            credit_limit: None,
            address: None,
            city: None,
        };

        let admin_token = env.token_for(&env.admin);
        let response = with_token(server.post("/api/users").json(&request), &admin_token).await;
        response.assert_status(StatusCode::FORBIDDEN);

        let root_token = env.token_for(&env.superadmin);
        let response = with_token(server.post("/api/users").json(&request), &root_token).await;
        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_login() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin_token = env.token_for(&env.admin);
        let response = with_token(
            server
                .patch(&format!("/api/users/{}/status", env.shopkeeper.id))
                .json(&serde_json::json!({"is_active": false})),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::OK);

        let login = server
            .post("/api/auth/login")
            .json(&LoginRequest {
                email: "shop@test.local".to_string(),
                password: "password123".to_string(),
            })
            .await;
        login.assert_status(StatusCode::FORBIDDEN);

        // Existing tokens stop working too.
        let stale = env.token_for(&env.shopkeeper);
        let me = with_token(server.get("/api/auth/me"), &stale).await;
        me.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_product_crud_and_stock() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin_token = env.token_for(&env.admin);

        let response = with_token(
            server.post("/api/products").json(&CreateProductRequest {
                name: "Tea 500g".to_string(),
                description: Some("Loose leaf".to_string()),
                price: Decimal::new(250, 0),
                stock: 40,
                category_id: None,
            }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        let product_id = body.data["id"].as_i64().unwrap();

        // Listing is public.
        let listing = server.get("/api/products").await;
        listing.assert_status(StatusCode::OK);
        let listing_body: ApiResponse<Vec<serde_json::Value>> = listing.json();
        assert_eq!(listing_body.data.len(), 1);

        // Restock.
        let response = with_token(
            server
                .patch(&format!("/api/products/{}/stock", product_id))
                .json(&UpdateStockRequest { delta: 10 }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["stock"], 50);

        // Write-off below zero is rejected.
        let response = with_token(
            server
                .patch(&format!("/api/products/{}/stock", product_id))
                .json(&UpdateStockRequest { delta: -60 }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Mutations are admin-only.
        let salesman_token = env.token_for(&env.salesman);
        let response = with_token(
            server
                .patch(&format!("/api/products/{}/stock", product_id))
                .json(&UpdateStockRequest { delta: 1 }),
            &salesman_token,
        )
        .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let missing = server.get("/api/products/9999").await;
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_and_city_round_trip() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin_token = env.token_for(&env.admin);

        let response = with_token(
            server.post("/api/categories").json(&CreateCategoryRequest {
                name: "Beverages".to_string(),
                description: None,
            }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);

        let response = with_token(
            server.post("/api/cities").json(&CreateCityRequest {
                name: "Lahore".to_string(),
            }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);

        let categories = server.get("/api/categories").await;
        categories.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = categories.json();
        assert_eq!(body.data[0]["name"], "Beverages");

        let cities = server.get("/api/cities").await;
        cities.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = cities.json();
        assert_eq!(body.data[0]["name"], "Lahore");
    }

    #[tokio::test]
    async fn test_assignment_replacement() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin_token = env.token_for(&env.admin);

        let other_salesman = seed_user(
            &env.state.db,
            "Other Salesman",
            "other@test.local",
            Role::Salesman,
            None,
        )
        .await;

        let response = with_token(
            server.post("/api/assignments").json(&CreateAssignmentRequest {
                salesman_id: env.salesman.id,
                shopkeeper_id: env.shopkeeper.id,
            }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);
        let first: ApiResponse<serde_json::Value> = response.json();
        let first_id = first.data["id"].as_i64().unwrap();

        // Re-assigning the shopkeeper deactivates the first assignment.
        let response = with_token(
            server.post("/api/assignments").json(&CreateAssignmentRequest {
                salesman_id: other_salesman.id,
                shopkeeper_id: env.shopkeeper.id,
            }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);

        let response = with_token(
            server.get("/api/assignments?active_only=true"),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["salesman_id"], other_salesman.id);
        assert_ne!(body.data[0]["id"], first_id);

        // Role mismatch is rejected.
        let response = with_token(
            server.post("/api/assignments").json(&CreateAssignmentRequest {
                salesman_id: env.shopkeeper.id,
                shopkeeper_id: env.salesman.id,
            }),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_place_order_worked_example() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Product at 100, salesman on 10% commission, 150 paid up front.
        let product = seed_product(&env.state.db, "Sugar 1kg", Decimal::new(100, 0), 10).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 3,
                    custom_price: None,
                }],
                amount_paid: Some(Decimal::new(150, 0)),
                payment_method: Some("cash".to_string()),
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["order_number"], "ORD-00001");
        assert_eq!(body.data["total_amount"], "300");
        assert_eq!(body.data["pending_amount"], "150");
        assert_eq!(body.data["payment_status"], "partial");
        let commission: Decimal = body.data["commission"].as_str().unwrap().parse().unwrap();
        assert_eq!(commission, Decimal::new(30, 0));
        assert_eq!(body.data["items"].as_array().unwrap().len(), 1);

        // Balance went up by the order's pending amount.
        let shopkeeper = user::Entity::find_by_id(env.shopkeeper.id)
            .one(&env.state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shopkeeper.pending_amount, Decimal::new(150, 0));

        // Stock is untouched by placement.
        let product = model::entities::product::Entity::find_by_id(product.id)
            .one(&env.state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock, 10);
    }

    #[tokio::test]
    async fn test_place_order_custom_price_wins() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Rice 5kg", Decimal::new(900, 0), 20).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 2,
                    custom_price: Some(Decimal::new(850, 0)),
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["total_amount"], "1700");
        assert_eq!(body.data["payment_status"], "pending");
        assert_eq!(body.data["items"][0]["unit_price"], "850");
    }

    #[tokio::test]
    async fn test_place_order_insufficient_stock_leaves_no_order() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Flour 10kg", Decimal::new(1200, 0), 2).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 5,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let orders = shopkeeper_order::Entity::find()
            .all(&env.state.db)
            .await
            .unwrap();
        assert!(orders.is_empty());

        // Balance untouched.
        let shopkeeper = user::Entity::find_by_id(env.shopkeeper.id)
            .one(&env.state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shopkeeper.pending_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_unassigned_salesman_is_denied() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Salt 1kg", Decimal::new(50, 0), 100).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 1,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_shopkeeper_orders_for_themselves() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Oil 1L", Decimal::new(500, 0), 30).await;
        let token = env.token_for(&env.shopkeeper);

        // Without an assignment the shopkeeper cannot order at all.
        let request = PlaceOrderRequest {
            shopkeeper_id: None,
            items: vec![OrderItemRequest {
                product_id: product.id,
                quantity: 1,
                custom_price: None,
            }],
            amount_paid: None,
            payment_method: None,
            delivery_address: None,
            notes: None,
        };
        let response = with_token(server.post("/api/shopkeeper-orders").json(&request), &token).await;
        response.assert_status(StatusCode::FORBIDDEN);

        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let response = with_token(server.post("/api/shopkeeper-orders").json(&request), &token).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        // Commission goes to the assigned salesman.
        assert_eq!(body.data["salesman_id"], env.salesman.id);
        assert_eq!(body.data["shopkeeper_id"], env.shopkeeper.id);
    }

    #[tokio::test]
    async fn test_order_listing_is_role_scoped() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Ghee 1kg", Decimal::new(700, 0), 50).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let other_shopkeeper = seed_user(
            &env.state.db,
            "Second Shop",
            "shop2@test.local",
            Role::Shopkeeper,
            None,
        )
        .await;
        seed_assignment(&env.state.db, env.salesman.id, other_shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        for shopkeeper_id in [env.shopkeeper.id, other_shopkeeper.id] {
            let response = with_token(
                server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                    shopkeeper_id: Some(shopkeeper_id),
                    items: vec![OrderItemRequest {
                        product_id: product.id,
                        quantity: 1,
                        custom_price: None,
                    }],
                    amount_paid: None,
                    payment_method: None,
                    delivery_address: None,
                    notes: None,
                }),
                &token,
            )
            .await;
            response.assert_status(StatusCode::CREATED);
        }

        // Salesman sees both, each shopkeeper sees only their own.
        let response = with_token(server.get("/api/shopkeeper-orders"), &token).await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 2);

        let shop_token = env.token_for(&env.shopkeeper);
        let response = with_token(server.get("/api/shopkeeper-orders"), &shop_token).await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["shopkeeper_id"], env.shopkeeper.id);

        // A shopkeeper cannot read another shopkeeper's order.
        let admin_token = env.token_for(&env.admin);
        let all = with_token(server.get("/api/shopkeeper-orders"), &admin_token).await;
        let all_body: ApiResponse<Vec<serde_json::Value>> = all.json();
        let foreign_order = all_body
            .data
            .iter()
            .find(|o| o["shopkeeper_id"] == other_shopkeeper.id)
            .unwrap();
        let response = with_token(
            server.get(&format!("/api/shopkeeper-orders/{}", foreign_order["id"])),
            &shop_token,
        )
        .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_order_payment_settles_balance() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Soap", Decimal::new(80, 0), 100).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 5,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        let order_id = body.data["id"].as_i64().unwrap();
        assert_eq!(body.data["payment_status"], "pending");

        // Partial payment.
        let response = with_token(
            server
                .post(&format!("/api/shopkeeper-orders/{}/payments", order_id))
                .json(&RecordPaymentRequest {
                    amount: Decimal::new(150, 0),
                    payment_method: Some("cash".to_string()),
                }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["payment_status"], "partial");
        assert_eq!(body.data["pending_amount"], "250");

        // Settle the rest.
        let response = with_token(
            server
                .post(&format!("/api/shopkeeper-orders/{}/payments", order_id))
                .json(&RecordPaymentRequest {
                    amount: Decimal::new(250, 0),
                    payment_method: None,
                }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["payment_status"], "paid");

        let shopkeeper = user::Entity::find_by_id(env.shopkeeper.id)
            .one(&env.state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shopkeeper.pending_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_order_status_lifecycle() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Matches", Decimal::new(10, 0), 500).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 10,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        let body: ApiResponse<serde_json::Value> = response.json();
        let order_id = body.data["id"].as_i64().unwrap();

        // Shopkeepers cannot move the order along.
        let shop_token = env.token_for(&env.shopkeeper);
        let response = with_token(
            server
                .patch(&format!("/api/shopkeeper-orders/{}/status", order_id))
                .json(&UpdateOrderStatusRequest {
                    status: "confirmed".to_string(),
                }),
            &shop_token,
        )
        .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = with_token(
            server
                .patch(&format!("/api/shopkeeper-orders/{}/status", order_id))
                .json(&UpdateOrderStatusRequest {
                    status: "delivered".to_string(),
                }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["status"], "delivered");

        let response = with_token(
            server
                .patch(&format!("/api/shopkeeper-orders/{}/status", order_id))
                .json(&UpdateOrderStatusRequest {
                    status: "teleported".to_string(),
                }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recovery_reduces_balance() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Biscuits", Decimal::new(60, 0), 100).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        // Build up a balance of 300 first.
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 5,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);

        let response = with_token(
            server.post("/api/recoveries").json(&CreateRecoveryRequest {
                shopkeeper_id: env.shopkeeper.id,
                amount: Decimal::new(120, 0),
                payment_method: Some("cash".to_string()),
                notes: None,
                recovered_at: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);

        let shopkeeper = user::Entity::find_by_id(env.shopkeeper.id)
            .one(&env.state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shopkeeper.pending_amount, Decimal::new(180, 0));

        // Shopkeepers see recoveries collected from them.
        let shop_token = env.token_for(&env.shopkeeper);
        let response = with_token(server.get("/api/recoveries"), &shop_token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["amount"], "120");

        // Shopkeepers cannot record recoveries.
        let response = with_token(
            server.post("/api/recoveries").json(&CreateRecoveryRequest {
                shopkeeper_id: env.shopkeeper.id,
                amount: Decimal::new(10, 0),
                payment_method: None,
                notes: None,
                recovered_at: None,
            }),
            &shop_token,
        )
        .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_receipt_numbering_is_sequential() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin_token = env.token_for(&env.admin);

        for expected in ["RCP-00001", "RCP-00002"] {
            let response = with_token(
                server.post("/api/receipts").json(&CreateReceiptRequest {
                    shopkeeper_id: env.shopkeeper.id,
                    order_id: None,
                    amount: Decimal::new(500, 0),
                    payment_method: Some("cash".to_string()),
                }),
                &admin_token,
            )
            .await;
            response.assert_status(StatusCode::CREATED);
            let body: ApiResponse<serde_json::Value> = response.json();
            assert_eq!(body.data["receipt_number"], expected);
        }

        // Shopkeeper sees receipts issued to them only.
        let shop_token = env.token_for(&env.shopkeeper);
        let response = with_token(server.get("/api/receipts"), &shop_token).await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 2);
    }

    #[tokio::test]
    async fn test_customer_order_has_no_balance_side_effects() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Eggs (dozen)", Decimal::new(320, 0), 25).await;
        let token = env.token_for(&env.salesman);

        let response = with_token(
            server.post("/api/orders").json(&CreateCustomerOrderRequest {
                customer_name: "Walk-in".to_string(),
                customer_phone: None,
                delivery_address: None,
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 2,
                    custom_price: None,
                }],
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["order_number"], "CORD-00001");
        assert_eq!(body.data["total_amount"], "640");

        let order_id = body.data["id"].as_i64().unwrap();
        let response = with_token(
            server
                .patch(&format!("/api/orders/{}/status", order_id))
                .json(&UpdateOrderStatusRequest {
                    status: "confirmed".to_string(),
                }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::OK);

        // Shopkeepers have no access to the walk-in flow.
        let shop_token = env.token_for(&env.shopkeeper);
        let response = with_token(server.get("/api/orders"), &shop_token).await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_analytics_summary() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Detergent", Decimal::new(150, 0), 100).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        let response = with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 2,
                    custom_price: None,
                }],
                amount_paid: Some(Decimal::new(100, 0)),
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await;
        response.assert_status(StatusCode::CREATED);

        with_token(
            server.post("/api/recoveries").json(&CreateRecoveryRequest {
                shopkeeper_id: env.shopkeeper.id,
                amount: Decimal::new(50, 0),
                payment_method: None,
                notes: None,
                recovered_at: None,
            }),
            &token,
        )
        .await
        .assert_status(StatusCode::CREATED);

        // Admin only.
        let response = with_token(server.get("/api/analytics/summary"), &token).await;
        response.assert_status(StatusCode::FORBIDDEN);

        let admin_token = env.token_for(&env.admin);
        let response = with_token(server.get("/api/analytics/summary"), &admin_token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["revenue"], "300");
        assert_eq!(body.data["recovered"], "50");
        assert_eq!(body.data["order_count"], 1);
        let rows = body.data["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["shopkeeper_id"], env.shopkeeper.id);

        // Inverted range is rejected.
        let response = with_token(
            server.get("/api/analytics/summary?start_date=2026-02-01&end_date=2026-01-01"),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_salesman_dashboard() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Shampoo", Decimal::new(200, 0), 50).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let token = env.token_for(&env.salesman);
        with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 3,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &token,
        )
        .await
        .assert_status(StatusCode::CREATED);

        let response = with_token(server.get("/api/sales/shopkeepers"), &token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["id"], env.shopkeeper.id);

        // 600 in sales at a 10% rate.
        let response = with_token(server.get("/api/sales/commission"), &token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["order_count"], 1);
        assert_eq!(body.data["total_sales"], "600");
        let commission: Decimal = body.data["commission"].as_str().unwrap().parse().unwrap();
        assert_eq!(commission, Decimal::new(60, 0));

        // Not a salesman endpoint.
        let admin_token = env.token_for(&env.admin);
        let response = with_token(server.get("/api/sales/commission"), &admin_token).await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_distribution_overview() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let admin_token = env.token_for(&env.admin);
        let response = with_token(server.get("/api/distribution/overview"), &admin_token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        let row = body
            .data
            .iter()
            .find(|r| r["salesman_id"] == env.salesman.id)
            .unwrap();
        assert_eq!(row["shopkeeper_count"], 1);
    }

    #[tokio::test]
    async fn test_shopkeeper_dashboard() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let product = seed_product(&env.state.db, "Honey", Decimal::new(450, 0), 15).await;
        seed_assignment(&env.state.db, env.salesman.id, env.shopkeeper.id, env.admin.id).await;

        let salesman_token = env.token_for(&env.salesman);
        with_token(
            server.post("/api/shopkeeper-orders").json(&PlaceOrderRequest {
                shopkeeper_id: Some(env.shopkeeper.id),
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 1,
                    custom_price: None,
                }],
                amount_paid: None,
                payment_method: None,
                delivery_address: None,
                notes: None,
            }),
            &salesman_token,
        )
        .await
        .assert_status(StatusCode::CREATED);

        let token = env.token_for(&env.shopkeeper);
        let response = with_token(server.get("/api/shopkeepers/balance"), &token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["pending_amount"], "450");

        let response = with_token(server.get("/api/shopkeepers/orders"), &token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);

        // Salesmen do not have a shopkeeper dashboard.
        let response = with_token(server.get("/api/shopkeepers/balance"), &salesman_token).await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_notification_fanout_and_read_flow() {
        let (app, env) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Exercise the fan-out directly; handlers run it detached.
        crate::handlers::notifications::notify_admins(
            env.state.db.clone(),
            notification::NotificationKind::System,
            "Stock alert".to_string(),
            "Sugar 1kg is running low".to_string(),
            None,
        )
        .await;

        // Both the admin and the superadmin got a copy.
        let admin_token = env.token_for(&env.admin);
        let response = with_token(server.get("/api/notifications"), &admin_token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["is_read"], false);
        let notification_id = body.data[0]["id"].as_i64().unwrap();

        let root_token = env.token_for(&env.superadmin);
        let response = with_token(server.get("/api/notifications"), &root_token).await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);

        // The salesman got nothing.
        let salesman_token = env.token_for(&env.salesman);
        let response = with_token(server.get("/api/notifications"), &salesman_token).await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert!(body.data.is_empty());

        // Mark one read; the other admin's copy is unaffected.
        let response = with_token(
            server.patch(&format!("/api/notifications/{}/read", notification_id)),
            &admin_token,
        )
        .await;
        response.assert_status(StatusCode::OK);

        // Cannot read someone else's notification.
        let response = with_token(
            server.patch(&format!("/api/notifications/{}/read", notification_id)),
            &root_token,
        )
        .await;
        response.assert_status(StatusCode::NOT_FOUND);

        // Mark-all for the superadmin.
        let response = with_token(server.patch("/api/notifications/read-all"), &root_token).await;
        response.assert_status(StatusCode::OK);
        let response = with_token(server.get("/api/notifications"), &root_token).await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data[0]["is_read"], true);
    }
}
