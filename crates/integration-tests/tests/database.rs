//! Repository and router tests against a real `PostgreSQL`.
//!
//! Each test gets a fresh database with migrations applied. They are
//! ignored by default; run them with `DATABASE_URL` set and `--ignored`.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use ampere_core::{Cart, Currency, OrderStatus, PaymentMethod, ProductId, SubcategoryId, UserId, UserRole};
use ampere_integration_tests::{
    empty_request, json_body, json_request, send, session_cookie, test_app,
};
use ampere_storefront::db::orders::NewOrder;
use ampere_storefront::db::{
    CategoryRepository, OrderRepository, ProductRepository, RepositoryError,
    SubcategoryRepository, UserRepository,
};
use ampere_storefront::models::{
    CategoryInput, CustomerInfo, Product, ProductInput, SubcategoryInput,
};
use ampere_storefront::error::AppError;
use ampere_storefront::services::checkout::CheckoutError;

async fn seed_product(pool: &PgPool, code: &str, stock: i32) -> Product {
    let category = CategoryRepository::new(pool)
        .create(&CategoryInput {
            name: format!("Category {code}"),
            description: None,
            image: None,
        })
        .await
        .unwrap();
    let subcategory = SubcategoryRepository::new(pool)
        .create(&SubcategoryInput {
            category_id: category.id,
            name: format!("Subcategory {code}"),
            description: None,
            image: None,
        })
        .await
        .unwrap();

    ProductRepository::new(pool)
        .create(&product_input(code, stock, subcategory.id))
        .await
        .unwrap()
}

fn product_input(code: &str, stock: i32, subcategory_id: SubcategoryId) -> ProductInput {
    ProductInput {
        code: code.to_string(),
        name: format!("Product {code}"),
        description: None,
        price: Decimal::new(1999, 0),
        discounted_price: Some(Decimal::new(1499, 0)),
        stock,
        images: vec![],
        subcategory_id,
        specifications: BTreeMap::from([("Color".to_string(), "Black".to_string())]),
    }
}

async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    ProductRepository::new(pool).get(id).await.unwrap().unwrap().stock
}

fn new_order(cart: Cart) -> NewOrder {
    NewOrder {
        user_id: None,
        customer: CustomerInfo {
            name: "Oleg Smirnov".to_string(),
            email: "oleg@example.com".to_string(),
            phone: "+7 900 123-45-67".to_string(),
            address: "Tverskaya 7, Moscow".to_string(),
        },
        payment_method: PaymentMethod::CashOnDelivery,
        comment: None,
        currency: Currency::Rub,
        cart,
    }
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_category_delete_cascades(pool: PgPool) {
    let product = seed_product(&pool, "CAS-1", 3).await;
    let subcategory = SubcategoryRepository::new(&pool)
        .get(product.subcategory_id)
        .await
        .unwrap()
        .unwrap();
    ProductRepository::new(&pool)
        .create(&product_input("CAS-2", 1, subcategory.id))
        .await
        .unwrap();

    let summary = CategoryRepository::new(&pool)
        .delete_cascade(subcategory.category_id)
        .await
        .unwrap();

    assert_eq!(summary.categories, 1);
    assert_eq!(summary.subcategories, 1);
    assert_eq!(summary.products, 2);
    assert!(ProductRepository::new(&pool).get(product.id).await.unwrap().is_none());

    let again = CategoryRepository::new(&pool)
        .delete_cascade(subcategory.category_id)
        .await;
    assert!(matches!(again, Err(RepositoryError::NotFound)));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_product_code_conflicts(pool: PgPool) {
    let product = seed_product(&pool, "DUP-1", 1).await;

    let duplicate = ProductRepository::new(&pool)
        .create(&product_input("DUP-1", 5, product.subcategory_id))
        .await;

    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_subcategory_delete_removes_only_its_products(pool: PgPool) {
    let doomed = seed_product(&pool, "SUB-1", 2).await;
    let subcategory = SubcategoryRepository::new(&pool)
        .get(doomed.subcategory_id)
        .await
        .unwrap()
        .unwrap();
    let sibling = SubcategoryRepository::new(&pool)
        .create(&SubcategoryInput {
            category_id: subcategory.category_id,
            name: "Sibling".to_string(),
            description: None,
            image: None,
        })
        .await
        .unwrap();
    let survivor = ProductRepository::new(&pool)
        .create(&product_input("SUB-2", 4, sibling.id))
        .await
        .unwrap();

    let summary = SubcategoryRepository::new(&pool)
        .delete_cascade(subcategory.id)
        .await
        .unwrap();

    assert_eq!(summary.categories, 0);
    assert_eq!(summary.subcategories, 1);
    assert_eq!(summary.products, 1);
    let products = ProductRepository::new(&pool);
    assert!(products.get(doomed.id).await.unwrap().is_none());
    assert!(products.get(survivor.id).await.unwrap().is_some());
    assert!(
        CategoryRepository::new(&pool)
            .get(subcategory.category_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_updating_to_taken_code_conflicts(pool: PgPool) {
    let first = seed_product(&pool, "UPD-A", 1).await;
    let second = ProductRepository::new(&pool)
        .create(&product_input("UPD-B", 1, first.subcategory_id))
        .await
        .unwrap();

    let result = ProductRepository::new(&pool)
        .update(second.id, &product_input("UPD-A", 1, first.subcategory_id))
        .await;

    let Err(err) = result else {
        panic!("expected a conflict");
    };
    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert_eq!(AppError::from(err).status(), StatusCode::BAD_REQUEST);

    let stored = ProductRepository::new(&pool).get(second.id).await.unwrap().unwrap();
    assert_eq!(stored.code, "UPD-B");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_admin_product_update_with_taken_code_is_400(pool: PgPool) {
    let first = seed_product(&pool, "API-A", 1).await;
    let second = ProductRepository::new(&pool)
        .create(&product_input("API-B", 1, first.subcategory_id))
        .await
        .unwrap();
    let app = test_app(pool.clone());
    let cookie = admin_cookie(&app, &pool).await;

    let body = json!({
        "code": "API-A",
        "name": "Renamed product",
        "price": 1999,
        "subcategory_id": first.subcategory_id,
    });
    let mut request = json_request("PUT", &format!("/api/admin/products/{}", second.id), &body);
    request.headers_mut().insert("cookie", cookie.parse().unwrap());
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Product code already exists");
}

/// Register an account, promote it, and sign in again as admin.
async fn admin_cookie(app: &axum::Router, pool: &PgPool) -> String {
    let credentials = json!({ "email": "ops@example.com", "password": "lantern-quartz-91" });
    let response = send(app, json_request("POST", "/api/auth/register", &credentials)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = json_body(response).await["id"].as_i64().unwrap();

    UserRepository::new(pool)
        .set_role(UserId::new(i32::try_from(user_id).unwrap()), UserRole::Admin)
        .await
        .unwrap();

    let response = send(app, json_request("POST", "/api/auth/login", &credentials)).await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).unwrap()
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_checkout_decrements_stock_and_cancel_restocks(pool: PgPool) {
    let product = seed_product(&pool, "CHK-1", 5).await;
    let mut cart = Cart::new();
    cart.add(product.id, 2);

    let orders = OrderRepository::new(&pool);
    let order = orders.create_from_checkout(&new_order(cart)).await.unwrap();

    assert!(order.order_number.starts_with("AMP-"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total, Decimal::new(2998, 0));

    assert_eq!(stock_of(&pool, product.id).await, 3);

    orders
        .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, product.id).await, 5);

    let stale = orders
        .update_status(order.id, OrderStatus::Pending, OrderStatus::Processing)
        .await;
    assert!(matches!(stale, Err(RepositoryError::Conflict(_))));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_checkout_with_insufficient_stock_writes_nothing(pool: PgPool) {
    let product = seed_product(&pool, "LOW-1", 1).await;
    let mut cart = Cart::new();
    cart.add(product.id, 2);

    let result = OrderRepository::new(&pool)
        .create_from_checkout(&new_order(cart))
        .await;

    assert!(matches!(
        result,
        Err(CheckoutError::InsufficientStock { requested: 2, available: 1, .. })
    ));
    assert_eq!(stock_of(&pool, product.id).await, 1);

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_admin_access_follows_stored_role(pool: PgPool) {
    let app = test_app(pool.clone());
    let credentials = json!({ "email": "maria@example.com", "password": "kettle-orbit-57" });

    let response = send(&app, json_request("POST", "/api/auth/register", &credentials)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response).unwrap();
    let user_id = json_body(response).await["id"].as_i64().unwrap();

    let mut request = empty_request("GET", "/api/admin/stats");
    request.headers_mut().insert("cookie", cookie.parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::FORBIDDEN);

    UserRepository::new(&pool)
        .set_role(
            UserId::new(i32::try_from(user_id).unwrap()),
            UserRole::Admin,
        )
        .await
        .unwrap();

    let response = send(&app, json_request("POST", "/api/auth/login", &credentials)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();

    let mut request = empty_request("GET", "/api/admin/stats");
    request.headers_mut().insert("cookie", cookie.parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["users"], 1);
}
