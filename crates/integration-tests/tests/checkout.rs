//! Cart merge and checkout against a real database.
//!
//! Run with: `cargo test -p uniformly-integration-tests -- --ignored`
//! (requires `DATABASE_URL`).

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use uniformly_core::{OrderStatus, UserId};
use uniformly_integration_tests::{
    app, call, cart_quantity, insert_product, insert_school, insert_user,
};
use uniformly_storefront::db::{CartRepository, MergeOutcome};
use uniformly_storefront::services::{CheckoutError, OrderService};

// ============================================================================
// Cart
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_repeated_add_merges_into_one_line(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let shirt = insert_product(&pool, school, "Shirt 24", 850).await;
    let user = insert_user(&pool, "parent@example.com").await;
    let app = app(pool.clone());

    let body = json!({ "userId": user.as_i32(), "productId": shirt.as_i32(), "quantity": 2 });
    let (status, first) = call(&app, Method::POST, "/cart", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["quantity"], 2);

    let (status, second) = call(&app, Method::POST, "/cart", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["quantity"], 4);

    let (status, cart) = call(&app, Method::GET, &format!("/cart?userId={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart.as_array().unwrap().len(), 1);
    assert_eq!(cart[0]["product"]["name"], "Shirt 24");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_adds_settle_on_one_line(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let tie = insert_product(&pool, school, "Tie", 150).await;
    let user = insert_user(&pool, "parent@example.com").await;

    let first = CartRepository::new(&pool);
    let second = CartRepository::new(&pool);
    let (a, b) = tokio::join!(
        first.add_or_merge(user, tie, 1),
        second.add_or_merge(user, tie, 1),
    );
    let outcomes = [a.unwrap().1, b.unwrap().1];

    assert!(outcomes.contains(&MergeOutcome::Created));
    assert!(outcomes.contains(&MergeOutcome::Updated));
    assert_eq!(cart_quantity(&pool, user, tie).await, Some(2));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_merge_past_integer_range_is_invalid_quantity(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let shirt = insert_product(&pool, school, "Shirt 24", 850).await;
    let user = insert_user(&pool, "parent@example.com").await;
    let app = app(pool.clone());

    let body = |quantity: i32| {
        json!({ "userId": user.as_i32(), "productId": shirt.as_i32(), "quantity": quantity })
    };
    let (status, _) = call(&app, Method::POST, "/cart", Some(body(i32::MAX))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = call(&app, Method::POST, "/cart", Some(body(1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_QUANTITY");
    assert_eq!(cart_quantity(&pool, user, shirt).await, Some(i32::MAX));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_add_for_unknown_product_is_not_found(pool: PgPool) {
    let user = insert_user(&pool, "parent@example.com").await;
    let app = app(pool);

    let body = json!({ "userId": user.as_i32(), "productId": 9999, "quantity": 1 });
    let (status, json) = call(&app, Method::POST, "/cart", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_patch_and_delete_cart_line(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let pant = insert_product(&pool, school, "Pant 30", 900).await;
    let user = insert_user(&pool, "parent@example.com").await;
    let (item, _) = CartRepository::new(&pool)
        .add_or_merge(user, pant, 1)
        .await
        .unwrap();
    let app = app(pool.clone());

    let uri = format!("/cart?id={}", item.id);
    let (status, json) = call(&app, Method::PATCH, &uri, Some(json!({ "quantity": 5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quantity"], 5);

    let (status, json) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], item.id.as_i32());

    let (status, json) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_clear_cart_succeeds_when_empty(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let frock = insert_product(&pool, school, "Frock 30", 900).await;
    let user = insert_user(&pool, "parent@example.com").await;
    let cart = CartRepository::new(&pool);
    cart.add_or_merge(user, frock, 3).await.unwrap();

    assert_eq!(cart.clear(user).await.unwrap(), 1);
    assert_eq!(cart.clear(user).await.unwrap(), 0);
    assert_eq!(cart_quantity(&pool, user, frock).await, None);
}

// ============================================================================
// Checkout
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_snapshots_cart_and_empties_it(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let shirt = insert_product(&pool, school, "Shirt 24", 850).await;
    let tie = insert_product(&pool, school, "Tie", 150).await;
    let user = insert_user(&pool, "parent@example.com").await;
    let cart = CartRepository::new(&pool);
    cart.add_or_merge(user, shirt, 2).await.unwrap();
    cart.add_or_merge(user, tie, 1).await.unwrap();
    let app = app(pool.clone());

    let (status, receipt) =
        call(&app, Method::POST, "/orders", Some(json!({ "userId": user.as_i32() }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["totalCents"], 1850);
    assert_eq!(receipt["status"], "pending");
    assert_eq!(receipt["itemsCount"], 2);

    let (_, remaining) = call(&app, Method::GET, &format!("/cart?userId={user}"), None).await;
    assert_eq!(remaining, json!([]));

    // Later price changes never reach the order.
    sqlx::query("UPDATE products SET price_cents = 9999 WHERE id = $1")
        .bind(shirt)
        .execute(&pool)
        .await
        .unwrap();

    let uri = format!("/orders?id={}", receipt["id"]);
    let (status, detail) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["totalCents"], 1850);
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let shirt_line = items.iter().find(|i| i["productName"] == "Shirt 24").unwrap();
    assert_eq!(shirt_line["unitPriceCents"], 850);
    assert_eq!(shirt_line["lineTotalCents"], 1700);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_of_empty_cart_writes_nothing(pool: PgPool) {
    let user = insert_user(&pool, "parent@example.com").await;
    let app = app(pool.clone());

    let (status, json) =
        call(&app, Method::POST, "/orders", Some(json!({ "userId": user.as_i32() }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EMPTY_CART");

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_for_unknown_user_is_empty_cart(pool: PgPool) {
    let service = OrderService::new(pool, Duration::from_secs(5));
    let err = service.checkout(UserId::new(4242)).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_checkouts_create_one_order(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let sweater = insert_product(&pool, school, "Sweater 26", 1300).await;
    let user = insert_user(&pool, "parent@example.com").await;
    CartRepository::new(&pool)
        .add_or_merge(user, sweater, 1)
        .await
        .unwrap();

    let service = OrderService::new(pool.clone(), Duration::from_secs(5));
    let (a, b) = tokio::join!(service.checkout(user), service.checkout(user));

    let placed = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(placed, 1);
    assert!(matches!(
        a.err().or(b.err()),
        Some(CheckoutError::EmptyCart)
    ));
}

// ============================================================================
// Orders
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_status_update_is_idempotent(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let tie = insert_product(&pool, school, "Tie", 150).await;
    let user = insert_user(&pool, "parent@example.com").await;
    CartRepository::new(&pool)
        .add_or_merge(user, tie, 1)
        .await
        .unwrap();
    let service = OrderService::new(pool.clone(), Duration::from_secs(5));
    let receipt = service.checkout(user).await.unwrap();
    let app = app(pool);

    let uri = format!("/orders?id={}", receipt.order.id);
    for _ in 0..2 {
        let (status, json) = call(&app, Method::PUT, &uri, Some(json!({ "status": "shipped" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], OrderStatus::Shipped.as_str());
        assert_eq!(json["totalCents"], 150);
    }

    let (status, json) =
        call(&app, Method::PUT, "/orders?id=9999", Some(json!({ "status": "paid" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_orders_list_newest_first_with_paging(pool: PgPool) {
    let school = insert_school(&pool, "Allied School").await;
    let tie = insert_product(&pool, school, "Tie", 150).await;
    let user = insert_user(&pool, "parent@example.com").await;
    let cart = CartRepository::new(&pool);
    let service = OrderService::new(pool.clone(), Duration::from_secs(5));

    let mut placed = Vec::new();
    for quantity in 1..=3 {
        cart.add_or_merge(user, tie, quantity).await.unwrap();
        placed.push(service.checkout(user).await.unwrap().order.id);
    }
    let app = app(pool);

    let (status, json) = call(&app, Method::GET, &format!("/orders?userId={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    let newest_first: Vec<i64> = placed.iter().rev().map(|id| i64::from(id.as_i32())).collect();
    assert_eq!(ids, newest_first);

    let uri = format!("/orders?userId={user}&limit=1&offset=1");
    let (_, json) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], placed[1].as_i32());
}
