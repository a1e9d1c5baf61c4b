use hotel_rs::models::{Guest, Room, RoomType};
use rust_decimal_macros::dec;
use serde_json::Value;

mod common;
use common::*;

#[tokio::test]
async fn test_guest_lifecycle() {
    let test_env = TestEnvironment::new().await;

    // Create as admin; any client-supplied id is discarded
    let mut payload = guest_payload("Ana");
    payload["id"] = Value::from("client-chosen");

    let response = test_env
        .post(Caller::Admin, "/guests")
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 201);
    let created: Guest = response.json().await.expect("Failed to parse response");
    assert_ne!(created.id, "client-chosen");
    assert!(!created.id.is_empty());
    assert_eq!(created.guest_name, "Ana");
    assert_eq!(created.price, dec!(100));

    // Fetch from the web client
    let response = test_env
        .get(Caller::Web, &format!("/guests/{}", created.id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let fetched: Guest = response.json().await.expect("Failed to parse response");
    assert_eq!(fetched, created);

    // Full replace keeps the path id
    let mut replacement = guest_payload("Ana Maria");
    replacement["price"] = Value::from(150);
    let response = test_env
        .put(Caller::Admin, &format!("/guests/{}", created.id))
        .json(&replacement)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let updated: Guest = response.json().await.expect("Failed to parse response");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.guest_name, "Ana Maria");
    assert_eq!(updated.price, dec!(150));

    // Listing shows the guest for mobile callers too
    let response = test_env
        .get(Caller::Mobile, "/guests")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let guests: Vec<Guest> = response.json().await.expect("Failed to parse response");
    assert_eq!(guests, vec![updated.clone()]);

    // Delete returns the last persisted state
    let response = test_env
        .delete(Caller::Admin, &format!("/guests/{}", created.id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let deleted: Guest = response.json().await.expect("Failed to parse response");
    assert_eq!(deleted, updated);

    let response = test_env
        .get(Caller::Web, &format!("/guests/{}", created.id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.text().await.unwrap(), "Guest not found");
}

#[tokio::test]
async fn test_room_filters() {
    let test_env = TestEnvironment::new().await;

    let clean = test_env
        .create("/rooms", &room_payload("single", true, false))
        .await;
    let dirty = test_env
        .create("/rooms", &room_payload("double", false, true))
        .await;

    let list = |query: &'static str| {
        let request = test_env.get(Caller::Mobile, &format!("/rooms{}", query));
        async move {
            let response = request.send().await.expect("Failed to send request");
            assert_eq!(response.status().as_u16(), 200);
            response
                .json::<Vec<Room>>()
                .await
                .expect("Failed to parse response")
        }
    };

    let all = list("").await;
    assert_eq!(all.len(), 2);

    let cleaned = list("?isCleaned=true").await;
    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned[0].id, clean["id"].as_str().unwrap());
    assert_eq!(cleaned[0].room_type, RoomType::Single);

    let not_cleaned = list("?isCleaned=false").await;
    assert_eq!(not_cleaned.len(), 1);
    assert_eq!(not_cleaned[0].id, dirty["id"].as_str().unwrap());

    let full = list("?isFull=true").await;
    assert_eq!(full.len(), 1);
    assert!(full[0].is_full);

    // Unknown parameters are ignored
    assert_eq!(list("?page=2").await.len(), 2);

    // Cleaning the dirty room moves it between the partitions
    let response = test_env
        .put(Caller::Admin, &format!("/rooms/{}", dirty["id"].as_str().unwrap()))
        .json(&room_payload("double", true, true))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(list("?isCleaned=true").await.len(), 2);
    assert!(list("?isCleaned=false").await.is_empty());
}

#[tokio::test]
async fn test_bad_requests() {
    let test_env = TestEnvironment::new().await;

    let cases = vec![
        test_env.get(Caller::Web, "/rooms?isCleaned=yes"),
        test_env.get(Caller::Web, "/rooms?isCleaned=true&isFull=false"),
        test_env.get(Caller::Web, "/bookings"),
        test_env.client.patch(format!("{}/guests", test_env.base_url)),
        test_env
            .post(Caller::Admin, "/guests")
            .header("content-type", "application/json")
            .body("{not json"),
        test_env
            .post(Caller::Admin, "/rooms")
            .json(&serde_json::json!({"roomType": "suite", "isFull": false, "isCleaned": true, "description": "x"})),
        test_env.post(Caller::Admin, "/guests"),
    ];

    for request in cases {
        let response = request.send().await.expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(response.text().await.unwrap(), "Bad request");
    }
}

#[tokio::test]
async fn test_access_policy() {
    let test_env = TestEnvironment::new().await;
    let guest = test_env.create("/guests", &guest_payload("Ana")).await;
    let guest_path = format!("/guests/{}", guest["id"].as_str().unwrap());

    let status = |request: reqwest::RequestBuilder| async move {
        request
            .send()
            .await
            .expect("Failed to send request")
            .status()
            .as_u16()
    };

    assert_eq!(status(test_env.get(Caller::Anonymous, "/guests")).await, 401);
    assert_eq!(status(test_env.get(Caller::Web, "/guests")).await, 200);
    assert_eq!(status(test_env.get(Caller::Mobile, "/guests")).await, 200);

    // Single guest lookups are web-only
    assert_eq!(status(test_env.get(Caller::Web, &guest_path)).await, 200);
    assert_eq!(status(test_env.get(Caller::Mobile, &guest_path)).await, 403);

    // Writes need the admin group
    assert_eq!(
        status(test_env.post(Caller::Web, "/guests").json(&guest_payload("Bo"))).await,
        403
    );
    assert_eq!(status(test_env.delete(Caller::Mobile, &guest_path)).await, 403);

    // Blocked accounts are refused regardless of scope
    let response = test_env
        .get(Caller::Blocked, "/rooms")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(
        response.text().await.unwrap(),
        "This user is blocked. Reason: PAYMENT"
    );

    // A rejected request leaves the record untouched
    assert_eq!(status(test_env.get(Caller::Web, &guest_path)).await, 200);
}

#[tokio::test]
async fn test_missing_records() {
    let test_env = TestEnvironment::new().await;

    let response = test_env
        .put(Caller::Admin, "/rooms/missing")
        .json(&room_payload("triple", true, false))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.text().await.unwrap(), "Room not found");

    // Update never creates the record
    let response = test_env
        .get(Caller::Web, "/rooms/missing")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = test_env
        .delete(Caller::Admin, "/guests/missing")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.text().await.unwrap(), "Guest not found");
}

#[tokio::test]
async fn test_health_endpoint() {
    let test_env = TestEnvironment::new().await;

    let response = test_env
        .client
        .get(format!("{}/health/status", test_env.base_url))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("x-frame-options").unwrap(),
        "DENY"
    );
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test_env = TestEnvironment::new().await;
    test_env.create("/rooms", &room_payload("couple", true, false)).await;

    let response = test_env
        .client
        .get(format!("{}/metrics", test_env.base_url))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("repository_operations_total"));
    assert!(body.contains(r#"resource="rooms""#));
}

#[tokio::test]
async fn test_pre_authentication_trigger() {
    let test_env = TestEnvironment::new().await;
    let url = format!("{}/auth/pre-authentication", test_env.base_url);

    let event = |email: &str| {
        serde_json::json!({
            "userName": "user-1",
            "userPoolId": "us-east-1_pool",
            "request": { "userAttributes": { "email": email } },
            "response": {}
        })
    };

    let response = test_env
        .client
        .post(&url)
        .json(&event("guest@x.com"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let echoed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(echoed, event("guest@x.com"));

    let response = test_env
        .client
        .post(&url)
        .json(&event(BLOCKED_EMAIL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(
        response.text().await.unwrap(),
        "This user is blocked. Reason: PAYMENT"
    );
}
