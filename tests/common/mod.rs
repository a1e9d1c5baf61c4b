#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hotel_rs::auth::{AccessPolicy, BlockList};
use hotel_rs::config::ServerConfig;
use hotel_rs::repositories::{GuestRepository, InMemoryStore, RoomRepository};
use hotel_rs::{create_app, Metrics, RequestRouter};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const BLOCKED_EMAIL: &str = "blocked@x.com";

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

/// Caller identities asserted through the trusted gateway headers
#[derive(Debug, Clone, Copy)]
pub enum Caller {
    Anonymous,
    Web,
    Mobile,
    Admin,
    Blocked,
}

impl Caller {
    pub fn apply(self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Caller::Anonymous => request,
            Caller::Web => request
                .header("x-auth-subject", "web-user")
                .header("x-auth-scope", "customer/web"),
            Caller::Mobile => request
                .header("x-auth-subject", "mobile-user")
                .header("x-auth-scope", "customer/mobile"),
            Caller::Admin => request
                .header("x-auth-subject", "admin-user")
                .header("x-auth-groups", "admin"),
            Caller::Blocked => request
                .header("x-auth-subject", "blocked-user")
                .header("x-auth-email", BLOCKED_EMAIL)
                .header("x-auth-scope", "customer/web customer/mobile"),
        }
    }
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let router = RequestRouter::new(
            GuestRepository::new(store.clone(), "guests"),
            RoomRepository::new(store, "rooms"),
            AccessPolicy::new("admin", BlockList::new().block(BLOCKED_EMAIL, "PAYMENT")),
        )
        .with_metrics(metrics.clone());

        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 30,
            max_request_size: 64 * 1024,
        };
        let app = create_app(Arc::new(router), metrics, &server);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn get(&self, caller: Caller, path: &str) -> RequestBuilder {
        caller.apply(self.client.get(format!("{}{}", self.base_url, path)))
    }

    pub fn post(&self, caller: Caller, path: &str) -> RequestBuilder {
        caller.apply(self.client.post(format!("{}{}", self.base_url, path)))
    }

    pub fn put(&self, caller: Caller, path: &str) -> RequestBuilder {
        caller.apply(self.client.put(format!("{}{}", self.base_url, path)))
    }

    pub fn delete(&self, caller: Caller, path: &str) -> RequestBuilder {
        caller.apply(self.client.delete(format!("{}{}", self.base_url, path)))
    }

    /// Create a record as admin and return the persisted JSON
    pub async fn create(&self, path: &str, body: &Value) -> Value {
        let response = self
            .post(Caller::Admin, path)
            .json(body)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }
}

pub fn guest_payload(name: &str) -> Value {
    json!({
        "guestName": name,
        "guestEmail": "a@x.com",
        "guestMobile": "1",
        "guestBirthDate": "1990-01-01",
        "guestAddress": "St 1",
        "code": "C1",
        "price": 100
    })
}

pub fn room_payload(room_type: &str, is_cleaned: bool, is_full: bool) -> Value {
    json!({
        "roomType": room_type,
        "isFull": is_full,
        "isCleaned": is_cleaned,
        "description": format!("{} room", room_type)
    })
}
