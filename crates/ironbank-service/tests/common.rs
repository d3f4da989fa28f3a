//! Common test utilities for ironbank integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use ironbank_core::UserId;
use ironbank_service::{create_router, AppState, ServiceConfig};
use ironbank_store::RocksStore;

/// Shared secret the harness signs tokens with.
const JWT_SECRET: &str = "test-secret";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_jwt_secret: Some(JWT_SECRET.into()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Get the authorization header for the harness's test user.
    pub fn user_auth_header(&self) -> String {
        Self::auth_header_for(&self.test_user_id)
    }

    /// Get an authorization header for an arbitrary user, signed with the
    /// harness secret.
    pub fn auth_header_for(user_id: &UserId) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": user_id.to_string(),
            "iat": now,
            "exp": now + 3600,
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode test token");

        format!("Bearer {token}")
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        Self::auth_header_for(&UserId::generate())
    }

    /// Create an account owned by the test user over HTTP; returns its ID.
    pub async fn create_account(&self, number: &str, balance_cents: i64) -> String {
        let response = self
            .server
            .post("/v1/accounts")
            .add_header("authorization", self.user_auth_header())
            .json(&serde_json::json!({
                "bank_name": "First National",
                "bank_account_number": number,
                "balance_cents": balance_cents,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["data"]["id"].as_str().expect("account id").to_string()
    }

    /// Read an account's balance over HTTP.
    pub async fn account_balance(&self, id: &str) -> i64 {
        let response = self.server.get(&format!("/v1/accounts/{id}")).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["data"]["balance_cents"].as_i64().expect("balance")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
