//! Shared fixtures: an in-process stand-in for the authentication service and
//! a runtime wired to the desktop bridges.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::{DesktopNavigationHost, SqliteSettingsStore};
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::AuthRuntime;
use core_runtime::config::{ApiConfig, BuildProfile, CoreConfig};
use core_runtime::events::EventBus;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "correct-horse";
pub const VALID_TOKEN: &str = "valid-token";

/// Answers `/auth/*` the way the backend does.
#[derive(Default)]
pub struct FakeAuthServer {
    requests: Mutex<Vec<HttpRequest>>,
    offline: Mutex<bool>,
}

impl FakeAuthServer {
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    fn user() -> Value {
        json!({
            "id": 1,
            "created_at": "2024-01-15T09:30:00Z",
            "updated_at": "2024-01-15T09:30:00Z",
            "email": EMAIL,
            "name": "Angel Admin",
            "role": "admin"
        })
    }

    fn reply(status: u16, body: Value) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
    }

    fn authorized(request: &HttpRequest) -> bool {
        request.header_value("authorization") == Some(format!("Bearer {}", VALID_TOKEN).as_str())
    }

    fn body(request: &HttpRequest) -> Value {
        request
            .body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
            .unwrap_or(Value::Null)
    }
}

#[async_trait]
impl HttpClient for FakeAuthServer {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if *self.offline.lock().unwrap() {
            return Err(BridgeError::OperationFailed(
                "Network error: connection refused".to_string(),
            ));
        }

        let path = request
            .url
            .strip_prefix("https://angel-event.fr/api")
            .unwrap_or(&request.url)
            .to_string();

        let response = match (request.method, path.as_str()) {
            (HttpMethod::Post, "/auth/login") => {
                let body = Self::body(&request);
                if body["email"] == EMAIL && body["password"] == PASSWORD {
                    Self::reply(200, json!({"token": VALID_TOKEN, "user": Self::user()}))
                } else {
                    Self::reply(401, json!({"error": "Invalid credentials"}))
                }
            }
            (HttpMethod::Get, "/auth/me") if Self::authorized(&request) => {
                Self::reply(200, Self::user())
            }
            (HttpMethod::Post, "/auth/change-password") if Self::authorized(&request) => {
                let body = Self::body(&request);
                if body["current_password"] != PASSWORD {
                    Self::reply(400, json!({"error": "Current password is incorrect"}))
                } else if body["new_password"].as_str().map_or(0, str::len) < 8 {
                    Self::reply(400, json!({}))
                } else {
                    Self::reply(200, json!({"message": "Password updated"}))
                }
            }
            (_, "/bookings") if Self::authorized(&request) => Self::reply(200, json!([])),
            _ if !Self::authorized(&request) => {
                Self::reply(401, json!({"error": "Invalid or expired token"}))
            }
            _ => Self::reply(404, json!({"error": "Not found"})),
        };

        Ok(response)
    }
}

pub struct Fixture {
    pub runtime: AuthRuntime,
    pub server: Arc<FakeAuthServer>,
    pub settings: Arc<SqliteSettingsStore>,
    pub navigation: Arc<DesktopNavigationHost>,
    pub events: EventBus,
}

impl Fixture {
    pub async fn stored_token(&self) -> Option<String> {
        use bridge_traits::storage::SettingsStore;
        self.settings.get_string("auth_token").await.unwrap()
    }
}

/// Runtime over a fresh in-memory store, optionally holding `token`.
pub async fn fixture(token: Option<&str>) -> Fixture {
    let settings = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
    if let Some(token) = token {
        use bridge_traits::storage::SettingsStore;
        settings.set_string("auth_token", token).await.unwrap();
    }
    fixture_with_store(settings).await
}

pub async fn fixture_with_store(settings: Arc<SqliteSettingsStore>) -> Fixture {
    let server = Arc::new(FakeAuthServer::default());
    let navigation = Arc::new(DesktopNavigationHost::new());

    let config = CoreConfig::builder()
        .http_client(server.clone())
        .settings_store(settings.clone())
        .navigation_host(navigation.clone())
        .api(ApiConfig::new(BuildProfile::Release))
        .site_origin("https://angel-event.fr")
        .build()
        .unwrap();

    let events = EventBus::new(64);
    let runtime = AuthRuntime::bootstrap(&config, events.clone()).await.unwrap();

    Fixture {
        runtime,
        server,
        settings,
        navigation,
        events,
    }
}
