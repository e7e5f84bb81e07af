//! In-memory bridge doubles shared by the unit tests.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::navigation::NavigationHost;
use bridge_traits::storage::SettingsStore;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct MemorySettingsStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn with_token(key: &str, token: &str) -> Self {
        let store = Self::default();
        store.insert(key, token);
        store
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.data.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        self.data.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigationHost {
    redirects: Mutex<Vec<String>>,
    titles: Mutex<Vec<String>>,
}

impl RecordingNavigationHost {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    pub fn last_title(&self) -> Option<String> {
        self.titles.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NavigationHost for RecordingNavigationHost {
    async fn hard_redirect(&self, href: &str) -> Result<()> {
        self.redirects.lock().unwrap().push(href.to_string());
        Ok(())
    }

    fn set_title(&self, title: &str) {
        self.titles.lock().unwrap().push(title.to_string());
    }
}

/// Replays queued outcomes in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedHttpClient {
    outcomes: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
    hold: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedHttpClient {
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body.to_string())));
        self
    }

    pub fn fail(&self, error: BridgeError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Keep the next reply back until the returned sender fires or is dropped.
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (release, held) = oneshot::channel();
        *self.hold.lock().unwrap() = Some(held);
        release
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::OperationFailed("nothing scripted".to_string())));

        let held = self.hold.lock().unwrap().take();
        if let Some(held) = held {
            let _ = held.await;
        }
        outcome
    }
}
