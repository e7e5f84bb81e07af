//! In-process navigation host for desktop shells

use async_trait::async_trait;
use bridge_traits::{error::Result, navigation::NavigationHost};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

type RedirectHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Navigation host that records the current location and window title.
///
/// A desktop shell that embeds a webview can register a redirect handler to
/// reload the view whenever the core forces a top-level navigation.
pub struct DesktopNavigationHost {
    state: Mutex<NavigationState>,
    on_redirect: Option<RedirectHandler>,
}

#[derive(Debug, Default)]
struct NavigationState {
    location: Option<String>,
    title: Option<String>,
    redirects: Vec<String>,
}

impl DesktopNavigationHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NavigationState::default()),
            on_redirect: None,
        }
    }

    /// Invoke `handler` with the target of every hard redirect
    pub fn with_redirect_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_redirect = Some(Box::new(handler));
        self
    }

    /// Last title applied by the core
    pub fn title(&self) -> Option<String> {
        self.state().title.clone()
    }

    /// Every hard redirect issued so far, oldest first
    pub fn redirects(&self) -> Vec<String> {
        self.state().redirects.clone()
    }

    fn state(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DesktopNavigationHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NavigationHost for DesktopNavigationHost {
    async fn hard_redirect(&self, href: &str) -> Result<()> {
        info!(href = href, "Hard redirect");
        {
            let mut state = self.state();
            state.location = Some(href.to_string());
            state.redirects.push(href.to_string());
        }

        if let Some(handler) = &self.on_redirect {
            handler(href);
        }
        Ok(())
    }

    fn set_title(&self, title: &str) {
        self.state().title = Some(title.to_string());
    }

    fn current_location(&self) -> Option<String> {
        self.state().location.clone()
    }
}
