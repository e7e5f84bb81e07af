//! Navigation Host Abstraction
//!
//! The host owns the real navigation surface (browser window, webview, native
//! router). The core only needs two things from it: a way to force a full
//! top-level navigation and a way to set the visible page title.

use async_trait::async_trait;

use crate::error::Result;

/// Host navigation capability
///
/// # Example
///
/// ```ignore
/// use bridge_traits::navigation::NavigationHost;
///
/// async fn kick_to_login(host: &dyn NavigationHost) -> Result<()> {
///     host.hard_redirect("/admin/login").await
/// }
/// ```
#[async_trait]
pub trait NavigationHost: Send + Sync {
    /// Replace the current location with `href`, discarding in-app router state.
    ///
    /// Equivalent to assigning `window.location.href` on the web.
    async fn hard_redirect(&self, href: &str) -> Result<()>;

    /// Set the document/window title
    fn set_title(&self, title: &str);

    /// Current location as last set by a navigation, if the host tracks it
    fn current_location(&self) -> Option<String> {
        None
    }
}
