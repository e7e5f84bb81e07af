//! Wiring of the session layer.
//!
//! [`AuthRuntime`] builds one [`SessionHandle`] and hands clones of it to the
//! pipeline stages, the store and the guard, so every component observes the
//! same session.

use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::guard::NavigationGuard;
use crate::pipeline::RequestPipeline;
use crate::routes::RouteTable;
use crate::session::SessionHandle;
use crate::stages::{BearerTokenStage, UnauthorizedStage};
use crate::store::AuthStore;
use crate::token_store::TokenStore;

/// The assembled session layer of one running client.
///
/// # Example
///
/// ```no_run
/// use core_auth::{AuthRuntime, GuardDecision};
/// use core_runtime::config::CoreConfig;
///
/// # async fn run(config: CoreConfig) -> core_auth::Result<()> {
/// let runtime = AuthRuntime::start(&config).await?;
///
/// if let GuardDecision::Redirect { to, .. } = runtime.guard().before_each("/admin").await {
///     println!("go to {}", to.href());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthRuntime {
    session: SessionHandle,
    pipeline: RequestPipeline,
    token_store: TokenStore,
    store: AuthStore,
    guard: NavigationGuard,
    event_bus: EventBus,
}

impl AuthRuntime {
    /// Bootstrap with an event bus sized from the configuration.
    pub async fn start(config: &CoreConfig) -> Result<Self> {
        Self::bootstrap(config, EventBus::new(config.event_buffer_size)).await
    }

    /// Bootstrap over the site's route table.
    pub async fn bootstrap(config: &CoreConfig, event_bus: EventBus) -> Result<Self> {
        Self::bootstrap_with_routes(config, event_bus, RouteTable::angel_event()).await
    }

    /// Validate the configuration, seed the session from the persisted token
    /// and wire the components.
    ///
    /// The user profile is not fetched here; the guard loads it on the first
    /// protected navigation.
    pub async fn bootstrap_with_routes(
        config: &CoreConfig,
        event_bus: EventBus,
        routes: RouteTable,
    ) -> Result<Self> {
        config.validate()?;

        let token_store = TokenStore::from_config(config);

        // An unreadable store starts the client signed out rather than failing
        let token = token_store.load_token().await.unwrap_or_else(|e| {
            warn!(error = %e, "Starting without a stored session");
            None
        });
        let restored = token.is_some();
        let session = SessionHandle::with_token(token);

        let pipeline = RequestPipeline::from_config(config)?
            .with_request_stage(Arc::new(BearerTokenStage::new(session.clone())))
            .with_response_stage(Arc::new(UnauthorizedStage::new(
                session.clone(),
                token_store.clone(),
                Arc::clone(&config.navigation_host),
                event_bus.clone(),
                config.login_path.clone(),
            )));

        let store = AuthStore::new(
            session.clone(),
            pipeline.clone(),
            token_store.clone(),
            event_bus.clone(),
        );

        let guard = NavigationGuard::new(
            store.clone(),
            Arc::new(routes),
            Arc::clone(&config.navigation_host),
            event_bus.clone(),
        )
        .with_login_path(config.login_path.clone())
        .with_default_title(config.default_title.clone());

        info!(
            api_base = %pipeline.base_url(),
            restored_token = restored,
            "Auth runtime ready"
        );

        Ok(Self {
            session,
            pipeline,
            token_store,
            store,
            guard,
            event_bus,
        })
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }
}
