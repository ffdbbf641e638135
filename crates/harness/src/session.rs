//! Lazily created provider and SDK instance shared across tests.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use mock_provider::{Connector, MockProvider};
use tracing::{debug, error, warn};

use crate::{
    config::{HarnessConfig, Network},
    error::{HarnessError, Result},
};

/// The SDK under test, as far as the harness needs to drive it.
#[async_trait]
pub trait Sdk: Send + Sync + 'static {
    /// Connects the SDK to the wallet provider.
    async fn initialize(&mut self, provider: MockProvider) -> eyre::Result<()>;

    /// Releases SDK resources.
    async fn deinit(&self) -> eyre::Result<()>;
}

type SdkFactory<S> = Box<dyn Fn(Network) -> S + Send + Sync>;

/// Owns at most one initialized SDK and the provider it was given.
///
/// The provider is selected once and survives [`reset`](Self::reset); the SDK
/// is rebuilt on the next [`get`](Self::get).
pub struct SdkSession<S> {
    config: HarnessConfig,
    connector: Arc<dyn Connector>,
    factory: SdkFactory<S>,
    provider: Option<MockProvider>,
    sdk: Option<Arc<S>>,
}

impl<S: Sdk> SdkSession<S> {
    pub fn new(
        config: HarnessConfig,
        connector: Arc<dyn Connector>,
        factory: impl Fn(Network) -> S + Send + Sync + 'static,
    ) -> Self {
        Self { config, connector, factory: Box::new(factory), provider: None, sdk: None }
    }

    /// Uses `provider` instead of selecting an endpoint.
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub const fn is_active(&self) -> bool {
        self.sdk.is_some()
    }

    /// The session provider, connecting on first use.
    pub async fn provider(&mut self) -> Result<MockProvider> {
        if let Some(provider) = &self.provider {
            return Ok(provider.clone());
        }

        let candidates = self.config.candidates();
        let provider = MockProvider::connect(
            &candidates,
            self.connector.as_ref(),
            self.config.selection_policy(),
        )
        .await?
        .with_identity(self.config.identity()?)
        .with_chain_id(self.config.chain_id);

        debug!(endpoint = provider.endpoint_url(), address = %provider.address(), "Provider ready");
        self.provider = Some(provider.clone());
        Ok(provider)
    }

    /// The initialized SDK, creating it on first use.
    pub async fn get(&mut self) -> Result<Arc<S>> {
        if let Some(sdk) = &self.sdk {
            return Ok(sdk.clone());
        }

        let provider = self.provider().await?;
        let network = self.config.network;
        let mut sdk = (self.factory)(network);
        if let Err(e) = sdk.initialize(provider).await {
            let reason = format!("{e:#}");
            error!(%network, error = %reason, "SDK initialization failed");
            return Err(HarnessError::SdkInit(reason));
        }

        let sdk = Arc::new(sdk);
        self.sdk = Some(sdk.clone());
        Ok(sdk)
    }

    /// Deinitializes the SDK, if any. Cleanup failures are logged, never returned.
    pub async fn reset(&mut self) {
        let Some(sdk) = self.sdk.take() else {
            return;
        };
        if let Err(e) = sdk.deinit().await {
            warn!(error = %format!("{e:#}"), "SDK cleanup failed");
        }
    }

    /// Runs `f` with the SDK and provider, then resets the session.
    pub async fn scoped<F, Fut, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(Arc<S>, MockProvider) -> Fut,
        Fut: Future<Output = T>,
    {
        let sdk = match self.get().await {
            Ok(sdk) => sdk,
            Err(e) => {
                self.reset().await;
                return Err(e);
            }
        };
        let provider = self.provider().await?;
        let output = f(sdk, provider).await;
        self.reset().await;
        Ok(output)
    }
}

impl<S> std::fmt::Debug for SdkSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkSession")
            .field("network", &self.config.network)
            .field("provider", &self.provider)
            .field("active", &self.sdk.is_some())
            .finish()
    }
}
