//! NAP Server Module
//!
//! Registers the PAN service UUID against the bridge interface on each
//! selected adapter, and tears the registrations down on shutdown.
//!
//! bluez persists registrations across restarts of this process, so a
//! stale one from an unclean exit would make a fresh `Register` fail.
//! `register` therefore always clears the UUID first.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::infrastructure::bluetooth::error::{BluezError, LinkError};
use crate::infrastructure::bluetooth::proxies::NetworkServer1Proxy;
use crate::infrastructure::bluetooth::session::Adapter;

/// The per-adapter server endpoint, as a seam for policy tests.
#[async_trait]
pub trait PanServer {
    async fn register(&self, uuid: &str, bridge: &str) -> Result<(), LinkError>;
    async fn unregister(&self, uuid: &str) -> Result<(), LinkError>;

    /// Adapter address, for log lines only.
    fn address(&self) -> &str;
}

/// The real endpoint on an adapter's `NetworkServer1` object.
pub struct BluezPanServer {
    proxy: NetworkServer1Proxy<'static>,
    address: String,
}

impl BluezPanServer {
    pub async fn for_adapter(adapter: &Adapter) -> Result<Self, BluezError> {
        Ok(Self {
            proxy: adapter.network_server().await?,
            address: adapter.address().await?,
        })
    }
}

#[async_trait]
impl PanServer for BluezPanServer {
    async fn register(&self, uuid: &str, bridge: &str) -> Result<(), LinkError> {
        Ok(self.proxy.register(uuid, bridge).await?)
    }

    async fn unregister(&self, uuid: &str) -> Result<(), LinkError> {
        Ok(self.proxy.unregister(uuid).await?)
    }

    fn address(&self) -> &str {
        &self.address
    }
}

/// Tracks which adapters hold a live registration so shutdown
/// unregisters exactly those.
pub struct NapRegistrar<S> {
    uuid: String,
    bridge: String,
    registered: Vec<S>,
}

impl<S: PanServer> NapRegistrar<S> {
    pub fn new(uuid: &str, bridge: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            bridge: bridge.to_string(),
            registered: Vec::new(),
        }
    }

    /// Register the UUID on one adapter. The preceding unregister is
    /// best-effort: the UUID may simply not have been registered.
    pub async fn register(&mut self, server: S) -> Result<(), LinkError> {
        if let Err(err) = server.unregister(&self.uuid).await {
            debug!("no stale registration to clear: {err}");
        }
        server.register(&self.uuid, &self.bridge).await?;
        debug!(
            uuid = %self.uuid,
            bridge = %self.bridge,
            adapter = %server.address(),
            "registered PAN server"
        );
        self.registered.push(server);
        Ok(())
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Unregister everything registered during this run. Failures are
    /// reported but do not change the exit outcome.
    pub async fn unregister_all(&mut self) {
        for server in self.registered.drain(..) {
            match server.unregister(&self.uuid).await {
                Ok(()) => debug!(adapter = %server.address(), "unregistered PAN server"),
                Err(err) => warn!(
                    adapter = %server.address(),
                    "failed to unregister PAN server: {err}"
                ),
            }
        }
    }
}
