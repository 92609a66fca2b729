//! PAN Connection Module
//!
//! Drives the two-step client connection sequence: profile connect,
//! then network connect, with the bounded retry/reconnect policy for
//! pre-established connections.

use async_trait::async_trait;
use tracing::{debug, warn};
use zbus::proxy::CacheProperties;

use crate::domain::models::{ConnectOptions, ConnectionState};
use crate::infrastructure::bluetooth::error::{BluezError, LinkError};
use crate::infrastructure::bluetooth::proxies::{Device1Proxy, Network1Proxy};
use crate::infrastructure::bluetooth::session::Device;

/// Network-connect attempts per invocation, including the retry after a
/// forced reconnect.
pub const CONNECT_ATTEMPTS: usize = 2;

/// The bluez calls the negotiator drives, as a seam so the policy can be
/// exercised against a scripted double.
#[async_trait]
pub trait PanLink {
    async fn connect_profile(&self, uuid: &str) -> Result<(), LinkError>;
    async fn connect_network(&self, uuid: &str) -> Result<String, LinkError>;
    async fn disconnect(&self) -> Result<(), LinkError>;
    async fn is_connected(&self) -> Result<bool, LinkError>;
    async fn interface_name(&self) -> Result<String, LinkError>;
}

/// The real link, backed by a device's `Device1` and `Network1` objects.
pub struct BluezPanLink {
    device: Device1Proxy<'static>,
    network: Network1Proxy<'static>,
}

impl BluezPanLink {
    pub async fn for_device(device: &Device) -> Result<Self, BluezError> {
        let network = Network1Proxy::builder(device.connection())
            .path(device.path().clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(Self {
            device: device.device_proxy().clone(),
            network,
        })
    }
}

#[async_trait]
impl PanLink for BluezPanLink {
    async fn connect_profile(&self, uuid: &str) -> Result<(), LinkError> {
        Ok(self.device.connect_profile(uuid).await?)
    }

    async fn connect_network(&self, uuid: &str) -> Result<String, LinkError> {
        Ok(self.network.connect(uuid).await?)
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        Ok(self.network.disconnect().await?)
    }

    async fn is_connected(&self) -> Result<bool, LinkError> {
        Ok(self.network.connected().await?)
    }

    async fn interface_name(&self) -> Result<String, LinkError> {
        Ok(self.network.interface().await?)
    }
}

/// Client-side connection state machine. One instance per connection
/// attempt; retries are serialized, never concurrent.
pub struct PanNegotiator<L> {
    link: L,
    state: ConnectionState,
}

impl<L: PanLink> PanNegotiator<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Establish the PAN connection and return the network interface
    /// name.
    ///
    /// The profile-connect step is known to report failure even when it
    /// establishes the profile as a side effect, so its errors are
    /// logged and ignored. A generic failure on network connect is
    /// re-inspected against the `Connected` property and resolved per
    /// `opts`; every other failure is fatal as-is.
    pub async fn establish(
        &mut self,
        uuid: &str,
        opts: &ConnectOptions,
    ) -> Result<String, LinkError> {
        self.state = ConnectionState::ProfileNegotiating;
        if let Err(err) = self.link.connect_profile(uuid).await {
            // Known quirk: the profile often comes up anyway.
            debug!("profile connect reported an error, continuing: {err}");
        }

        self.state = ConnectionState::NetworkNegotiating;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let failure = match self.link.connect_network(uuid).await {
                Ok(iface) => {
                    self.state = ConnectionState::Connected;
                    return Ok(iface);
                }
                Err(LinkError::Failed(reason)) => reason,
                Err(other) => {
                    self.state = ConnectionState::Disconnected;
                    return Err(other);
                }
            };

            if !self.link.is_connected().await? {
                self.state = ConnectionState::Disconnected;
                return Err(LinkError::Failed(failure));
            }

            // A connection already exists; opts decide what that means.
            if opts.reconnect && attempts < CONNECT_ATTEMPTS {
                let existing = self.link.interface_name().await?;
                debug!(
                    iface = %existing,
                    "detected pre-established connection, reconnecting"
                );
                self.link.disconnect().await?;
                continue;
            }
            if opts.if_not_connected && !opts.reconnect {
                let iface = self.link.interface_name().await?;
                self.state = ConnectionState::Connected;
                return Ok(iface);
            }

            self.state = ConnectionState::Disconnected;
            return Err(LinkError::Failed(failure));
        }
    }

    /// Tear the connection down. Used on the wait-mode exit path.
    pub async fn teardown(&mut self) -> Result<(), LinkError> {
        self.state = ConnectionState::Disconnecting;
        let result = self.link.disconnect().await;
        self.state = ConnectionState::Disconnected;
        if result.is_ok() {
            debug!("disconnected from network");
        } else {
            warn!("disconnect failed during teardown");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Attempt {
        Succeed(&'static str),
        FailGeneric,
        FailFatal,
    }

    struct FakeLink {
        attempts: Mutex<VecDeque<Attempt>>,
        connected: bool,
        existing_iface: &'static str,
        profile_fails: bool,
        connects: Mutex<usize>,
        disconnects: Mutex<usize>,
    }

    impl FakeLink {
        fn new(script: &[Attempt], connected: bool) -> Self {
            Self {
                attempts: Mutex::new(script.iter().copied().collect()),
                connected,
                existing_iface: "bnep0",
                profile_fails: false,
                connects: Mutex::new(0),
                disconnects: Mutex::new(0),
            }
        }

        fn connect_calls(&self) -> usize {
            *self.connects.lock().unwrap()
        }

        fn disconnect_calls(&self) -> usize {
            *self.disconnects.lock().unwrap()
        }
    }

    #[async_trait]
    impl PanLink for FakeLink {
        async fn connect_profile(&self, _uuid: &str) -> Result<(), LinkError> {
            if self.profile_fails {
                Err(LinkError::Failed("profile refused".into()))
            } else {
                Ok(())
            }
        }

        async fn connect_network(&self, _uuid: &str) -> Result<String, LinkError> {
            *self.connects.lock().unwrap() += 1;
            match self.attempts.lock().unwrap().pop_front() {
                Some(Attempt::Succeed(iface)) => Ok(iface.to_string()),
                Some(Attempt::FailGeneric) => Err(LinkError::Failed("Operation failed".into())),
                Some(Attempt::FailFatal) => {
                    Err(LinkError::Dbus(zbus::Error::Failure("not ready".into())))
                }
                None => panic!("unexpected connect attempt"),
            }
        }

        async fn disconnect(&self) -> Result<(), LinkError> {
            *self.disconnects.lock().unwrap() += 1;
            Ok(())
        }

        async fn is_connected(&self) -> Result<bool, LinkError> {
            Ok(self.connected)
        }

        async fn interface_name(&self) -> Result<String, LinkError> {
            Ok(self.existing_iface.to_string())
        }
    }

    #[tokio::test]
    async fn test_connects_on_first_attempt() {
        let link = FakeLink::new(&[Attempt::Succeed("bnep1")], false);
        let mut negotiator = PanNegotiator::new(link);
        let iface = negotiator
            .establish("uuid", &ConnectOptions::default())
            .await
            .unwrap();
        assert_eq!(iface, "bnep1");
        assert_eq!(negotiator.state(), ConnectionState::Connected);
        assert_eq!(negotiator.link.connect_calls(), 1);
        assert_eq!(negotiator.link.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn test_profile_connect_failure_is_ignored() {
        let mut link = FakeLink::new(&[Attempt::Succeed("bnep1")], false);
        link.profile_fails = true;
        let mut negotiator = PanNegotiator::new(link);
        let iface = negotiator
            .establish("uuid", &ConnectOptions::default())
            .await
            .unwrap();
        assert_eq!(iface, "bnep1");
    }

    #[tokio::test]
    async fn test_failure_without_connection_propagates() {
        let link = FakeLink::new(&[Attempt::FailGeneric], false);
        let mut negotiator = PanNegotiator::new(link);
        let err = negotiator
            .establish("uuid", &ConnectOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Failed(_)));
        assert_eq!(negotiator.state(), ConnectionState::Disconnected);
        assert_eq!(negotiator.link.connect_calls(), 1);
        assert_eq!(negotiator.link.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn test_reconnect_disconnects_once_and_retries() {
        let link = FakeLink::new(&[Attempt::FailGeneric, Attempt::Succeed("bnep2")], true);
        let mut negotiator = PanNegotiator::new(link);
        let opts = ConnectOptions {
            reconnect: true,
            ..Default::default()
        };
        let iface = negotiator.establish("uuid", &opts).await.unwrap();
        assert_eq!(iface, "bnep2");
        assert_eq!(negotiator.state(), ConnectionState::Connected);
        assert_eq!(negotiator.link.connect_calls(), 2);
        assert_eq!(negotiator.link.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_attempts_are_bounded() {
        let link = FakeLink::new(&[Attempt::FailGeneric, Attempt::FailGeneric], true);
        let mut negotiator = PanNegotiator::new(link);
        let opts = ConnectOptions {
            reconnect: true,
            ..Default::default()
        };
        let err = negotiator.establish("uuid", &opts).await.unwrap_err();
        assert!(matches!(err, LinkError::Failed(_)));
        assert_eq!(negotiator.link.connect_calls(), CONNECT_ATTEMPTS);
        assert_eq!(negotiator.link.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn test_if_not_connected_adopts_existing_interface() {
        let link = FakeLink::new(&[Attempt::FailGeneric], true);
        let mut negotiator = PanNegotiator::new(link);
        let opts = ConnectOptions {
            if_not_connected: true,
            ..Default::default()
        };
        let iface = negotiator.establish("uuid", &opts).await.unwrap();
        assert_eq!(iface, "bnep0");
        assert_eq!(negotiator.state(), ConnectionState::Connected);
        assert_eq!(negotiator.link.connect_calls(), 1);
        assert_eq!(negotiator.link.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn test_existing_connection_without_flags_is_an_error() {
        let link = FakeLink::new(&[Attempt::FailGeneric], true);
        let mut negotiator = PanNegotiator::new(link);
        let err = negotiator
            .establish("uuid", &ConnectOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Failed(_)));
        assert_eq!(negotiator.link.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_generic_failure_is_never_retried() {
        let link = FakeLink::new(&[Attempt::FailFatal], true);
        let mut negotiator = PanNegotiator::new(link);
        let opts = ConnectOptions {
            reconnect: true,
            if_not_connected: true,
            ..Default::default()
        };
        let err = negotiator.establish("uuid", &opts).await.unwrap_err();
        assert!(matches!(err, LinkError::Dbus(_)));
        assert_eq!(negotiator.link.connect_calls(), 1);
        assert_eq!(negotiator.link.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn test_teardown_disconnects() {
        let link = FakeLink::new(&[Attempt::Succeed("bnep1")], false);
        let mut negotiator = PanNegotiator::new(link);
        negotiator
            .establish("uuid", &ConnectOptions::default())
            .await
            .unwrap();
        negotiator.teardown().await.unwrap();
        assert_eq!(negotiator.state(), ConnectionState::Disconnected);
        assert_eq!(negotiator.link.disconnect_calls(), 1);
    }
}
