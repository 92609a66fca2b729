//! BlueZ Session Module
//!
//! Owns the single system-bus connection and resolves the adapter and
//! device objects the rest of the crate operates on. The session is
//! constructed once at startup and passed by reference; nothing here is
//! a hidden global.

use tracing::debug;
use zbus::fdo::{ManagedObjects, ObjectManagerProxy};
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedObjectPath;
use zbus::Connection;

use crate::infrastructure::bluetooth::directory;
use crate::infrastructure::bluetooth::error::BluezError;
use crate::infrastructure::bluetooth::proxies::{
    Adapter1Proxy, Device1Proxy, NetworkServer1Proxy,
};

pub const BLUEZ_SERVICE: &str = "org.bluez";

/// A handle to the bluez management service on the system bus.
pub struct BluezSession {
    conn: Connection,
}

impl BluezSession {
    /// Open the system-bus connection. Called once per process.
    pub async fn connect() -> Result<Self, BluezError> {
        let conn = Connection::system().await?;
        debug!("connected to the system bus");
        Ok(Self { conn })
    }

    async fn object_manager(&self) -> Result<ObjectManagerProxy<'static>, BluezError> {
        Ok(ObjectManagerProxy::builder(&self.conn)
            .destination(BLUEZ_SERVICE)?
            .path("/")?
            .build()
            .await?)
    }

    /// A fresh directory snapshot. Re-fetched per lookup, so consecutive
    /// lookups are not atomic with each other.
    async fn managed_objects(&self) -> Result<ManagedObjects, BluezError> {
        Ok(self.object_manager().await?.get_managed_objects().await?)
    }

    /// All adapters matching `pattern` (address or path suffix), default
    /// adapter first. Fails with `AdapterNotFound` when nothing matches.
    pub async fn find_adapters(&self, pattern: Option<&str>) -> Result<Vec<Adapter>, BluezError> {
        let objects = self.managed_objects().await?;
        let paths = directory::matching_adapters(&objects, pattern);
        if paths.is_empty() {
            return Err(BluezError::AdapterNotFound);
        }
        let mut adapters = Vec::with_capacity(paths.len());
        for path in paths {
            adapters.push(Adapter::new(&self.conn, path).await?);
        }
        Ok(adapters)
    }

    /// The device with `address`, restricted to `scope`'s path namespace
    /// when given.
    pub async fn find_device(
        &self,
        address: &str,
        scope: Option<&Adapter>,
    ) -> Result<Device, BluezError> {
        let objects = self.managed_objects().await?;
        let path = directory::find_device_path(
            &objects,
            address,
            scope.map(|adapter| adapter.path().as_str()),
        )
        .ok_or_else(|| BluezError::DeviceNotFound {
            address: address.to_string(),
        })?;
        Device::new(&self.conn, path).await
    }
}

/// A resolved local adapter.
pub struct Adapter {
    path: OwnedObjectPath,
    proxy: Adapter1Proxy<'static>,
    conn: Connection,
}

impl Adapter {
    async fn new(conn: &Connection, path: OwnedObjectPath) -> Result<Self, BluezError> {
        let proxy = Adapter1Proxy::builder(conn)
            .path(path.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(Self {
            path,
            proxy,
            conn: conn.clone(),
        })
    }

    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    pub async fn address(&self) -> Result<String, BluezError> {
        Ok(self.proxy.address().await?)
    }

    pub async fn is_powered(&self) -> Result<bool, BluezError> {
        Ok(self.proxy.powered().await?)
    }

    pub async fn power_on(&self) -> Result<(), BluezError> {
        Ok(self.proxy.set_powered(true).await?)
    }

    /// NAP server endpoint living on this adapter's object.
    pub(crate) async fn network_server(&self) -> Result<NetworkServer1Proxy<'static>, BluezError> {
        Ok(NetworkServer1Proxy::builder(&self.conn)
            .path(self.path.clone())?
            .build()
            .await?)
    }
}

/// A resolved remote peer.
pub struct Device {
    path: OwnedObjectPath,
    proxy: Device1Proxy<'static>,
    conn: Connection,
}

impl Device {
    async fn new(conn: &Connection, path: OwnedObjectPath) -> Result<Self, BluezError> {
        let proxy = Device1Proxy::builder(conn)
            .path(path.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(Self {
            path,
            proxy,
            conn: conn.clone(),
        })
    }

    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    pub async fn address(&self) -> Result<String, BluezError> {
        Ok(self.proxy.address().await?)
    }

    pub(crate) fn device_proxy(&self) -> &Device1Proxy<'static> {
        &self.proxy
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
