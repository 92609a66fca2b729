//! zbus proxies for the BlueZ interfaces this tool drives.
//!
//! Property access goes through the typed accessors these traits
//! generate; there is no untyped getter in the public surface.

use zbus::proxy;

/// A local Bluetooth adapter object.
#[proxy(
    interface = "org.bluez.Adapter1",
    default_service = "org.bluez",
    gen_blocking = false
)]
pub trait Adapter1 {
    /// Hardware address of the adapter, `XX:XX:XX:XX:XX:XX`.
    #[zbus(property)]
    fn address(&self) -> zbus::Result<String>;

    /// Whether the radio is powered.
    #[zbus(property)]
    fn powered(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn set_powered(&self, value: bool) -> zbus::Result<()>;
}

/// A remote peer known to bluez (discovered or previously paired).
#[proxy(
    interface = "org.bluez.Device1",
    default_service = "org.bluez",
    gen_blocking = false
)]
pub trait Device1 {
    /// Connect a specific profile UUID on the device.
    fn connect_profile(&self, uuid: &str) -> zbus::Result<()>;

    /// Hardware address of the peer.
    #[zbus(property)]
    fn address(&self) -> zbus::Result<String>;
}

/// PAN client endpoint living on a device object.
#[proxy(
    interface = "org.bluez.Network1",
    default_service = "org.bluez",
    gen_blocking = false
)]
pub trait Network1 {
    /// Connect the network profile; returns the created interface name.
    fn connect(&self, uuid: &str) -> zbus::Result<String>;

    fn disconnect(&self) -> zbus::Result<()>;

    /// Whether a network connection is currently established.
    #[zbus(property)]
    fn connected(&self) -> zbus::Result<bool>;

    /// Name of the network interface backing the connection.
    #[zbus(property)]
    fn interface(&self) -> zbus::Result<String>;
}

/// NAP server endpoint living on an adapter object.
#[proxy(
    interface = "org.bluez.NetworkServer1",
    default_service = "org.bluez",
    gen_blocking = false
)]
pub trait NetworkServer1 {
    /// Register a PAN server for `uuid`, attaching links to `bridge`.
    fn register(&self, uuid: &str, bridge: &str) -> zbus::Result<()>;

    fn unregister(&self, uuid: &str) -> zbus::Result<()>;
}
