//! Object Directory Lookups
//!
//! Matching over a `GetManagedObjects` snapshot of the bluez object
//! tree. The functions here are pure; `BluezSession` fetches a fresh
//! snapshot per call, so results reflect current state but are not
//! atomic across calls.

use std::collections::HashMap;

use zbus::fdo::ManagedObjects;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

pub const ADAPTER_IFACE: &str = "org.bluez.Adapter1";
pub const DEVICE_IFACE: &str = "org.bluez.Device1";

fn interface_properties<'o>(
    interfaces: &'o HashMap<zbus::names::OwnedInterfaceName, HashMap<String, OwnedValue>>,
    interface: &str,
) -> Option<&'o HashMap<String, OwnedValue>> {
    interfaces
        .iter()
        .find_map(|(name, props)| (name.as_str() == interface).then_some(props))
}

/// Paths of adapter objects matching `pattern`, sorted so the default
/// adapter (lowest hci index) comes first.
///
/// A pattern matches on the exact `Address` property or as an
/// object-path suffix (e.g. `hci0`). No pattern matches every adapter.
pub(crate) fn matching_adapters(
    objects: &ManagedObjects,
    pattern: Option<&str>,
) -> Vec<OwnedObjectPath> {
    let mut paths: Vec<OwnedObjectPath> = objects
        .iter()
        .filter_map(|(path, interfaces)| {
            let props = interface_properties(interfaces, ADAPTER_IFACE)?;
            let address: Option<&str> = props
                .get("Address")
                .and_then(|v| v.downcast_ref::<&str>().ok());
            let matched = match pattern {
                None => true,
                Some(p) => address == Some(p) || path.as_str().ends_with(p),
            };
            matched.then(|| path.clone())
        })
        .collect();
    paths.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    paths
}

/// Path of the first device object under `adapter_prefix` whose
/// `Address` property equals `address`. An empty prefix searches every
/// adapter's namespace.
pub(crate) fn find_device_path(
    objects: &ManagedObjects,
    address: &str,
    adapter_prefix: Option<&str>,
) -> Option<OwnedObjectPath> {
    let prefix = adapter_prefix.unwrap_or("");
    let mut paths: Vec<OwnedObjectPath> = objects
        .iter()
        .filter_map(|(path, interfaces)| {
            let props = interface_properties(interfaces, DEVICE_IFACE)?;
            let dev_address: Option<&str> = props
                .get("Address")
                .and_then(|v| v.downcast_ref::<&str>().ok());
            (dev_address == Some(address) && path.as_str().starts_with(prefix))
                .then(|| path.clone())
        })
        .collect();
    paths.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    paths.into_iter().next()
}
