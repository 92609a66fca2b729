//! Error kinds at the BlueZ boundary.
//!
//! Resolution failures (`BluezError`) abort before any state changes.
//! Action failures (`LinkError`) carry the classification the connect
//! policy branches on.

use thiserror::Error;

/// The catch-all error code bluez reports for failed actions. On
/// `Network1.Connect` this can also mean a link is already established.
pub const BLUEZ_ERR_FAILED: &str = "org.bluez.Error.Failed";

/// Failures while resolving adapters and devices from the object directory.
#[derive(Debug, Error)]
pub enum BluezError {
    #[error("Bluetooth adapter not found")]
    AdapterNotFound,

    #[error("Bluetooth device {address} not found")]
    DeviceNotFound { address: String },

    #[error(transparent)]
    Dbus(#[from] zbus::Error),
}

impl From<zbus::fdo::Error> for BluezError {
    fn from(err: zbus::fdo::Error) -> Self {
        BluezError::Dbus(err.into())
    }
}

/// Outcome of a bluez action call, split into the generic failure class
/// and everything else.
#[derive(Debug, Error)]
pub enum LinkError {
    /// `org.bluez.Error.Failed` — ambiguous; the caller decides whether it
    /// masks an already-established connection.
    #[error("bluez call failed: {0}")]
    Failed(String),

    /// Any other service error. Never retried.
    #[error(transparent)]
    Dbus(zbus::Error),
}

impl From<zbus::Error> for LinkError {
    fn from(err: zbus::Error) -> Self {
        match &err {
            zbus::Error::MethodError(name, detail, _) if name.as_str() == BLUEZ_ERR_FAILED => {
                let detail = detail
                    .clone()
                    .unwrap_or_else(|| BLUEZ_ERR_FAILED.to_string());
                LinkError::Failed(detail)
            }
            _ => LinkError::Dbus(err),
        }
    }
}
