//! PAN Protocol Definitions
//!
//! Well-known service UUIDs for the Bluetooth Personal Area Network
//! profile and resolution of their short aliases.

/// PAN User — the client end of a PAN link.
pub const PANU_UUID: &str = "00001115-0000-1000-8000-00805f9b34fb";

/// Network Access Point — bridges PAN links into an Ethernet segment.
pub const NAP_UUID: &str = "00001116-0000-1000-8000-00805f9b34fb";

/// Group ad-hoc Network.
pub const GN_UUID: &str = "00001117-0000-1000-8000-00805f9b34fb";

/// Expand the well-known shortcuts (`gn`, `panu`, `nap`) to their full
/// UUID form. Anything else is handed to bluez unchanged, so callers can
/// pass a full UUID directly.
pub fn resolve_uuid(value: &str) -> String {
    match value.to_ascii_lowercase().as_str() {
        "panu" => PANU_UUID.to_string(),
        "nap" => NAP_UUID.to_string(),
        "gn" => GN_UUID.to_string(),
        _ => value.to_string(),
    }
}
