//! Infrastructure Layer
//!
//! Integrations with the outside world: the bluez management service,
//! the kernel bridge tooling, the process supervisor, and logging.

pub mod bluetooth;
pub mod bridge;
pub mod logging;
pub mod systemd;
