//! Bluetooth Module
//!
//! PAN orchestration against the bluez management service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      BluezSession                        │
//! │   (system-bus handle - resolves adapters and devices)    │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼──────────────┐
//!         │             │              │
//!         ▼             ▼              ▼
//! ┌───────────┐  ┌────────────┐  ┌───────────┐
//! │ Directory │  │ Connection │  │  Server   │
//! │           │  │            │  │           │
//! │ - managed │  │ - profile/ │  │ - UUID    │
//! │   object  │  │   network  │  │   register│
//! │   lookups │  │   connect  │  │ - teardown│
//! └───────────┘  └────────────┘  └───────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - PAN service UUIDs and alias resolution
//! - [`proxies`] - zbus proxies for the bluez interfaces
//! - [`directory`] - lookups over the managed-object tree
//! - [`session`] - system-bus handle and resolved objects
//! - [`connection`] - client connect sequence and retry policy
//! - [`server`] - NAP registration lifecycle
//! - [`error`] - error kinds and failure classification

pub mod connection;
pub mod directory;
pub mod error;
pub mod protocol;
pub mod proxies;
pub mod server;
pub mod session;

// Re-export the types the application layer works with
pub use connection::{BluezPanLink, PanNegotiator};
pub use error::{BluezError, LinkError};
pub use server::{BluezPanServer, NapRegistrar};
pub use session::{Adapter, BluezSession, Device};
