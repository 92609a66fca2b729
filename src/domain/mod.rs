//! Domain Layer
//!
//! Pure models and settings; nothing here touches the bus.

pub mod models;
pub mod settings;
