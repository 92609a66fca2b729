use std::fmt;

/// Which side of the PAN link this process drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// Logical lifecycle of the client-side connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    ProfileNegotiating,
    NetworkNegotiating,
    Connected,
    Disconnecting,
}

/// Tolerance/retry flags for the client connect sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// Treat an already-established connection as success.
    pub if_not_connected: bool,
    /// Drop an already-established connection and connect fresh.
    pub reconnect: bool,
}
