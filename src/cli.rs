//! Command-line Interface
//!
//! Role selection plus the shared adapter/UUID options. The flag
//! surface mirrors the classic bt-pan tooling.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "btpan", version, about = "BlueZ bluetooth PAN network server/client")]
pub struct Cli {
    /// Local device address/pattern to use (if not default)
    #[arg(
        short = 'i',
        long = "device",
        value_name = "local-addr/pattern",
        global = true
    )]
    pub device: Option<String>,

    /// Use all local hci devices, not just the default one. Only valid
    /// in server mode
    #[arg(short = 'a', long = "device-all", conflicts_with = "device", global = true)]
    pub device_all: bool,

    /// Service UUID to use. Either a full UUID or one of the shortcuts:
    /// gn, panu, nap
    #[arg(
        short = 'u',
        long,
        value_name = "uuid_or_shortcut",
        default_value = "nap",
        global = true
    )]
    pub uuid: String,

    /// Use systemd service notification/watchdog mechanisms, if available
    #[arg(long, global = true)]
    pub systemd: bool,

    /// Verbose operation mode
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run infinitely as a NAP network server
    Server(ServerOpts),
    /// Connect to a PAN network
    Client(ClientOpts),
}

#[derive(Debug, Args)]
pub struct ServerOpts {
    /// Bridge interface name to which each link will be added by bluez.
    /// It must be created and configured before starting the server
    pub iface_name: String,
}

#[derive(Debug, Args)]
pub struct ClientOpts {
    /// Remote device address to connect to
    pub remote_addr: String,

    /// Go into an endless wait-loop after connection, terminating it on
    /// exit
    #[arg(short, long)]
    pub wait: bool,

    /// Don't raise an error if the connection is already established
    #[arg(short = 'c', long = "if-not-connected")]
    pub if_not_connected: bool,

    /// Force reconnection if some connection is already established
    #[arg(short, long)]
    pub reconnect: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server() {
        let cli = Cli::try_parse_from(["btpan", "server", "bnep-bridge"]).unwrap();
        assert_eq!(cli.uuid, "nap");
        match cli.command {
            Commands::Server(opts) => assert_eq!(opts.iface_name, "bnep-bridge"),
            Commands::Client(_) => panic!("expected server"),
        }
    }

    #[test]
    fn test_parse_client_flags() {
        let cli = Cli::try_parse_from([
            "btpan",
            "--uuid",
            "gn",
            "client",
            "AA:BB:CC:DD:EE:FF",
            "-w",
            "-r",
        ])
        .unwrap();
        assert_eq!(cli.uuid, "gn");
        match cli.command {
            Commands::Client(opts) => {
                assert_eq!(opts.remote_addr, "AA:BB:CC:DD:EE:FF");
                assert!(opts.wait);
                assert!(opts.reconnect);
                assert!(!opts.if_not_connected);
            }
            Commands::Server(_) => panic!("expected client"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["btpan", "server", "br0", "--device", "hci1"]).unwrap();
        assert_eq!(cli.device.as_deref(), Some("hci1"));
    }

    #[test]
    fn test_device_and_device_all_conflict() {
        assert!(
            Cli::try_parse_from(["btpan", "-i", "hci0", "-a", "server", "br0"]).is_err()
        );
    }
}
