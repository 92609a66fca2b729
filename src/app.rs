//! Application Layer
//!
//! Lifecycle orchestration: resolve and power the local adapters,
//! dispatch to the server or client flow, keep the process alive with
//! the wait cycle, and guarantee cleanup on interrupt or termination.

use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::cli::{Cli, ClientOpts, Commands, ServerOpts};
use crate::domain::models::{ConnectOptions, Role};
use crate::infrastructure::bluetooth::{
    protocol, Adapter, BluezPanLink, BluezPanServer, BluezSession, NapRegistrar, PanNegotiator,
};
use crate::infrastructure::{bridge, systemd};

/// Sleep per wait cycle when no watchdog interval applies.
const IDLE_INTERVAL: Duration = Duration::from_secs(3600);

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let role = match &cli.command {
        Commands::Server(_) => Role::Server,
        Commands::Client(_) => Role::Client,
    };
    if cli.device_all && role != Role::Server {
        anyhow::bail!("--device-all is only valid in server mode");
    }

    let uuid = protocol::resolve_uuid(&cli.uuid);
    let session = BluezSession::connect()
        .await
        .context("connecting to the system bus")?;

    let adapters = resolve_local_adapters(&session, cli.device.as_deref(), cli.device_all).await?;

    match &cli.command {
        Commands::Server(opts) => run_server(&adapters, &uuid, opts, cli.systemd).await,
        Commands::Client(opts) => {
            run_client(&session, &adapters[0], &uuid, opts, cli.systemd).await
        }
    }
}

/// Resolve the selected adapter set (single by pattern, or all) and
/// power each one on.
async fn resolve_local_adapters(
    session: &BluezSession,
    pattern: Option<&str>,
    all: bool,
) -> anyhow::Result<Vec<Adapter>> {
    let adapters = if all {
        session.find_adapters(None).await?
    } else {
        let mut found = session.find_adapters(pattern).await?;
        found.truncate(1);
        found
    };
    for adapter in &adapters {
        if !adapter.is_powered().await? {
            adapter.power_on().await?;
        }
        debug!(
            address = %adapter.address().await?,
            path = %adapter.path(),
            "using local device"
        );
    }
    Ok(adapters)
}

async fn run_server(
    adapters: &[Adapter],
    uuid: &str,
    opts: &ServerOpts,
    notify: bool,
) -> anyhow::Result<()> {
    if let Err(err) = bridge::ensure_ready(&opts.iface_name).await {
        eprintln!("{err}");
        eprintln!();
        eprintln!("{}", bridge::remediation_hint(&opts.iface_name));
        anyhow::bail!("bridge interface {} is not ready", opts.iface_name);
    }

    let mut registrar = NapRegistrar::new(uuid, &opts.iface_name);
    let serve = async {
        for adapter in adapters {
            let server = BluezPanServer::for_adapter(adapter).await?;
            registrar
                .register(server)
                .await
                .with_context(|| format!("registering uuid {uuid} on {}", adapter.path()))?;
        }
        info!(uuid, bridge = %opts.iface_name, "serving PAN network");

        let mut cycle = WaitCycle::new(notify, Role::Server);
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = cycle.run_once() => {}
            }
        }
        Ok(())
    };

    // Cleanup runs on the error path too: a mid-flight registration
    // failure must still release the adapters registered before it.
    let result: anyhow::Result<()> = serve.await;
    registrar.unregister_all().await;
    result
}

async fn run_client(
    session: &BluezSession,
    adapter: &Adapter,
    uuid: &str,
    opts: &ClientOpts,
    notify: bool,
) -> anyhow::Result<()> {
    let device = session.find_device(&opts.remote_addr, Some(adapter)).await?;
    debug!(
        address = %device.address().await?,
        path = %device.path(),
        "using remote device"
    );

    let link = BluezPanLink::for_device(&device).await?;
    let mut negotiator = PanNegotiator::new(link);
    let connect_opts = ConnectOptions {
        if_not_connected: opts.if_not_connected,
        reconnect: opts.reconnect,
    };
    let iface = negotiator
        .establish(uuid, &connect_opts)
        .await
        .with_context(|| format!("connecting to {}", opts.remote_addr))?;
    info!(
        device = %device.path(),
        uuid,
        iface = %iface,
        "connected to PAN network"
    );

    // Without wait-mode the link is left attached on exit.
    if !opts.wait {
        debug!(state = ?negotiator.state(), "leaving connection attached");
        return Ok(());
    }

    let mut cycle = WaitCycle::new(notify, Role::Client);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = cycle.run_once() => {}
        }
    }

    if let Err(err) = negotiator.teardown().await {
        warn!("failed to disconnect cleanly: {err}");
    }
    Ok(())
}

/// One blocking heartbeat of the liveness loop.
///
/// Announces readiness to the supervisor once, then sleeps either the
/// idle interval or the watchdog interval, pinging the watchdog after
/// waking when one is active.
struct WaitCycle {
    notify: bool,
    role: Role,
    interval: Duration,
    watchdog: bool,
    ready_sent: bool,
}

impl WaitCycle {
    fn new(notify: bool, role: Role) -> Self {
        let watchdog = if notify {
            systemd::watchdog_interval()
        } else {
            None
        };
        Self::configure(notify, role, watchdog)
    }

    fn configure(notify: bool, role: Role, watchdog: Option<Duration>) -> Self {
        if let Some(interval) = watchdog {
            debug!(?interval, "watchdog pinger enabled");
        }
        Self {
            notify,
            role,
            interval: watchdog.map_or(IDLE_INTERVAL, |d| d.min(IDLE_INTERVAL)),
            watchdog: watchdog.is_some(),
            ready_sent: false,
        }
    }

    /// Whether this cycle must emit the one-time readiness
    /// notification. Flips the latch.
    fn announce_ready(&mut self) -> bool {
        let announce = self.notify && !self.ready_sent;
        self.ready_sent = true;
        announce
    }

    async fn run_once(&mut self) {
        if self.announce_ready() {
            systemd::notify_ready();
            systemd::notify_status(&format!("Running in {} mode...", self.role));
        }
        tokio::time::sleep(self.interval).await;
        if self.watchdog {
            systemd::notify_watchdog();
        }
    }
}

/// Completes on SIGINT or SIGTERM, so termination takes the same
/// cleanup path as an interrupt.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("received interrupt, shutting down"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            }
        }
        Err(err) => {
            warn!("failed to register SIGTERM handler: {err}");
            let _ = ctrl_c.await;
            info!("received interrupt, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_is_announced_exactly_once() {
        let mut cycle = WaitCycle::configure(true, Role::Server, None);
        assert!(cycle.announce_ready());
        assert!(!cycle.announce_ready());
        assert!(!cycle.announce_ready());
    }

    #[test]
    fn test_no_announcement_without_supervisor() {
        let mut cycle = WaitCycle::configure(false, Role::Client, None);
        assert!(!cycle.announce_ready());
    }

    #[test]
    fn test_watchdog_interval_bounds_the_sleep() {
        let cycle = WaitCycle::configure(true, Role::Server, Some(Duration::from_secs(5)));
        assert_eq!(cycle.interval, Duration::from_secs(5));
        assert!(cycle.watchdog);
    }

    #[test]
    fn test_long_watchdog_interval_is_capped() {
        let cycle = WaitCycle::configure(true, Role::Server, Some(Duration::from_secs(7200)));
        assert_eq!(cycle.interval, IDLE_INTERVAL);
        assert!(cycle.watchdog);
    }

    #[test]
    fn test_idle_interval_without_watchdog() {
        let cycle = WaitCycle::configure(true, Role::Client, None);
        assert_eq!(cycle.interval, IDLE_INTERVAL);
        assert!(!cycle.watchdog);
    }
}
