//! Supervisor Notification Support
//!
//! Readiness, status and watchdog messages for a supervising process
//! manager. All notification functions are no-ops when the crate is
//! built without the `systemd` feature, so daemon logic can call them
//! unconditionally.

use std::time::Duration;

#[cfg(feature = "systemd")]
use tracing::debug;

/// Watchdog ping interval derived from the supervisor environment:
/// half of `WATCHDOG_USEC`, and only when `WATCHDOG_PID` names this
/// process. `None` disables pinging; readiness notification is
/// unaffected.
pub fn watchdog_interval() -> Option<Duration> {
    watchdog_interval_from(
        std::env::var("WATCHDOG_PID").ok().as_deref(),
        std::env::var("WATCHDOG_USEC").ok().as_deref(),
        std::process::id(),
    )
}

fn watchdog_interval_from(
    pid: Option<&str>,
    usec: Option<&str>,
    own_pid: u32,
) -> Option<Duration> {
    let expected: u32 = pid?.trim().parse().ok()?;
    if expected != own_pid {
        return None;
    }
    let usec: u64 = usec?.trim().parse().ok()?;
    if usec == 0 {
        return None;
    }
    Some(Duration::from_micros(usec / 2))
}

/// Signal that the service finished initialization (`READY=1`).
#[cfg(feature = "systemd")]
pub fn notify_ready() {
    let state = [("READY", "1")];
    if let Err(err) = ::systemd::daemon::notify(false, state.iter()) {
        debug!("supervisor notification failed: {err}");
    }
}

#[cfg(not(feature = "systemd"))]
pub fn notify_ready() {}

/// Update the status line shown by the supervisor (`STATUS=<msg>`).
#[cfg(feature = "systemd")]
pub fn notify_status(msg: &str) {
    let state = [("STATUS", msg)];
    if let Err(err) = ::systemd::daemon::notify(false, state.iter()) {
        debug!("supervisor notification failed: {err}");
    }
}

#[cfg(not(feature = "systemd"))]
pub fn notify_status(_msg: &str) {}

/// Ping the watchdog timer (`WATCHDOG=1`).
#[cfg(feature = "systemd")]
pub fn notify_watchdog() {
    let state = [("WATCHDOG", "1")];
    if let Err(err) = ::systemd::daemon::notify(false, state.iter()) {
        debug!("supervisor notification failed: {err}");
    }
}

#[cfg(not(feature = "systemd"))]
pub fn notify_watchdog() {}
