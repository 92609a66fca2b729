//! Bridge Status Collaborator
//!
//! The server role requires the kernel bridge to exist before bluez can
//! add PAN links to it. Bridge creation is out of scope; this module
//! only asks `brctl` whether the interface is ready and renders the
//! remediation steps when it is not.

use std::process::Output;

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
#[error("brctl check failed for interface {iface}: {detail}")]
pub struct BridgeNotReady {
    pub iface: String,
    pub detail: String,
}

/// Verify that `iface` exists and is configured. Success is a zero exit
/// status with empty diagnostic output; any deviation means not ready.
pub async fn ensure_ready(iface: &str) -> Result<(), BridgeNotReady> {
    let output = match Command::new("brctl").arg("show").arg(iface).output().await {
        Ok(output) => output,
        Err(err) => {
            return Err(BridgeNotReady {
                iface: iface.to_string(),
                detail: err.to_string(),
            })
        }
    };
    if bridge_ok(&output) {
        Ok(())
    } else {
        Err(BridgeNotReady {
            iface: iface.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn bridge_ok(output: &Output) -> bool {
    output.status.success() && output.stderr.is_empty()
}

/// Step-by-step setup commands shown when the bridge check fails.
pub fn remediation_hint(iface: &str) -> String {
    format!(
        "Bridge interface must be added and configured before starting the server, e.g. with:\n\
         \x20 brctl addbr {iface}\n\
         \x20 brctl setfd {iface} 0\n\
         \x20 brctl stp {iface} off\n\
         \x20 ip addr add 10.101.225.84/24 dev {iface}\n\
         \x20 ip link set {iface} up"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn output(code: i32, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_clean_exit_with_silent_stderr_is_ready() {
        assert!(bridge_ok(&output(0, "")));
    }

    #[test]
    fn test_diagnostic_output_means_not_ready() {
        assert!(!bridge_ok(&output(0, "bridge br0 does not exist!")));
    }

    #[test]
    fn test_nonzero_exit_means_not_ready() {
        // Raw wait status 256 encodes exit code 1.
        assert!(!bridge_ok(&output(256, "")));
    }

    #[test]
    fn test_remediation_names_the_interface() {
        let hint = remediation_hint("bnep-bridge");
        assert!(hint.contains("brctl addbr bnep-bridge"));
        assert!(hint.contains("ip link set bnep-bridge up"));
    }
}
