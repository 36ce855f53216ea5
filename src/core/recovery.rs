//! Two-tier response to shell failures.

use crate::domain::error::SockShellResult;
use crate::infrastructure::tcp::SessionTransport;
use tracing::{error, info, warn};

/// How bad the shell failure was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Level 0: the shell reported an unhealthy outcome
    Soft,
    /// Level 1: the shell itself failed
    Hard,
}

impl Severity {
    pub fn level(&self) -> u8 {
        match self {
            Severity::Soft => 0,
            Severity::Hard => 1,
        }
    }
}

/// What the session loop does after recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Keep serving, possibly on a new connection
    Continue,
    /// Transport is torn down and a reset was issued or attempted
    Halted,
}

pub const RECOVERY_NOTICE: &str = "[HA] system recovery ...";
pub const CRITICAL_RESET_NOTICE: &str = "[HA] Critical error - disconnect & hard reset";
pub const CRITICAL_SESSION_NOTICE: &str = "[HA] Critical error - closing session";

/// Run recovery for `severity`
///
/// Soft recovery never touches the sockets. Hard recovery on a constrained
/// platform closes connection and listener before the reset; elsewhere it
/// only recycles the connection.
pub async fn escalate(
    transport: &mut SessionTransport,
    severity: Severity,
) -> SockShellResult<RecoveryOutcome> {
    info!("[HA] recovery level {}", severity.level());
    transport.send_line(RECOVERY_NOTICE).await;

    if !transport.platform().is_constrained() {
        warn!(
            "[HA] memory recovery only available on constrained platforms ({})",
            transport.platform().name()
        );
        return match severity {
            Severity::Soft => Ok(RecoveryOutcome::Continue),
            Severity::Hard => {
                transport.send_line(CRITICAL_SESSION_NOTICE).await;
                transport.reconnect().await?;
                Ok(RecoveryOutcome::Continue)
            }
        };
    }

    transport.platform().reclaim_memory();
    let free = transport
        .platform()
        .free_memory()
        .map(|bytes| bytes.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    transport.send_line(format!("[HA] gc-collect-memfree: {}", free)).await;

    if severity == Severity::Soft {
        return Ok(RecoveryOutcome::Continue);
    }

    transport.send_line(CRITICAL_RESET_NOTICE).await;
    transport.deinit();
    if let Err(e) = transport.platform().hard_reset() {
        error!("[HA] Recovery error: {}", e);
    }
    Ok(RecoveryOutcome::Halted)
}
