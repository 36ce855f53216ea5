use crate::core::dispatch::{Dispatcher, Outcome, SessionView};
use crate::core::identity::resolve_uid;
use crate::core::platform::{MacSource, Platform};
use crate::core::protocol::{ControlFilter, Filtered};
use crate::core::recovery::{self, RecoveryOutcome, Severity};
use crate::core::session::state::TransportState;
use crate::domain::config::{resolve_port, resolve_timeout, ConfigStore, ServerOptions, KEY_DEVICE_IP};
use crate::domain::error::{SockShellError, SockShellResult};
use crate::infrastructure::tcp::SessionTransport;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long the session loop runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Serve until the process ends or hard recovery halts it
    Loop,
    /// One read/dispatch cycle, then return
    Once,
}

/// Why [`Session::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Single-shot cycle finished
    Completed,
    /// Hard recovery tore the transport down
    Halted,
}

/// External collaborators of a session
pub struct SessionDeps {
    pub store: Arc<dyn ConfigStore>,
    pub platform: Arc<dyn Platform>,
    pub dispatcher: Box<dyn Dispatcher>,
    pub mac_source: Option<Box<dyn MacSource>>,
}

/// Single-client shell session server
pub struct Session {
    transport: SessionTransport,
    filter: ControlFilter,
    dispatcher: Box<dyn Dispatcher>,
    timeout_secs: u64,
    port: u16,
}

impl Session {
    /// Resolve port, timeout and uid, and prepare an unbound transport
    pub fn new(options: ServerOptions, deps: SessionDeps) -> SockShellResult<Self> {
        let SessionDeps {
            store,
            platform,
            dispatcher,
            mac_source,
        } = deps;

        let port = resolve_port(options.port, store.as_ref());
        let timeout_secs = resolve_timeout(options.user_timeout.as_deref(), store.as_ref());
        let uid = resolve_uid(options.uid.as_deref(), mac_source.as_deref(), store.as_ref());

        let hint_host = if platform.is_constrained() {
            store.get(KEY_DEVICE_IP).unwrap_or_else(|| "n/a".to_string())
        } else {
            "127.0.0.1".to_string()
        };

        let mut transport =
            SessionTransport::new(options.bind_host(), port, store.clone(), platform)?;
        transport.server_console("<<constructor>>");
        transport.server_console(format!("telnet {} {}", hint_host, port));

        Ok(Self {
            transport,
            filter: ControlFilter::new(uid),
            dispatcher,
            timeout_secs,
            port,
        })
    }

    /// Override the bind retry budget
    pub fn with_bind_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.transport = self.transport.with_bind_retry(attempts, delay);
        self
    }

    pub fn uid(&self) -> &str {
        self.filter.uid()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn transport(&self) -> &SessionTransport {
        &self.transport
    }

    /// Set up the socket, wait for the first client and serve it
    ///
    /// The transport is shut down before returning, whatever the result.
    pub async fn run(&mut self, mode: RunMode) -> SockShellResult<RunExit> {
        let result = self.serve(mode).await;
        self.shutdown();
        result
    }

    async fn serve(&mut self, mode: RunMode) -> SockShellResult<RunExit> {
        self.transport.init()?;
        self.transport.bind_and_accept().await?;

        loop {
            if let Some(exit) = self.cycle().await? {
                return Ok(exit);
            }
            if mode == RunMode::Once {
                return Ok(RunExit::Completed);
            }
        }
    }

    /// Close connection and listening socket, a no-op once closed
    pub fn shutdown(&mut self) {
        if self.transport.state() == TransportState::Closed {
            return;
        }
        info!("[ socket server ] <<destructor>>");
        self.transport.deinit();
    }

    /// One prompt, read, filter, dispatch round
    async fn cycle(&mut self) -> SockShellResult<Option<RunExit>> {
        let line = match self.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(None),
            Err(e @ SockShellError::Transport { .. }) => {
                error!("[EXEC-ERROR] transport error: {}", e);
                return self.recover(Severity::Hard).await;
            }
            Err(e) => return Err(e),
        };
        if line.is_empty() {
            return Ok(None);
        }

        let severity = match self.dispatch(&line).await {
            Ok(outcome) if outcome.healthy => return Ok(None),
            Ok(outcome) => {
                warn!("[EXEC-WARNING] shell internal error: {}", outcome.message);
                Severity::Soft
            }
            Err(e) => {
                error!("[EXEC-ERROR] shell error: {}", e);
                Severity::Hard
            }
        };

        self.recover(severity).await
    }

    async fn recover(&mut self, severity: Severity) -> SockShellResult<Option<RunExit>> {
        match recovery::escalate(&mut self.transport, severity).await? {
            RecoveryOutcome::Continue => Ok(None),
            RecoveryOutcome::Halted => Ok(Some(RunExit::Halted)),
        }
    }

    /// Read a line and answer control requests, `Some("")` when consumed
    async fn next_line(&mut self) -> SockShellResult<Option<String>> {
        let Some(raw) = self.transport.recv_line(self.timeout_secs).await? else {
            return Ok(None);
        };

        let filtered = self.filter.apply(&raw, self.transport.device_name());
        let line = filtered.line().to_string();
        match filtered {
            Filtered::Disconnect(reply) => {
                self.transport.send_line(reply).await;
                self.transport.reconnect().await?;
            }
            Filtered::Reply(reply) => self.transport.send_line(reply).await,
            Filtered::Forward(_) => {}
        }
        Ok(Some(line))
    }

    async fn dispatch(&mut self, line: &str) -> SockShellResult<Outcome> {
        let mut view = SessionView::new(self.transport.shell_state_mut());
        let result = self.dispatcher.execute(line, &mut view).await;
        let replies = view.into_replies();

        for reply in replies {
            self.transport.send_line(reply).await;
        }
        result
    }
}
