use crate::core::platform::Platform;
use crate::core::protocol::CTRL_C_SENTINEL;
use crate::core::session::state::{ShellState, TransportState};
use crate::domain::config::{ConfigStore, KEY_DEVICE_NAME};
use crate::domain::error::{SockShellError, SockShellResult};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, info, warn};

pub const BIND_RETRY_ATTEMPTS: u32 = 20;
pub const BIND_RETRY_DELAY: Duration = Duration::from_millis(250);
pub const LISTEN_BACKLOG: u32 = 10;
pub const RECV_BUFFER_SIZE: usize = 1024;

const DEFAULT_DEVICE_NAME: &str = "node01";

/// Outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Sent with a trailing newline
    Text(String),
    /// Sent exactly as given
    Raw(Vec<u8>),
}

impl Reply {
    fn is_blank(&self) -> bool {
        match self {
            Reply::Text(text) => text.trim().is_empty(),
            Reply::Raw(bytes) => String::from_utf8_lossy(bytes).trim().is_empty(),
        }
    }

    fn into_wire(self) -> Vec<u8> {
        match self {
            Reply::Text(text) => format!("{}\n", text).into_bytes(),
            Reply::Raw(bytes) => bytes,
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(bytes: Vec<u8>) -> Self {
        Reply::Raw(bytes)
    }
}

/// Read errors that only mean the client went away
fn is_peer_gone(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
    )
}

enum Endpoint {
    Unbound,
    Socket(TcpSocket),
    Listening(TcpListener),
    Closed,
}

/// Single-client line transport
///
/// Owns the listening socket for the whole process lifetime and at most one
/// connection, which is replaced on every reconnect.
pub struct SessionTransport {
    addr: SocketAddr,
    endpoint: Endpoint,
    conn: Option<(TcpStream, SocketAddr)>,
    state: TransportState,
    shell: ShellState,
    console_indent: usize,
    device_name: String,
    bind_attempts: u32,
    bind_retry_delay: Duration,
    store: Arc<dyn ConfigStore>,
    platform: Arc<dyn Platform>,
}

impl SessionTransport {
    pub fn new(
        host: &str,
        port: u16,
        store: Arc<dyn ConfigStore>,
        platform: Arc<dyn Platform>,
    ) -> SockShellResult<Self> {
        let ip: IpAddr = host.parse().map_err(|_| SockShellError::Config {
            message: format!("invalid host address: {}", host),
        })?;

        let device_name = store
            .get(KEY_DEVICE_NAME)
            .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string());

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            endpoint: Endpoint::Unbound,
            conn: None,
            state: TransportState::Unbound,
            shell: ShellState::default(),
            console_indent: 0,
            device_name,
            bind_attempts: BIND_RETRY_ATTEMPTS,
            bind_retry_delay: BIND_RETRY_DELAY,
            store,
            platform,
        })
    }

    /// Override the bind retry budget
    pub fn with_bind_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.bind_attempts = attempts.max(1);
        self.bind_retry_delay = delay;
        self
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Address actually listened on, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.endpoint {
            Endpoint::Listening(listener) => listener.local_addr().ok(),
            Endpoint::Socket(socket) => socket.local_addr().ok(),
            Endpoint::Unbound | Endpoint::Closed => None,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.conn.as_ref().map(|(_, addr)| *addr)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn shell_state(&self) -> &ShellState {
        &self.shell
    }

    pub fn shell_state_mut(&mut self) -> &mut ShellState {
        &mut self.shell
    }

    pub fn console_indent(&self) -> usize {
        self.console_indent
    }

    /// Prompt sent before every read
    pub fn prompt(&self) -> String {
        format!("{}{} $ ", self.shell.prompt_prefix, self.device_name)
    }

    /// Indented server console line
    pub fn server_console(&mut self, message: impl AsRef<str>) {
        info!("{}[ socket server ] {}", "  ".repeat(self.console_indent), message.as_ref());
        self.console_indent += 1;
    }

    /// Create the stream socket with address reuse enabled
    pub fn init(&mut self) -> SockShellResult<()> {
        if self.state != TransportState::Unbound {
            return Err(SockShellError::InvalidState(format!("init while {}", self.state)));
        }

        let socket = if self.addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;

        self.endpoint = Endpoint::Socket(socket);
        self.state = TransportState::SocketReady;
        debug!("Socket ready for {}", self.addr);
        Ok(())
    }

    /// Bind with retries, listen, then block until the first client connects
    pub async fn bind_and_accept(&mut self) -> SockShellResult<()> {
        self.bind_and_listen().await?;
        self.accept().await
    }

    /// Bind with retries and start listening
    pub async fn bind_and_listen(&mut self) -> SockShellResult<()> {
        let socket = match std::mem::replace(&mut self.endpoint, Endpoint::Unbound) {
            Endpoint::Socket(socket) => socket,
            other => {
                self.endpoint = other;
                return Err(SockShellError::InvalidState(format!("bind while {}", self.state)));
            }
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match socket.bind(self.addr) {
                Ok(()) => break,
                Err(e) if attempt < self.bind_attempts => {
                    self.server_console(format!("Bind failed. Error Code : {}", e));
                    tokio::time::sleep(self.bind_retry_delay).await;
                }
                Err(e) => {
                    self.server_console(format!("Bind failed. Error Code : {}", e));
                    // keep the socket so deinit still finds something to close
                    self.endpoint = Endpoint::Socket(socket);
                    return Err(SockShellError::Bind {
                        addr: self.addr.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
        self.server_console("Socket bind complete");

        let listener = socket.listen(LISTEN_BACKLOG)?;
        self.endpoint = Endpoint::Listening(listener);
        self.state = TransportState::Listening;
        self.server_console("Socket now listening");
        Ok(())
    }

    /// Block until a client connects
    pub async fn accept(&mut self) -> SockShellResult<()> {
        if self.conn.is_some() {
            return Err(SockShellError::InvalidState("accept with a live connection".to_string()));
        }

        self.server_console("wait to accept a connection - blocking call...");
        let (stream, peer) = match &self.endpoint {
            Endpoint::Listening(listener) => listener.accept().await?,
            _ => {
                return Err(SockShellError::InvalidState(format!("accept while {}", self.state)));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.conn = Some((stream, peer));
        self.state = TransportState::Connected;
        if let Some(name) = self.store.get(KEY_DEVICE_NAME) {
            self.device_name = name;
        }
        self.server_console(format!("Connected with {}", peer));
        Ok(())
    }

    /// Send the prompt and read one line
    ///
    /// Returns `None` when the connection was recycled instead (read timeout
    /// or peer hang-up); the caller must ask the new client for a line.
    pub async fn recv_line(&mut self, timeout_secs: u64) -> SockShellResult<Option<String>> {
        let prompt = self.prompt();
        self.send_line(Reply::Raw(prompt.into_bytes())).await;

        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let read = {
            let (stream, _) = self.conn.as_mut().ok_or(SockShellError::NotConnected)?;
            tokio::time::timeout(Duration::from_secs(timeout_secs), stream.read(&mut buffer)).await
        };

        let received = match read {
            Ok(Ok(0)) => {
                self.server_console("socket recv - peer closed the connection");
                self.reconnect().await?;
                return Ok(None);
            }
            Ok(Err(e)) if is_peer_gone(e.kind()) => {
                self.server_console(format!("socket recv - peer dropped the connection: {}", e));
                self.reconnect().await?;
                return Ok(None);
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                self.on_timeout(timeout_secs).await?;
                return Ok(None);
            }
            Ok(Err(e)) => {
                return Err(SockShellError::Transport {
                    message: format!("socket recv failed: {}", e),
                });
            }
            Err(_) => {
                self.on_timeout(timeout_secs).await?;
                return Ok(None);
            }
        };

        let line = match std::str::from_utf8(&buffer[..received]) {
            Ok(text) => text.trim().to_string(),
            Err(_) => CTRL_C_SENTINEL.to_string(),
        };
        self.server_console(format!("RAW INPUT |{}|", line));
        Ok(Some(line))
    }

    async fn on_timeout(&mut self, timeout_secs: u64) -> SockShellResult<()> {
        self.server_console(format!(
            "socket recv - connection with user - timeout {} sec",
            timeout_secs
        ));
        self.send_line(format!("Session timeout {} sec", timeout_secs)).await;
        self.reconnect().await
    }

    /// Fire-and-forget send
    ///
    /// Blank messages are skipped, text gets a trailing newline and failures
    /// are only logged.
    pub async fn send_line(&mut self, message: impl Into<Reply>) {
        let reply = message.into();
        if reply.is_blank() {
            self.server_console(format!("No msg income: {:?}", reply));
            return;
        }

        let Some((stream, _)) = self.conn.as_mut() else {
            debug!("send skipped, no client: {:?}", reply);
            return;
        };

        let result = stream.write_all(&reply.into_wire()).await;
        if let Err(e) = result {
            self.server_console(format!("send failed: {}", e));
        }
    }

    /// Drop the current client and wait for the next one
    pub async fn reconnect(&mut self) -> SockShellResult<()> {
        let peer = self
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "<none>".to_string());
        self.server_console(format!("exit and close connection from {}", peer));
        self.send_line(format!("exit and close connection from {}", peer)).await;
        self.close_connection().await;

        self.shell.reset();
        self.console_indent = 0;
        self.platform.reclaim_memory();

        self.accept().await
    }

    async fn close_connection(&mut self) {
        if let Some((mut stream, peer)) = self.conn.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("shutdown of {} failed: {}", peer, e);
            }
        }
        if self.state == TransportState::Connected {
            self.state = TransportState::Disconnected;
        }
    }

    /// Close the connection and the listening socket
    pub fn deinit(&mut self) {
        self.console_indent = 0;
        if let Some((_stream, peer)) = self.conn.take() {
            debug!("Closing connection with {}", peer);
        }
        if !matches!(self.endpoint, Endpoint::Closed) {
            info!("[ socket server ] closing listening socket {}", self.addr);
        }
        self.endpoint = Endpoint::Closed;
        self.state = TransportState::Closed;
    }
}

impl Drop for SessionTransport {
    fn drop(&mut self) {
        if self.state != TransportState::Closed && self.state != TransportState::Unbound {
            warn!("SessionTransport dropped while {} - closing sockets", self.state);
            self.deinit();
        }
    }
}
