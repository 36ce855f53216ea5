use std::fmt;

/// Lifecycle of the listening socket and its single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No socket yet
    Unbound,
    /// Socket created with address reuse, not bound
    SocketReady,
    /// Bound and listening, no client
    Listening,
    /// Exactly one client connected
    Connected,
    /// Client dropped, a new accept is pending
    Disconnected,
    /// Socket closed for good
    Closed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportState::Unbound => "unbound",
            TransportState::SocketReady => "socket-ready",
            TransportState::Listening => "listening",
            TransportState::Connected => "connected",
            TransportState::Disconnected => "disconnected",
            TransportState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Per-connection state the shell may change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellState {
    pub configure_mode: bool,
    pub prompt_prefix: String,
}

impl ShellState {
    pub fn reset(&mut self) {
        self.configure_mode = false;
        self.prompt_prefix.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_state_reset() {
        let mut state = ShellState {
            configure_mode: true,
            prompt_prefix: "[configure] ".to_string(),
        };
        state.reset();
        assert_eq!(state, ShellState::default());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TransportState::SocketReady.to_string(), "socket-ready");
        assert_eq!(TransportState::Connected.to_string(), "connected");
    }
}
