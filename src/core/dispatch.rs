use crate::core::session::state::ShellState;
use crate::domain::error::SockShellResult;
use async_trait::async_trait;

/// Result of one shell dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub healthy: bool,
    pub message: String,
}

impl Outcome {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            healthy: true,
            message: message.into(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: message.into(),
        }
    }
}

/// What a dispatcher may touch of the session
///
/// Replies are buffered and written to the peer once dispatch returns.
pub struct SessionView<'a> {
    state: &'a mut ShellState,
    replies: Vec<String>,
}

impl<'a> SessionView<'a> {
    pub fn new(state: &'a mut ShellState) -> Self {
        Self {
            state,
            replies: Vec::new(),
        }
    }

    pub fn configure_mode(&self) -> bool {
        self.state.configure_mode
    }

    pub fn set_configure_mode(&mut self, enabled: bool) {
        self.state.configure_mode = enabled;
    }

    pub fn prompt_prefix(&self) -> &str {
        &self.state.prompt_prefix
    }

    pub fn set_prompt_prefix(&mut self, prefix: impl Into<String>) {
        self.state.prompt_prefix = prefix.into();
    }

    /// Queue a line for the peer
    pub fn reply(&mut self, message: impl Into<String>) {
        self.replies.push(message.into());
    }

    pub fn into_replies(self) -> Vec<String> {
        self.replies
    }
}

/// Command interpreter behind the control filter
///
/// An `Err` is treated as a crash of the interpreter and escalates to hard
/// recovery; an unhealthy [`Outcome`] triggers soft recovery.
#[async_trait]
pub trait Dispatcher: Send {
    async fn execute(&mut self, line: &str, session: &mut SessionView<'_>) -> SockShellResult<Outcome>;
}
