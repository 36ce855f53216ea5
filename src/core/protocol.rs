//! In-band control lines handled before general dispatch.

/// Version reported for the `version` request
pub const PROTOCOL_VERSION: &str = "0.6";

/// Substituted for input that is not valid UTF-8, e.g. telnet interrupt bytes
pub const CTRL_C_SENTINEL: &str = "ctrl-c";

pub const EXIT_REPLY: &str = "Bye!";

/// Result of filtering one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filtered {
    /// Send the reply, then recycle the connection
    Disconnect(String),
    /// Send the reply, nothing is dispatched
    Reply(String),
    /// Hand the line to the shell
    Forward(String),
}

impl Filtered {
    /// Line that continues to the shell, empty when consumed here
    pub fn line(&self) -> &str {
        match self {
            Filtered::Forward(line) => line,
            Filtered::Disconnect(_) | Filtered::Reply(_) => "",
        }
    }
}

/// Classifies `exit`, `hello` and `version`
#[derive(Debug, Clone)]
pub struct ControlFilter {
    uid: String,
    version: String,
}

impl ControlFilter {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Exact, case-sensitive match on the trimmed line
    pub fn apply(&self, line: &str, device_name: &str) -> Filtered {
        let line = line.trim();
        match line {
            "exit" => Filtered::Disconnect(EXIT_REPLY.to_string()),
            "hello" => Filtered::Reply(format!("hello:{}:{}", device_name, self.uid)),
            "version" => Filtered::Reply(self.version.clone()),
            _ => Filtered::Forward(line.to_string()),
        }
    }
}
