use crate::cli::args::OutputFormat;
use serde::Serialize;
use std::io::{self, Write};
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_entries(&self, entries: &[ConfigEntry]) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::SockShellError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// One configuration key and its value
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render entries into a string in the configured format
    pub fn render_entries(&self, entries: &[ConfigEntry]) -> Result<String, OutputError> {
        let rendered = match self.format {
            OutputFormat::Text => entries
                .iter()
                .map(|entry| format!("{}: {}", entry.key, entry.value))
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|entry| (entry.key.clone(), serde_json::Value::String(entry.value.clone())))
                    .collect();
                serde_json::to_string_pretty(&map)?
            }
            OutputFormat::Table => Table::new(entries.to_vec()).to_string(),
        };
        Ok(rendered)
    }

    /// Render a plain message in the configured format
    pub fn render_message(&self, message: &str) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(&serde_json::json!({ "message": message }))?),
            OutputFormat::Text | OutputFormat::Table => Ok(message.to_string()),
        }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_entries(&self, entries: &[ConfigEntry]) -> Result<(), OutputError> {
        let rendered = self.render_entries(entries)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", rendered)?;
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        let rendered = self.render_message(message)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", rendered)?;
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        let mut stderr = io::stderr().lock();
        match self.format {
            OutputFormat::Json => {
                writeln!(stderr, "{}", serde_json::json!({ "error": error }))?;
            }
            OutputFormat::Text | OutputFormat::Table => {
                writeln!(stderr, "Error: {}", error)?;
            }
        }
        Ok(())
    }
}
