//! Runner event input

use anyhow::{Context, Result};
use caserail_core::RunnerEvent;
use caserail_core::events::{parse_event_lines, parse_newman_report};
use clap::{Args, ValueEnum};
use std::io::Read;

/// Shape of the event input
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// JSON Lines, one `{"event": "assertion" | "done", ...}` object per line
    Events,
    /// Newman JSON report (`newman run --reporters json`)
    Newman,
}

/// Where runner events come from
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Event file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: String,

    /// Input format
    #[arg(short, long, value_enum, default_value_t = InputFormat::Events)]
    pub format: InputFormat,
}

impl InputArgs {
    /// Read and parse every event
    pub fn read_events(&self) -> Result<Vec<RunnerEvent>> {
        let contents = if self.input == "-" {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read events from stdin")?;
            buffer
        } else {
            std::fs::read_to_string(&self.input)
                .with_context(|| format!("Failed to read events from {}", self.input))?
        };

        let events = match self.format {
            InputFormat::Events => parse_event_lines(&contents),
            InputFormat::Newman => parse_newman_report(&contents),
        }
        .with_context(|| format!("Failed to parse {:?} input", self.format))?;

        tracing::debug!("Read {} event(s) from {}", events.len(), self.input);
        Ok(events)
    }
}
