//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use contratai_core::{IndexHit, Session, SessionSummary, SourceCount, ToolDescriptor, TurnOutcome};

pub fn format_turn(outcome: &TurnOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_turn(outcome),
        OutputFormat::Cli => terminal::format_turn(outcome),
    }
}

pub fn format_sessions(sessions: &[SessionSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(sessions),
        OutputFormat::Cli => terminal::format_sessions(sessions),
    }
}

pub fn format_session(session: &Session, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(session),
        OutputFormat::Cli => terminal::format_session(session),
    }
}

pub fn format_tools(tools: &[&ToolDescriptor], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(tools),
        OutputFormat::Cli => terminal::format_tools(tools),
    }
}

pub fn format_sources(sources: &[SourceCount], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(sources),
        OutputFormat::Cli => terminal::format_sources(sources),
    }
}

pub fn format_passages(hits: &[IndexHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_passages(hits),
        OutputFormat::Cli => terminal::format_passages(hits),
    }
}
