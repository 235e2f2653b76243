//! Terminal output formatter

use contratai_core::{
    IndexHit, Session, SessionSummary, SourceCount, ToolDescriptor, TurnOutcome,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const PASSAGE_PREVIEW_LINES: usize = 5;

pub fn format_turn(outcome: &TurnOutcome) -> String {
    let mut output = String::new();
    if let Some(tool) = &outcome.tool_used {
        output.push_str(&format!("[{}]\n", tool));
    }
    output.push_str(&outcome.answer);
    output.push('\n');
    output
}

pub fn format_sessions(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No sessions\n".to_string();
    }

    let mut output = String::new();
    for s in sessions {
        output.push_str(&format!(
            "{:<10} {:>4} messages  updated {}\n",
            s.id,
            s.message_count,
            s.updated_at.format(DATE_FORMAT)
        ));
    }
    output
}

pub fn format_session(session: &Session) -> String {
    let mut output = format!(
        "Session {} (created {})\n",
        session.id,
        session.created_at.format(DATE_FORMAT)
    );
    for message in &session.messages {
        output.push_str(&format!(
            "\n[{}] {}:\n{}\n",
            message.timestamp.format(DATE_FORMAT),
            message.role,
            message.content
        ));
    }
    output
}

pub fn format_tools(tools: &[&ToolDescriptor]) -> String {
    let mut output = String::new();
    for tool in tools {
        output.push_str(&tool.signature());
        output.push('\n');
        output.push_str(&format!("    {}\n", tool.description));
    }
    output
}

pub fn format_sources(sources: &[SourceCount]) -> String {
    if sources.is_empty() {
        return "Law index is empty\n".to_string();
    }

    let total: usize = sources.iter().map(|s| s.chunks).sum();
    let mut output = String::new();
    for s in sources {
        output.push_str(&format!("{:>6}  {}\n", s.chunks, s.source));
    }
    output.push_str(&format!("{:>6}  total ({} files)\n", total, sources.len()));
    output
}

pub fn format_passages(hits: &[IndexHit]) -> String {
    let mut output = String::new();
    for hit in hits {
        output.push_str(&format!("{} #{}\n", hit.source, hit.chunk_index));
        let lines: Vec<&str> = hit.text.trim().lines().collect();
        for line in lines.iter().take(PASSAGE_PREVIEW_LINES) {
            output.push_str(&format!("  {}\n", line));
        }
        if lines.len() > PASSAGE_PREVIEW_LINES {
            output.push_str("  ...\n");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_turn_marks_tool() {
        let outcome = TurnOutcome {
            session_id: "abc".into(),
            answer: "Sessão encerrada. Até logo!".into(),
            tool_used: Some("leave_chat".into()),
            exit_requested: true,
            trace: Vec::new(),
        };
        assert_eq!(
            format_turn(&outcome),
            "[leave_chat]\nSessão encerrada. Até logo!\n"
        );
    }

    #[test]
    fn test_format_sources_totals() {
        let sources = vec![
            SourceCount { source: "cdc.txt".into(), chunks: 3 },
            SourceCount { source: "codigo_civil.txt".into(), chunks: 7 },
        ];
        let text = format_sources(&sources);
        assert!(text.contains("     3  cdc.txt"));
        assert!(text.ends_with("    10  total (2 files)\n"));
    }
}
