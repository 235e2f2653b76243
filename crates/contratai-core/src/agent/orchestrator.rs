//! Turn orchestration
//!
//! A turn starts in [`Phase::Conversational`]. The conversational step
//! either answers directly (the turn ends) or asks for a tool, in which case
//! a second generation step selects the tool and its arguments and the tool
//! runs. Every generation output is appended to the turn's rolling history,
//! and exactly one assistant message is persisted per successful turn.

use crate::context::AppContext;
use crate::db::{format_history, Role};
use crate::error::{ContratAiError, Result};
use crate::llm::json::{bool_field, parse_object, string_field};
use crate::llm::{PromptId, PromptVars};
use crate::tools::{ToolArgs, ToolInvocation, ToolRegistry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Conversational,
    ToolSelection,
    ToolExecution,
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Conversational => "conversational",
            Phase::ToolSelection => "tool_selection",
            Phase::ToolExecution => "tool_execution",
            Phase::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Mutable state of one turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnState {
    pub question: String,
    /// Persisted history plus every generation output of this turn
    pub history: String,
    pub pending_tool_invocation: Option<ToolInvocation>,
    pub use_tool: bool,
    pub session_id: String,
}

/// What a caller gets back from a turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub answer: String,
    pub tool_used: Option<String>,
    pub exit_requested: bool,
    pub trace: Vec<Phase>,
}

/// Structured reading of an agent generation step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationOutput {
    pub answer: Option<String>,
    pub use_tool: bool,
    pub invocation: Option<ToolInvocation>,
}

impl GenerationOutput {
    /// Probe the output for `answer`, `use_tool` and a tool invocation given
    /// either as top-level `function`/`args` or nested under
    /// `tool_invocation`/`tool`. Only a non-object output is an error here.
    pub fn parse(raw: &str) -> Result<Self> {
        let map = parse_object(raw).ok_or_else(|| {
            ContratAiError::MalformedGenerationOutput(format!(
                "expected a JSON object, got: {}",
                preview(raw)
            ))
        })?;

        let answer = string_field(&map, "answer")
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        let use_tool = bool_field(&map, "use_tool").unwrap_or(false);

        let invocation = read_invocation(&map).or_else(|| {
            ["tool_invocation", "tool"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_object))
                .find_map(read_invocation)
        });

        Ok(Self {
            answer,
            use_tool,
            invocation,
        })
    }
}

fn read_invocation(map: &Map<String, Value>) -> Option<ToolInvocation> {
    let function = string_field(map, "function")
        .or_else(|| string_field(map, "name"))
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())?;
    let args = map
        .get("args")
        .or_else(|| map.get("arguments"))
        .map(ToolArgs::from_value)
        .unwrap_or_default();
    Some(ToolInvocation { function, args })
}

fn preview(raw: &str) -> String {
    let mut s: String = raw.chars().take(200).collect();
    if raw.chars().count() > 200 {
        s.push_str("...");
    }
    s
}

/// Last `max_chars` characters of `history`
pub fn clip_history(history: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match history.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &history[start..],
        None => history,
    }
}

/// Runs turns against a shared context and a fixed tool catalogue
pub struct Orchestrator {
    ctx: Arc<AppContext>,
    tools: ToolRegistry,
}

impl Orchestrator {
    pub fn new(ctx: Arc<AppContext>, tools: ToolRegistry) -> Self {
        Self { ctx, tools }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Process one user question in `session_id`. The user message is
    /// stored first; on success exactly one assistant message follows.
    pub async fn run_turn(&self, session_id: &str, question: &str) -> Result<TurnOutcome> {
        let sessions = &self.ctx.sessions;
        sessions.append_message(session_id, Role::User, question)?;
        let history = format_history(&sessions.load_history(session_id)?);

        let mut state = TurnState {
            question: question.to_string(),
            history,
            pending_tool_invocation: None,
            use_tool: false,
            session_id: session_id.to_string(),
        };
        let mut outcome = TurnOutcome {
            session_id: session_id.to_string(),
            answer: String::new(),
            tool_used: None,
            exit_requested: false,
            trace: Vec::new(),
        };

        let mut phase = Phase::Conversational;
        loop {
            outcome.trace.push(phase);
            tracing::debug!("Turn phase: {}", phase);
            phase = match phase {
                Phase::Conversational => self.conversational(&mut state, &mut outcome).await?,
                Phase::ToolSelection => self.tool_selection(&mut state).await?,
                Phase::ToolExecution => self.tool_execution(&mut state, &mut outcome).await?,
                Phase::Terminal => break,
            };
        }

        Ok(outcome)
    }

    async fn generate(&self, prompt: PromptId, state: &mut TurnState) -> Result<GenerationOutput> {
        let vars = PromptVars::new()
            .with(
                "history",
                clip_history(&state.history, self.ctx.config.agent.history_max_chars),
            )
            .with("question", state.question.as_str())
            .with("use_tool", state.use_tool.to_string())
            .with("tools_list", self.tools.tools_list());

        let raw = self.ctx.generator.generate(prompt, &vars).await?;
        tracing::debug!("{} output: {}", prompt, raw);

        let output = GenerationOutput::parse(&raw)?;
        state.history.push('\n');
        state.history.push_str(&raw);
        Ok(output)
    }

    async fn conversational(&self, state: &mut TurnState, outcome: &mut TurnOutcome) -> Result<Phase> {
        let output = self.generate(PromptId::ChatAgent, state).await?;
        state.use_tool = output.use_tool;
        state.pending_tool_invocation = output.invocation;

        if state.use_tool {
            return Ok(Phase::ToolSelection);
        }

        let answer = output.answer.ok_or_else(|| {
            ContratAiError::MalformedGenerationOutput(
                "direct reply without an answer".to_string(),
            )
        })?;
        self.ctx
            .sessions
            .append_message(&state.session_id, Role::Assistant, &answer)?;
        outcome.answer = answer;
        Ok(Phase::Terminal)
    }

    async fn tool_selection(&self, state: &mut TurnState) -> Result<Phase> {
        let output = self.generate(PromptId::ToolAgent, state).await?;
        state.pending_tool_invocation = output.invocation;
        Ok(Phase::ToolExecution)
    }

    async fn tool_execution(&self, state: &mut TurnState, outcome: &mut TurnOutcome) -> Result<Phase> {
        let invocation = state.pending_tool_invocation.take().ok_or_else(|| {
            ContratAiError::MalformedGenerationOutput(
                "tool selection named no function".to_string(),
            )
        })?;

        let output = self.tools.invoke(&self.ctx, &invocation).await?;
        let answer = output.answer();

        self.ctx
            .sessions
            .append_message(&state.session_id, Role::Assistant, &answer)?;
        state.history.push_str(&format!(
            "\nExecuted {} with result: {}",
            invocation.function, output.payload
        ));
        state.use_tool = false;

        outcome.answer = answer;
        outcome.tool_used = Some(invocation.function);
        outcome.exit_requested = output.exit_requested;
        Ok(Phase::Terminal)
    }
}
