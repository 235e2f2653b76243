//! Tool catalogue and dispatch
//!
//! Tools are registered once, at start, into a name-keyed table. The
//! generation capability picks a tool by name and supplies its arguments
//! either positionally or by keyword; both forms are bound against the
//! tool's declared parameters before the tool runs.

use crate::context::AppContext;
use crate::error::{ContratAiError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Declared kind of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Free text
    Text,
    /// Filesystem path
    Path,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Text => f.write_str("str"),
            ParamKind::Path => f.write_str("path"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
    /// `None` means the parameter is required
    pub default: Option<String>,
}

impl ToolParameter {
    pub fn required(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: Some(default.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    /// One-line signature shown to the generation capability
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}: {} = {:?}", p.name, p.kind, default),
                None => format!("{}: {}", p.name, p.kind),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.name, params)
    }

    /// Bind supplied arguments to the declared parameters, filling defaults.
    /// Null values count as absent.
    pub fn bind(&self, args: &ToolArgs) -> Result<BoundArgs> {
        let mut bound = BTreeMap::new();

        match args {
            ToolArgs::Positional(values) => {
                if values.len() > self.parameters.len() {
                    return Err(ContratAiError::InvalidInput(format!(
                        "{} takes {} arguments but {} were given",
                        self.name,
                        self.parameters.len(),
                        values.len()
                    )));
                }
                for (param, value) in self.parameters.iter().zip(values) {
                    if let Some(value) = value_to_arg(value) {
                        bound.insert(param.name.clone(), value);
                    }
                }
            }
            ToolArgs::Keyword(map) => {
                for (key, value) in map {
                    if !self.parameters.iter().any(|p| &p.name == key) {
                        tracing::warn!("Ignoring unknown argument '{}' for {}", key, self.name);
                        continue;
                    }
                    if let Some(value) = value_to_arg(value) {
                        bound.insert(key.clone(), value);
                    }
                }
            }
        }

        for param in &self.parameters {
            if bound.contains_key(&param.name) {
                continue;
            }
            match &param.default {
                Some(default) => {
                    bound.insert(param.name.clone(), default.clone());
                }
                None => {
                    return Err(ContratAiError::InvalidInput(format!(
                        "{} is missing required argument '{}'",
                        self.name, param.name
                    )));
                }
            }
        }

        Ok(BoundArgs(bound))
    }
}

fn value_to_arg(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Arguments as produced by the generation capability
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    Positional(Vec<Value>),
    Keyword(Map<String, Value>),
}

impl Default for ToolArgs {
    fn default() -> Self {
        ToolArgs::Positional(Vec::new())
    }
}

impl ToolArgs {
    /// Interpret a JSON value: arrays are positional, objects are keyword,
    /// null is no arguments, anything else is a single positional argument.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(values) => ToolArgs::Positional(values.clone()),
            Value::Object(map) => ToolArgs::Keyword(map.clone()),
            Value::Null => ToolArgs::default(),
            other => ToolArgs::Positional(vec![other.clone()]),
        }
    }
}

/// A request to run a named tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub function: String,
    pub args: ToolArgs,
}

/// Arguments after binding; every declared parameter is present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs(BTreeMap<String, String>);

impl BoundArgs {
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// What a tool hands back to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Usually a JSON object with an `answer` member; may be raw text
    pub payload: String,
    pub exit_requested: bool,
}

impl ToolOutput {
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            exit_requested: false,
        }
    }

    pub fn json(value: &Value) -> Self {
        Self::text(value.to_string())
    }

    /// `{status: "error", answer, message}`
    pub fn error(answer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::json(&serde_json::json!({
            "status": "error",
            "answer": answer.into(),
            "message": message.into(),
        }))
    }

    /// User-facing message: the payload's `answer` string when it is a JSON
    /// object that has one, else the payload verbatim
    pub fn answer(&self) -> String {
        crate::llm::json::parse_object(&self.payload)
            .and_then(|map| crate::llm::json::string_field(&map, "answer"))
            .unwrap_or_else(|| self.payload.clone())
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn call(&self, ctx: &AppContext, args: BoundArgs) -> Result<ToolOutput>;
}

/// Static, name-keyed tool table
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-in tools, in catalogue order
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let tools: [Arc<dyn Tool>; 5] = [
            Arc::new(super::LeaveChat::new()),
            Arc::new(super::AnalyzeContract::new()),
            Arc::new(super::RefactorContract::new()),
            Arc::new(super::GenerateContracts::new()),
            Arc::new(super::RetrieveLaw::new()),
        ];
        for tool in tools {
            // names are distinct
            let _ = registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.descriptor().name.clone();
        if self.tools.contains_key(&name) {
            return Err(ContratAiError::InvalidInput(format!(
                "tool '{}' is already registered",
                name
            )));
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    /// Catalogue text for the agent prompts
    pub fn tools_list(&self) -> String {
        self.descriptors()
            .iter()
            .map(|d| format!("- {}: {}", d.signature(), d.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Look up, bind and run a tool. Unknown names are `ToolNotFound` and
    /// bad arguments `InvalidInput`. A failing tool becomes an error payload,
    /// except for corpus bootstrap failures, which propagate.
    pub async fn invoke(&self, ctx: &AppContext, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let tool = self
            .get(&invocation.function)
            .ok_or_else(|| ContratAiError::ToolNotFound(invocation.function.clone()))?;

        let args = tool.descriptor().bind(&invocation.args)?;
        tracing::info!("Executing tool {}", invocation.function);

        match tool.call(ctx, args).await {
            Ok(output) => Ok(output),
            Err(e @ ContratAiError::CorpusBootstrapFailure(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", invocation.function, e);
                Ok(ToolOutput::error(
                    "Não foi possível concluir a operação solicitada.",
                    e.to_string(),
                ))
            }
        }
    }
}
