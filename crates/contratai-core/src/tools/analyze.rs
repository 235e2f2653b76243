//! Contract analysis: metadata, risks, missing clauses, obligations

use super::{read_document, BoundArgs, ParamKind, Tool, ToolDescriptor, ToolOutput, ToolParameter};
use crate::context::AppContext;
use crate::error::Result;
use crate::llm::json::parse_object;
use crate::llm::{PromptId, PromptVars};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_ANALYSIS_REQUEST: &str = "Faça uma análise completa do contrato";

pub struct AnalyzeContract {
    descriptor: ToolDescriptor,
}

impl AnalyzeContract {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "analyze_contract".to_string(),
                description: "Realiza análise completa de contratos e documentos jurídicos: \
                    extrai metadados, identifica riscos, detecta cláusulas ausentes, mapeia \
                    obrigações e gera resumo executivo."
                    .to_string(),
                parameters: vec![
                    ToolParameter::required("file_path", ParamKind::Path),
                    ToolParameter::optional("question", ParamKind::Text, DEFAULT_ANALYSIS_REQUEST),
                    ToolParameter::optional("history", ParamKind::Text, ""),
                ],
            },
        }
    }
}

impl Default for AnalyzeContract {
    fn default() -> Self {
        Self::new()
    }
}

fn nested_str<'a>(value: &'a serde_json::Map<String, Value>, outer: &str, inner: &str) -> &'a str {
    value
        .get(outer)
        .and_then(|v| v.get(inner))
        .and_then(Value::as_str)
        .unwrap_or("N/A")
}

#[async_trait]
impl Tool for AnalyzeContract {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, ctx: &AppContext, args: BoundArgs) -> Result<ToolOutput> {
        let file_path = args.get("file_path");
        let document = match read_document(file_path) {
            Ok(document) => document,
            Err(output) => return Ok(output),
        };

        let vars = PromptVars::new()
            .with("document", document)
            .with("question", args.get("question"))
            .with("history", args.get("history"));
        let output = ctx
            .generator
            .generate(PromptId::AnalyzeContract, &vars)
            .await?;
        tracing::debug!("Analysis output: {}", output);

        let Some(mut analysis) = parse_object(&output) else {
            tracing::warn!("Contract analysis is not a JSON object, returning it verbatim");
            return Ok(ToolOutput::text(output));
        };

        let risk = nested_str(&analysis, "risk_analysis", "overall_risk").to_string();
        let recommendation =
            nested_str(&analysis, "executive_summary", "recommendation").to_string();
        tracing::info!("Analysis finished: risk {}, recommendation {}", risk, recommendation);

        analysis.insert(
            "answer".to_string(),
            Value::String(format!(
                "Análise do contrato concluída. Nível de risco: {}. Recomendação: {}. \
                 Verifique os detalhes completos no JSON retornado.",
                risk, recommendation
            )),
        );
        Ok(ToolOutput::json(&Value::Object(analysis)))
    }
}
