//! Contract rewriting on request

use super::{
    read_document, write_output, BoundArgs, ParamKind, Tool, ToolDescriptor, ToolOutput,
    ToolParameter,
};
use crate::context::AppContext;
use crate::error::Result;
use crate::llm::json::parse_object;
use crate::llm::{PromptId, PromptVars};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_REFACTOR_REQUEST: &str = "Reformule o contrato mantendo conformidade legal";
pub const REFACTORED_FILE_NAME: &str = "refactored_contract.txt";

pub struct RefactorContract {
    descriptor: ToolDescriptor,
}

impl RefactorContract {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "refactor_contract".to_string(),
                description: "Reformula contratos e documentos jurídicos conforme a solicitação \
                    do usuário e salva o novo texto."
                    .to_string(),
                parameters: vec![
                    ToolParameter::required("file_path", ParamKind::Path),
                    ToolParameter::optional("question", ParamKind::Text, DEFAULT_REFACTOR_REQUEST),
                    ToolParameter::optional("history", ParamKind::Text, ""),
                ],
            },
        }
    }
}

impl Default for RefactorContract {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for RefactorContract {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, ctx: &AppContext, args: BoundArgs) -> Result<ToolOutput> {
        let document = match read_document(args.get("file_path")) {
            Ok(document) => document,
            Err(output) => return Ok(output),
        };

        tracing::info!("Refactoring contract: {}", args.get("question"));
        let vars = PromptVars::new()
            .with("document", document)
            .with("question", args.get("question"))
            .with("history", args.get("history"));
        let output = ctx
            .generator
            .generate(PromptId::RefactorContract, &vars)
            .await?;
        tracing::debug!("Refactor output: {}", output);

        let Some(mut data) = parse_object(&output) else {
            return Ok(ToolOutput::error(
                "Erro ao processar resposta da reformulação",
                "json_decode_error",
            ));
        };

        let refactored = data.get("refactored_contract").cloned().unwrap_or(Value::Null);
        let full_text = refactored
            .get("full_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if full_text.trim().is_empty() {
            tracing::warn!("Refactored contract is empty");
            return Ok(ToolOutput::error(
                "Erro ao reformular o contrato. O texto reformulado está vazio.",
                "empty_full_text",
            ));
        }

        let path = match write_output(&ctx.config.paths.output_dir, REFACTORED_FILE_NAME, &full_text)
        {
            Ok(path) => path,
            Err(e) => {
                return Ok(ToolOutput::error(
                    format!("Erro ao salvar contrato reformulado: {}", e),
                    e.to_string(),
                ))
            }
        };

        let summary = refactored
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("Veja o documento completo.");
        tracing::info!("Refactored contract saved to {}", path);

        data.insert("status".to_string(), Value::String("completed".to_string()));
        data.insert("file_path".to_string(), Value::String(path.clone()));
        data.insert(
            "answer".to_string(),
            Value::String(format!(
                "Contrato reformulado com sucesso! O novo contrato foi salvo em '{}' com {} \
                 caracteres. Principais alterações: {}",
                path,
                full_text.chars().count(),
                summary
            )),
        );
        Ok(ToolOutput::json(&Value::Object(data)))
    }
}
