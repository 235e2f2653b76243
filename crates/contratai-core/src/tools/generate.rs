//! Contract generation from catalogued templates
//!
//! A request is first mapped to one catalogued contract type, either by a
//! closed-set classification or by the nearest indexed template confirmed
//! by the model. The template is then filled from the user's data; when
//! required fields are missing, the user is asked for them and nothing is
//! written.

use super::{
    head_chars, write_output, BoundArgs, ParamKind, Tool, ToolDescriptor, ToolOutput,
    ToolParameter,
};
use crate::agent::clip_history;
use crate::config::ContractMatchStrategy;
use crate::context::AppContext;
use crate::contracts::{ensure_template_index, load_template, ContractCatalogue, ContractSpec};
use crate::db::SourceFilter;
use crate::error::{ContratAiError, Result};
use crate::llm::json::{bool_field, parse_object, string_field, string_list};
use crate::llm::{PromptId, PromptVars};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub const GENERATED_FILE_NAME: &str = "generated_contract.txt";

const TEMPLATE_PROMPT_CHARS: usize = 3000;
const FIELDS_PROMPT_CHARS: usize = 1000;
const HISTORY_PROMPT_CHARS: usize = 500;
const VALIDATE_TEMPLATE_CHARS: usize = 1500;

/// Result of mapping a request to a contract type
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    Matched {
        contract_type: String,
        confidence: String,
    },
    Rejected {
        reason: String,
        confidence: String,
    },
}

/// Result of one filling attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    Completed {
        contract: String,
        answer: Option<String>,
    },
    MissingInfo {
        missing_fields: Vec<String>,
        answer: Option<String>,
    },
    /// Output we could not classify; passed through verbatim
    Unrecognized(String),
}

/// Apply the acceptance rules to a `{match, contract_type, confidence,
/// reason}` record. `candidate` supplies the type when the record does not
/// name one. A match is rejected when `match` is not true, confidence is
/// `low`, or the type is not catalogued.
pub fn judge_match(
    record: &Map<String, Value>,
    candidate: Option<&str>,
    catalogue: &ContractCatalogue,
) -> Identification {
    let confidence = string_field(record, "confidence")
        .map(|c| c.trim().to_lowercase())
        .unwrap_or_else(|| "medium".to_string());
    let reason = string_field(record, "reason")
        .unwrap_or_else(|| "Tipo de contrato não identificado".to_string());

    if !bool_field(record, "match").unwrap_or(false) {
        return Identification::Rejected { reason, confidence };
    }
    if confidence == "low" {
        return Identification::Rejected { reason, confidence };
    }

    let contract_type = string_field(record, "contract_type")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| candidate.map(str::to_string))
        .unwrap_or_default();

    if !catalogue.contains(&contract_type) {
        return Identification::Rejected {
            reason: format!("Contrato '{}' não existe", contract_type),
            confidence,
        };
    }

    Identification::Matched {
        contract_type,
        confidence,
    }
}

/// Read a `fill_contract` output
pub fn parse_fill_output(output: &str, spec: &ContractSpec) -> FillOutcome {
    let Some(record) = parse_object(output) else {
        return FillOutcome::Unrecognized(output.to_string());
    };

    let answer = string_field(&record, "answer");
    match string_field(&record, "status").as_deref() {
        Some("completed") => FillOutcome::Completed {
            contract: string_field(&record, "filled_contract").unwrap_or_default(),
            answer,
        },
        Some("missing_info") => {
            let mut missing_fields = string_list(&record, &["missing_fields", "campos_faltantes"]);
            if missing_fields.is_empty() {
                missing_fields = spec.required_fields.clone();
            }
            FillOutcome::MissingInfo {
                missing_fields,
                answer,
            }
        }
        _ => FillOutcome::Unrecognized(output.to_string()),
    }
}

pub struct GenerateContracts {
    descriptor: ToolDescriptor,
}

impl GenerateContracts {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "generate_contracts".to_string(),
                description: "Gera contratos personalizados a partir dos modelos disponíveis: \
                    identifica o tipo de contrato, pede as informações necessárias e preenche o \
                    modelo."
                    .to_string(),
                parameters: vec![
                    ToolParameter::required("question", ParamKind::Text),
                    ToolParameter::required("history", ParamKind::Text),
                ],
            },
        }
    }

    async fn identify(
        &self,
        ctx: &AppContext,
        catalogue: &ContractCatalogue,
        question: &str,
        history: &str,
    ) -> Result<Identification> {
        match ctx.config.contracts.strategy {
            ContractMatchStrategy::Classifier => {
                let vars = PromptVars::new()
                    .with("contracts", catalogue.listing())
                    .with("history", history)
                    .with("question", question);
                let output = ctx
                    .generator
                    .generate(PromptId::ContractFilter, &vars)
                    .await?;
                tracing::debug!("Contract filter output: {}", output);
                Ok(judge_output(&output, None, catalogue))
            }
            ContractMatchStrategy::NearestTemplate => {
                let contracts_dir = &ctx.config.paths.contracts_dir;
                ensure_template_index(
                    catalogue,
                    contracts_dir,
                    ctx.contracts.as_ref(),
                    ctx.embedder.as_ref(),
                )
                .await?;

                let embedding = ctx.embedder.embed(question).await?;
                let catalogued = SourceFilter::new(catalogue.names());
                let Some(nearest) = ctx
                    .contracts
                    .query(&embedding, 1, Some(&catalogued))?
                    .into_iter()
                    .next()
                else {
                    return Ok(Identification::Rejected {
                        reason: "Nenhum modelo de contrato indexado".to_string(),
                        confidence: "low".to_string(),
                    });
                };

                let candidate = nearest.source;
                let description = catalogue
                    .get(&candidate)
                    .map(|s| s.description.clone())
                    .unwrap_or_default();
                let template = match load_template(contracts_dir, &candidate) {
                    Ok(template) => template,
                    Err(e) => {
                        tracing::warn!("Nearest contract {} has no template: {}", candidate, e);
                        return Ok(Identification::Rejected {
                            reason: format!("Template do contrato '{}' não encontrado", candidate),
                            confidence: "low".to_string(),
                        });
                    }
                };

                let vars = PromptVars::new()
                    .with("candidate", candidate.as_str())
                    .with("description", description)
                    .with("template", head_chars(&template, VALIDATE_TEMPLATE_CHARS))
                    .with("history", history)
                    .with("question", question);
                let output = ctx
                    .generator
                    .generate(PromptId::ContractValidate, &vars)
                    .await?;
                tracing::debug!("Contract validation output: {}", output);
                Ok(judge_output(&output, Some(&candidate), catalogue))
            }
        }
    }

    async fn fill(
        &self,
        ctx: &AppContext,
        spec: &ContractSpec,
        template: &str,
        question: &str,
        history: &str,
    ) -> Result<FillOutcome> {
        let fields = serde_json::to_string_pretty(&spec.required_fields)?;
        let vars = PromptVars::new()
            .with("template", head_chars(template, TEMPLATE_PROMPT_CHARS))
            .with("required_fields", head_chars(&fields, FIELDS_PROMPT_CHARS))
            .with("user_data", question)
            .with("history", clip_history(history, HISTORY_PROMPT_CHARS));

        let output = ctx.generator.generate(PromptId::FillContract, &vars).await?;
        tracing::debug!("Fill output: {}", output);
        Ok(parse_fill_output(&output, spec))
    }
}

impl Default for GenerateContracts {
    fn default() -> Self {
        Self::new()
    }
}

fn judge_output(
    output: &str,
    candidate: Option<&str>,
    catalogue: &ContractCatalogue,
) -> Identification {
    match parse_object(output) {
        Some(record) => judge_match(&record, candidate, catalogue),
        None => {
            tracing::warn!("Contract identification output is not a JSON object");
            Identification::Rejected {
                reason: "Resposta de identificação ilegível".to_string(),
                confidence: "low".to_string(),
            }
        }
    }
}

#[async_trait]
impl Tool for GenerateContracts {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, ctx: &AppContext, args: BoundArgs) -> Result<ToolOutput> {
        let question = args.get("question");
        let history = args.get("history");
        let paths = &ctx.config.paths;

        let catalogue = match ContractCatalogue::load(&paths.catalogue) {
            Ok(catalogue) => catalogue,
            Err(e) => {
                return Ok(ToolOutput::error(
                    "Catálogo de contratos indisponível.",
                    e.to_string(),
                ))
            }
        };

        tracing::info!("Identifying requested contract type");
        let (contract_type, confidence) =
            match self.identify(ctx, &catalogue, question, history).await? {
                Identification::Matched {
                    contract_type,
                    confidence,
                } => (contract_type, confidence),
                Identification::Rejected { reason, confidence } => {
                    tracing::info!("Contract type not identified: {}", reason);
                    return Ok(ToolOutput::json(&json!({
                        "status": "error",
                        "answer": "Não foi possível identificar um tipo de contrato correspondente \
                                   à sua solicitação. Por favor, escolha um dos tipos disponíveis.",
                        "message": reason,
                        "confidence": confidence,
                    })));
                }
            };
        tracing::info!(
            "Identified contract type {} (confidence: {})",
            contract_type,
            confidence
        );

        let template = match load_template(&paths.contracts_dir, &contract_type) {
            Ok(template) => template,
            Err(e @ ContratAiError::SourceNotFound(_)) => {
                return Ok(ToolOutput::error(
                    "Template do contrato não encontrado.",
                    e.to_string(),
                ))
            }
            Err(e) => return Err(e),
        };

        let spec = catalogue.get(&contract_type).cloned().unwrap_or_default();

        match self.fill(ctx, &spec, &template, question, history).await? {
            FillOutcome::Completed { contract, answer } => {
                if contract.trim().is_empty() {
                    return Ok(ToolOutput::error(
                        "O contrato preenchido retornou vazio.",
                        "empty_filled_contract",
                    ));
                }
                let path = match write_output(&paths.output_dir, GENERATED_FILE_NAME, &contract) {
                    Ok(path) => path,
                    Err(e) => {
                        return Ok(ToolOutput::error(
                            format!("Erro ao salvar o contrato gerado: {}", e),
                            e.to_string(),
                        ))
                    }
                };
                tracing::info!("Generated contract saved to {}", path);
                Ok(ToolOutput::json(&json!({
                    "status": "completed",
                    "contract_type": contract_type,
                    "filled_contract": contract,
                    "file_path": path,
                    "answer": answer.unwrap_or_else(|| format!(
                        "Contrato gerado com sucesso! Salvo em '{}'.",
                        path
                    )),
                })))
            }
            FillOutcome::MissingInfo {
                missing_fields,
                answer,
            } => {
                tracing::info!("Additional information required: {}", missing_fields.join(", "));
                let answer = answer.unwrap_or_else(|| {
                    format!(
                        "Para gerar o contrato, informe: {}.",
                        missing_fields.join(", ")
                    )
                });
                Ok(ToolOutput::json(&json!({
                    "status": "missing_info",
                    "contract_type": contract_type,
                    "missing_fields": missing_fields,
                    "answer": answer,
                })))
            }
            FillOutcome::Unrecognized(raw) => Ok(ToolOutput::text(raw)),
        }
    }
}
