//! Contract type catalogue and templates
//!
//! The catalogue file maps each contract type to a description and the
//! fields a user must supply:
//!
//! ```json
//! {"contrato_locacao": {"description": "Locação residencial",
//!                        "required_fields": ["locador", "locatario", "valor"]}}
//! ```
//!
//! The template for type `T` lives at `<contracts_dir>/T.txt`.

use crate::db::{IndexEntry, VectorIndex};
use crate::error::{ContratAiError, Result};
use crate::llm::Embedder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Characters of a template embedded next to its description
const TEMPLATE_HEAD_CHARS: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractCatalogue {
    types: BTreeMap<String, ContractSpec>,
}

impl ContractCatalogue {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContratAiError::SourceNotFound(format!(
                "contract catalogue {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn get(&self, name: &str) -> Option<&ContractSpec> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractSpec)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `- name: description` lines, one per type
    pub fn listing(&self) -> String {
        self.types
            .iter()
            .map(|(name, spec)| format!("- {}: {}", name, spec.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn template_path(contracts_dir: &Path, contract_type: &str) -> PathBuf {
    contracts_dir.join(format!("{}.txt", contract_type))
}

/// Read the template of `contract_type`; missing or blank is `SourceNotFound`
pub fn load_template(contracts_dir: &Path, contract_type: &str) -> Result<String> {
    let path = template_path(contracts_dir, contract_type);
    let content = std::fs::read_to_string(&path).map_err(|_| {
        ContratAiError::SourceNotFound(format!("contract template {}", path.display()))
    })?;
    if content.trim().is_empty() {
        return Err(ContratAiError::SourceNotFound(format!(
            "contract template {} is empty",
            path.display()
        )));
    }
    Ok(content)
}

/// Embed each catalogued type (description plus template head) that
/// `index` does not hold yet. Types without a template are indexed by
/// description alone. Returns the number of entries written.
pub async fn ensure_template_index(
    catalogue: &ContractCatalogue,
    contracts_dir: &Path,
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
) -> Result<usize> {
    let indexed: HashSet<String> = index.sources()?.into_iter().map(|s| s.source).collect();

    let docs: Vec<(String, String)> = catalogue
        .iter()
        .filter(|(name, _)| !indexed.contains(*name))
        .map(|(name, spec)| {
            let head: String = load_template(contracts_dir, name)
                .map(|t| t.chars().take(TEMPLATE_HEAD_CHARS).collect())
                .unwrap_or_default();
            (name.to_string(), format!("{}: {}\n\n{}", name, spec.description, head))
        })
        .collect();

    if docs.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = docs.iter().map(|(_, text)| text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    let mut written = 0;
    for ((name, text), embedding) in docs.into_iter().zip(embeddings) {
        index.upsert(IndexEntry {
            id: name.clone(),
            source: name,
            chunk_index: 0,
            text,
            embedding,
        })?;
        written += 1;
    }

    tracing::info!("Indexed {} contract templates", written);
    Ok(written)
}
