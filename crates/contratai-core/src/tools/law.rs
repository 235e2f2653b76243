//! Grounded answers over the Brazilian law corpus

use super::{BoundArgs, ParamKind, Tool, ToolDescriptor, ToolOutput, ToolParameter};
use crate::context::AppContext;
use crate::error::Result;
use async_trait::async_trait;

pub struct RetrieveLaw {
    descriptor: ToolDescriptor,
}

impl RetrieveLaw {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "retrieve_brazilian_law_context_and_answer".to_string(),
                description: "Busca trechos relevantes da legislação brasileira com expansão de \
                    consulta e similaridade vetorial e gera uma resposta jurídica fundamentada."
                    .to_string(),
                parameters: vec![
                    ToolParameter::required("question", ParamKind::Text),
                    ToolParameter::required("history", ParamKind::Text),
                ],
            },
        }
    }
}

impl Default for RetrieveLaw {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for RetrieveLaw {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, ctx: &AppContext, args: BoundArgs) -> Result<ToolOutput> {
        let question = args.get("question");
        tracing::info!("Consulting Brazilian law: {}", question);

        let (retrieved, answer) = ctx
            .retrieval_pipeline()
            .answer(question, args.get("history"))
            .await?;

        tracing::info!(
            "Legal consultation finished with {} passages ({} merged)",
            retrieved.passages.len(),
            retrieved.merged
        );
        Ok(ToolOutput::text(answer))
    }
}
