//! Session exit

use super::{BoundArgs, Tool, ToolDescriptor, ToolOutput};
use crate::context::AppContext;
use crate::error::Result;
use async_trait::async_trait;

pub struct LeaveChat {
    descriptor: ToolDescriptor,
}

impl LeaveChat {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "leave_chat".to_string(),
                description: "Encerra a sessão de chat quando o usuário deseja sair da conversa."
                    .to_string(),
                parameters: Vec::new(),
            },
        }
    }
}

impl Default for LeaveChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for LeaveChat {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, _ctx: &AppContext, _args: BoundArgs) -> Result<ToolOutput> {
        tracing::info!("Exiting chat session");
        let mut output = ToolOutput::json(&serde_json::json!({
            "status": "exit",
            "answer": "Sessão encerrada. Até logo!",
        }));
        output.exit_requested = true;
        Ok(output)
    }
}
