//! Built-in tools and their registry

mod analyze;
mod generate;
mod law;
mod leave;
mod refactor;
mod registry;

pub use analyze::AnalyzeContract;
pub use generate::{judge_match, FillOutcome, GenerateContracts, Identification};
pub use law::RetrieveLaw;
pub use leave::LeaveChat;
pub use refactor::RefactorContract;
pub use registry::{
    BoundArgs, ParamKind, Tool, ToolArgs, ToolDescriptor, ToolInvocation, ToolOutput,
    ToolParameter, ToolRegistry,
};

use std::path::Path;

/// Read a contract the user pointed at, or the error payload to return
fn read_document(file_path: &str) -> std::result::Result<String, ToolOutput> {
    match std::fs::read_to_string(file_path) {
        Ok(content) => {
            tracing::info!("Loaded {} ({} chars)", file_path, content.chars().count());
            Ok(content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolOutput::error(
            format!("Erro: Arquivo não encontrado em '{}'", file_path),
            "file_not_found",
        )),
        Err(e) => Err(ToolOutput::error(
            format!("Erro ao ler o arquivo: {}", e),
            e.to_string(),
        )),
    }
}

/// Write `content` to `dir/name`, creating `dir`
fn write_output(dir: &Path, name: &str, content: &str) -> std::io::Result<String> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path.display().to_string())
}

/// First `n` characters
fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
