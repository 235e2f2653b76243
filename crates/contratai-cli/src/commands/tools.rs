//! Tool listing

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use contratai_core::ToolRegistry;

pub async fn run(format: OutputFormat) -> Result<()> {
    let registry = ToolRegistry::builtin();
    print!("{}", output::format_tools(&registry.descriptors(), format));
    Ok(())
}
