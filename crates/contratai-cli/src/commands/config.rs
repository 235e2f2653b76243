//! Configuration commands

use crate::app::{ConfigAction, ConfigArgs};
use anyhow::Result;
use contratai_core::{Config, ContratAiError};

pub async fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", serde_yaml::to_string(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
        ConfigAction::Init { force } => {
            let path = Config::path();
            if path.exists() && !force {
                return Err(ContratAiError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ))
                .into());
            }

            let mut config = Config::default();
            // Keep credentials in the environment
            config.llm_service.api_key = None;
            config.save_to(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
