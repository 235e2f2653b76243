//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contratai")]
#[command(
    author,
    version,
    about = "Legal assistant for Brazilian law and contracts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat session
    Chat(ChatArgs),

    /// Ask a single question and exit
    Ask(AskArgs),

    /// Manage chat sessions
    Sessions(SessionsArgs),

    /// List the tools the assistant can call
    Tools,

    /// Build or inspect the law index
    Index(IndexArgs),

    /// Show or initialize the configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ChatArgs {
    /// Resume an existing session
    #[arg(short, long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Session to ask in (a new one is created otherwise)
    #[arg(short, long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub action: SessionsAction,
}

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List sessions, most recent first
    #[command(alias = "ls")]
    List,
    /// Show the messages of a session
    Show { id: String },
    /// Create an empty session and print its id
    Create,
    /// Replace the messages of a session with a JSON list of
    /// `{"role": "user"|"assistant", "content": ...}`
    Replace {
        id: String,
        /// JSON file to read (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete a session
    #[command(alias = "rm")]
    Delete { id: String },
    /// Delete every session
    Clear,
}

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Chunk and embed the law corpus
    Build {
        /// Drop the existing law passages first
        #[arg(short, long)]
        force: bool,
    },
    /// Passage counts per law file
    Status,
    /// Print stored passages, by id, by law file, or the first ones
    Show {
        /// Number of passages
        #[arg(short = 'n', default_value = "5")]
        limit: usize,
        /// Only passages from this law file
        #[arg(long)]
        source: Option<String>,
        /// A single passage by id (e.g. law_chunk_0)
        #[arg(long, conflicts_with = "source")]
        id: Option<String>,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as YAML
    Show,
    /// Print the configuration file location
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
