//! Conversational agent

mod orchestrator;

pub use orchestrator::{
    clip_history, GenerationOutput, Orchestrator, Phase, TurnOutcome, TurnState,
};
