//! CLI command handlers

pub mod chat;
pub mod config;
pub mod index;
pub mod sessions;
pub mod tools;
