pub mod agent;
pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod conversation;
pub mod diff;
pub mod error;
pub mod file_editor;
pub mod gateway;
pub mod hashing;
pub mod safe_path;
pub mod streaming_executor;
pub mod tool_registry;
pub mod tools;
pub mod ui;

pub use config::Config;
pub use tool_registry::ToolRegistry;
