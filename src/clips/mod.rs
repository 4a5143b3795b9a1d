pub mod cli;
pub mod commands;
mod batch;
mod config;
mod ffmpeg;
mod filters;
mod layout;
mod logging;
mod probe;
mod processor;
mod rows;
mod styles;

pub use cli::ClipsCommands;
pub use commands::handle_clips_command;
