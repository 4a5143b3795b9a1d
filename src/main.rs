mod clips;
mod ui;

use clap::Parser;

use crate::clips::{ClipsCommands, handle_clips_command};
use crate::ui::prelude::{Level, OutputFormat, emit};

/// Batch-render captioned clips from a CSV sheet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for log lines
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: ClipsCommands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = handle_clips_command(cli.command).await {
        emit(Level::Error, "bulkclip.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
