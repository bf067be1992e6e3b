mod cli;

use std::error::Error;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let result = match cli.cmd {
        Command::Diff(args) => cli::diff::handle_diff_command(args),
        Command::Patch(args) => cli::patch::handle_patch_command(args),
        Command::Unpatch(args) => cli::patch::handle_unpatch_command(args),
        Command::Reverse(args) => cli::reverse::handle_reverse_command(args),
    };
    result.map_err(|e| {
        eprintln!("Error: {}", e);
        e
    })
}

fn init_tracing(directives: Option<&str>) {
    let filter = directives
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
