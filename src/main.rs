/// Llmload - Load-testing harness for LLM chat-completion endpoints.
mod cli;
mod config;
mod error;
mod http;
mod loadgen;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
