//! CLI for the Quotevault API

pub mod serve;

use clap::{Parser, Subcommand};

/// Quotevault - quotation catalog API with an API key workflow
#[derive(Parser)]
#[command(name = "quotevault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
