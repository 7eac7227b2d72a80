//! sqlwhy CLI - explain why a SQL query produced a surprising result

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod render;

use cli::Cli;
use commands::{agg, join, model, predicate, why_not};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Agg(args) => agg::execute(args, &cli.global).await,
        cli::Commands::Join(args) => join::execute(args, &cli.global).await,
        cli::Commands::Predicate(args) => predicate::execute(args, &cli.global).await,
        cli::Commands::WhyNot(args) => why_not::execute(args, &cli.global).await,
        cli::Commands::Model(args) => model::execute(args, &cli.global).await,
    }
}
