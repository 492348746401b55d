use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = cli::Cli::parse();

    match parsed.dispatch().await {
        Ok(()) => Ok(()),
        Err(err) => {
            // Already reported to the operator by the dispatcher
            if err.downcast_ref::<commands::CommandFailed>().is_some() {
                std::process::exit(1);
            }
            Err(err)
        }
    }
}
