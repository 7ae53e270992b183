// src/bin/cli.rs
use catalog_scrape::cli::{self, Cli};
use clap::Parser;
use color_eyre::eyre::eyre;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::run(Cli::parse()).map_err(|e| eyre!(e))
}
