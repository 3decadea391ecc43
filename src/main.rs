#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use clap::Parser;
use loopgov::Config;

mod app;
mod cli;

use cli::commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_init()?,
    };

    loopgov::observability::init_logging(&config.observability)?;
    app::dispatch::dispatch(cli, config)
}
