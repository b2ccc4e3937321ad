use printsched::utils;
use printsched::utils::prelude::*;

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    // defaults and environment, the cli may layer a file and a printer on top
    utils::app_config::setup()?;

    cli::execute()
}
