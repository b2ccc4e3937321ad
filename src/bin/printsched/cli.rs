use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use crate::commands::{self, Cmd};
use printsched::utils::prelude::*;
use printsched::utils::{app_config, logging};

#[derive(StructOpt)]
#[structopt(
    name = "printsched",
    about = "Plan print batches under printer capacity limits",
    global_settings = &[AppSettings::VersionlessSubcommands]
)]
pub struct Opt {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE", parse(from_os_str))]
    config: Option<PathBuf>,

    /// Use the limits of a printer defined under `printers` in the config
    #[structopt(short, long, value_name = "NAME")]
    printer: Option<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    Config(commands::Config),
    Schedule(commands::Schedule),
}

impl Command {
    /// Whether the command writes its result to stdout
    fn produces_output(&self) -> bool {
        match self {
            Command::Config(_) => true,
            Command::Schedule(s) => s.writes_stdout(),
        }
    }
}

/// Parse arguments, finish config and logging, then run the subcommand
pub fn execute() -> Result<()> {
    let opt = Opt::from_args();

    {
        let mut cfg = app_config::config_mut();
        if let Some(path) = &opt.config {
            cfg.use_file(path)?;
        }
        if let Some(name) = &opt.printer {
            cfg.use_printer(name)?;
        }
    }

    let _guard = logging::setup(opt.cmd.produces_output())?;
    trace!("Start cli execution");

    match opt.cmd {
        Command::Config(c) => c.run(),
        Command::Schedule(s) => s.run(),
    }
}
