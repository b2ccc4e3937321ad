use std::path::PathBuf;

use structopt::StructOpt;

use printsched::output::OutputFormat;
use printsched::utils::prelude::*;
use printsched::ScheduleOptions;

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Show the effective configuration
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let value: serde_yaml::Value = config().fetch()?;
        print!("{}", serde_yaml::to_string(&value)?);

        Ok(())
    }
}

/// Schedule the jobs of a workload file (.json, .yaml or .csv)
#[derive(StructOpt)]
pub struct Schedule {
    #[structopt(parse(from_os_str))]
    workload: PathBuf,

    /// Output format: json, yaml or text
    #[structopt(short, long)]
    format: Option<OutputFormat>,

    /// Write the result to FILE instead of stdout
    #[structopt(short, long, value_name = "FILE", parse(from_os_str))]
    output: Option<PathBuf>,

    /// Override the maximum volume per batch
    #[structopt(long)]
    max_volume: Option<f64>,

    /// Override the maximum number of jobs per batch
    #[structopt(long)]
    max_items: Option<usize>,

    /// Fail instead of printing a job larger than the printer on its own
    #[structopt(long)]
    reject_oversize: bool,
}

impl Schedule {
    pub fn writes_stdout(&self) -> bool {
        self.output.is_none()
    }
}

impl Cmd for Schedule {
    fn run(self) -> Result<()> {
        {
            let mut cfg = config_mut();
            if let Some(format) = self.format {
                cfg.set("output.format", format.to_string())?;
            }
            if self.reject_oversize {
                cfg.set("scheduler.oversize", "reject")?;
            }
        }

        let opts = ScheduleOptions {
            output: self.output,
            max_volume: self.max_volume,
            max_items: self.max_items,
        };
        printsched::run_schedule(&self.workload, &opts)?;

        Ok(())
    }
}
