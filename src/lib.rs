//! Priority-ordered, capacity-bounded batching of print jobs.
//!
//! [`BatchScheduler`] is the core: it sorts jobs by priority (stable on ties),
//! packs them greedily into batches that respect a [`CapacityConstraint`], and
//! estimates the total time as the sum of each batch's slowest job.

use std::path::{Path, PathBuf};

use crate::config::AppConfigExt;
use crate::utils::prelude::*;

pub mod config;
pub mod output;
pub mod records;
pub mod scheduler;
pub mod types;
pub mod utils;

pub use records::{optimize_printing, Workload};
pub use scheduler::{BatchScheduler, OversizePolicy, ScheduleError};
pub use types::{CapacityConstraint, Duration, Job, ScheduleResult, Volume};

/// Overrides given on the command line for one `schedule` run
#[derive(Debug, Default, Clone)]
pub struct ScheduleOptions {
    /// write the result here instead of stdout
    pub output: Option<PathBuf>,
    pub max_volume: Option<f64>,
    pub max_items: Option<usize>,
}

/// Load a workload, schedule it with the configured scheduler and render the result.
///
/// Printer limits come from the workload file when it has them, otherwise from
/// the config; `opts` overrides both.
pub fn run_schedule(workload: &Path, opts: &ScheduleOptions) -> Result<ScheduleResult> {
    let _g = info_span!("schedule").entered();

    let (scheduler, default_constraint, format) = {
        let cfg = config();
        (
            scheduler::from_config(&cfg.scheduler()?),
            cfg.constraints()?,
            cfg.output_format()?,
        )
    };

    let workload = {
        let _g = info_span!("load").entered();
        Workload::load(workload)?
    };

    let mut constraint = workload.constraints.unwrap_or(default_constraint);
    if let Some(v) = opts.max_volume {
        constraint.max_volume = Volume(v);
    }
    if let Some(n) = opts.max_items {
        constraint.max_items = n;
    }

    let result = {
        let _g = info_span!("run").entered();
        scheduler.schedule(&workload.jobs, &constraint)?
    };
    info!(jobs = result.print_order.len(), total_time = %result.total_time, "scheduled");

    {
        let _g = info_span!("output").entered();
        output::render_to(&result, format, opts.output.as_deref())?;
    }

    Ok(result)
}
