use crate::output::OutputFormat;
use crate::scheduler::SchedulerConfig;
use crate::types::CapacityConstraint;
use crate::utils::app_config::AppConfig;
use crate::utils::prelude::*;

/// Typed access to the sections printsched reads
pub trait AppConfigExt {
    /// Default printer limits
    fn constraints(&self) -> Result<CapacityConstraint>;
    fn scheduler(&self) -> Result<SchedulerConfig>;
    fn output_format(&self) -> Result<OutputFormat>;
}

impl AppConfigExt for AppConfig {
    fn constraints(&self) -> Result<CapacityConstraint> {
        self.get("constraints")
    }

    fn scheduler(&self) -> Result<SchedulerConfig> {
        self.get("scheduler")
    }

    fn output_format(&self) -> Result<OutputFormat> {
        self.get("output.format")
    }
}
