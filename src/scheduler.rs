use std::collections::HashSet;

use crate::types::{Batch, CapacityConstraint, Duration, Job, ScheduleResult};
use crate::utils::logging::prelude::*;

mod error;
mod from_config;
pub use error::ScheduleError;
pub use from_config::{from_config, OversizePolicy, SchedulerConfig};

/// Orders jobs by priority and packs them greedily into capacity-bounded batches.
///
/// Batches print one after another; jobs inside a batch print concurrently, so a
/// batch takes as long as its slowest job. This is a single greedy pass, not an
/// optimal packing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchScheduler {
    oversize: OversizePolicy,
}

impl BatchScheduler {
    pub fn new(oversize: OversizePolicy) -> Self {
        Self { oversize }
    }

    pub fn oversize_policy(&self) -> OversizePolicy {
        self.oversize
    }

    /// Compute the dispatch order and the estimated total time for `jobs`.
    ///
    /// All input is validated before any batching happens, so an error never
    /// comes with a partial result.
    #[instrument(
        level = "debug",
        skip(self, jobs, constraint),
        fields(
            jobs.len = jobs.len(),
            %constraint
        )
    )]
    pub fn schedule(&self, jobs: &[Job], constraint: &CapacityConstraint) -> Result<ScheduleResult, ScheduleError> {
        self.validate(jobs, constraint)?;

        let sorted = sort_by_priority(jobs);
        let batches = pack(&sorted, constraint);

        let print_order = batches
            .iter()
            .flat_map(|b| b.jobs.iter().map(|j| j.id.clone()))
            .collect();
        let total_time: Duration = batches.iter().map(Batch::latency).sum();

        debug!(batches = batches.len(), %total_time, "scheduled");
        Ok(ScheduleResult {
            print_order,
            total_time,
        })
    }

    fn validate(&self, jobs: &[Job], constraint: &CapacityConstraint) -> Result<(), ScheduleError> {
        if !(constraint.max_volume.0 > 0.0) {
            return Err(ScheduleError::invalid(format!(
                "max_volume must be positive, got {}",
                constraint.max_volume
            )));
        }
        if constraint.max_items == 0 {
            return Err(ScheduleError::invalid("max_items must be positive, got 0"));
        }

        let mut seen = HashSet::with_capacity(jobs.len());
        for job in jobs {
            if job.id.is_empty() {
                return Err(ScheduleError::invalid("job identifier must not be empty"));
            }
            if !is_non_negative(job.volume.0) {
                return Err(ScheduleError::invalid(format!(
                    "job '{}' has invalid volume {}",
                    job.id, job.volume
                )));
            }
            if !is_non_negative(job.duration.0) {
                return Err(ScheduleError::invalid(format!(
                    "job '{}' has invalid duration {}",
                    job.id, job.duration
                )));
            }
            if self.oversize == OversizePolicy::Reject && job.volume > constraint.max_volume {
                return Err(ScheduleError::invalid(format!(
                    "job '{}' volume {} exceeds max_volume {}",
                    job.id, job.volume, constraint.max_volume
                )));
            }
            if !seen.insert(job.id.as_str()) {
                return Err(ScheduleError::DuplicateIdentifier(job.id.clone()));
            }
        }
        Ok(())
    }
}

fn is_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// Stable sort on priority alone, equal priorities keep their input order
pub(crate) fn sort_by_priority(jobs: &[Job]) -> Vec<&Job> {
    let mut sorted: Vec<_> = jobs.iter().collect();
    sorted.sort_by_key(|j| j.priority);
    sorted
}

/// Split the already sorted jobs into consecutive runs that respect `constraint`.
///
/// A job that does not fit closes the current batch and opens the next one, even
/// when its volume alone is above the limit.
pub(crate) fn pack<'a>(sorted: &[&'a Job], constraint: &CapacityConstraint) -> Vec<Batch<'a>> {
    let mut batches = vec![];
    let mut current = Batch::default();

    for &job in sorted {
        if !current.fits(job, constraint) {
            if !current.is_empty() {
                debug!(batch = %current, latency = %current.latency(), "batch closed");
                batches.push(std::mem::take(&mut current));
            }
            if job.volume > constraint.max_volume {
                warn!(%job, %constraint, "job alone exceeds max_volume, printing it by itself");
            }
        }
        current.push(job);
    }

    if !current.is_empty() {
        debug!(batch = %current, latency = %current.latency(), "batch closed");
        batches.push(current);
    }
    batches
}
