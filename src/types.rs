use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Deref};

use parse_display::Display;
use serde::{Deserialize, Serialize};

/// Physical space/material a job consumes on the build plate
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Display, Serialize, Deserialize)]
#[serde(transparent)]
#[display("{0}")]
pub struct Volume(pub f64);

/// A processing duration, in minutes
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Display, Serialize, Deserialize)]
#[serde(transparent)]
#[display("{0}")]
pub struct Duration(pub f64);

impl Deref for Volume {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for Duration {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Add for Volume {
    type Output = Volume;

    fn add(self, rhs: Self) -> Self::Output {
        Volume(self.0 + rhs.0)
    }
}

impl AddAssign for Volume {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Duration::default(), Add::add)
    }
}

/// A print job submitted to the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job ID, unique within one scheduling call
    pub id: String,
    pub volume: Volume,
    /// lower value is printed earlier
    pub priority: i64,
    /// time to print this job on its own
    #[serde(alias = "print_time")]
    pub duration: Duration,
}

impl Job {
    pub fn new(id: impl Into<String>, volume: f64, priority: i64, duration: f64) -> Self {
        Self {
            id: id.into(),
            volume: Volume(volume),
            priority,
            duration: Duration(duration),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job({}, vol {:.2}, pri {}, {:.2})",
            self.id, self.volume.0, self.priority, self.duration.0
        )
    }
}

/// Physical limits of one printer, applied to every batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityConstraint {
    pub max_volume: Volume,
    pub max_items: usize,
}

impl CapacityConstraint {
    pub fn new(max_volume: f64, max_items: usize) -> Self {
        Self {
            max_volume: Volume(max_volume),
            max_items,
        }
    }
}

impl fmt::Display for CapacityConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capacity({:.2}, {} items)", self.max_volume.0, self.max_items)
    }
}

/// Jobs printed together on one plate
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Batch<'a> {
    pub jobs: Vec<&'a Job>,
    pub volume: Volume,
}

impl<'a> fmt::Display for Batch<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Batch {{ jobs.len: {}, volume: {:.2} }}", self.jobs.len(), self.volume.0)
    }
}

impl<'a> Batch<'a> {
    /// Whether `job` can join without breaking either limit
    pub fn fits(&self, job: &Job, constraint: &CapacityConstraint) -> bool {
        self.volume + job.volume <= constraint.max_volume && self.jobs.len() + 1 <= constraint.max_items
    }

    pub fn push(&mut self, job: &'a Job) {
        self.volume += job.volume;
        self.jobs.push(job);
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// the batch finishes with its slowest job, an empty batch takes no time
    pub fn latency(&self) -> Duration {
        self.jobs
            .iter()
            .map(|j| j.duration)
            .fold(Duration::default(), |a, b| if a < b { b } else { a })
    }
}

/// Outcome of one scheduling call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// job IDs in dispatch order
    pub print_order: Vec<String>,
    /// sum of all batch latencies
    pub total_time: Duration,
}
