//! Conversion of loosely typed records into validated jobs and constraints.
//!
//! Records are key-value maps as they come out of JSON, YAML or CSV documents. Job
//! records carry `id`, `volume`, `priority` and `print_time` (or `duration`);
//! constraint records carry `max_volume` and `max_items`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::scheduler::{BatchScheduler, ScheduleError};
use crate::types::{CapacityConstraint, Duration, Job, ScheduleResult, Volume};
use crate::utils::prelude::*;

type Fields = Map<String, Value>;

fn as_record<'a>(what: &str, record: &'a Value) -> std::result::Result<&'a Fields, ScheduleError> {
    record
        .as_object()
        .ok_or_else(|| ScheduleError::invalid(format!("{} record must be a mapping, got {}", what, record)))
}

fn field<'a>(what: &str, fields: &'a Fields, key: &str) -> std::result::Result<&'a Value, ScheduleError> {
    fields
        .get(key)
        .ok_or_else(|| ScheduleError::invalid(format!("{} record is missing `{}`", what, key)))
}

fn number(what: &str, key: &str, v: &Value) -> std::result::Result<f64, ScheduleError> {
    v.as_f64()
        .ok_or_else(|| ScheduleError::invalid(format!("{} `{}` must be a number, got {}", what, key, v)))
}

fn integer(what: &str, key: &str, v: &Value) -> std::result::Result<i64, ScheduleError> {
    // integral floats such as `1.0` are accepted
    let parsed = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)),
        _ => None,
    };
    parsed.ok_or_else(|| ScheduleError::invalid(format!("{} `{}` must be an integer, got {}", what, key, v)))
}

/// Job identifiers may be strings or integers, integers are used in their decimal form
fn identifier(v: &Value) -> std::result::Result<String, ScheduleError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        _ => Err(ScheduleError::invalid(format!(
            "job `id` must be a string or an integer, got {}",
            v
        ))),
    }
}

/// Convert one job record
pub fn job_from_record(record: &Value) -> std::result::Result<Job, ScheduleError> {
    let fields = as_record("job", record)?;
    let id = identifier(field("job", fields, "id")?)?;
    let what = format!("job '{}'", id);

    let volume = number(&what, "volume", field(&what, fields, "volume")?)?;
    let priority = integer(&what, "priority", field(&what, fields, "priority")?)?;
    let duration = match fields.get("print_time") {
        Some(v) => number(&what, "print_time", v)?,
        None => number(&what, "duration", field(&what, fields, "duration")?)?,
    };

    Ok(Job {
        id,
        volume: Volume(volume),
        priority,
        duration: Duration(duration),
    })
}

/// Convert a constraint record
pub fn constraint_from_record(record: &Value) -> std::result::Result<CapacityConstraint, ScheduleError> {
    let fields = as_record("constraint", record)?;
    let max_volume = number("constraint", "max_volume", field("constraint", fields, "max_volume")?)?;
    let max_items = integer("constraint", "max_items", field("constraint", fields, "max_items")?)?;
    if max_items <= 0 {
        return Err(ScheduleError::invalid(format!(
            "max_items must be positive, got {}",
            max_items
        )));
    }

    Ok(CapacityConstraint::new(max_volume, max_items as usize))
}

/// Convert all records, then schedule them once with the default scheduler
pub fn optimize_printing(jobs: &[Value], constraint: &Value) -> std::result::Result<ScheduleResult, ScheduleError> {
    let constraint = constraint_from_record(constraint)?;
    let jobs = jobs.iter().map(job_from_record).collect::<std::result::Result<Vec<_>, _>>()?;
    BatchScheduler::default().schedule(&jobs, &constraint)
}

/// Turn a CSV row into a record, the `id` column stays text and every other
/// column that parses as a number becomes one
fn csv_record(headers: &csv::StringRecord, row: &csv::StringRecord) -> Value {
    let fields = headers
        .iter()
        .zip(row.iter())
        .map(|(key, raw)| {
            let (key, raw) = (key.trim(), raw.trim());
            let value = if key == "id" {
                Value::String(raw.to_owned())
            } else if let Ok(i) = raw.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::from(f)
            } else {
                Value::String(raw.to_owned())
            };
            (key.to_owned(), value)
        })
        .collect::<Fields>();
    Value::Object(fields)
}

/// Jobs to schedule, with optional printer limits, as read from a file
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub jobs: Vec<Job>,
    pub constraints: Option<CapacityConstraint>,
}

#[derive(Deserialize)]
struct RawWorkload {
    jobs: Vec<Value>,
    #[serde(default)]
    constraints: Option<Value>,
}

impl Workload {
    /// Load from a `.json`, `.yaml`/`.yml` or `.csv` file.
    ///
    /// CSV files carry one job per row and never any constraints.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        debug!(path = %path.display(), %ext, "loading workload");

        let workload = match ext.as_str() {
            "json" => Self::from_raw(serde_json::from_reader(BufReader::new(File::open(path)?))?)?,
            "yaml" | "yml" => Self::from_raw(serde_yaml::from_reader(BufReader::new(File::open(path)?))?)?,
            "csv" => {
                let mut reader = csv::Reader::from_path(path)?;
                let headers = reader.headers()?.clone();
                let mut jobs = vec![];
                for row in reader.records() {
                    jobs.push(job_from_record(&csv_record(&headers, &row?))?);
                }
                Self {
                    jobs,
                    constraints: None,
                }
            }
            _ => return Err(Error::UnsupportedFormat(path.display().to_string())),
        };

        info!(jobs = workload.jobs.len(), "workload loaded");
        Ok(workload)
    }

    #[cfg(test)]
    fn from_json_str(s: &str) -> Result<Self> {
        Self::from_raw(serde_json::from_str(s)?)
    }

    fn from_raw(raw: RawWorkload) -> Result<Self> {
        let jobs = raw
            .jobs
            .iter()
            .map(job_from_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let constraints = raw.constraints.as_ref().map(constraint_from_record).transpose()?;
        Ok(Self { jobs, constraints })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn printer() -> Value {
        json!({"max_volume": 300, "max_items": 2})
    }

    #[test]
    fn converts_job_record() {
        let job = job_from_record(&json!({"id": "M1", "volume": 100, "priority": 2, "print_time": 120})).unwrap();
        assert_eq!(job, Job::new("M1", 100.0, 2, 120.0));

        let job = job_from_record(&json!({"id": 7, "volume": 1.5, "priority": 1.0, "duration": 3})).unwrap();
        assert_eq!(job, Job::new("7", 1.5, 1, 3.0));
    }

    #[test]
    fn rejects_malformed_records() {
        let bad = [
            json!("M1"),
            json!({"volume": 1, "priority": 1, "print_time": 1}),
            json!({"id": null, "volume": 1, "priority": 1, "print_time": 1}),
            json!({"id": ["M1"], "volume": 1, "priority": 1, "print_time": 1}),
            json!({"id": "M1", "volume": "big", "priority": 1, "print_time": 1}),
            json!({"id": "M1", "volume": 1, "priority": 1.5, "print_time": 1}),
            json!({"id": "M1", "volume": 1, "priority": 1}),
        ];
        for record in bad.iter() {
            let err = job_from_record(record).unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidInput(_)), "{}", record);
        }

        assert!(constraint_from_record(&json!({"max_volume": 300})).is_err());
        assert!(constraint_from_record(&json!({"max_volume": 300, "max_items": -1})).is_err());
        assert!(constraint_from_record(&json!({"max_volume": 300, "max_items": 0})).is_err());
    }

    #[test]
    fn optimizes_mixed_records() {
        let jobs = vec![
            json!({"id": "M1", "volume": 100, "priority": 2, "print_time": 120}),
            json!({"id": "M2", "volume": 150, "priority": 1, "print_time": 90}),
            json!({"id": "M3", "volume": 120, "priority": 3, "print_time": 150}),
        ];
        let result = optimize_printing(&jobs, &printer()).unwrap();
        assert_eq!(result.print_order, vec!["M2", "M1", "M3"]);
        assert_eq!(result.total_time, Duration(270.0));
    }

    #[test]
    fn optimize_reports_duplicates() {
        let jobs = vec![
            json!({"id": "M1", "volume": 1, "priority": 1, "print_time": 1}),
            json!({"id": "M1", "volume": 1, "priority": 1, "print_time": 1}),
        ];
        let err = optimize_printing(&jobs, &printer()).unwrap_err();
        assert_eq!(err, ScheduleError::DuplicateIdentifier("M1".into()));
    }

    #[test]
    fn workload_from_json() {
        let w = Workload::from_json_str(
            r#"{"jobs": [{"id": "a", "volume": 1, "priority": 0, "print_time": 2}],
                "constraints": {"max_volume": 10, "max_items": 3}}"#,
        )
        .unwrap();
        assert_eq!(w.jobs, vec![Job::new("a", 1.0, 0, 2.0)]);
        assert_eq!(w.constraints, Some(CapacityConstraint::new(10.0, 3)));

        let w = Workload::from_json_str(r#"{"jobs": []}"#).unwrap();
        assert!(w.jobs.is_empty());
        assert_eq!(w.constraints, None);
    }

    #[test]
    fn workload_from_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("jobs.yaml");
        std::fs::write(
            &yaml,
            "jobs:\n  - {id: M1, volume: 250, priority: 1, print_time: 180}\nconstraints: {max_volume: 300, max_items: 2}\n",
        )
        .unwrap();
        let w = Workload::load(&yaml).unwrap();
        assert_eq!(w.jobs, vec![Job::new("M1", 250.0, 1, 180.0)]);
        assert_eq!(w.constraints, Some(CapacityConstraint::new(300.0, 2)));

        let csv = dir.path().join("jobs.csv");
        let mut f = File::create(&csv).unwrap();
        writeln!(f, "id,volume,priority,print_time").unwrap();
        writeln!(f, "M1,100,2,120").unwrap();
        writeln!(f, "M2,150,1,90").unwrap();
        drop(f);
        let w = Workload::load(&csv).unwrap();
        assert_eq!(w.jobs, vec![Job::new("M1", 100.0, 2, 120.0), Job::new("M2", 150.0, 1, 90.0)]);
        assert_eq!(w.constraints, None);

        let csv = dir.path().join("float_priority.csv");
        std::fs::write(&csv, "id,volume,priority,print_time\n007,100,1.0,120\n").unwrap();
        let w = Workload::load(&csv).unwrap();
        assert_eq!(w.jobs, vec![Job::new("007", 100.0, 1, 120.0)]);

        let csv = dir.path().join("bad_volume.csv");
        std::fs::write(&csv, "id,volume,priority,print_time\nM1,big,1,120\n").unwrap();
        match Workload::load(&csv) {
            Err(Error::Schedule(ScheduleError::InvalidInput(msg))) => assert!(msg.contains("volume"), "{}", msg),
            other => panic!("expected invalid volume, got {:?}", other),
        }

        let txt = dir.path().join("jobs.txt");
        std::fs::write(&txt, "").unwrap();
        assert!(matches!(Workload::load(&txt), Err(Error::UnsupportedFormat(_))));
    }
}
