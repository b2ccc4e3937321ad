use parse_display::Display;

use super::*;

pub fn from_config(cfg: &SchedulerConfig) -> BatchScheduler {
    info!(scheduler = %cfg, "using");
    BatchScheduler::new(cfg.oversize)
}

/// What to do with a job that is larger than a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[display(style = "lowercase")]
pub enum OversizePolicy {
    /// print it in a batch of its own
    Admit,
    /// fail the scheduling call
    Reject,
}

impl Default for OversizePolicy {
    fn default() -> Self {
        Self::Admit
    }
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize, Display)]
#[display("BatchScheduler(oversize: {oversize})")]
pub struct SchedulerConfig {
    #[serde(default)]
    pub oversize: OversizePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names() {
        let cfg: SchedulerConfig = serde_json::from_str(r#"{"oversize": "reject"}"#).unwrap();
        assert_eq!(cfg.oversize, OversizePolicy::Reject);
        assert_eq!(from_config(&cfg).oversize_policy(), OversizePolicy::Reject);
        assert_eq!(OversizePolicy::Admit.to_string(), "admit");
    }

    #[test]
    fn admits_by_default() {
        let cfg: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(from_config(&cfg), BatchScheduler::default());
    }
}
