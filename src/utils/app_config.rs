use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use config::{Environment, Source};
use lazy_static::lazy_static;

use super::error::Result;

static DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/default_config.toml"));

/// A named printer section, merged over the top-level config
#[derive(Debug, Clone, serde::Deserialize)]
struct PrinterProfile(HashMap<String, config::Value>);

impl config::Source for PrinterProfile {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> std::result::Result<HashMap<String, config::Value>, config::ConfigError> {
        let mut kv = self.0.clone();
        // a profile can not pull in other profiles
        kv.remove("printers");
        Ok(kv)
    }
}

/// The main structure holding application config
pub struct AppConfig(config::Config);

impl AppConfig {
    pub(crate) fn new() -> Self {
        Self(config::Config::new())
    }

    pub fn setup(&mut self) -> Result<&mut Self> {
        self.0
            .merge(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))?;

        // nested keys are separated by `__`
        self.0
            .merge(Environment::with_prefix("PRINTSCHED").separator("__"))?;

        Ok(self)
    }

    /// Load config from a file
    pub fn use_file(&mut self, path: &Path) -> Result<&mut Self> {
        self.0.merge(config::File::from(path))?;
        Ok(self)
    }

    /// Apply the `printers.<name>` section
    pub fn use_printer(&mut self, name: &str) -> Result<&mut Self> {
        let profile: PrinterProfile = self.get(format!("printers.{}", name))?;
        self.0.merge(profile)?;
        Ok(self)
    }

    /// Override a single key
    pub fn set<T>(&mut self, key: &str, value: T) -> Result<&mut Self>
    where
        T: Into<config::Value>,
    {
        self.0.set(key, value)?;
        Ok(self)
    }

    /// Get a single value and deserialize to the given type
    pub fn get<T, K>(&self, key: K) -> Result<T>
    where
        // CONFIG is read through a RwLock released before returning,
        // so T can not borrow from it.
        T: serde::de::DeserializeOwned,
        K: AsRef<str>,
    {
        Ok(self.0.get(key.as_ref())?)
    }

    /// Deserialize the whole config to the given type
    pub fn fetch<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let t = self.0.clone().try_into()?;
        Ok(t)
    }
}

lazy_static! {
    /// global AppConfig instance
    static ref CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::new());
}

pub fn setup() -> Result<()> {
    config_mut().setup()?;
    Ok(())
}

/// global AppConfig instance
pub fn config() -> RwLockReadGuard<'static, AppConfig> {
    // a poisoned lock only means a panic elsewhere, the config itself is intact
    CONFIG.read().unwrap_or_else(|e| e.into_inner())
}

/// mutable global AppConfig instance
pub fn config_mut() -> RwLockWriteGuard<'static, AppConfig> {
    CONFIG.write().unwrap_or_else(|e| e.into_inner())
}

pub mod prelude {
    pub use super::{config, config_mut};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{OversizePolicy, SchedulerConfig};
    use crate::types::CapacityConstraint;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::new();
        config.setup().unwrap();
        config
            .use_file(Path::new(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test_config.toml"
            )))
            .unwrap();

        config
    }

    #[test]
    fn defaults_are_embedded() {
        let mut config = AppConfig::new();
        config.setup().unwrap();

        let sched: SchedulerConfig = config.get("scheduler").unwrap();
        assert_eq!(sched.oversize, OversizePolicy::Admit);
        let format: String = config.get("output.format").unwrap();
        assert_eq!(format, "json");
    }

    #[test]
    fn file_overrides_defaults() {
        let config = test_config();

        let c: CapacityConstraint = config.get("constraints").unwrap();
        assert_eq!(c, CapacityConstraint::new(300.0, 2));
    }

    #[test]
    fn printer_profile() {
        let mut config = test_config();

        config.use_printer("big").unwrap();
        let c: CapacityConstraint = config.get("constraints").unwrap();
        assert_eq!(c, CapacityConstraint::new(1000.0, 4));
        let sched: SchedulerConfig = config.get("scheduler").unwrap();
        assert_eq!(sched.oversize, OversizePolicy::Reject);
    }

    #[test]
    fn unknown_printer() {
        let mut config = test_config();
        assert!(config.use_printer("nope").is_err());
    }

    #[test]
    fn set_single_key() {
        let mut config = test_config();
        config.set("constraints.max_items", 7i64).unwrap();
        let items: usize = config.get("constraints.max_items").unwrap();
        assert_eq!(items, 7);
    }
}
