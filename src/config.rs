//! Session configuration using Figment.
//!
//! A configuration describes a hardware setup: where the adapters live,
//! which devices to load, their properties and roles. It is read from a TOML
//! file and merged with environment variables prefixed `MMCORE_`, where a
//! double underscore separates nesting levels:
//!
//! ```text
//! MMCORE_LOGGING__LEVEL=debug
//! MMCORE_ACQUISITION__EXPOSURE_MS=25
//! ```
//!
//! # Example
//! ```no_run
//! use mmcore::{config::SessionConfig, Session};
//!
//! # fn main() -> mmcore::Result<()> {
//! let config = SessionConfig::load("config/session.example.toml")?;
//! let session = Session::open()?;
//! session.apply_config(&config)?;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::events::{DeliveryPolicy, MAX_CAPACITY};
use crate::logging::LoggingConfig;
use crate::session::Session;
use crate::types::PropertyValue;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MMCORE_";

/// Top-level session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directories searched for device adapters, in order.
    pub search_paths: Vec<PathBuf>,
    /// Devices to load, in load order.
    pub devices: Vec<DeviceEntry>,
    /// Current device assignments.
    pub roles: Roles,
    /// Camera and buffer settings applied last.
    pub acquisition: AcquisitionConfig,
    /// Event delivery settings.
    pub events: EventsConfig,
    /// Logging settings for applications that call [`crate::logging::init`].
    pub logging: LoggingConfig,
}

/// One device to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Label the device is loaded under.
    pub label: String,
    /// Adapter module, e.g. `DemoCamera`.
    pub module: String,
    /// Device name inside the module, e.g. `DCam`.
    pub device: String,
    /// Properties written before initialization.
    #[serde(default)]
    pub pre_init: BTreeMap<String, PropertyValue>,
    /// Properties written after initialization.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

/// Labels of the devices assigned to each role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Roles {
    pub camera: Option<String>,
    pub shutter: Option<String>,
    pub focus: Option<String>,
    pub xy_stage: Option<String>,
    pub auto_focus: Option<String>,
}

/// Camera and circular buffer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Exposure of the current camera in milliseconds.
    pub exposure_ms: Option<f64>,
    /// Circular buffer size in megabytes.
    pub circular_buffer_mb: Option<u32>,
}

/// Event delivery settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Policy used for subscriptions created from this configuration.
    pub policy: DeliveryPolicy,
}

impl SessionConfig {
    /// Load a TOML file merged with `MMCORE_` environment variables, then
    /// validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = Self::figment(Figment::new().merge(Toml::file(path)))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        debug!(path = %path.display(), devices = config.devices.len(), "Loaded session configuration");
        Ok(config)
    }

    /// Parse TOML text merged with `MMCORE_` environment variables.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = Self::figment(Figment::new().merge(Toml::string(text)))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(base: Figment) -> Figment {
        base.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check the configuration for mistakes the core would only report
    /// halfway through applying it.
    pub fn validate(&self) -> Result<()> {
        self.logging.parsed_level()?;

        let capacity = self.events.policy.requested_capacity();
        if !(1..=MAX_CAPACITY).contains(&capacity) {
            return Err(Error::Config(format!(
                "events.policy capacity {capacity} is outside 1..={MAX_CAPACITY}"
            )));
        }

        let mut labels = HashSet::new();
        for device in &self.devices {
            if device.label.is_empty() {
                return Err(Error::Config(format!(
                    "device {}/{} has an empty label",
                    device.module, device.device
                )));
            }
            if !labels.insert(device.label.as_str()) {
                return Err(Error::Config(format!("duplicate device label: {}", device.label)));
            }
        }
        Ok(())
    }

    /// Labels of the configured devices, in load order.
    pub fn device_labels(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.label.as_str()).collect()
    }
}

impl Session {
    /// Bring the core into the configured state.
    ///
    /// Steps run in order and stop at the first failing call: search paths,
    /// device loading, pre-init properties, initialization of all devices,
    /// post-init properties, roles, acquisition settings.
    pub fn apply_config(&self, config: &SessionConfig) -> Result<()> {
        if !config.search_paths.is_empty() {
            let paths: Vec<String> = config
                .search_paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            self.set_device_adapter_search_paths(&paths)?;
        }

        for device in &config.devices {
            self.load_device(&device.label, &device.module, &device.device)?;
            for (name, value) in &device.pre_init {
                self.set_property(&device.label, name, value.clone())?;
            }
        }

        if !config.devices.is_empty() {
            self.initialize_all_devices()?;
        }

        for device in &config.devices {
            for (name, value) in &device.properties {
                self.set_property(&device.label, name, value.clone())?;
            }
        }

        let roles = &config.roles;
        if let Some(label) = &roles.camera {
            self.set_camera_device(label)?;
        }
        if let Some(label) = &roles.shutter {
            self.set_shutter_device(label)?;
        }
        if let Some(label) = &roles.focus {
            self.set_focus_device(label)?;
        }
        if let Some(label) = &roles.xy_stage {
            self.set_xy_stage_device(label)?;
        }
        if let Some(label) = &roles.auto_focus {
            self.set_auto_focus_device(label)?;
        }

        if let Some(exposure) = config.acquisition.exposure_ms {
            self.set_exposure(exposure)?;
        }
        if let Some(size_mb) = config.acquisition.circular_buffer_mb {
            self.set_circular_buffer_memory_footprint(size_mb)?;
        }

        info!(session = %self.handle(), devices = config.devices.len(), "Applied session configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const EXAMPLE: &str = r#"
        search_paths = ["/opt/micro-manager"]

        [[devices]]
        label = "Camera"
        module = "DemoCamera"
        device = "DCam"
        pre_init = { MaximumExposureMs = 5000.0 }
        properties = { Binning = "2", PixelType = "16bit" }

        [[devices]]
        label = "Wheel"
        module = "DemoCamera"
        device = "DWheel"

        [roles]
        camera = "Camera"

        [acquisition]
        exposure_ms = 15.0

        [events.policy]
        kind = "drop_oldest"
        capacity = 64
    "#;

    #[test]
    #[serial]
    fn test_parse_example() {
        let config = SessionConfig::from_toml_str(EXAMPLE).unwrap();
        assert_eq!(config.search_paths, vec![PathBuf::from("/opt/micro-manager")]);
        assert_eq!(config.device_labels(), vec!["Camera", "Wheel"]);
        assert_eq!(
            config.devices[0].pre_init.get("MaximumExposureMs"),
            Some(&PropertyValue::Float64(5000.0))
        );
        assert_eq!(config.roles.camera.as_deref(), Some("Camera"));
        assert_eq!(config.roles.shutter, None);
        assert_eq!(config.acquisition.exposure_ms, Some(15.0));
        assert_eq!(config.events.policy, DeliveryPolicy::DropOldest { capacity: 64 });
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    #[serial]
    fn test_defaults_for_empty_file() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.events.policy, DeliveryPolicy::Blocking { capacity: 16 });
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"info\"\n[acquisition]\nexposure_ms = 10.0").unwrap();

        std::env::set_var("MMCORE_LOGGING__LEVEL", "debug");
        std::env::set_var("MMCORE_ACQUISITION__CIRCULAR_BUFFER_MB", "64");
        let loaded = SessionConfig::load(file.path());
        std::env::remove_var("MMCORE_LOGGING__LEVEL");
        std::env::remove_var("MMCORE_ACQUISITION__CIRCULAR_BUFFER_MB");

        let config = loaded.unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.acquisition.exposure_ms, Some(10.0));
        assert_eq!(config.acquisition.circular_buffer_mb, Some(64));
    }

    #[test]
    #[serial]
    fn test_duplicate_labels_rejected() {
        let text = r#"
            [[devices]]
            label = "Z"
            module = "DemoCamera"
            device = "DStage"

            [[devices]]
            label = "Z"
            module = "DemoCamera"
            device = "DStage"
        "#;
        let err = SessionConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("duplicate")));
    }

    #[test]
    #[serial]
    fn test_invalid_log_level_rejected() {
        let err = SessionConfig::from_toml_str("[logging]\nlevel = \"chatty\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[serial]
    fn test_out_of_range_capacity_rejected() {
        let huge = "[events.policy]\nkind = \"drop_oldest\"\ncapacity = 9223372036854775807";
        let err = SessionConfig::from_toml_str(huge).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("capacity")));

        let zero = "[events.policy]\nkind = \"blocking\"\ncapacity = 0";
        assert!(SessionConfig::from_toml_str(zero).is_err());

        let max = format!("[events.policy]\nkind = \"drop_newest\"\ncapacity = {MAX_CAPACITY}");
        assert!(SessionConfig::from_toml_str(&max).is_ok());
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        // A missing file merges as empty; the defaults still validate.
        let config = SessionConfig::load("/nonexistent/session.toml").unwrap();
        assert!(config.devices.is_empty());
    }
}
