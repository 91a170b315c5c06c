//! Demo device catalogue and the property model of the simulated core.

use std::collections::BTreeMap;

use crate::types::*;

/// Name of the only adapter module the simulated core knows about.
pub const MODULE: &str = "DemoCamera";

/// Devices offered by [`MODULE`]: `(name, description, type)`.
pub const CATALOGUE: &[(&str, &str, MM_DeviceType)] = &[
    ("DCam", "Demo camera", MM_CameraDevice),
    ("DWheel", "Demo filter wheel", MM_StateDevice),
    ("DStage", "Demo stage", MM_StageDevice),
    ("DXYStage", "Demo XY stage", MM_XYStageDevice),
    ("DShutter", "Demo shutter", MM_ShutterDevice),
    ("DAutoFocus", "Demo auto focus", MM_AutoFocusDevice),
    ("DHub", "DHub", MM_HubDevice),
];

/// Sensor size of the demo camera before ROI and binning.
pub const SENSOR_WIDTH: i32 = 512;
pub const SENSOR_HEIGHT: i32 = 512;

/// Number of positions of the demo filter wheel.
pub const WHEEL_POSITIONS: usize = 10;

pub fn catalogue_entry(name: &str) -> Option<&'static (&'static str, &'static str, MM_DeviceType)> {
    CATALOGUE.iter().find(|(n, _, _)| *n == name)
}

/// One device property.
#[derive(Debug, Clone)]
pub struct Property {
    pub value: String,
    pub kind: MM_PropertyType,
    pub read_only: bool,
    pub pre_init: bool,
    pub sequenceable: bool,
    pub allowed: Vec<String>,
    pub limits: Option<(f64, f64)>,
}

impl Property {
    fn new(kind: MM_PropertyType, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
            read_only: false,
            pre_init: false,
            sequenceable: false,
            allowed: Vec::new(),
            limits: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(MM_String, value)
    }

    pub fn float(value: f64) -> Self {
        Self::new(MM_Float, format_float(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::new(MM_Integer, value.to_string())
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn pre_init(mut self) -> Self {
        self.pre_init = true;
        self
    }

    pub fn sequenceable(mut self) -> Self {
        self.sequenceable = true;
        self
    }

    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn limits(mut self, low: f64, high: f64) -> Self {
        self.limits = Some((low, high));
        self
    }

    /// Normalise and validate a new value the way a device adapter would.
    pub fn accept(&self, value: &str) -> Result<String, MM_Status> {
        if self.read_only {
            return Err(MM_ErrSetPropertyFailed);
        }

        let normalised = match self.kind {
            MM_Float => {
                let v: f64 = value.trim().parse().map_err(|_| MM_ErrSetPropertyFailed)?;
                self.check_limits(v)?;
                format_float(v)
            }
            MM_Integer => {
                let v: f64 = value.trim().parse().map_err(|_| MM_ErrSetPropertyFailed)?;
                if v.fract() != 0.0 {
                    return Err(MM_ErrSetPropertyFailed);
                }
                self.check_limits(v)?;
                (v as i64).to_string()
            }
            _ => value.to_string(),
        };

        if !self.allowed.is_empty() && !self.allowed.iter().any(|a| *a == normalised) {
            return Err(MM_ErrSetPropertyFailed);
        }
        Ok(normalised)
    }

    fn check_limits(&self, v: f64) -> Result<(), MM_Status> {
        match self.limits {
            Some((low, high)) if v < low || v > high => Err(MM_ErrSetPropertyFailed),
            _ => Ok(()),
        }
    }
}

/// Floats are stored with four decimals, like the device utilities of the core.
pub fn format_float(v: f64) -> String {
    format!("{:.4}", v)
}

/// Motion state of stage-like devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct Axis {
    /// Raw position in the device's frame.
    pub raw: f64,
    /// Raw position reported as zero.
    pub origin: f64,
}

impl Axis {
    pub fn reported(&self) -> f64 {
        self.raw - self.origin
    }

    pub fn set_reported(&mut self, value: f64) {
        self.raw = value + self.origin;
    }
}

/// Hardware state that is not expressed as properties.
#[derive(Debug, Clone)]
pub enum Hardware {
    Plain,
    Wheel { labels: Vec<String> },
    Stage { z: Axis, direction: i8 },
    XYStage { x: Axis, y: Axis },
}

/// A loaded device.
#[derive(Debug, Clone)]
pub struct Device {
    pub label: String,
    pub name: String,
    pub kind: MM_DeviceType,
    pub initialized: bool,
    pub parent: String,
    pub properties: BTreeMap<String, Property>,
    pub hardware: Hardware,
}

impl Device {
    /// Instantiate a catalogue device under `label`.
    pub fn create(label: &str, name: &str) -> Option<Self> {
        let (name, description, kind) = *catalogue_entry(name)?;

        let mut properties = BTreeMap::new();
        properties.insert("Name".to_string(), Property::string(name).read_only());
        properties.insert(
            "Description".to_string(),
            Property::string(description).read_only(),
        );

        let hardware = match kind {
            MM_CameraDevice => {
                properties.insert(
                    "Exposure".to_string(),
                    Property::float(10.0).limits(0.0, 10000.0),
                );
                properties.insert(
                    "Binning".to_string(),
                    Property::integer(1).allowed(["1", "2", "4"]),
                );
                properties.insert(
                    "PixelType".to_string(),
                    Property::string("8bit").allowed(["8bit", "16bit"]),
                );
                properties.insert(
                    "Gain".to_string(),
                    Property::integer(0).limits(-5.0, 8.0).sequenceable(),
                );
                properties.insert(
                    "MaximumExposureMs".to_string(),
                    Property::float(10000.0).pre_init(),
                );
                Hardware::Plain
            }
            MM_StateDevice => {
                let labels: Vec<String> =
                    (0..WHEEL_POSITIONS).map(|i| format!("State-{}", i)).collect();
                properties.insert(
                    "State".to_string(),
                    Property::integer(0).allowed((0..WHEEL_POSITIONS).map(|i| i.to_string())),
                );
                properties.insert(
                    "Label".to_string(),
                    Property::string(labels[0].clone()).allowed(labels.clone()),
                );
                Hardware::Wheel { labels }
            }
            MM_ShutterDevice => {
                properties.insert(
                    "State".to_string(),
                    Property::integer(0).allowed(["0", "1"]),
                );
                Hardware::Plain
            }
            MM_StageDevice => Hardware::Stage {
                z: Axis::default(),
                direction: 1,
            },
            MM_XYStageDevice => Hardware::XYStage {
                x: Axis::default(),
                y: Axis::default(),
            },
            _ => Hardware::Plain,
        };

        Some(Self {
            label: label.to_string(),
            name: name.to_string(),
            kind,
            initialized: false,
            parent: String::new(),
            properties,
            hardware,
        })
    }

    /// Properties exist before initialisation only if they are pre-init or
    /// the identification pair.
    pub fn visible(&self, name: &str) -> Option<&Property> {
        let prop = self.properties.get(name)?;
        if self.initialized || prop.pre_init || name == "Name" || name == "Description" {
            Some(prop)
        } else {
            None
        }
    }

    pub fn visible_names(&self) -> Vec<String> {
        self.properties
            .keys()
            .filter(|name| self.visible(name).is_some())
            .cloned()
            .collect()
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|p| p.value.as_str())
    }

    /// Set a property and return every `(property, value)` pair that changed,
    /// including dependent properties.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<Vec<(String, String)>, MM_Status> {
        let prop = self.visible(name).ok_or(MM_ErrDEVICE_GENERIC)?;
        let accepted = prop.accept(value)?;
        Ok(self.store(name, accepted))
    }

    fn store(&mut self, name: &str, value: String) -> Vec<(String, String)> {
        let mut changed = Vec::new();
        if let Some(prop) = self.properties.get_mut(name) {
            prop.value = value.clone();
            changed.push((name.to_string(), value.clone()));
        }

        // Keep the wheel's State and Label in step.
        if let Hardware::Wheel { labels } = &self.hardware {
            let follow = match name {
                "State" => value
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| labels.get(i).cloned())
                    .map(|l| ("Label", l)),
                "Label" => labels
                    .iter()
                    .position(|l| *l == value)
                    .map(|i| ("State", i.to_string())),
                _ => None,
            };
            if let Some((other, other_value)) = follow {
                if let Some(prop) = self.properties.get_mut(other) {
                    prop.value = other_value.clone();
                    changed.push((other.to_string(), other_value));
                }
            }
        }
        changed
    }

    /// Wheel position, if this is a state device.
    pub fn state(&self) -> Option<i32> {
        match self.hardware {
            Hardware::Wheel { .. } => self.value("State").and_then(|v| v.parse().ok()),
            _ => None,
        }
    }

    /// Move the wheel, bypassing read-only and visibility checks.
    pub fn set_state(&mut self, state: i32) -> Result<Vec<(String, String)>, MM_Status> {
        let n = match &self.hardware {
            Hardware::Wheel { labels } => labels.len(),
            _ => return Err(MM_ErrInvalidStateDevice),
        };
        if state < 0 || state as usize >= n {
            return Err(MM_ErrDEVICE_GENERIC);
        }
        Ok(self.store("State", state.to_string()))
    }

    /// Rename one wheel position.
    pub fn define_state_label(&mut self, state: i32, label: &str) -> Result<(), MM_Status> {
        let Hardware::Wheel { labels } = &mut self.hardware else {
            return Err(MM_ErrInvalidStateDevice);
        };
        let slot = usize::try_from(state)
            .ok()
            .and_then(|i| labels.get_mut(i))
            .ok_or(MM_ErrDEVICE_GENERIC)?;
        *slot = label.to_string();
        let labels = labels.clone();

        let current = self.state().unwrap_or(0) as usize;
        if let Some(prop) = self.properties.get_mut("Label") {
            prop.allowed = labels.clone();
            if let Some(l) = labels.get(current) {
                prop.value = l.clone();
            }
        }
        Ok(())
    }

    pub fn state_labels(&self) -> Result<&[String], MM_Status> {
        match &self.hardware {
            Hardware::Wheel { labels } => Ok(labels),
            _ => Err(MM_ErrInvalidStateDevice),
        }
    }
}
