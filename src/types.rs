//! Value types exchanged with the core.

use std::fmt;

use mmcore_sys as sys;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of a loaded or available device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum DeviceType {
    Unknown,
    Any,
    Camera,
    Shutter,
    State,
    Stage,
    XYStage,
    Serial,
    Generic,
    AutoFocus,
    Core,
    ImageProcessor,
    SignalIO,
    Magnifier,
    Slm,
    Hub,
    Galvo,
}

impl DeviceType {
    /// Decode a raw `MM_DeviceType`.
    pub fn from_raw(raw: sys::MM_DeviceType) -> Result<Self> {
        Ok(match raw {
            sys::MM_UnknownType => Self::Unknown,
            sys::MM_AnyType => Self::Any,
            sys::MM_CameraDevice => Self::Camera,
            sys::MM_ShutterDevice => Self::Shutter,
            sys::MM_StateDevice => Self::State,
            sys::MM_StageDevice => Self::Stage,
            sys::MM_XYStageDevice => Self::XYStage,
            sys::MM_SerialDevice => Self::Serial,
            sys::MM_GenericDevice => Self::Generic,
            sys::MM_AutoFocusDevice => Self::AutoFocus,
            sys::MM_CoreDevice => Self::Core,
            sys::MM_ImageProcessorDevice => Self::ImageProcessor,
            sys::MM_SignalIODevice => Self::SignalIO,
            sys::MM_MagnifierDevice => Self::Magnifier,
            sys::MM_SLMDevice => Self::Slm,
            sys::MM_HubDevice => Self::Hub,
            sys::MM_GalvoDevice => Self::Galvo,
            other => return Err(Error::InvalidDeviceType(other)),
        })
    }

    /// Encode as a raw `MM_DeviceType`.
    pub fn to_raw(self) -> sys::MM_DeviceType {
        match self {
            Self::Unknown => sys::MM_UnknownType,
            Self::Any => sys::MM_AnyType,
            Self::Camera => sys::MM_CameraDevice,
            Self::Shutter => sys::MM_ShutterDevice,
            Self::State => sys::MM_StateDevice,
            Self::Stage => sys::MM_StageDevice,
            Self::XYStage => sys::MM_XYStageDevice,
            Self::Serial => sys::MM_SerialDevice,
            Self::Generic => sys::MM_GenericDevice,
            Self::AutoFocus => sys::MM_AutoFocusDevice,
            Self::Core => sys::MM_CoreDevice,
            Self::ImageProcessor => sys::MM_ImageProcessorDevice,
            Self::SignalIO => sys::MM_SignalIODevice,
            Self::Magnifier => sys::MM_MagnifierDevice,
            Self::Slm => sys::MM_SLMDevice,
            Self::Hub => sys::MM_HubDevice,
            Self::Galvo => sys::MM_GalvoDevice,
        }
    }
}

/// Value type of a device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum PropertyType {
    Undef,
    String,
    Float,
    Integer,
}

impl PropertyType {
    /// Decode a raw `MM_PropertyType`.
    pub fn from_raw(raw: sys::MM_PropertyType) -> Result<Self> {
        match raw {
            sys::MM_Undef => Ok(Self::Undef),
            sys::MM_String => Ok(Self::String),
            sys::MM_Float => Ok(Self::Float),
            sys::MM_Integer => Ok(Self::Integer),
            other => Err(Error::InvalidPropertyType(other)),
        }
    }

    /// Encode as a raw `MM_PropertyType`.
    pub fn to_raw(self) -> sys::MM_PropertyType {
        match self {
            Self::Undef => sys::MM_Undef,
            Self::String => sys::MM_String,
            Self::Float => sys::MM_Float,
            Self::Integer => sys::MM_Integer,
        }
    }
}

/// A value to write to a device property.
///
/// The variant picks the core entry point: `MM_SetPropertyBool`,
/// `MM_SetPropertyInt`, `MM_SetPropertyFloat`, `MM_SetPropertyDouble` or
/// `MM_SetPropertyString`.
///
/// In configuration files values are written untagged: `true`, `2`, `12.5`
/// or `"8bit"`. Floats read from configuration are always `Float64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Sent as `1` or `0`.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// Single precision float.
    #[serde(skip_deserializing)]
    Float32(f32),
    /// Double precision float.
    Float64(f64),
    /// Sent verbatim.
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", u8::from(*v)),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float32(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Camera region of interest in binned pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Shape of the images the current camera produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageFormat {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Bytes per pixel and component.
    pub bytes_per_pixel: u8,
    /// Significant bits per pixel.
    pub bit_depth: u8,
    /// Components per pixel (1 for grayscale, 4 for RGB32).
    pub components: u8,
    /// Number of simultaneous camera channels.
    pub channels: u8,
    /// Size of one image in bytes.
    pub buffer_len: u32,
}

/// Direction of a focus drive relative to the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusDirection {
    /// The adapter does not know.
    #[default]
    Unknown,
    /// Positive moves go towards the sample.
    TowardSample,
    /// Positive moves go away from the sample.
    AwayFromSample,
}

impl FocusDirection {
    /// Decode the sign reported by the core.
    pub fn from_sign(sign: i8) -> Self {
        match sign.signum() {
            1 => Self::TowardSample,
            -1 => Self::AwayFromSample,
            _ => Self::Unknown,
        }
    }

    /// The sign the core expects.
    pub fn to_sign(self) -> i8 {
        match self {
            Self::Unknown => 0,
            Self::TowardSample => 1,
            Self::AwayFromSample => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_raw_round_trip() {
        for raw in sys::MM_UnknownType..=sys::MM_GalvoDevice {
            assert_eq!(DeviceType::from_raw(raw).unwrap().to_raw(), raw);
        }
        assert!(matches!(DeviceType::from_raw(99), Err(Error::InvalidDeviceType(99))));
    }

    #[test]
    fn test_property_type_rejects_unknown() {
        assert_eq!(PropertyType::from_raw(sys::MM_Float).unwrap(), PropertyType::Float);
        assert!(matches!(PropertyType::from_raw(7), Err(Error::InvalidPropertyType(7))));
    }

    #[test]
    fn test_property_value_from_config_text() {
        #[derive(Deserialize)]
        struct Doc {
            values: Vec<PropertyValue>,
        }
        let doc: Doc = toml::from_str(r#"values = [true, 2, 12.5, "8bit"]"#).unwrap();
        assert_eq!(
            doc.values,
            vec![
                PropertyValue::Bool(true),
                PropertyValue::Int(2),
                PropertyValue::Float64(12.5),
                PropertyValue::String("8bit".into()),
            ]
        );
    }

    #[test]
    fn test_property_value_display() {
        assert_eq!(PropertyValue::from(true).to_string(), "1");
        assert_eq!(PropertyValue::from(3).to_string(), "3");
        assert_eq!(PropertyValue::from("Label").to_string(), "Label");
    }

    #[test]
    fn test_focus_direction_signs() {
        assert_eq!(FocusDirection::from_sign(1), FocusDirection::TowardSample);
        assert_eq!(FocusDirection::from_sign(-4), FocusDirection::AwayFromSample);
        assert_eq!(FocusDirection::from_sign(0), FocusDirection::Unknown);
        assert_eq!(FocusDirection::AwayFromSample.to_sign(), -1);
    }
}
