//! Device property access.

use mmcore_sys as sys;
use tracing::trace;

use super::Session;
use crate::error::Result;
use crate::marshal::{to_cstring, to_flag};
use crate::types::{PropertyType, PropertyValue};

impl Session {
    /// Names of the properties `label` currently exposes.
    pub fn device_property_names(&self, label: &str) -> Result<Vec<String>> {
        let c_label = to_cstring("label", label)?;
        self.read_list(|out| unsafe { sys::MM_GetDevicePropertyNames(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Whether `label` has property `name`.
    pub fn has_property(&self, label: &str, name: &str) -> Result<bool> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_flag(|out| unsafe { sys::MM_HasProperty(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out) })
    }

    /// Current value of a property, as the core formats it.
    pub fn property(&self, label: &str, name: &str) -> Result<String> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_string(|out| unsafe { sys::MM_GetProperty(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out) })
    }

    /// Write a property.
    ///
    /// The value's variant picks the typed setter, so `set_property(l, n, 2)`
    /// goes through `MM_SetPropertyInt` and `set_property(l, n, "2")` through
    /// `MM_SetPropertyString`.
    pub fn set_property(&self, label: &str, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        let (mm, l, n) = (self.as_raw(), c_label.as_ptr(), c_name.as_ptr());

        trace!(label, name, %value, "Setting property");
        let status = match &value {
            PropertyValue::Bool(v) => unsafe { sys::MM_SetPropertyBool(mm, l, n, to_flag(*v)) },
            PropertyValue::Int(v) => unsafe { sys::MM_SetPropertyInt(mm, l, n, *v) },
            PropertyValue::Float32(v) => unsafe { sys::MM_SetPropertyFloat(mm, l, n, *v) },
            PropertyValue::Float64(v) => unsafe { sys::MM_SetPropertyDouble(mm, l, n, *v) },
            PropertyValue::String(v) => {
                let c_value = to_cstring("value", v)?;
                unsafe { sys::MM_SetPropertyString(mm, l, n, c_value.as_ptr()) }
            }
        };
        self.check(status)
    }

    /// Values the property accepts; empty when it accepts anything in range.
    pub fn allowed_property_values(&self, label: &str, name: &str) -> Result<Vec<String>> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_list(|out| unsafe {
            sys::MM_GetAllowedPropertyValues(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Whether the property is read-only.
    pub fn is_property_read_only(&self, label: &str, name: &str) -> Result<bool> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_flag(|out| unsafe {
            sys::MM_IsPropertyReadOnly(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Whether the property must be set before the device is initialized.
    pub fn is_property_pre_init(&self, label: &str, name: &str) -> Result<bool> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_flag(|out| unsafe {
            sys::MM_IsPropertyPreInit(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Whether the device can run a hardware sequence of this property.
    pub fn is_property_sequenceable(&self, label: &str, name: &str) -> Result<bool> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_flag(|out| unsafe {
            sys::MM_IsPropertySequenceable(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Whether the property has numeric limits.
    pub fn has_property_limits(&self, label: &str, name: &str) -> Result<bool> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_flag(|out| unsafe {
            sys::MM_HasPropertyLimits(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Lower limit of a numeric property.
    pub fn property_lower_limit(&self, label: &str, name: &str) -> Result<f64> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_value(|out| unsafe {
            sys::MM_GetPropertyLowerLimit(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Upper limit of a numeric property.
    pub fn property_upper_limit(&self, label: &str, name: &str) -> Result<f64> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        self.read_value(|out| unsafe {
            sys::MM_GetPropertyUpperLimit(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })
    }

    /// Value type of the property.
    pub fn property_type(&self, label: &str, name: &str) -> Result<PropertyType> {
        let (c_label, c_name) = (to_cstring("label", label)?, to_cstring("name", name)?);
        let raw = self.read_value(|out| unsafe {
            sys::MM_GetPropertyType(self.as_raw(), c_label.as_ptr(), c_name.as_ptr(), out)
        })?;
        PropertyType::from_raw(raw)
    }
}
