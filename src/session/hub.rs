//! Hubs and their peripherals.

use mmcore_sys as sys;

use super::Session;
use crate::error::Result;
use crate::marshal::to_cstring;

impl Session {
    /// Attach a loaded peripheral to hub `parent`.
    pub fn set_parent_label(&self, label: &str, parent: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        let c_parent = to_cstring("parent", parent)?;
        self.check(unsafe { sys::MM_SetParentLabel(self.as_raw(), c_label.as_ptr(), c_parent.as_ptr()) })
    }

    /// Hub of a peripheral, empty if it has none.
    pub fn parent_label(&self, label: &str) -> Result<String> {
        let c_label = to_cstring("label", label)?;
        self.read_string(|out| unsafe { sys::MM_GetParentLabel(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Peripherals a hub reports as installed.
    pub fn installed_devices(&self, hub: &str) -> Result<Vec<String>> {
        let c_hub = to_cstring("hub", hub)?;
        self.read_list(|out| unsafe { sys::MM_GetInstalledDevices(self.as_raw(), c_hub.as_ptr(), out) })
    }

    /// Description of one installed peripheral.
    pub fn installed_device_description(&self, hub: &str, device: &str) -> Result<String> {
        let c_hub = to_cstring("hub", hub)?;
        let c_device = to_cstring("device", device)?;
        self.read_string(|out| unsafe {
            sys::MM_GetInstalledDeviceDescription(self.as_raw(), c_hub.as_ptr(), c_device.as_ptr(), out)
        })
    }

    /// Labels of loaded devices whose parent is `hub`.
    pub fn loaded_peripheral_devices(&self, hub: &str) -> Result<Vec<String>> {
        let c_hub = to_cstring("hub", hub)?;
        self.read_list(|out| unsafe {
            sys::MM_GetLoadedPeripheralDevices(self.as_raw(), c_hub.as_ptr(), out)
        })
    }
}
