//! Device loading, discovery and role assignment.

use std::ptr;
use std::slice;

use mmcore_sys as sys;
use tracing::{debug, info};

use super::Session;
use crate::error::Result;
use crate::marshal::{from_flag, to_cstring, CStringArray, NativeStringList};
use crate::types::DeviceType;

impl Session {
    /// Load `device` from adapter `module` under `label`.
    pub fn load_device(&self, label: &str, module: &str, device: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        let c_module = to_cstring("module", module)?;
        let c_device = to_cstring("device", device)?;
        self.check(unsafe {
            sys::MM_LoadDevice(self.as_raw(), c_label.as_ptr(), c_module.as_ptr(), c_device.as_ptr())
        })?;
        debug!(label, module, device, "Loaded device");
        Ok(())
    }

    /// Unload one device.
    pub fn unload_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_UnloadDevice(self.as_raw(), c_label.as_ptr()) })?;
        debug!(label, "Unloaded device");
        Ok(())
    }

    /// Unload every device.
    pub fn unload_all_devices(&self) -> Result<()> {
        self.check(unsafe { sys::MM_UnloadAllDevices(self.as_raw()) })
    }

    /// Initialize every loaded device.
    pub fn initialize_all_devices(&self) -> Result<()> {
        self.check(unsafe { sys::MM_InitializeAllDevices(self.as_raw()) })?;
        info!(session = %self.handle(), "Initialized all devices");
        Ok(())
    }

    /// Initialize one loaded device.
    pub fn initialize_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_InitializeDevice(self.as_raw(), c_label.as_ptr()) })
    }

    /// Unload all devices and reset the core to its initial state.
    pub fn reset(&self) -> Result<()> {
        self.check(unsafe { sys::MM_Reset(self.as_raw()) })
    }

    /// Replace the directories searched for device adapters.
    pub fn set_device_adapter_search_paths<S: AsRef<str>>(&self, paths: &[S]) -> Result<()> {
        let mut c_paths = CStringArray::new("paths", paths)?;
        unsafe { sys::MM_SetDeviceAdapterSearchPaths(self.as_raw(), c_paths.as_mut_ptr()) };
        debug!(count = c_paths.len(), "Set device adapter search paths");
        Ok(())
    }

    /// Directories searched for device adapters, in order.
    pub fn device_adapter_search_paths(&self) -> Vec<String> {
        let mut list = NativeStringList::null();
        unsafe { sys::MM_GetDeviceAdapterSearchPaths(self.as_raw(), list.as_out()) };
        list.to_vec()
    }

    /// Names of the device adapters found on the search paths.
    pub fn device_adapter_names(&self) -> Result<Vec<String>> {
        self.read_list(|out| unsafe { sys::MM_GetDeviceAdapterNames(self.as_raw(), out) })
    }

    /// Devices provided by adapter `module`.
    pub fn available_devices(&self, module: &str) -> Result<Vec<String>> {
        let c_module = to_cstring("module", module)?;
        self.read_list(|out| unsafe { sys::MM_GetAvailableDevices(self.as_raw(), c_module.as_ptr(), out) })
    }

    /// Descriptions of the devices of `module`, in the order of
    /// [`available_devices`](Self::available_devices).
    pub fn available_device_descriptions(&self, module: &str) -> Result<Vec<String>> {
        let c_module = to_cstring("module", module)?;
        self.read_list(|out| unsafe {
            sys::MM_GetAvailableDeviceDescriptions(self.as_raw(), c_module.as_ptr(), out)
        })
    }

    /// Types of the devices of `module`, in the order of
    /// [`available_devices`](Self::available_devices).
    pub fn available_device_types(&self, module: &str) -> Result<Vec<DeviceType>> {
        let c_module = to_cstring("module", module)?;
        let mut types: *mut sys::MM_DeviceType = ptr::null_mut();
        let mut len = 0usize;
        let status = unsafe {
            sys::MM_GetAvailableDeviceTypes(self.as_raw(), c_module.as_ptr(), &mut types, &mut len)
        };

        let raw = if types.is_null() {
            Vec::new()
        } else {
            // SAFETY: the core returned `len` elements at `types`; the array is
            // released right after copying.
            let copied = unsafe { slice::from_raw_parts(types, len).to_vec() };
            unsafe { sys::MM_Free(types.cast()) };
            copied
        };

        self.check(status)?;
        raw.into_iter().map(DeviceType::from_raw).collect()
    }

    /// Whether the device is still executing a command.
    pub fn device_busy(&self, label: &str) -> Result<bool> {
        let c_label = to_cstring("label", label)?;
        self.read_flag(|busy| unsafe { sys::MM_DeviceBusy(self.as_raw(), c_label.as_ptr(), busy) })
    }

    /// Whether any device of `kind` is busy.
    pub fn device_type_busy(&self, kind: DeviceType) -> Result<bool> {
        let mut busy = 0u8;
        self.check(unsafe { sys::MM_DeviceTypeBusy(self.as_raw(), kind.to_raw(), &mut busy) })?;
        Ok(from_flag(busy))
    }

    // --- current devices ---

    /// Make `label` the current camera. An empty label clears the role.
    pub fn set_camera_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetCameraDevice(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make `label` the current shutter.
    pub fn set_shutter_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetShutterDevice(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make `label` the current focus stage.
    pub fn set_focus_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetFocusDevice(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make `label` the current XY stage.
    pub fn set_xy_stage_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetXYStageDevice(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make `label` the current autofocus device.
    pub fn set_auto_focus_device(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetAutoFocusDevice(self.as_raw(), c_label.as_ptr()) })
    }

    /// Label of the current camera, empty if none.
    pub fn camera_device(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetCameraDevice(self.as_raw(), out) })
    }

    /// Label of the current shutter, empty if none.
    pub fn shutter_device(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetShutterDevice(self.as_raw(), out) })
    }

    /// Label of the current focus stage, empty if none.
    pub fn focus_device(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetFocusDevice(self.as_raw(), out) })
    }

    /// Label of the current XY stage, empty if none.
    pub fn xy_stage_device(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetXYStageDevice(self.as_raw(), out) })
    }

    /// Label of the current autofocus device, empty if none.
    pub fn auto_focus_device(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetAutoFocusDevice(self.as_raw(), out) })
    }
}
