//! `extern "C"` declarations of the MMCoreC ABI.
//!
//! Ownership rules:
//! - `char*` outputs are allocated by the library and released with
//!   [`MM_StringFree`].
//! - NULL-terminated `char**` outputs are released with [`MM_StringListFree`].
//! - `MM_DeviceType*` outputs are released with [`MM_Free`].
//! - `uint8_t*` image outputs point into core-owned buffers and must not be
//!   freed; they stay valid until the next acquisition call.

use std::os::raw::{c_char, c_int, c_void};

use crate::types::*;

extern "C" {
    pub fn MM_Open(mm: *mut MM_Session);
    pub fn MM_Close(mm: MM_Session);
    pub fn MM_GetVersionInfo(mm: MM_Session, info: *mut *mut c_char);
    pub fn MM_GetAPIVersionInfo(mm: MM_Session, info: *mut *mut c_char);

    pub fn MM_StringFree(str_: *mut c_char);
    pub fn MM_StringListFree(str_list: *mut *mut c_char);
    pub fn MM_Free(ptr: *mut c_void);

    pub fn MM_RegisterCallback(mm: MM_Session, callback: *mut MM_EventCallback);

    // Device initialization and setup
    pub fn MM_LoadDevice(
        mm: MM_Session,
        label: *const c_char,
        module_name: *const c_char,
        device_name: *const c_char,
    ) -> MM_Status;
    pub fn MM_UnloadDevice(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_UnloadAllDevices(mm: MM_Session) -> MM_Status;
    pub fn MM_InitializeAllDevices(mm: MM_Session) -> MM_Status;
    pub fn MM_InitializeDevice(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_Reset(mm: MM_Session) -> MM_Status;

    // Device listing
    pub fn MM_SetDeviceAdapterSearchPaths(mm: MM_Session, paths: *mut *const c_char);
    pub fn MM_GetDeviceAdapterSearchPaths(mm: MM_Session, paths: *mut *mut *mut c_char);
    pub fn MM_GetDeviceAdapterNames(mm: MM_Session, names: *mut *mut *mut c_char) -> MM_Status;
    pub fn MM_GetAvailableDevices(
        mm: MM_Session,
        library: *const c_char,
        names: *mut *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_GetAvailableDeviceDescriptions(
        mm: MM_Session,
        library: *const c_char,
        descriptions: *mut *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_GetAvailableDeviceTypes(
        mm: MM_Session,
        library: *const c_char,
        types: *mut *mut MM_DeviceType,
        len_types: *mut usize,
    ) -> MM_Status;

    // Generic device control
    pub fn MM_GetDevicePropertyNames(
        mm: MM_Session,
        label: *const c_char,
        names: *mut *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_HasProperty(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        has_property: *mut u8,
    ) -> MM_Status;
    pub fn MM_GetProperty(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        value: *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_SetPropertyString(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        value: *const c_char,
    ) -> MM_Status;
    pub fn MM_SetPropertyBool(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        value: u8,
    ) -> MM_Status;
    pub fn MM_SetPropertyInt(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        value: i32,
    ) -> MM_Status;
    pub fn MM_SetPropertyFloat(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        value: f32,
    ) -> MM_Status;
    pub fn MM_SetPropertyDouble(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        value: f64,
    ) -> MM_Status;
    pub fn MM_GetAllowedPropertyValues(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        values: *mut *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_IsPropertyReadOnly(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        read_only: *mut u8,
    ) -> MM_Status;
    pub fn MM_IsPropertyPreInit(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        pre_init: *mut u8,
    ) -> MM_Status;
    pub fn MM_IsPropertySequenceable(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        sequenceable: *mut u8,
    ) -> MM_Status;
    pub fn MM_HasPropertyLimits(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        has_limits: *mut u8,
    ) -> MM_Status;
    pub fn MM_GetPropertyLowerLimit(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        lower_limit: *mut f64,
    ) -> MM_Status;
    pub fn MM_GetPropertyUpperLimit(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        upper_limit: *mut f64,
    ) -> MM_Status;
    pub fn MM_GetPropertyType(
        mm: MM_Session,
        label: *const c_char,
        prop_name: *const c_char,
        type_: *mut MM_PropertyType,
    ) -> MM_Status;

    pub fn MM_DeviceBusy(mm: MM_Session, label: *const c_char, busy: *mut u8) -> MM_Status;
    pub fn MM_DeviceTypeBusy(mm: MM_Session, type_: MM_DeviceType, busy: *mut u8) -> MM_Status;

    // Manage current devices
    pub fn MM_SetCameraDevice(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetShutterDevice(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetFocusDevice(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetXYStageDevice(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetAutoFocusDevice(mm: MM_Session, label: *const c_char) -> MM_Status;

    pub fn MM_GetCameraDevice(mm: MM_Session, label: *mut *mut c_char);
    pub fn MM_GetShutterDevice(mm: MM_Session, label: *mut *mut c_char);
    pub fn MM_GetFocusDevice(mm: MM_Session, label: *mut *mut c_char);
    pub fn MM_GetXYStageDevice(mm: MM_Session, label: *mut *mut c_char);
    pub fn MM_GetAutoFocusDevice(mm: MM_Session, label: *mut *mut c_char);

    // Image acquisition settings
    pub fn MM_SetROI(mm: MM_Session, x: c_int, y: c_int, x_size: c_int, y_size: c_int)
        -> MM_Status;
    pub fn MM_GetROI(
        mm: MM_Session,
        x: *mut c_int,
        y: *mut c_int,
        x_size: *mut c_int,
        y_size: *mut c_int,
    ) -> MM_Status;
    pub fn MM_ClearROI(mm: MM_Session) -> MM_Status;

    pub fn MM_SetExposure(mm: MM_Session, exp: f64) -> MM_Status;
    pub fn MM_GetExposure(mm: MM_Session, exp: *mut f64) -> MM_Status;

    pub fn MM_GetImageWidth(mm: MM_Session, width: *mut u16);
    pub fn MM_GetImageHeight(mm: MM_Session, height: *mut u16);
    pub fn MM_GetBytesPerPixel(mm: MM_Session, bytes: *mut u8);
    pub fn MM_GetImageBitDepth(mm: MM_Session, bit_depth: *mut u8);
    pub fn MM_GetNumberOfComponents(mm: MM_Session, n_components: *mut u8);
    pub fn MM_GetNumberOfCameraChannels(mm: MM_Session, n_channels: *mut u8);
    pub fn MM_GetImageBufferSize(mm: MM_Session, len: *mut u32);

    // Image acquisition
    pub fn MM_SnapImage(mm: MM_Session) -> MM_Status;
    pub fn MM_GetImage(mm: MM_Session, ptr_buffer: *mut *mut u8) -> MM_Status;
    pub fn MM_GetImageOfChannel(mm: MM_Session, channel: u16, ptr_buffer: *mut *mut u8)
        -> MM_Status;

    // Image sequence acquisition
    pub fn MM_StartSequenceAcquisition(
        mm: MM_Session,
        num_images: i16,
        interval_ms: f64,
        stop_on_overflow: u8,
    ) -> MM_Status;
    pub fn MM_StartContinuousSequenceAcquisition(mm: MM_Session, interval_ms: f64) -> MM_Status;
    pub fn MM_StopSequenceAcquisition(mm: MM_Session) -> MM_Status;
    pub fn MM_IsSequenceRunning(mm: MM_Session, status: *mut u8);

    // Image circular buffer
    pub fn MM_GetLastImage(mm: MM_Session, ptr_buffer: *mut *mut u8) -> MM_Status;
    pub fn MM_PopNextImage(mm: MM_Session, ptr_buffer: *mut *mut u8) -> MM_Status;

    pub fn MM_GetRemainingImageCount(mm: MM_Session, count: *mut i16);
    pub fn MM_GetBufferTotalCapacity(mm: MM_Session, capacity: *mut i16);
    pub fn MM_GetBufferFreeCapacity(mm: MM_Session, capacity: *mut i16);
    pub fn MM_IsBufferOverflowed(mm: MM_Session, overflowed: *mut u8);

    pub fn MM_SetCircularBufferMemoryFootprint(mm: MM_Session, size_MB: u32) -> MM_Status;
    pub fn MM_GetCircularBufferMemoryFootprint(mm: MM_Session, size_MB: *mut u32);
    pub fn MM_InitializeCircularBuffer(mm: MM_Session) -> MM_Status;
    pub fn MM_ClearCircularBuffer(mm: MM_Session) -> MM_Status;

    // Shutter control
    pub fn MM_SetShutterOpen(mm: MM_Session, label: *const c_char, is_open: u8) -> MM_Status;
    /// Reads the shutter state. The symbol is spelled this way in the library.
    pub fn MM_GetShutteOpenr(mm: MM_Session, label: *const c_char, is_open: *mut u8)
        -> MM_Status;

    // Autofocus control
    pub fn MM_GetLastFocusScore(mm: MM_Session, score: *mut f64);
    pub fn MM_GetCurrentFocusScore(mm: MM_Session, score: *mut f64);
    pub fn MM_EnableContinuousFocus(mm: MM_Session) -> MM_Status;
    pub fn MM_DisableContinuousFocus(mm: MM_Session) -> MM_Status;
    pub fn MM_IsContinuousFocusEnabled(mm: MM_Session, status: *mut u8) -> MM_Status;
    pub fn MM_IsContinuousFocusLocked(mm: MM_Session, status: *mut u8) -> MM_Status;
    pub fn MM_IsContinuousFocusDrive(
        mm: MM_Session,
        label: *const c_char,
        is_continuous_focus_drive: *mut u8,
    ) -> MM_Status;
    pub fn MM_FullFocus(mm: MM_Session) -> MM_Status;
    pub fn MM_IncrementalFocus(mm: MM_Session) -> MM_Status;
    pub fn MM_SetAutoFocusOffset(mm: MM_Session, offset: f64) -> MM_Status;
    pub fn MM_GetAutoFocusOffset(mm: MM_Session, offset: *mut f64) -> MM_Status;

    // State device control
    pub fn MM_SetState(mm: MM_Session, label: *const c_char, state: i32) -> MM_Status;
    pub fn MM_GetState(mm: MM_Session, label: *const c_char, state: *mut i32) -> MM_Status;
    pub fn MM_GetNumberOfStates(mm: MM_Session, label: *const c_char, state: *mut i32)
        -> MM_Status;
    pub fn MM_SetStateLabel(
        mm: MM_Session,
        label: *const c_char,
        state_label: *const c_char,
    ) -> MM_Status;
    pub fn MM_GetStateLabel(
        mm: MM_Session,
        label: *const c_char,
        state_label: *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_DefineStateLabel(
        mm: MM_Session,
        label: *const c_char,
        state: i32,
        state_label: *const c_char,
    ) -> MM_Status;
    pub fn MM_GetStateLabels(
        mm: MM_Session,
        label: *const c_char,
        state_labels: *mut *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_GetStateFromLabel(
        mm: MM_Session,
        label: *const c_char,
        state_label: *const c_char,
        state: *mut i32,
    ) -> MM_Status;

    // Focus (Z) stage control
    pub fn MM_SetPosition(mm: MM_Session, label: *const c_char, position: f64) -> MM_Status;
    pub fn MM_GetPosition(mm: MM_Session, label: *const c_char, position: *mut f64)
        -> MM_Status;
    pub fn MM_SetRelativePosition(mm: MM_Session, label: *const c_char, delta: f64)
        -> MM_Status;
    pub fn MM_SetOrigin(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetAdapterOrigin(mm: MM_Session, label: *const c_char, new_z_um: f64)
        -> MM_Status;
    pub fn MM_SetFocusDirection(mm: MM_Session, label: *const c_char, sign: i8) -> MM_Status;
    pub fn MM_GetFocusDirection(mm: MM_Session, label: *const c_char, sign: *mut i8)
        -> MM_Status;

    // XY stage control
    pub fn MM_SetXYPosition(mm: MM_Session, label: *const c_char, x: f64, y: f64) -> MM_Status;
    pub fn MM_SetRelativeXYPosition(
        mm: MM_Session,
        label: *const c_char,
        dx: f64,
        dy: f64,
    ) -> MM_Status;
    pub fn MM_GetXYPosition(mm: MM_Session, label: *const c_char, x: *mut f64, y: *mut f64)
        -> MM_Status;
    pub fn MM_GetXPosition(mm: MM_Session, label: *const c_char, x: *mut f64) -> MM_Status;
    pub fn MM_GetYPosition(mm: MM_Session, label: *const c_char, y: *mut f64) -> MM_Status;

    pub fn MM_Stop(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_Home(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetOriginXY(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetOriginX(mm: MM_Session, label: *const c_char) -> MM_Status;
    pub fn MM_SetOriginY(mm: MM_Session, label: *const c_char) -> MM_Status;
    /// Sets the adapter origin of an XY stage. The symbol is spelled this way
    /// in the library.
    pub fn MM_SetAdpaterOriginXY(
        mm: MM_Session,
        label: *const c_char,
        new_x_um: f64,
        new_y_um: f64,
    ) -> MM_Status;

    // Hub and peripheral devices
    pub fn MM_SetParentLabel(
        mm: MM_Session,
        label: *const c_char,
        parent_label: *const c_char,
    ) -> MM_Status;
    pub fn MM_GetParentLabel(
        mm: MM_Session,
        label: *const c_char,
        parent_label: *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_GetInstalledDevices(
        mm: MM_Session,
        hub_label: *const c_char,
        names: *mut *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_GetInstalledDeviceDescription(
        mm: MM_Session,
        hub_label: *const c_char,
        name: *const c_char,
        descriptions: *mut *mut c_char,
    ) -> MM_Status;
    pub fn MM_GetLoadedPeripheralDevices(
        mm: MM_Session,
        hub_label: *const c_char,
        labels: *mut *mut *mut c_char,
    ) -> MM_Status;

    // Miscellaneous
    pub fn MM_GetUserId(mm: MM_Session, userid: *mut *mut c_char);
    pub fn MM_GetHostName(mm: MM_Session, hostname: *mut *mut c_char);
    pub fn MM_GetMACAddresses(mm: MM_Session, addresses: *mut *mut *mut c_char);
}
