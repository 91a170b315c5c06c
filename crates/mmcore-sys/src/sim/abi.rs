//! `MM_*` entry points of the simulated core.
//!
//! Signatures match `ffi.rs` one for one. A NULL session makes status
//! functions return `MM_ErrNullPointerException` and void functions return
//! without touching their outputs.

use std::os::raw::{c_char, c_int, c_void};

use super::camera::Geometry;
use super::engine::{CoreState, Role};
use super::{
    alloc_list, alloc_string, alloc_types, arg, enter, free_list, put, status, Acquisition,
    SimCore,
};
use crate::types::*;

pub const VERSION_INFO: &str = "MMCore version 10.2.0";
pub const API_VERSION_INFO: &str = "Device API version 70, Module API version 10";

macro_rules! session {
    ($mm:expr, $entry:literal) => {
        match enter($mm, $entry) {
            Some(core) => core,
            None => return MM_ErrNullPointerException,
        }
    };
    ($mm:expr, $entry:literal, void) => {
        match enter($mm, $entry) {
            Some(core) => core,
            None => return,
        }
    };
}

unsafe fn put_string(out: *mut *mut c_char, value: &str) {
    if !out.is_null() {
        *out = alloc_string(value);
    }
}

unsafe fn put_list<S: AsRef<str>>(out: *mut *mut *mut c_char, items: &[S]) {
    if !out.is_null() {
        *out = alloc_list(items);
    }
}

/// Run a list-producing operation and write the list on success.
unsafe fn list_op(
    core: &SimCore,
    mm: MM_Session,
    out: *mut *mut *mut c_char,
    f: impl FnOnce(&mut CoreState) -> Result<Vec<String>, MM_Status>,
) -> MM_Status {
    match core.with_state(mm, f) {
        Ok(items) => {
            put_list(out, &items);
            MM_ErrOK
        }
        Err(code) => {
            put(out, std::ptr::null_mut());
            code
        }
    }
}

/// Run a value-producing operation and write the value on success.
unsafe fn value_op<T>(
    core: &SimCore,
    mm: MM_Session,
    out: *mut T,
    f: impl FnOnce(&mut CoreState) -> Result<T, MM_Status>,
) -> MM_Status {
    match core.with_state(mm, f) {
        Ok(value) => {
            put(out, value);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

unsafe fn flag_op(
    core: &SimCore,
    mm: MM_Session,
    out: *mut u8,
    f: impl FnOnce(&mut CoreState) -> Result<bool, MM_Status>,
) -> MM_Status {
    value_op(core, mm, out, |s| f(s).map(u8::from))
}

unsafe fn image_op(
    core: &SimCore,
    mm: MM_Session,
    out: *mut *mut u8,
    f: impl FnOnce(&mut CoreState) -> Result<*mut u8, MM_Status>,
) -> MM_Status {
    match core.with_state(mm, f) {
        Ok(ptr) => {
            put(out, ptr);
            MM_ErrOK
        }
        Err(code) => {
            put(out, std::ptr::null_mut());
            code
        }
    }
}

// --- Session ---

pub unsafe extern "C" fn MM_Open(mm: *mut MM_Session) {
    if mm.is_null() {
        return;
    }
    let core = Box::into_raw(Box::new(SimCore::new())) as MM_Session;
    *mm = core;
    enter(core, "MM_Open");
}

pub unsafe extern "C" fn MM_Close(mm: MM_Session) {
    if mm.is_null() {
        return;
    }
    drop(Box::from_raw(mm as *mut SimCore));
}

pub unsafe extern "C" fn MM_GetVersionInfo(mm: MM_Session, info: *mut *mut c_char) {
    session!(mm, "MM_GetVersionInfo", void);
    put_string(info, VERSION_INFO);
}

pub unsafe extern "C" fn MM_GetAPIVersionInfo(mm: MM_Session, info: *mut *mut c_char) {
    session!(mm, "MM_GetAPIVersionInfo", void);
    put_string(info, API_VERSION_INFO);
}

pub unsafe extern "C" fn MM_StringFree(str_: *mut c_char) {
    if !str_.is_null() {
        libc::free(str_ as *mut libc::c_void);
    }
}

pub unsafe extern "C" fn MM_StringListFree(str_list: *mut *mut c_char) {
    free_list(str_list);
}

pub unsafe extern "C" fn MM_Free(ptr: *mut c_void) {
    if !ptr.is_null() {
        libc::free(ptr as *mut libc::c_void);
    }
}

pub unsafe extern "C" fn MM_RegisterCallback(mm: MM_Session, callback: *mut MM_EventCallback) {
    let core = session!(mm, "MM_RegisterCallback", void);
    core.register_callback(callback.as_ref().copied());
}

// --- Device initialization and setup ---

pub unsafe extern "C" fn MM_LoadDevice(
    mm: MM_Session,
    label: *const c_char,
    module_name: *const c_char,
    device_name: *const c_char,
) -> MM_Status {
    let core = session!(mm, "MM_LoadDevice");
    let (label, module, device) = (arg(label), arg(module_name), arg(device_name));
    status(core.with_state(mm, |s| s.load_device(&label, &module, &device)))
}

pub unsafe extern "C" fn MM_UnloadDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_UnloadDevice");
    let label = arg(label);
    let is_camera = core.with_state(mm, |s| s.roles.camera == label);
    if is_camera {
        core.stop_acquisition();
    }
    status(core.with_state(mm, |s| s.unload_device(&label)))
}

pub unsafe extern "C" fn MM_UnloadAllDevices(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_UnloadAllDevices");
    core.stop_acquisition();
    core.with_state(mm, CoreState::unload_all);
    MM_ErrOK
}

pub unsafe extern "C" fn MM_InitializeAllDevices(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_InitializeAllDevices");
    core.with_state(mm, CoreState::initialize_all);
    MM_ErrOK
}

pub unsafe extern "C" fn MM_InitializeDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_InitializeDevice");
    let label = arg(label);
    status(core.with_state(mm, |s| s.initialize_device(&label)))
}

pub unsafe extern "C" fn MM_Reset(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_Reset");
    core.stop_acquisition();
    core.with_state(mm, CoreState::reset);
    MM_ErrOK
}

// --- Device listing ---

pub unsafe extern "C" fn MM_SetDeviceAdapterSearchPaths(mm: MM_Session, paths: *mut *const c_char) {
    let core = session!(mm, "MM_SetDeviceAdapterSearchPaths", void);
    let mut collected = Vec::new();
    if !paths.is_null() {
        let mut i = 0;
        loop {
            let path = *paths.add(i);
            if path.is_null() {
                break;
            }
            collected.push(arg(path));
            i += 1;
        }
    }
    core.with_state(mm, |s| s.search_paths = collected);
}

pub unsafe extern "C" fn MM_GetDeviceAdapterSearchPaths(mm: MM_Session, paths: *mut *mut *mut c_char) {
    let core = session!(mm, "MM_GetDeviceAdapterSearchPaths", void);
    let collected = core.with_state(mm, |s| s.search_paths.clone());
    put_list(paths, &collected);
}

pub unsafe extern "C" fn MM_GetDeviceAdapterNames(mm: MM_Session, names: *mut *mut *mut c_char) -> MM_Status {
    session!(mm, "MM_GetDeviceAdapterNames");
    put_list(names, &[super::devices::MODULE]);
    MM_ErrOK
}

pub unsafe extern "C" fn MM_GetAvailableDevices(
    mm: MM_Session,
    library: *const c_char,
    names: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetAvailableDevices");
    let library = arg(library);
    list_op(core, mm, names, |s| s.available_devices(&library))
}

pub unsafe extern "C" fn MM_GetAvailableDeviceDescriptions(
    mm: MM_Session,
    library: *const c_char,
    descriptions: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetAvailableDeviceDescriptions");
    let library = arg(library);
    list_op(core, mm, descriptions, |s| s.available_descriptions(&library))
}

pub unsafe extern "C" fn MM_GetAvailableDeviceTypes(
    mm: MM_Session,
    library: *const c_char,
    types: *mut *mut MM_DeviceType,
    len_types: *mut usize,
) -> MM_Status {
    let core = session!(mm, "MM_GetAvailableDeviceTypes");
    let library = arg(library);
    match core.with_state(mm, |s| s.available_types(&library)) {
        Ok(found) => {
            if !types.is_null() {
                *types = alloc_types(&found);
            }
            put(len_types, found.len());
            MM_ErrOK
        }
        Err(code) => {
            put(types, std::ptr::null_mut());
            put(len_types, 0);
            code
        }
    }
}

// --- Generic device control ---

pub unsafe extern "C" fn MM_GetDevicePropertyNames(
    mm: MM_Session,
    label: *const c_char,
    names: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetDevicePropertyNames");
    let label = arg(label);
    list_op(core, mm, names, |s| s.property_names(&label))
}

pub unsafe extern "C" fn MM_HasProperty(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    has_property: *mut u8,
) -> MM_Status {
    let core = session!(mm, "MM_HasProperty");
    let (label, name) = (arg(label), arg(prop_name));
    flag_op(core, mm, has_property, |s| s.has_property(&label, &name))
}

pub unsafe extern "C" fn MM_GetProperty(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetProperty");
    let (label, name) = (arg(label), arg(prop_name));
    match core.with_state(mm, |s| s.property(&label, &name).map(|p| p.value.clone())) {
        Ok(v) => {
            put_string(value, &v);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

unsafe fn set_property(
    core: &SimCore,
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: String,
) -> MM_Status {
    let (label, name) = (arg(label), arg(prop_name));
    status(core.with_state(mm, |s| s.set_property(&label, &name, &value)))
}

pub unsafe extern "C" fn MM_SetPropertyString(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: *const c_char,
) -> MM_Status {
    let core = session!(mm, "MM_SetPropertyString");
    set_property(core, mm, label, prop_name, arg(value))
}

pub unsafe extern "C" fn MM_SetPropertyBool(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: u8,
) -> MM_Status {
    let core = session!(mm, "MM_SetPropertyBool");
    let value = if value != 0 { "1" } else { "0" };
    set_property(core, mm, label, prop_name, value.to_string())
}

pub unsafe extern "C" fn MM_SetPropertyInt(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: i32,
) -> MM_Status {
    let core = session!(mm, "MM_SetPropertyInt");
    set_property(core, mm, label, prop_name, value.to_string())
}

pub unsafe extern "C" fn MM_SetPropertyFloat(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: f32,
) -> MM_Status {
    let core = session!(mm, "MM_SetPropertyFloat");
    set_property(core, mm, label, prop_name, format!("{:.4}", value))
}

pub unsafe extern "C" fn MM_SetPropertyDouble(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    value: f64,
) -> MM_Status {
    let core = session!(mm, "MM_SetPropertyDouble");
    set_property(core, mm, label, prop_name, format!("{:.4}", value))
}

pub unsafe extern "C" fn MM_GetAllowedPropertyValues(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    values: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetAllowedPropertyValues");
    let (label, name) = (arg(label), arg(prop_name));
    list_op(core, mm, values, |s| s.property(&label, &name).map(|p| p.allowed.clone()))
}

pub unsafe extern "C" fn MM_IsPropertyReadOnly(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    read_only: *mut u8,
) -> MM_Status {
    let core = session!(mm, "MM_IsPropertyReadOnly");
    let (label, name) = (arg(label), arg(prop_name));
    flag_op(core, mm, read_only, |s| s.property(&label, &name).map(|p| p.read_only))
}

pub unsafe extern "C" fn MM_IsPropertyPreInit(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    pre_init: *mut u8,
) -> MM_Status {
    let core = session!(mm, "MM_IsPropertyPreInit");
    let (label, name) = (arg(label), arg(prop_name));
    flag_op(core, mm, pre_init, |s| s.property(&label, &name).map(|p| p.pre_init))
}

pub unsafe extern "C" fn MM_IsPropertySequenceable(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    sequenceable: *mut u8,
) -> MM_Status {
    let core = session!(mm, "MM_IsPropertySequenceable");
    let (label, name) = (arg(label), arg(prop_name));
    flag_op(core, mm, sequenceable, |s| s.property(&label, &name).map(|p| p.sequenceable))
}

pub unsafe extern "C" fn MM_HasPropertyLimits(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    has_limits: *mut u8,
) -> MM_Status {
    let core = session!(mm, "MM_HasPropertyLimits");
    let (label, name) = (arg(label), arg(prop_name));
    flag_op(core, mm, has_limits, |s| s.property(&label, &name).map(|p| p.limits.is_some()))
}

pub unsafe extern "C" fn MM_GetPropertyLowerLimit(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    lower_limit: *mut f64,
) -> MM_Status {
    let core = session!(mm, "MM_GetPropertyLowerLimit");
    let (label, name) = (arg(label), arg(prop_name));
    value_op(core, mm, lower_limit, |s| {
        s.property(&label, &name).map(|p| p.limits.map(|(low, _)| low).unwrap_or(0.0))
    })
}

pub unsafe extern "C" fn MM_GetPropertyUpperLimit(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    upper_limit: *mut f64,
) -> MM_Status {
    let core = session!(mm, "MM_GetPropertyUpperLimit");
    let (label, name) = (arg(label), arg(prop_name));
    value_op(core, mm, upper_limit, |s| {
        s.property(&label, &name).map(|p| p.limits.map(|(_, high)| high).unwrap_or(0.0))
    })
}

pub unsafe extern "C" fn MM_GetPropertyType(
    mm: MM_Session,
    label: *const c_char,
    prop_name: *const c_char,
    type_: *mut MM_PropertyType,
) -> MM_Status {
    let core = session!(mm, "MM_GetPropertyType");
    let (label, name) = (arg(label), arg(prop_name));
    value_op(core, mm, type_, |s| s.property(&label, &name).map(|p| p.kind))
}

pub unsafe extern "C" fn MM_DeviceBusy(mm: MM_Session, label: *const c_char, busy: *mut u8) -> MM_Status {
    let core = session!(mm, "MM_DeviceBusy");
    let label = arg(label);
    flag_op(core, mm, busy, |s| s.busy(&label))
}

pub unsafe extern "C" fn MM_DeviceTypeBusy(mm: MM_Session, type_: MM_DeviceType, busy: *mut u8) -> MM_Status {
    session!(mm, "MM_DeviceTypeBusy");
    if !(MM_UnknownType..=MM_GalvoDevice).contains(&type_) {
        return MM_ErrGENERIC;
    }
    put(busy, 0);
    MM_ErrOK
}

// --- Manage current devices ---

unsafe fn set_role(core: &SimCore, mm: MM_Session, role: Role, label: *const c_char) -> MM_Status {
    let label = arg(label);
    if role == Role::Camera && core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    status(core.with_state(mm, |s| s.set_role(role, &label)))
}

unsafe fn get_role(core: &SimCore, mm: MM_Session, role: Role, out: *mut *mut c_char) {
    let label = core.with_state(mm, |s| s.role(role).to_string());
    put_string(out, &label);
}

pub unsafe extern "C" fn MM_SetCameraDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetCameraDevice");
    set_role(core, mm, Role::Camera, label)
}

pub unsafe extern "C" fn MM_SetShutterDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetShutterDevice");
    set_role(core, mm, Role::Shutter, label)
}

pub unsafe extern "C" fn MM_SetFocusDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetFocusDevice");
    set_role(core, mm, Role::Focus, label)
}

pub unsafe extern "C" fn MM_SetXYStageDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetXYStageDevice");
    set_role(core, mm, Role::XYStage, label)
}

pub unsafe extern "C" fn MM_SetAutoFocusDevice(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetAutoFocusDevice");
    set_role(core, mm, Role::AutoFocus, label)
}

pub unsafe extern "C" fn MM_GetCameraDevice(mm: MM_Session, label: *mut *mut c_char) {
    let core = session!(mm, "MM_GetCameraDevice", void);
    get_role(core, mm, Role::Camera, label)
}

pub unsafe extern "C" fn MM_GetShutterDevice(mm: MM_Session, label: *mut *mut c_char) {
    let core = session!(mm, "MM_GetShutterDevice", void);
    get_role(core, mm, Role::Shutter, label)
}

pub unsafe extern "C" fn MM_GetFocusDevice(mm: MM_Session, label: *mut *mut c_char) {
    let core = session!(mm, "MM_GetFocusDevice", void);
    get_role(core, mm, Role::Focus, label)
}

pub unsafe extern "C" fn MM_GetXYStageDevice(mm: MM_Session, label: *mut *mut c_char) {
    let core = session!(mm, "MM_GetXYStageDevice", void);
    get_role(core, mm, Role::XYStage, label)
}

pub unsafe extern "C" fn MM_GetAutoFocusDevice(mm: MM_Session, label: *mut *mut c_char) {
    let core = session!(mm, "MM_GetAutoFocusDevice", void);
    get_role(core, mm, Role::AutoFocus, label)
}

// --- Image acquisition settings ---

pub unsafe extern "C" fn MM_SetROI(mm: MM_Session, x: c_int, y: c_int, x_size: c_int, y_size: c_int) -> MM_Status {
    let core = session!(mm, "MM_SetROI");
    if core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    status(core.with_state(mm, |s| s.set_roi(x, y, x_size, y_size)))
}

pub unsafe extern "C" fn MM_GetROI(
    mm: MM_Session,
    x: *mut c_int,
    y: *mut c_int,
    x_size: *mut c_int,
    y_size: *mut c_int,
) -> MM_Status {
    let core = session!(mm, "MM_GetROI");
    match core.with_state(mm, |s| s.roi()) {
        Ok(roi) => {
            put(x, roi.x);
            put(y, roi.y);
            put(x_size, roi.width);
            put(y_size, roi.height);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

pub unsafe extern "C" fn MM_ClearROI(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_ClearROI");
    if core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    status(core.with_state(mm, CoreState::clear_roi))
}

pub unsafe extern "C" fn MM_SetExposure(mm: MM_Session, exp: f64) -> MM_Status {
    let core = session!(mm, "MM_SetExposure");
    status(core.with_state(mm, |s| s.set_exposure(exp)))
}

pub unsafe extern "C" fn MM_GetExposure(mm: MM_Session, exp: *mut f64) -> MM_Status {
    let core = session!(mm, "MM_GetExposure");
    value_op(core, mm, exp, |s| s.exposure())
}

/// Geometry of the current camera, or zeros without one.
unsafe fn geometry(core: &SimCore, mm: MM_Session) -> Geometry {
    core.with_state(mm, |s| s.geometry()).unwrap_or(Geometry {
        width: 0,
        height: 0,
        bytes_per_pixel: 0,
        bit_depth: 0,
    })
}

pub unsafe extern "C" fn MM_GetImageWidth(mm: MM_Session, width: *mut u16) {
    let core = session!(mm, "MM_GetImageWidth", void);
    put(width, geometry(core, mm).width.clamp(0, u16::MAX as i32) as u16);
}

pub unsafe extern "C" fn MM_GetImageHeight(mm: MM_Session, height: *mut u16) {
    let core = session!(mm, "MM_GetImageHeight", void);
    put(height, geometry(core, mm).height.clamp(0, u16::MAX as i32) as u16);
}

pub unsafe extern "C" fn MM_GetBytesPerPixel(mm: MM_Session, bytes: *mut u8) {
    let core = session!(mm, "MM_GetBytesPerPixel", void);
    put(bytes, geometry(core, mm).bytes_per_pixel);
}

pub unsafe extern "C" fn MM_GetImageBitDepth(mm: MM_Session, bit_depth: *mut u8) {
    let core = session!(mm, "MM_GetImageBitDepth", void);
    put(bit_depth, geometry(core, mm).bit_depth);
}

pub unsafe extern "C" fn MM_GetNumberOfComponents(mm: MM_Session, n_components: *mut u8) {
    let core = session!(mm, "MM_GetNumberOfComponents", void);
    let has_camera = core.with_state(mm, |s| s.camera().is_ok());
    put(n_components, u8::from(has_camera));
}

pub unsafe extern "C" fn MM_GetNumberOfCameraChannels(mm: MM_Session, n_channels: *mut u8) {
    let core = session!(mm, "MM_GetNumberOfCameraChannels", void);
    let has_camera = core.with_state(mm, |s| s.camera().is_ok());
    put(n_channels, u8::from(has_camera));
}

pub unsafe extern "C" fn MM_GetImageBufferSize(mm: MM_Session, len: *mut u32) {
    let core = session!(mm, "MM_GetImageBufferSize", void);
    put(len, geometry(core, mm).frame_len() as u32);
}

// --- Image acquisition ---

pub unsafe extern "C" fn MM_SnapImage(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_SnapImage");
    if core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    status(core.with_state(mm, CoreState::snap))
}

pub unsafe extern "C" fn MM_GetImage(mm: MM_Session, ptr_buffer: *mut *mut u8) -> MM_Status {
    let core = session!(mm, "MM_GetImage");
    image_op(core, mm, ptr_buffer, CoreState::image)
}

pub unsafe extern "C" fn MM_GetImageOfChannel(mm: MM_Session, channel: u16, ptr_buffer: *mut *mut u8) -> MM_Status {
    let core = session!(mm, "MM_GetImageOfChannel");
    if channel != 0 {
        put(ptr_buffer, std::ptr::null_mut());
        return MM_ErrCameraBufferReadFailed;
    }
    image_op(core, mm, ptr_buffer, CoreState::image)
}

// --- Image sequence acquisition ---

unsafe fn start_sequence(
    core: &SimCore,
    mm: MM_Session,
    count: Option<usize>,
    interval_ms: f64,
    stop_on_overflow: bool,
) -> MM_Status {
    if core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    // Join a sequence that already ran to completion.
    core.stop_acquisition();

    let prepared = core.with_state(mm, |s| -> Result<Geometry, MM_Status> {
        let geometry = s.geometry()?;
        s.camera()?
            .initialized
            .then_some(())
            .ok_or(MM_ErrCameraNotAvailable)?;
        s.initialize_buffer()?;
        Ok(geometry)
    });
    let geometry = match prepared {
        Ok(geometry) => geometry,
        Err(code) => return code,
    };

    let acquisition = Acquisition::start(
        std::sync::Arc::clone(&core.state),
        geometry,
        count,
        interval_ms,
        stop_on_overflow,
    );
    *core.acquisition.lock() = Some(acquisition);
    MM_ErrOK
}

pub unsafe extern "C" fn MM_StartSequenceAcquisition(
    mm: MM_Session,
    num_images: i16,
    interval_ms: f64,
    stop_on_overflow: u8,
) -> MM_Status {
    let core = session!(mm, "MM_StartSequenceAcquisition");
    if num_images <= 0 {
        return MM_ErrInvalidImageSequence;
    }
    start_sequence(core, mm, Some(num_images as usize), interval_ms, stop_on_overflow != 0)
}

pub unsafe extern "C" fn MM_StartContinuousSequenceAcquisition(mm: MM_Session, interval_ms: f64) -> MM_Status {
    let core = session!(mm, "MM_StartContinuousSequenceAcquisition");
    start_sequence(core, mm, None, interval_ms, false)
}

pub unsafe extern "C" fn MM_StopSequenceAcquisition(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_StopSequenceAcquisition");
    core.stop_acquisition();
    MM_ErrOK
}

pub unsafe extern "C" fn MM_IsSequenceRunning(mm: MM_Session, status: *mut u8) {
    let core = session!(mm, "MM_IsSequenceRunning", void);
    put(status, u8::from(core.is_acquiring()));
}

// --- Image circular buffer ---

pub unsafe extern "C" fn MM_GetLastImage(mm: MM_Session, ptr_buffer: *mut *mut u8) -> MM_Status {
    let core = session!(mm, "MM_GetLastImage");
    image_op(core, mm, ptr_buffer, CoreState::last_image)
}

pub unsafe extern "C" fn MM_PopNextImage(mm: MM_Session, ptr_buffer: *mut *mut u8) -> MM_Status {
    let core = session!(mm, "MM_PopNextImage");
    image_op(core, mm, ptr_buffer, CoreState::pop_next)
}

fn clamp_count(n: usize) -> i16 {
    n.min(i16::MAX as usize) as i16
}

pub unsafe extern "C" fn MM_GetRemainingImageCount(mm: MM_Session, count: *mut i16) {
    let core = session!(mm, "MM_GetRemainingImageCount", void);
    put(count, core.with_state(mm, |s| clamp_count(s.buffer.frames.len())));
}

pub unsafe extern "C" fn MM_GetBufferTotalCapacity(mm: MM_Session, capacity: *mut i16) {
    let core = session!(mm, "MM_GetBufferTotalCapacity", void);
    put(capacity, core.with_state(mm, |s| clamp_count(s.buffer.capacity)));
}

pub unsafe extern "C" fn MM_GetBufferFreeCapacity(mm: MM_Session, capacity: *mut i16) {
    let core = session!(mm, "MM_GetBufferFreeCapacity", void);
    put(capacity, core.with_state(mm, |s| clamp_count(s.buffer.free())));
}

pub unsafe extern "C" fn MM_IsBufferOverflowed(mm: MM_Session, overflowed: *mut u8) {
    let core = session!(mm, "MM_IsBufferOverflowed", void);
    put(overflowed, u8::from(core.with_state(mm, |s| s.buffer.overflowed)));
}

pub unsafe extern "C" fn MM_SetCircularBufferMemoryFootprint(mm: MM_Session, size_MB: u32) -> MM_Status {
    let core = session!(mm, "MM_SetCircularBufferMemoryFootprint");
    if core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    status(core.with_state(mm, |s| s.set_footprint(size_MB)))
}

pub unsafe extern "C" fn MM_GetCircularBufferMemoryFootprint(mm: MM_Session, size_MB: *mut u32) {
    let core = session!(mm, "MM_GetCircularBufferMemoryFootprint", void);
    put(size_MB, core.with_state(mm, |s| s.buffer.footprint_mb));
}

pub unsafe extern "C" fn MM_InitializeCircularBuffer(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_InitializeCircularBuffer");
    if core.is_acquiring() {
        return MM_ErrNotAllowedDuringSequenceAcquisition;
    }
    status(core.with_state(mm, CoreState::initialize_buffer))
}

pub unsafe extern "C" fn MM_ClearCircularBuffer(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_ClearCircularBuffer");
    core.with_state(mm, |s| s.buffer.clear());
    MM_ErrOK
}

// --- Shutter control ---

pub unsafe extern "C" fn MM_SetShutterOpen(mm: MM_Session, label: *const c_char, is_open: u8) -> MM_Status {
    let core = session!(mm, "MM_SetShutterOpen");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_shutter_open(&label, is_open != 0)))
}

pub unsafe extern "C" fn MM_GetShutteOpenr(mm: MM_Session, label: *const c_char, is_open: *mut u8) -> MM_Status {
    let core = session!(mm, "MM_GetShutteOpenr");
    let label = arg(label);
    flag_op(core, mm, is_open, |s| s.shutter_open(&label))
}

// --- Autofocus control ---

pub unsafe extern "C" fn MM_GetLastFocusScore(mm: MM_Session, score: *mut f64) {
    let core = session!(mm, "MM_GetLastFocusScore", void);
    put(score, core.with_state(mm, |s| s.focus.last_score));
}

pub unsafe extern "C" fn MM_GetCurrentFocusScore(mm: MM_Session, score: *mut f64) {
    let core = session!(mm, "MM_GetCurrentFocusScore", void);
    put(score, core.with_state(mm, |s| s.current_focus_score()));
}

pub unsafe extern "C" fn MM_EnableContinuousFocus(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_EnableContinuousFocus");
    status(core.with_state(mm, |s| s.set_continuous_focus(true)))
}

pub unsafe extern "C" fn MM_DisableContinuousFocus(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_DisableContinuousFocus");
    status(core.with_state(mm, |s| s.set_continuous_focus(false)))
}

pub unsafe extern "C" fn MM_IsContinuousFocusEnabled(mm: MM_Session, status: *mut u8) -> MM_Status {
    let core = session!(mm, "MM_IsContinuousFocusEnabled");
    flag_op(core, mm, status, |s| s.continuous_focus_enabled())
}

pub unsafe extern "C" fn MM_IsContinuousFocusLocked(mm: MM_Session, status: *mut u8) -> MM_Status {
    let core = session!(mm, "MM_IsContinuousFocusLocked");
    flag_op(core, mm, status, |s| s.continuous_focus_locked())
}

pub unsafe extern "C" fn MM_IsContinuousFocusDrive(
    mm: MM_Session,
    label: *const c_char,
    is_continuous_focus_drive: *mut u8,
) -> MM_Status {
    let core = session!(mm, "MM_IsContinuousFocusDrive");
    let label = arg(label);
    flag_op(core, mm, is_continuous_focus_drive, |s| s.is_continuous_focus_drive(&label))
}

pub unsafe extern "C" fn MM_FullFocus(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_FullFocus");
    status(core.with_state(mm, CoreState::full_focus))
}

pub unsafe extern "C" fn MM_IncrementalFocus(mm: MM_Session) -> MM_Status {
    let core = session!(mm, "MM_IncrementalFocus");
    status(core.with_state(mm, CoreState::incremental_focus))
}

pub unsafe extern "C" fn MM_SetAutoFocusOffset(mm: MM_Session, offset: f64) -> MM_Status {
    let core = session!(mm, "MM_SetAutoFocusOffset");
    status(core.with_state(mm, |s| s.set_auto_focus_offset(offset)))
}

pub unsafe extern "C" fn MM_GetAutoFocusOffset(mm: MM_Session, offset: *mut f64) -> MM_Status {
    let core = session!(mm, "MM_GetAutoFocusOffset");
    value_op(core, mm, offset, |s| s.auto_focus_offset())
}

// --- State device control ---

pub unsafe extern "C" fn MM_SetState(mm: MM_Session, label: *const c_char, state: i32) -> MM_Status {
    let core = session!(mm, "MM_SetState");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_state(&label, state)))
}

pub unsafe extern "C" fn MM_GetState(mm: MM_Session, label: *const c_char, state: *mut i32) -> MM_Status {
    let core = session!(mm, "MM_GetState");
    let label = arg(label);
    value_op(core, mm, state, |s| s.state(&label))
}

pub unsafe extern "C" fn MM_GetNumberOfStates(mm: MM_Session, label: *const c_char, state: *mut i32) -> MM_Status {
    let core = session!(mm, "MM_GetNumberOfStates");
    let label = arg(label);
    value_op(core, mm, state, |s| s.number_of_states(&label))
}

pub unsafe extern "C" fn MM_SetStateLabel(
    mm: MM_Session,
    label: *const c_char,
    state_label: *const c_char,
) -> MM_Status {
    let core = session!(mm, "MM_SetStateLabel");
    let (label, state_label) = (arg(label), arg(state_label));
    status(core.with_state(mm, |s| s.set_state_label(&label, &state_label)))
}

pub unsafe extern "C" fn MM_GetStateLabel(
    mm: MM_Session,
    label: *const c_char,
    state_label: *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetStateLabel");
    let label = arg(label);
    match core.with_state(mm, |s| s.state_label(&label)) {
        Ok(text) => {
            put_string(state_label, &text);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

pub unsafe extern "C" fn MM_DefineStateLabel(
    mm: MM_Session,
    label: *const c_char,
    state: i32,
    state_label: *const c_char,
) -> MM_Status {
    let core = session!(mm, "MM_DefineStateLabel");
    let (label, state_label) = (arg(label), arg(state_label));
    status(core.with_state(mm, |s| s.define_state_label(&label, state, &state_label)))
}

pub unsafe extern "C" fn MM_GetStateLabels(
    mm: MM_Session,
    label: *const c_char,
    state_labels: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetStateLabels");
    let label = arg(label);
    list_op(core, mm, state_labels, |s| s.state_labels(&label))
}

pub unsafe extern "C" fn MM_GetStateFromLabel(
    mm: MM_Session,
    label: *const c_char,
    state_label: *const c_char,
    state: *mut i32,
) -> MM_Status {
    let core = session!(mm, "MM_GetStateFromLabel");
    let (label, state_label) = (arg(label), arg(state_label));
    value_op(core, mm, state, |s| s.state_from_label(&label, &state_label))
}

// --- Focus (Z) stage control ---

pub unsafe extern "C" fn MM_SetPosition(mm: MM_Session, label: *const c_char, position: f64) -> MM_Status {
    let core = session!(mm, "MM_SetPosition");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_position(&label, position)))
}

pub unsafe extern "C" fn MM_GetPosition(mm: MM_Session, label: *const c_char, position: *mut f64) -> MM_Status {
    let core = session!(mm, "MM_GetPosition");
    let label = arg(label);
    value_op(core, mm, position, |s| s.position(&label))
}

pub unsafe extern "C" fn MM_SetRelativePosition(mm: MM_Session, label: *const c_char, delta: f64) -> MM_Status {
    let core = session!(mm, "MM_SetRelativePosition");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_relative_position(&label, delta)))
}

pub unsafe extern "C" fn MM_SetOrigin(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetOrigin");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_origin(&label)))
}

pub unsafe extern "C" fn MM_SetAdapterOrigin(mm: MM_Session, label: *const c_char, new_z_um: f64) -> MM_Status {
    let core = session!(mm, "MM_SetAdapterOrigin");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_adapter_origin(&label, new_z_um)))
}

pub unsafe extern "C" fn MM_SetFocusDirection(mm: MM_Session, label: *const c_char, sign: i8) -> MM_Status {
    let core = session!(mm, "MM_SetFocusDirection");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_focus_direction(&label, sign)))
}

pub unsafe extern "C" fn MM_GetFocusDirection(mm: MM_Session, label: *const c_char, sign: *mut i8) -> MM_Status {
    let core = session!(mm, "MM_GetFocusDirection");
    let label = arg(label);
    value_op(core, mm, sign, |s| s.focus_direction(&label))
}

// --- XY stage control ---

pub unsafe extern "C" fn MM_SetXYPosition(mm: MM_Session, label: *const c_char, x: f64, y: f64) -> MM_Status {
    let core = session!(mm, "MM_SetXYPosition");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_xy_position(&label, x, y)))
}

pub unsafe extern "C" fn MM_SetRelativeXYPosition(
    mm: MM_Session,
    label: *const c_char,
    dx: f64,
    dy: f64,
) -> MM_Status {
    let core = session!(mm, "MM_SetRelativeXYPosition");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_relative_xy_position(&label, dx, dy)))
}

pub unsafe extern "C" fn MM_GetXYPosition(mm: MM_Session, label: *const c_char, x: *mut f64, y: *mut f64) -> MM_Status {
    let core = session!(mm, "MM_GetXYPosition");
    let label = arg(label);
    match core.with_state(mm, |s| s.xy_position(&label)) {
        Ok((px, py)) => {
            put(x, px);
            put(y, py);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

pub unsafe extern "C" fn MM_GetXPosition(mm: MM_Session, label: *const c_char, x: *mut f64) -> MM_Status {
    let core = session!(mm, "MM_GetXPosition");
    let label = arg(label);
    value_op(core, mm, x, |s| s.xy_position(&label).map(|(px, _)| px))
}

pub unsafe extern "C" fn MM_GetYPosition(mm: MM_Session, label: *const c_char, y: *mut f64) -> MM_Status {
    let core = session!(mm, "MM_GetYPosition");
    let label = arg(label);
    value_op(core, mm, y, |s| s.xy_position(&label).map(|(_, py)| py))
}

pub unsafe extern "C" fn MM_Stop(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_Stop");
    let label = arg(label);
    status(core.with_state(mm, |s| s.stop(&label)))
}

pub unsafe extern "C" fn MM_Home(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_Home");
    let label = arg(label);
    status(core.with_state(mm, |s| s.home(&label)))
}

pub unsafe extern "C" fn MM_SetOriginXY(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetOriginXY");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_origin_xy(&label, true, true)))
}

pub unsafe extern "C" fn MM_SetOriginX(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetOriginX");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_origin_xy(&label, true, false)))
}

pub unsafe extern "C" fn MM_SetOriginY(mm: MM_Session, label: *const c_char) -> MM_Status {
    let core = session!(mm, "MM_SetOriginY");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_origin_xy(&label, false, true)))
}

pub unsafe extern "C" fn MM_SetAdpaterOriginXY(
    mm: MM_Session,
    label: *const c_char,
    new_x_um: f64,
    new_y_um: f64,
) -> MM_Status {
    let core = session!(mm, "MM_SetAdpaterOriginXY");
    let label = arg(label);
    status(core.with_state(mm, |s| s.set_adapter_origin_xy(&label, new_x_um, new_y_um)))
}

// --- Hub and peripheral devices ---

pub unsafe extern "C" fn MM_SetParentLabel(
    mm: MM_Session,
    label: *const c_char,
    parent_label: *const c_char,
) -> MM_Status {
    let core = session!(mm, "MM_SetParentLabel");
    let (label, parent) = (arg(label), arg(parent_label));
    status(core.with_state(mm, |s| s.set_parent_label(&label, &parent)))
}

pub unsafe extern "C" fn MM_GetParentLabel(
    mm: MM_Session,
    label: *const c_char,
    parent_label: *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetParentLabel");
    let label = arg(label);
    match core.with_state(mm, |s| s.parent_label(&label)) {
        Ok(parent) => {
            put_string(parent_label, &parent);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

pub unsafe extern "C" fn MM_GetInstalledDevices(
    mm: MM_Session,
    hub_label: *const c_char,
    names: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetInstalledDevices");
    let hub = arg(hub_label);
    list_op(core, mm, names, |s| s.installed_devices(&hub))
}

pub unsafe extern "C" fn MM_GetInstalledDeviceDescription(
    mm: MM_Session,
    hub_label: *const c_char,
    name: *const c_char,
    descriptions: *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetInstalledDeviceDescription");
    let (hub, name) = (arg(hub_label), arg(name));
    match core.with_state(mm, |s| s.installed_description(&hub, &name)) {
        Ok(description) => {
            put_string(descriptions, &description);
            MM_ErrOK
        }
        Err(code) => code,
    }
}

pub unsafe extern "C" fn MM_GetLoadedPeripheralDevices(
    mm: MM_Session,
    hub_label: *const c_char,
    labels: *mut *mut *mut c_char,
) -> MM_Status {
    let core = session!(mm, "MM_GetLoadedPeripheralDevices");
    let hub = arg(hub_label);
    list_op(core, mm, labels, |s| s.loaded_peripherals(&hub))
}

// --- Miscellaneous ---

pub unsafe extern "C" fn MM_GetUserId(mm: MM_Session, userid: *mut *mut c_char) {
    session!(mm, "MM_GetUserId", void);
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "simulator".to_string());
    put_string(userid, &user);
}

pub unsafe extern "C" fn MM_GetHostName(mm: MM_Session, hostname: *mut *mut c_char) {
    session!(mm, "MM_GetHostName", void);
    put_string(hostname, "localhost");
}

pub unsafe extern "C" fn MM_GetMACAddresses(mm: MM_Session, addresses: *mut *mut *mut c_char) {
    session!(mm, "MM_GetMACAddresses", void);
    put_list(addresses, &["00-00-00-00-00-00"]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::take_calls;
    use std::ffi::{CStr, CString};
    use std::ptr;

    fn open() -> MM_Session {
        let mut mm = ptr::null_mut();
        unsafe { MM_Open(&mut mm) };
        assert!(!mm.is_null());
        mm
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn load(mm: MM_Session, label: &str, name: &str) -> MM_Status {
        MM_LoadDevice(mm, c(label).as_ptr(), c("DemoCamera").as_ptr(), c(name).as_ptr())
    }

    #[test]
    fn test_version_string_is_malloced() {
        unsafe {
            let mm = open();
            let mut info = ptr::null_mut();
            MM_GetVersionInfo(mm, &mut info);
            assert_eq!(CStr::from_ptr(info).to_str().unwrap(), VERSION_INFO);
            MM_StringFree(info);
            MM_Close(mm);
        }
    }

    #[test]
    fn test_null_session() {
        unsafe {
            assert_eq!(MM_Reset(ptr::null_mut()), MM_ErrNullPointerException);
            let mut width = 7u16;
            MM_GetImageWidth(ptr::null_mut(), &mut width);
            assert_eq!(width, 7);
        }
    }

    #[test]
    fn test_calls_are_recorded() {
        unsafe {
            let mm = open();
            MM_SetPropertyBool(mm, c("X").as_ptr(), c("Y").as_ptr(), 1);
            MM_SetPropertyDouble(mm, c("X").as_ptr(), c("Y").as_ptr(), 1.0);
            assert_eq!(
                take_calls(mm),
                vec!["MM_Open", "MM_SetPropertyBool", "MM_SetPropertyDouble"]
            );
            assert!(take_calls(mm).is_empty());
            MM_Close(mm);
        }
    }

    #[test]
    fn test_snap_and_get_image() {
        unsafe {
            let mm = open();
            assert_eq!(MM_SnapImage(mm), MM_ErrCameraNotAvailable);

            assert_eq!(load(mm, "Camera", "DCam"), MM_ErrOK);
            assert_eq!(MM_InitializeAllDevices(mm), MM_ErrOK);
            assert_eq!(MM_SetCameraDevice(mm, c("Camera").as_ptr()), MM_ErrOK);

            let mut buf = ptr::null_mut();
            assert_eq!(MM_GetImage(mm, &mut buf), MM_ErrCameraBufferReadFailed);
            assert!(buf.is_null());

            assert_eq!(MM_SnapImage(mm), MM_ErrOK);
            assert_eq!(MM_GetImage(mm, &mut buf), MM_ErrOK);
            assert!(!buf.is_null());

            let mut len = 0u32;
            MM_GetImageBufferSize(mm, &mut len);
            assert_eq!(len, 512 * 512);
            MM_Close(mm);
        }
    }

    #[test]
    fn test_sequence_fills_buffer() {
        unsafe {
            let mm = open();
            load(mm, "Camera", "DCam");
            MM_InitializeAllDevices(mm);
            MM_SetCameraDevice(mm, c("Camera").as_ptr());

            assert_eq!(MM_StartSequenceAcquisition(mm, 3, 0.0, 1), MM_ErrOK);
            let mut running = 1u8;
            for _ in 0..500 {
                MM_IsSequenceRunning(mm, &mut running);
                if running == 0 {
                    break;
                }
                std::thread::sleep(std::time::Duration::from_millis(2));
            }
            assert_eq!(running, 0);

            let mut count = 0i16;
            MM_GetRemainingImageCount(mm, &mut count);
            assert_eq!(count, 3);

            let mut buf = ptr::null_mut();
            assert_eq!(MM_PopNextImage(mm, &mut buf), MM_ErrOK);
            assert!(!buf.is_null());
            MM_ClearCircularBuffer(mm);
            assert_eq!(MM_PopNextImage(mm, &mut buf), MM_ErrCircularBufferEmpty);
            assert!(buf.is_null());
            MM_Close(mm);
        }
    }

    extern "C" fn count_property(_: MM_Session, _: *const c_char, _: *const c_char, _: *const c_char) {
        PROPERTY_EVENTS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    static PROPERTY_EVENTS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    #[test]
    fn test_callbacks_fire_for_initialized_devices() {
        unsafe {
            let mm = open();
            let mut table = MM_EventCallback {
                onPropertyChanged: Some(count_property),
                onStagePositionChanged: None,
            };
            MM_RegisterCallback(mm, &mut table);

            load(mm, "Shutter", "DShutter");
            MM_InitializeDevice(mm, c("Shutter").as_ptr());
            let before = PROPERTY_EVENTS.load(std::sync::atomic::Ordering::SeqCst);
            assert_eq!(MM_SetShutterOpen(mm, c("Shutter").as_ptr(), 1), MM_ErrOK);
            assert_eq!(PROPERTY_EVENTS.load(std::sync::atomic::Ordering::SeqCst), before + 1);

            let mut open = 0u8;
            MM_GetShutteOpenr(mm, c("Shutter").as_ptr(), &mut open);
            assert_eq!(open, 1);
            MM_Close(mm);
        }
    }
}
