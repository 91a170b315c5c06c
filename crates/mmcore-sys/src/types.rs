//! Types and constants shared by the linked library and the simulated core.

use std::os::raw::{c_char, c_int, c_void};

/// Opaque handle to a `CMMCore` instance.
pub type MM_Session = *mut c_void;

/// Status code returned by most `MM_*` functions (C enum, `int` sized).
pub type MM_Status = c_int;

pub const MM_ErrOK: MM_Status = 0;
pub const MM_ErrGENERIC: MM_Status = 1;
pub const MM_ErrNoDevice: MM_Status = 2;
pub const MM_ErrSetPropertyFailed: MM_Status = 3;
pub const MM_ErrLibraryFunctionNotFound: MM_Status = 4;
pub const MM_ErrModuleVersionMismatch: MM_Status = 5;
pub const MM_ErrDeviceVersionMismatch: MM_Status = 6;
pub const MM_ErrUnknownModule: MM_Status = 7;
pub const MM_ErrLoadLibraryFailed: MM_Status = 8;
pub const MM_ErrCreateFailed: MM_Status = 9;
pub const MM_ErrCreateNotFound: MM_Status = 10;
pub const MM_ErrDeleteNotFound: MM_Status = 11;
pub const MM_ErrDeleteFailed: MM_Status = 12;
pub const MM_ErrUnexpectedDevice: MM_Status = 13;
pub const MM_ErrDeviceUnloadFailed: MM_Status = 14;
pub const MM_ErrCameraNotAvailable: MM_Status = 15;
pub const MM_ErrDuplicateLabel: MM_Status = 16;
pub const MM_ErrInvalidLabel: MM_Status = 17;
pub const MM_ErrInvalidStateDevice: MM_Status = 19;
pub const MM_ErrNoConfiguration: MM_Status = 20;
pub const MM_ErrInvalidConfigurationIndex: MM_Status = 21;
pub const MM_ErrDEVICE_GENERIC: MM_Status = 22;
pub const MM_ErrInvalidPropertyBlock: MM_Status = 23;
pub const MM_ErrUnhandledException: MM_Status = 24;
pub const MM_ErrDevicePollingTimeout: MM_Status = 25;
pub const MM_ErrInvalidShutterDevice: MM_Status = 26;
pub const MM_ErrInvalidSerialDevice: MM_Status = 27;
pub const MM_ErrInvalidStageDevice: MM_Status = 28;
pub const MM_ErrInvalidSpecificDevice: MM_Status = 29;
pub const MM_ErrInvalidXYStageDevice: MM_Status = 30;
pub const MM_ErrFileOpenFailed: MM_Status = 31;
pub const MM_ErrInvalidCFGEntry: MM_Status = 32;
pub const MM_ErrInvalidContents: MM_Status = 33;
pub const MM_ErrInvalidCoreProperty: MM_Status = 34;
pub const MM_ErrInvalidCoreValue: MM_Status = 35;
pub const MM_ErrNoConfigGroup: MM_Status = 36;
pub const MM_ErrCameraBufferReadFailed: MM_Status = 37;
pub const MM_ErrDuplicateConfigGroup: MM_Status = 38;
pub const MM_ErrInvalidConfigurationFile: MM_Status = 39;
pub const MM_ErrCircularBufferFailedToInitialize: MM_Status = 40;
pub const MM_ErrCircularBufferEmpty: MM_Status = 41;
pub const MM_ErrContFocusNotAvailable: MM_Status = 42;
pub const MM_ErrAutoFocusNotAvailable: MM_Status = 43;
pub const MM_ErrBadConfigName: MM_Status = 44;
pub const MM_ErrCircularBufferIncompatibleImage: MM_Status = 45;
pub const MM_ErrNotAllowedDuringSequenceAcquisition: MM_Status = 46;
pub const MM_ErrOutOfMemory: MM_Status = 47;
pub const MM_ErrInvalidImageSequence: MM_Status = 48;
pub const MM_ErrNullPointerException: MM_Status = 49;
pub const MM_ErrCreatePeripheralFailed: MM_Status = 50;
pub const MM_ErrPropertyNotInCache: MM_Status = 51;
pub const MM_ErrBadAffineTransform: MM_Status = 52;

/// Device type tag (C enum, `int` sized).
pub type MM_DeviceType = c_int;

pub const MM_UnknownType: MM_DeviceType = 0;
pub const MM_AnyType: MM_DeviceType = 1;
pub const MM_CameraDevice: MM_DeviceType = 2;
pub const MM_ShutterDevice: MM_DeviceType = 3;
pub const MM_StateDevice: MM_DeviceType = 4;
pub const MM_StageDevice: MM_DeviceType = 5;
pub const MM_XYStageDevice: MM_DeviceType = 6;
pub const MM_SerialDevice: MM_DeviceType = 7;
pub const MM_GenericDevice: MM_DeviceType = 8;
pub const MM_AutoFocusDevice: MM_DeviceType = 9;
pub const MM_CoreDevice: MM_DeviceType = 10;
pub const MM_ImageProcessorDevice: MM_DeviceType = 11;
pub const MM_SignalIODevice: MM_DeviceType = 12;
pub const MM_MagnifierDevice: MM_DeviceType = 13;
pub const MM_SLMDevice: MM_DeviceType = 14;
pub const MM_HubDevice: MM_DeviceType = 15;
pub const MM_GalvoDevice: MM_DeviceType = 16;

/// Property value type tag (C enum, `int` sized).
pub type MM_PropertyType = c_int;

pub const MM_Undef: MM_PropertyType = 0;
pub const MM_String: MM_PropertyType = 1;
pub const MM_Float: MM_PropertyType = 2;
pub const MM_Integer: MM_PropertyType = 3;

/// Property-changed notification: `(session, device label, property, value)`.
pub type MM_OnPropertyChanged = unsafe extern "C" fn(
    mm: MM_Session,
    label: *const c_char,
    property: *const c_char,
    value: *const c_char,
);

/// Stage-position-changed notification: `(session, device label, position)`.
pub type MM_OnStagePositionChanged =
    unsafe extern "C" fn(mm: MM_Session, label: *const c_char, pos: f64);

/// Callback table handed to `MM_RegisterCallback`.
///
/// The core keeps the pointer for the lifetime of the session, so the table
/// must outlive it (in practice: a `static`). Unset entries are skipped.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct MM_EventCallback {
    pub onPropertyChanged: Option<MM_OnPropertyChanged>,
    pub onStagePositionChanged: Option<MM_OnStagePositionChanged>,
}
