//! Error types for core operations.
//!
//! Every fallible call into the core returns an `MM_Status`. Zero is success;
//! anything else is mapped to a [`CoreError`] carrying the core's fixed
//! description. Codes the table does not know are kept as
//! [`CoreError::Unknown`] so nothing is lost.

use mmcore_sys as sys;
use thiserror::Error;

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-zero status code returned by the core.
///
/// The `Display` text of each kind is the core's own description, so errors
/// read the same whatever language binding reported them.
#[allow(missing_docs)]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CoreError {
    #[error("generic (unspecified) error")]
    Generic,
    #[error("no device")]
    NoDevice,
    #[error("set property failed")]
    SetPropertyFailed,
    #[error("library function not found")]
    LibraryFunctionNotFound,
    #[error("module version mismatch")]
    ModuleVersionMismatch,
    #[error("device version mismatch")]
    DeviceVersionMismatch,
    #[error("unknown module")]
    UnknownModule,
    #[error("load library failed")]
    LoadLibraryFailed,
    #[error("create failed")]
    CreateFailed,
    #[error("create not found")]
    CreateNotFound,
    #[error("delete not found")]
    DeleteNotFound,
    #[error("delete failed")]
    DeleteFailed,
    #[error("unexpected device")]
    UnexpectedDevice,
    #[error("device unload failed")]
    DeviceUnloadFailed,
    #[error("camera not available")]
    CameraNotAvailable,
    #[error("duplicated label")]
    DuplicateLabel,
    #[error("invalid label")]
    InvalidLabel,
    #[error("invalid state device")]
    InvalidStateDevice,
    #[error("no configuration")]
    NoConfiguration,
    #[error("invalid configuration index")]
    InvalidConfigurationIndex,
    #[error("device generic (unspecified) error")]
    DeviceGeneric,
    #[error("invalid property block")]
    InvalidPropertyBlock,
    #[error("unhandled exception")]
    UnhandledException,
    #[error("device polling timeout")]
    DevicePollingTimeout,
    #[error("invalid shutter device")]
    InvalidShutterDevice,
    #[error("invalid serial device")]
    InvalidSerialDevice,
    #[error("invalid stage device")]
    InvalidStageDevice,
    #[error("invalid specific device")]
    InvalidSpecificDevice,
    #[error("invalid XY stage device")]
    InvalidXYStageDevice,
    #[error("file open failed")]
    FileOpenFailed,
    #[error("invalid CFG entry")]
    InvalidCfgEntry,
    #[error("invalid contents")]
    InvalidContents,
    #[error("invalid core property")]
    InvalidCoreProperty,
    #[error("invalid core value")]
    InvalidCoreValue,
    #[error("no config group")]
    NoConfigGroup,
    #[error("camera buffer read failed")]
    CameraBufferReadFailed,
    #[error("duplicated config group")]
    DuplicateConfigGroup,
    #[error("invalid configuration file")]
    InvalidConfigurationFile,
    #[error("circular buffer failed to initialize")]
    CircularBufferFailedToInitialize,
    #[error("circular buffer empty")]
    CircularBufferEmpty,
    #[error("continuous focus not available")]
    ContFocusNotAvailable,
    #[error("auto focus not available")]
    AutoFocusNotAvailable,
    #[error("bad config name")]
    BadConfigName,
    #[error("circular buffer incompatible image")]
    CircularBufferIncompatibleImage,
    #[error("not allowed during sequence acquisition")]
    NotAllowedDuringSequenceAcquisition,
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid image sequence")]
    InvalidImageSequence,
    #[error("null pointer exception")]
    NullPointerException,
    #[error("create peripheral failed")]
    CreatePeripheralFailed,
    #[error("property not in cache")]
    PropertyNotInCache,
    #[error("bad affine transform")]
    BadAffineTransform,

    /// A status code outside the known table.
    #[error("error {0}")]
    Unknown(i32),
}

impl CoreError {
    /// Map a raw status to an error. Returns `None` for success (zero).
    pub fn from_status(status: sys::MM_Status) -> Option<Self> {
        let err = match status {
            sys::MM_ErrOK => return None,
            sys::MM_ErrGENERIC => Self::Generic,
            sys::MM_ErrNoDevice => Self::NoDevice,
            sys::MM_ErrSetPropertyFailed => Self::SetPropertyFailed,
            sys::MM_ErrLibraryFunctionNotFound => Self::LibraryFunctionNotFound,
            sys::MM_ErrModuleVersionMismatch => Self::ModuleVersionMismatch,
            sys::MM_ErrDeviceVersionMismatch => Self::DeviceVersionMismatch,
            sys::MM_ErrUnknownModule => Self::UnknownModule,
            sys::MM_ErrLoadLibraryFailed => Self::LoadLibraryFailed,
            sys::MM_ErrCreateFailed => Self::CreateFailed,
            sys::MM_ErrCreateNotFound => Self::CreateNotFound,
            sys::MM_ErrDeleteNotFound => Self::DeleteNotFound,
            sys::MM_ErrDeleteFailed => Self::DeleteFailed,
            sys::MM_ErrUnexpectedDevice => Self::UnexpectedDevice,
            sys::MM_ErrDeviceUnloadFailed => Self::DeviceUnloadFailed,
            sys::MM_ErrCameraNotAvailable => Self::CameraNotAvailable,
            sys::MM_ErrDuplicateLabel => Self::DuplicateLabel,
            sys::MM_ErrInvalidLabel => Self::InvalidLabel,
            sys::MM_ErrInvalidStateDevice => Self::InvalidStateDevice,
            sys::MM_ErrNoConfiguration => Self::NoConfiguration,
            sys::MM_ErrInvalidConfigurationIndex => Self::InvalidConfigurationIndex,
            sys::MM_ErrDEVICE_GENERIC => Self::DeviceGeneric,
            sys::MM_ErrInvalidPropertyBlock => Self::InvalidPropertyBlock,
            sys::MM_ErrUnhandledException => Self::UnhandledException,
            sys::MM_ErrDevicePollingTimeout => Self::DevicePollingTimeout,
            sys::MM_ErrInvalidShutterDevice => Self::InvalidShutterDevice,
            sys::MM_ErrInvalidSerialDevice => Self::InvalidSerialDevice,
            sys::MM_ErrInvalidStageDevice => Self::InvalidStageDevice,
            sys::MM_ErrInvalidSpecificDevice => Self::InvalidSpecificDevice,
            sys::MM_ErrInvalidXYStageDevice => Self::InvalidXYStageDevice,
            sys::MM_ErrFileOpenFailed => Self::FileOpenFailed,
            sys::MM_ErrInvalidCFGEntry => Self::InvalidCfgEntry,
            sys::MM_ErrInvalidContents => Self::InvalidContents,
            sys::MM_ErrInvalidCoreProperty => Self::InvalidCoreProperty,
            sys::MM_ErrInvalidCoreValue => Self::InvalidCoreValue,
            sys::MM_ErrNoConfigGroup => Self::NoConfigGroup,
            sys::MM_ErrCameraBufferReadFailed => Self::CameraBufferReadFailed,
            sys::MM_ErrDuplicateConfigGroup => Self::DuplicateConfigGroup,
            sys::MM_ErrInvalidConfigurationFile => Self::InvalidConfigurationFile,
            sys::MM_ErrCircularBufferFailedToInitialize => Self::CircularBufferFailedToInitialize,
            sys::MM_ErrCircularBufferEmpty => Self::CircularBufferEmpty,
            sys::MM_ErrContFocusNotAvailable => Self::ContFocusNotAvailable,
            sys::MM_ErrAutoFocusNotAvailable => Self::AutoFocusNotAvailable,
            sys::MM_ErrBadConfigName => Self::BadConfigName,
            sys::MM_ErrCircularBufferIncompatibleImage => Self::CircularBufferIncompatibleImage,
            sys::MM_ErrNotAllowedDuringSequenceAcquisition => Self::NotAllowedDuringSequenceAcquisition,
            sys::MM_ErrOutOfMemory => Self::OutOfMemory,
            sys::MM_ErrInvalidImageSequence => Self::InvalidImageSequence,
            sys::MM_ErrNullPointerException => Self::NullPointerException,
            sys::MM_ErrCreatePeripheralFailed => Self::CreatePeripheralFailed,
            sys::MM_ErrPropertyNotInCache => Self::PropertyNotInCache,
            sys::MM_ErrBadAffineTransform => Self::BadAffineTransform,
            other => Self::Unknown(other),
        };
        Some(err)
    }

    /// The raw status code.
    pub fn code(&self) -> sys::MM_Status {
        match self {
            Self::Generic => sys::MM_ErrGENERIC,
            Self::NoDevice => sys::MM_ErrNoDevice,
            Self::SetPropertyFailed => sys::MM_ErrSetPropertyFailed,
            Self::LibraryFunctionNotFound => sys::MM_ErrLibraryFunctionNotFound,
            Self::ModuleVersionMismatch => sys::MM_ErrModuleVersionMismatch,
            Self::DeviceVersionMismatch => sys::MM_ErrDeviceVersionMismatch,
            Self::UnknownModule => sys::MM_ErrUnknownModule,
            Self::LoadLibraryFailed => sys::MM_ErrLoadLibraryFailed,
            Self::CreateFailed => sys::MM_ErrCreateFailed,
            Self::CreateNotFound => sys::MM_ErrCreateNotFound,
            Self::DeleteNotFound => sys::MM_ErrDeleteNotFound,
            Self::DeleteFailed => sys::MM_ErrDeleteFailed,
            Self::UnexpectedDevice => sys::MM_ErrUnexpectedDevice,
            Self::DeviceUnloadFailed => sys::MM_ErrDeviceUnloadFailed,
            Self::CameraNotAvailable => sys::MM_ErrCameraNotAvailable,
            Self::DuplicateLabel => sys::MM_ErrDuplicateLabel,
            Self::InvalidLabel => sys::MM_ErrInvalidLabel,
            Self::InvalidStateDevice => sys::MM_ErrInvalidStateDevice,
            Self::NoConfiguration => sys::MM_ErrNoConfiguration,
            Self::InvalidConfigurationIndex => sys::MM_ErrInvalidConfigurationIndex,
            Self::DeviceGeneric => sys::MM_ErrDEVICE_GENERIC,
            Self::InvalidPropertyBlock => sys::MM_ErrInvalidPropertyBlock,
            Self::UnhandledException => sys::MM_ErrUnhandledException,
            Self::DevicePollingTimeout => sys::MM_ErrDevicePollingTimeout,
            Self::InvalidShutterDevice => sys::MM_ErrInvalidShutterDevice,
            Self::InvalidSerialDevice => sys::MM_ErrInvalidSerialDevice,
            Self::InvalidStageDevice => sys::MM_ErrInvalidStageDevice,
            Self::InvalidSpecificDevice => sys::MM_ErrInvalidSpecificDevice,
            Self::InvalidXYStageDevice => sys::MM_ErrInvalidXYStageDevice,
            Self::FileOpenFailed => sys::MM_ErrFileOpenFailed,
            Self::InvalidCfgEntry => sys::MM_ErrInvalidCFGEntry,
            Self::InvalidContents => sys::MM_ErrInvalidContents,
            Self::InvalidCoreProperty => sys::MM_ErrInvalidCoreProperty,
            Self::InvalidCoreValue => sys::MM_ErrInvalidCoreValue,
            Self::NoConfigGroup => sys::MM_ErrNoConfigGroup,
            Self::CameraBufferReadFailed => sys::MM_ErrCameraBufferReadFailed,
            Self::DuplicateConfigGroup => sys::MM_ErrDuplicateConfigGroup,
            Self::InvalidConfigurationFile => sys::MM_ErrInvalidConfigurationFile,
            Self::CircularBufferFailedToInitialize => sys::MM_ErrCircularBufferFailedToInitialize,
            Self::CircularBufferEmpty => sys::MM_ErrCircularBufferEmpty,
            Self::ContFocusNotAvailable => sys::MM_ErrContFocusNotAvailable,
            Self::AutoFocusNotAvailable => sys::MM_ErrAutoFocusNotAvailable,
            Self::BadConfigName => sys::MM_ErrBadConfigName,
            Self::CircularBufferIncompatibleImage => sys::MM_ErrCircularBufferIncompatibleImage,
            Self::NotAllowedDuringSequenceAcquisition => sys::MM_ErrNotAllowedDuringSequenceAcquisition,
            Self::OutOfMemory => sys::MM_ErrOutOfMemory,
            Self::InvalidImageSequence => sys::MM_ErrInvalidImageSequence,
            Self::NullPointerException => sys::MM_ErrNullPointerException,
            Self::CreatePeripheralFailed => sys::MM_ErrCreatePeripheralFailed,
            Self::PropertyNotInCache => sys::MM_ErrPropertyNotInCache,
            Self::BadAffineTransform => sys::MM_ErrBadAffineTransform,
            Self::Unknown(code) => *code,
        }
    }
}

/// Convert a status into a `Result`, the way every wrapped call does.
pub fn check(status: sys::MM_Status) -> std::result::Result<(), CoreError> {
    match CoreError::from_status(status) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// Errors surfaced by the binding.
#[derive(Error, Debug)]
pub enum Error {
    /// The core reported a failure status.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A string argument contains a NUL byte and cannot cross the C ABI.
    #[error("argument '{argument}' contains an interior NUL byte")]
    InteriorNul {
        /// Name of the rejected argument.
        argument: &'static str,
    },

    /// The core returned a device type outside the known enumeration.
    #[error("core returned unknown device type {0}")]
    InvalidDeviceType(i32),

    /// The core returned a property type outside the known enumeration.
    #[error("core returned unknown property type {0}")]
    InvalidPropertyType(i32),

    /// A session configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The core status behind this error, if it came from the core.
    pub fn core(&self) -> Option<CoreError> {
        match self {
            Error::Core(err) => Some(*err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_not_an_error() {
        assert_eq!(CoreError::from_status(0), None);
        assert!(check(0).is_ok());
    }

    #[test]
    fn test_known_codes_round_trip() {
        for code in 1..=52 {
            let err = CoreError::from_status(code).unwrap();
            assert_eq!(err.code(), code);
            if code == 18 {
                assert_eq!(err, CoreError::Unknown(18));
            } else {
                assert!(!matches!(err, CoreError::Unknown(_)), "code {code}");
            }
        }
    }

    #[test]
    fn test_descriptions() {
        let table = [
            (1, "generic (unspecified) error"),
            (2, "no device"),
            (3, "set property failed"),
            (4, "library function not found"),
            (5, "module version mismatch"),
            (6, "device version mismatch"),
            (7, "unknown module"),
            (8, "load library failed"),
            (9, "create failed"),
            (10, "create not found"),
            (11, "delete not found"),
            (12, "delete failed"),
            (13, "unexpected device"),
            (14, "device unload failed"),
            (15, "camera not available"),
            (16, "duplicated label"),
            (17, "invalid label"),
            (19, "invalid state device"),
            (20, "no configuration"),
            (21, "invalid configuration index"),
            (22, "device generic (unspecified) error"),
            (23, "invalid property block"),
            (24, "unhandled exception"),
            (25, "device polling timeout"),
            (26, "invalid shutter device"),
            (27, "invalid serial device"),
            (28, "invalid stage device"),
            (29, "invalid specific device"),
            (30, "invalid XY stage device"),
            (31, "file open failed"),
            (32, "invalid CFG entry"),
            (33, "invalid contents"),
            (34, "invalid core property"),
            (35, "invalid core value"),
            (36, "no config group"),
            (37, "camera buffer read failed"),
            (38, "duplicated config group"),
            (39, "invalid configuration file"),
            (40, "circular buffer failed to initialize"),
            (41, "circular buffer empty"),
            (42, "continuous focus not available"),
            (43, "auto focus not available"),
            (44, "bad config name"),
            (45, "circular buffer incompatible image"),
            (46, "not allowed during sequence acquisition"),
            (47, "out of memory"),
            (48, "invalid image sequence"),
            (49, "null pointer exception"),
            (50, "create peripheral failed"),
            (51, "property not in cache"),
            (52, "bad affine transform"),
        ];
        for (code, text) in table {
            assert_eq!(CoreError::from_status(code).unwrap().to_string(), text, "code {code}");
        }
        assert_eq!(CoreError::from_status(18).unwrap().to_string(), "error 18");
        assert_eq!(CoreError::from_status(99).unwrap().to_string(), "error 99");
        assert_eq!(CoreError::from_status(-3).unwrap().to_string(), "error -3");
    }

    #[test]
    fn test_core_errors_pass_through_verbatim() {
        let err: Error = CoreError::CameraNotAvailable.into();
        assert_eq!(err.to_string(), "camera not available");
        assert_eq!(err.core(), Some(CoreError::CameraNotAvailable));

        let err = Error::InteriorNul { argument: "label" };
        assert_eq!(err.core(), None);
    }
}
