//! Low-level FFI bindings for the Micro-Manager `MMCoreC` library.
//!
//! `MMCoreC` is a flat C API over `CMMCore`, the C++ engine of Micro-Manager
//! that loads device adapters and drives cameras, stages, shutters, filter
//! wheels and other microscope hardware.
//!
//! # Safety
//!
//! All functions in this crate are `unsafe` as they are direct FFI bindings.
//! For a safe wrapper, use the `mmcore` crate instead.
//!
//! # Features
//!
//! - `mmcore-sdk`: Link against the real `MMCoreC` library.
//!   Without this feature the [`sim`] module provides every `MM_*` function
//!   with the same signature, backed by an in-process simulated core with a
//!   few demo devices. This lets the safe layer build and test on machines
//!   without Micro-Manager installed.
//!
//! # Example (unsafe)
//!
//! ```no_run
//! use mmcore_sys::*;
//! use std::ffi::CStr;
//! use std::ptr;
//!
//! unsafe {
//!     let mut mm: MM_Session = ptr::null_mut();
//!     MM_Open(&mut mm);
//!
//!     let mut info = ptr::null_mut();
//!     MM_GetVersionInfo(mm, &mut info);
//!     println!("{}", CStr::from_ptr(info).to_string_lossy());
//!     MM_StringFree(info);
//!
//!     MM_Close(mm);
//! }
//! ```

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(missing_docs)]
#![allow(unsafe_code)]
#![allow(clippy::all)]

mod types;
pub use types::*;

#[cfg(feature = "mmcore-sdk")]
mod ffi;
#[cfg(feature = "mmcore-sdk")]
pub use ffi::*;

#[cfg(not(feature = "mmcore-sdk"))]
pub mod sim;
#[cfg(not(feature = "mmcore-sdk"))]
pub use sim::abi::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_constants() {
        assert_eq!(MM_ErrOK, 0);
        assert_eq!(MM_ErrInvalidLabel, 17);
        // 18 is not assigned by the core
        assert_eq!(MM_ErrInvalidStateDevice, 19);
        assert_eq!(MM_ErrBadAffineTransform, 52);
    }

    #[test]
    fn test_device_type_constants() {
        assert_eq!(MM_UnknownType, 0);
        assert_eq!(MM_CameraDevice, 2);
        assert_eq!(MM_HubDevice, 15);
        assert_eq!(MM_GalvoDevice, 16);
    }

    #[test]
    fn test_property_type_constants() {
        assert_eq!(MM_Undef, 0);
        assert_eq!(MM_String, 1);
        assert_eq!(MM_Float, 2);
        assert_eq!(MM_Integer, 3);
    }
}
