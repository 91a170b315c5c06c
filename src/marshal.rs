//! Conversions between Rust values and the C representations used by the core.
//!
//! Strings and string lists returned by the core are owned by the caller and
//! must go back through `MM_StringFree` / `MM_StringListFree`. The guards here
//! make that happen on every path, including early returns on error.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use mmcore_sys as sys;

use crate::error::{Error, Result};

/// Convert a Rust string argument to a C string.
pub fn to_cstring(argument: &'static str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| Error::InteriorNul { argument })
}

/// An owned NULL-terminated `char*` array built from Rust strings.
///
/// The pointers stay valid for the lifetime of the value.
#[derive(Debug)]
pub struct CStringArray {
    _owned: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl CStringArray {
    /// Build the array, rejecting strings with interior NUL bytes.
    pub fn new<S: AsRef<str>>(argument: &'static str, items: &[S]) -> Result<Self> {
        let owned = items
            .iter()
            .map(|item| to_cstring(argument, item.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let mut pointers: Vec<*const c_char> = owned.iter().map(|s| s.as_ptr()).collect();
        pointers.push(ptr::null());
        Ok(Self {
            _owned: owned,
            pointers,
        })
    }

    /// Number of strings, not counting the terminator.
    pub fn len(&self) -> usize {
        self.pointers.len() - 1
    }

    /// True if the array holds no strings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pointer to the first element, as the core's `const char**` parameters
    /// expect it.
    pub fn as_mut_ptr(&mut self) -> *mut *const c_char {
        self.pointers.as_mut_ptr()
    }
}

/// A `char*` allocated by the core, released with `MM_StringFree` on drop.
#[derive(Debug)]
pub struct NativeString(*mut c_char);

impl NativeString {
    /// An empty slot to pass as an output parameter.
    pub fn null() -> Self {
        Self(ptr::null_mut())
    }

    /// Output parameter pointer.
    pub fn as_out(&mut self) -> *mut *mut c_char {
        &mut self.0
    }

    /// Copy into an owned `String`. NULL reads as empty.
    pub fn to_string_lossy(&self) -> String {
        // SAFETY: the pointer is null or a NUL-terminated string from the core.
        unsafe { read_string(self.0) }
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the core allocated this string and it is released once.
            unsafe { sys::MM_StringFree(self.0) };
        }
    }
}

/// A NULL-terminated `char**` allocated by the core, released with
/// `MM_StringListFree` on drop.
#[derive(Debug)]
pub struct NativeStringList(*mut *mut c_char);

impl NativeStringList {
    /// An empty slot to pass as an output parameter.
    pub fn null() -> Self {
        Self(ptr::null_mut())
    }

    /// Output parameter pointer.
    pub fn as_out(&mut self) -> *mut *mut *mut c_char {
        &mut self.0
    }

    /// Copy into owned strings, preserving order. NULL reads as empty.
    pub fn to_vec(&self) -> Vec<String> {
        // SAFETY: the pointer is null or a NULL-terminated list from the core.
        unsafe { read_string_list(self.0) }
    }
}

impl Drop for NativeStringList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the core allocated this list and it is released once.
            unsafe { sys::MM_StringListFree(self.0) };
        }
    }
}

/// Read a borrowed C string. NULL reads as empty; invalid UTF-8 is replaced.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn read_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Read a borrowed NULL-terminated string list. NULL reads as empty.
///
/// # Safety
///
/// `list` must be null or point to a NULL-terminated array of NUL-terminated
/// strings.
pub unsafe fn read_string_list(list: *const *mut c_char) -> Vec<String> {
    let mut out = Vec::new();
    if list.is_null() {
        return out;
    }
    let mut i = 0;
    loop {
        let item = *list.add(i);
        if item.is_null() {
            break;
        }
        out.push(read_string(item));
        i += 1;
    }
    out
}

/// Encode a flag for the core.
pub fn to_flag(value: bool) -> u8 {
    u8::from(value)
}

/// Decode a flag from the core; any non-zero byte is true.
pub fn from_flag(value: u8) -> bool {
    value != 0
}

/// Copy an image out of a core-owned buffer.
///
/// Returns `None` for a null pointer or an empty buffer.
///
/// # Safety
///
/// `ptr` must be null or valid for reads of `len` bytes.
pub unsafe fn copy_image(ptr: *const u8, len: usize) -> Option<Vec<u8>> {
    if ptr.is_null() || len == 0 {
        return None;
    }
    Some(std::slice::from_raw_parts(ptr, len).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_nul_is_rejected() {
        let err = to_cstring("label", "Cam\0era").unwrap_err();
        assert!(matches!(err, Error::InteriorNul { argument: "label" }));
        assert!(CStringArray::new("paths", &["ok", "b\0ad"]).is_err());
    }

    #[test]
    fn test_string_array_is_null_terminated() {
        let mut array = CStringArray::new("paths", &["/a", "/b"]).unwrap();
        assert_eq!(array.len(), 2);
        unsafe {
            let p = array.as_mut_ptr();
            assert_eq!(read_string(*p), "/a");
            assert_eq!(read_string(*p.add(1)), "/b");
            assert!((*p.add(2)).is_null());
        }

        let empty = CStringArray::new::<&str>("paths", &[]).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_null_pointers_read_as_empty() {
        unsafe {
            assert_eq!(read_string(ptr::null()), "");
            assert!(read_string_list(ptr::null()).is_empty());
            assert_eq!(copy_image(ptr::null(), 16), None);
        }
        assert_eq!(NativeString::null().to_string_lossy(), "");
        assert!(NativeStringList::null().to_vec().is_empty());
    }

    #[test]
    fn test_string_list_preserves_order() {
        let a = CString::new("first").unwrap();
        let b = CString::new("second").unwrap();
        let list = [a.as_ptr() as *mut c_char, b.as_ptr() as *mut c_char, ptr::null_mut()];
        let read = unsafe { read_string_list(list.as_ptr()) };
        assert_eq!(read, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_flags() {
        assert_eq!(to_flag(true), 1);
        assert_eq!(to_flag(false), 0);
        assert!(from_flag(1));
        assert!(from_flag(0xff));
        assert!(!from_flag(0));
    }

    #[test]
    fn test_copy_image() {
        let data = [1u8, 2, 3, 4];
        let copied = unsafe { copy_image(data.as_ptr(), 3) };
        assert_eq!(copied, Some(vec![1, 2, 3]));
        assert_eq!(unsafe { copy_image(data.as_ptr(), 0) }, None);
    }
}
