//! In-process simulated core.
//!
//! Compiled when the `mmcore-sdk` feature is off. [`abi`] exports every
//! `MM_*` function with the signature of the real library, and the memory it
//! hands out follows the same ownership rules (strings and lists come from
//! `malloc` and are released by `MM_StringFree`, `MM_StringListFree` and
//! `MM_Free`), so callers exercise their real marshaling and free paths.
//!
//! The simulated core offers one adapter module, [`devices::MODULE`], with a
//! camera, filter wheel, focus stage, XY stage, shutter, autofocus and hub.
//! Sequence acquisition runs a generator thread that fills a circular buffer.
//!
//! Besides the C ABI, a few hooks exist for tests:
//! - [`take_calls`] returns the names of the entry points invoked on a session
//! - [`emit_property_changed`] and [`emit_stage_position_changed`] raise
//!   notifications the way a device adapter would

pub mod abi;
mod camera;
mod engine;
pub mod devices;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::*;

pub(crate) use self::camera::Acquisition;
pub(crate) use self::engine::CoreState;

/// One simulated `CMMCore` instance. `MM_Session` points at this.
pub(crate) struct SimCore {
    pub(crate) state: Arc<Mutex<CoreState>>,
    calls: Mutex<Vec<&'static str>>,
    callback: Mutex<Option<MM_EventCallback>>,
    pub(crate) acquisition: Mutex<Option<Acquisition>>,
}

/// A notification to deliver through the registered callback table once the
/// state lock is released.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Notification {
    Property {
        label: String,
        property: String,
        value: String,
    },
    StagePosition {
        label: String,
        position: f64,
    },
}

impl SimCore {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CoreState::default())),
            calls: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
            acquisition: Mutex::new(None),
        }
    }

    fn record(&self, entry: &'static str) {
        self.calls.lock().push(entry);
    }

    pub(crate) fn register_callback(&self, table: Option<MM_EventCallback>) {
        *self.callback.lock() = table;
    }

    /// Invoke the registered callbacks. Must be called without the state
    /// lock held, since callbacks may re-enter the core.
    pub(crate) fn notify(&self, mm: MM_Session, notes: Vec<Notification>) {
        let Some(table) = *self.callback.lock() else {
            return;
        };

        for note in notes {
            match note {
                Notification::Property {
                    label,
                    property,
                    value,
                } => {
                    if let Some(cb) = table.onPropertyChanged {
                        let (label, property, value) =
                            (c_string(&label), c_string(&property), c_string(&value));
                        // SAFETY: the strings outlive the call.
                        unsafe { cb(mm, label.as_ptr(), property.as_ptr(), value.as_ptr()) };
                    }
                }
                Notification::StagePosition { label, position } => {
                    if let Some(cb) = table.onStagePositionChanged {
                        let label = c_string(&label);
                        // SAFETY: the string outlives the call.
                        unsafe { cb(mm, label.as_ptr(), position) };
                    }
                }
            }
        }
    }

    /// Run `f` under the state lock, then deliver the notifications it queued.
    pub(crate) fn with_state<T>(&self, mm: MM_Session, f: impl FnOnce(&mut CoreState) -> T) -> T {
        let (result, notes) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, std::mem::take(&mut state.pending))
        };
        self.notify(mm, notes);
        result
    }

    /// Stop and join the acquisition thread, if any.
    pub(crate) fn stop_acquisition(&self) {
        let acquisition = self.acquisition.lock().take();
        if let Some(acquisition) = acquisition {
            acquisition.stop();
        }
    }

    pub(crate) fn is_acquiring(&self) -> bool {
        self.acquisition
            .lock()
            .as_ref()
            .map(Acquisition::is_running)
            .unwrap_or(false)
    }
}

impl Drop for SimCore {
    fn drop(&mut self) {
        self.stop_acquisition();
    }
}

/// Resolve a session pointer and record the entry point.
///
/// # Safety
///
/// `mm` must be null or a pointer produced by `MM_Open` that was not closed.
pub(crate) unsafe fn enter<'a>(mm: MM_Session, entry: &'static str) -> Option<&'a SimCore> {
    let core = (mm as *const SimCore).as_ref()?;
    core.record(entry);
    Some(core)
}

/// Names of the entry points invoked on `mm` since the last call, in order.
///
/// # Safety
///
/// `mm` must be null or a live session handle.
pub unsafe fn take_calls(mm: MM_Session) -> Vec<&'static str> {
    match (mm as *const SimCore).as_ref() {
        Some(core) => std::mem::take(&mut *core.calls.lock()),
        None => Vec::new(),
    }
}

/// Raise a property-changed notification on `mm` as a device adapter would.
///
/// # Safety
///
/// `mm` must be null or a live session handle.
pub unsafe fn emit_property_changed(mm: MM_Session, label: &str, property: &str, value: &str) {
    if let Some(core) = (mm as *const SimCore).as_ref() {
        core.notify(
            mm,
            vec![Notification::Property {
                label: label.to_string(),
                property: property.to_string(),
                value: value.to_string(),
            }],
        );
    }
}

/// Raise a stage-position-changed notification on `mm`.
///
/// # Safety
///
/// `mm` must be null or a live session handle.
pub unsafe fn emit_stage_position_changed(mm: MM_Session, label: &str, position: f64) {
    if let Some(core) = (mm as *const SimCore).as_ref() {
        core.notify(
            mm,
            vec![Notification::StagePosition {
                label: label.to_string(),
                position,
            }],
        );
    }
}

fn c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

/// Read a borrowed C string argument. NULL reads as empty.
pub(crate) unsafe fn arg(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Write through an output pointer when it is non-null.
pub(crate) unsafe fn put<T>(out: *mut T, value: T) {
    if let Some(out) = out.as_mut() {
        *out = value;
    }
}

/// `malloc` a copy of `s`, to be released with `MM_StringFree`.
pub(crate) unsafe fn alloc_string(s: &str) -> *mut c_char {
    let c = c_string(s);
    libc::strdup(c.as_ptr())
}

/// `malloc` a NULL-terminated list, to be released with `MM_StringListFree`.
pub(crate) unsafe fn alloc_list<S: AsRef<str>>(items: &[S]) -> *mut *mut c_char {
    let slots = items.len() + 1;
    let list = libc::malloc(slots * std::mem::size_of::<*mut c_char>()) as *mut *mut c_char;
    if list.is_null() {
        return list;
    }
    for (i, item) in items.iter().enumerate() {
        *list.add(i) = alloc_string(item.as_ref());
    }
    *list.add(items.len()) = std::ptr::null_mut();
    list
}

/// `malloc` an array of device types, to be released with `MM_Free`.
pub(crate) unsafe fn alloc_types(types: &[MM_DeviceType]) -> *mut MM_DeviceType {
    if types.is_empty() {
        return std::ptr::null_mut();
    }
    let array =
        libc::malloc(types.len() * std::mem::size_of::<MM_DeviceType>()) as *mut MM_DeviceType;
    if !array.is_null() {
        std::ptr::copy_nonoverlapping(types.as_ptr(), array, types.len());
    }
    array
}

pub(crate) unsafe fn free_list(list: *mut *mut c_char) {
    if list.is_null() {
        return;
    }
    let mut i = 0;
    loop {
        let item = *list.add(i);
        if item.is_null() {
            break;
        }
        libc::free(item as *mut libc::c_void);
        i += 1;
    }
    libc::free(list as *mut libc::c_void);
}

pub(crate) fn status(result: Result<(), MM_Status>) -> MM_Status {
    match result {
        Ok(()) => MM_ErrOK,
        Err(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_allocation_is_null_terminated() {
        unsafe {
            let list = alloc_list(&["a", "bc"]);
            assert!(!list.is_null());
            assert_eq!(arg(*list), "a");
            assert_eq!(arg(*list.add(1)), "bc");
            assert!((*list.add(2)).is_null());
            free_list(list);
        }
    }

    #[test]
    fn test_empty_list_is_terminator_only() {
        unsafe {
            let list = alloc_list::<&str>(&[]);
            assert!((*list).is_null());
            free_list(list);
        }
    }

    #[test]
    fn test_null_arguments_read_as_empty() {
        unsafe {
            assert_eq!(arg(std::ptr::null()), "");
            put(std::ptr::null_mut::<i32>(), 1);
        }
    }
}
