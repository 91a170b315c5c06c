//! C callbacks handed to the core.

#![allow(unsafe_code)]

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use mmcore_sys as sys;
use tracing::error;

use super::{relay, PropertyChangedEvent, SessionHandle, StagePositionChangedEvent};
use crate::marshal::read_string;

static CALLBACKS: sys::MM_EventCallback = sys::MM_EventCallback {
    onPropertyChanged: Some(on_property_changed),
    onStagePositionChanged: Some(on_stage_position_changed),
};

/// The table passed to `MM_RegisterCallback`. The core never writes to it.
pub(super) fn callback_table() -> *mut sys::MM_EventCallback {
    std::ptr::addr_of!(CALLBACKS).cast_mut()
}

// Panics must not unwind into the core.

unsafe extern "C" fn on_property_changed(
    mm: sys::MM_Session,
    label: *const c_char,
    property: *const c_char,
    value: *const c_char,
) {
    let delivered = catch_unwind(AssertUnwindSafe(|| {
        let event = PropertyChangedEvent {
            label: read_string(label),
            property: read_string(property),
            value: read_string(value),
        };
        relay().publish(SessionHandle::from_raw(mm), event);
    }));
    if delivered.is_err() {
        error!("Panic while relaying property change");
    }
}

unsafe extern "C" fn on_stage_position_changed(mm: sys::MM_Session, label: *const c_char, pos: f64) {
    let delivered = catch_unwind(AssertUnwindSafe(|| {
        let event = StagePositionChangedEvent {
            label: read_string(label),
            position: pos,
        };
        relay().publish(SessionHandle::from_raw(mm), event);
    }));
    if delivered.is_err() {
        error!("Panic while relaying stage position change");
    }
}
