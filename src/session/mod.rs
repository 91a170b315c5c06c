//! Safe RAII wrapper around one core session.
//!
//! A [`Session`] owns one native handle from `MM_Open` and closes it when
//! dropped. All operations are blocking round-trips into the core; a failing
//! status comes back verbatim as [`CoreError`](crate::CoreError).
//!
//! The operations are grouped by device family in the submodules; they all
//! extend [`Session`].

// FFI wrapper: every unsafe block passes the live handle owned by `self` and
// C strings or output slots that outlive the call.
#![allow(unsafe_code)]

mod camera;
mod devices;
mod focus;
mod hub;
mod properties;
mod stage;
mod state;

use std::fmt;
use std::os::raw::{c_char, c_void};
use std::ptr::{self, NonNull};

use mmcore_sys as sys;
use tracing::{debug, info};

use crate::error::{self, CoreError, Error, Result};
use crate::events::{
    self, DeliveryPolicy, PropertyChangedEvent, SessionHandle, StagePositionChangedEvent,
    Subscription,
};
use crate::marshal::{from_flag, NativeString, NativeStringList};

/// One connection to the core.
///
/// Dropping the session removes its event listeners and closes the native
/// handle, in that order.
pub struct Session {
    raw: NonNull<c_void>,
}

// SAFETY: the core serialises access to its own state, and the handle is only
// an opaque pointer passed back to it.
unsafe impl Send for Session {}
unsafe impl Sync for Session {}

impl Session {
    /// Open a new core session.
    pub fn open() -> Result<Self> {
        let mut raw: sys::MM_Session = ptr::null_mut();
        unsafe { sys::MM_Open(&mut raw) };
        let raw = NonNull::new(raw).ok_or(Error::Core(CoreError::NullPointerException))?;

        let session = Self { raw };
        info!(session = %session.handle(), "Opened core session");
        Ok(session)
    }

    /// Close the session. Equivalent to dropping it.
    pub fn close(self) {
        drop(self);
    }

    /// The raw handle, for calling `mmcore-sys` directly.
    ///
    /// The handle stays owned by the session and must not be closed.
    pub fn as_raw(&self) -> sys::MM_Session {
        self.raw.as_ptr()
    }

    /// Registry key of this session in the event relay.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::from_raw(self.as_raw())
    }

    /// Version string of the core, e.g. `MMCore version 10.2.0`.
    pub fn version_info(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetVersionInfo(self.as_raw(), out) })
    }

    /// Device and module API versions the core was built against.
    pub fn api_version_info(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetAPIVersionInfo(self.as_raw(), out) })
    }

    /// Name of the user running the core.
    pub fn user_id(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetUserId(self.as_raw(), out) })
    }

    /// Host name of this machine.
    pub fn host_name(&self) -> String {
        self.out_string(|out| unsafe { sys::MM_GetHostName(self.as_raw(), out) })
    }

    /// MAC addresses of this machine's network interfaces.
    pub fn mac_addresses(&self) -> Vec<String> {
        let mut list = NativeStringList::null();
        unsafe { sys::MM_GetMACAddresses(self.as_raw(), list.as_out()) };
        list.to_vec()
    }

    /// Subscribe to property changes of this session's devices.
    pub fn subscribe_property_changed(&self, policy: DeliveryPolicy) -> Subscription<PropertyChangedEvent> {
        events::relay().subscribe(self.as_raw(), policy)
    }

    /// Subscribe to focus stage position changes.
    pub fn subscribe_stage_position_changed(
        &self,
        policy: DeliveryPolicy,
    ) -> Subscription<StagePositionChangedEvent> {
        events::relay().subscribe(self.as_raw(), policy)
    }

    // --- call helpers shared by the submodules ---

    fn check(&self, status: sys::MM_Status) -> Result<()> {
        error::check(status).map_err(Error::from)
    }

    /// Read a string from an entry point without a status.
    fn out_string(&self, f: impl FnOnce(*mut *mut c_char)) -> String {
        let mut value = NativeString::null();
        f(value.as_out());
        value.to_string_lossy()
    }

    fn read_string(&self, f: impl FnOnce(*mut *mut c_char) -> sys::MM_Status) -> Result<String> {
        let mut value = NativeString::null();
        let status = f(value.as_out());
        self.check(status)?;
        Ok(value.to_string_lossy())
    }

    fn read_list(&self, f: impl FnOnce(*mut *mut *mut c_char) -> sys::MM_Status) -> Result<Vec<String>> {
        let mut list = NativeStringList::null();
        let status = f(list.as_out());
        // The guard frees whatever the core handed out, even on failure.
        self.check(status)?;
        Ok(list.to_vec())
    }

    fn read_value<T: Default>(&self, f: impl FnOnce(*mut T) -> sys::MM_Status) -> Result<T> {
        let mut value = T::default();
        let status = f(&mut value);
        self.check(status)?;
        Ok(value)
    }

    fn read_flag(&self, f: impl FnOnce(*mut u8) -> sys::MM_Status) -> Result<bool> {
        self.read_value(f).map(from_flag)
    }

    /// Read a value from an entry point without a status.
    fn out_value<T: Default>(&self, f: impl FnOnce(*mut T)) -> T {
        let mut value = T::default();
        f(&mut value);
        value
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("handle", &self.handle()).finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let handle = self.handle();
        events::relay().remove(handle);
        debug!(session = %handle, "Closing core session");
        unsafe { sys::MM_Close(self.as_raw()) };
        info!(session = %handle, "Closed core session");
    }
}
