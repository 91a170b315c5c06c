//! Shutter and autofocus control.

use mmcore_sys as sys;
use tracing::debug;

use super::Session;
use crate::error::Result;
use crate::marshal::{to_cstring, to_flag};

impl Session {
    /// Open or close a shutter. An empty label addresses the current shutter.
    pub fn set_shutter_open(&self, label: &str, open: bool) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetShutterOpen(self.as_raw(), c_label.as_ptr(), to_flag(open)) })
    }

    /// Whether a shutter is open.
    pub fn shutter_open(&self, label: &str) -> Result<bool> {
        let c_label = to_cstring("label", label)?;
        self.read_flag(|out| unsafe { sys::MM_GetShutteOpenr(self.as_raw(), c_label.as_ptr(), out) })
    }

    // --- autofocus ---

    /// Score of the last focus run.
    pub fn last_focus_score(&self) -> f64 {
        self.out_value(|out| unsafe { sys::MM_GetLastFocusScore(self.as_raw(), out) })
    }

    /// Focus score of the current position.
    pub fn current_focus_score(&self) -> f64 {
        self.out_value(|out| unsafe { sys::MM_GetCurrentFocusScore(self.as_raw(), out) })
    }

    /// Turn continuous focus on.
    pub fn enable_continuous_focus(&self) -> Result<()> {
        self.check(unsafe { sys::MM_EnableContinuousFocus(self.as_raw()) })?;
        debug!("Continuous focus enabled");
        Ok(())
    }

    /// Turn continuous focus off.
    pub fn disable_continuous_focus(&self) -> Result<()> {
        self.check(unsafe { sys::MM_DisableContinuousFocus(self.as_raw()) })?;
        debug!("Continuous focus disabled");
        Ok(())
    }

    /// Whether continuous focus is on.
    pub fn is_continuous_focus_enabled(&self) -> Result<bool> {
        self.read_flag(|out| unsafe { sys::MM_IsContinuousFocusEnabled(self.as_raw(), out) })
    }

    /// Whether continuous focus is on and has locked.
    pub fn is_continuous_focus_locked(&self) -> Result<bool> {
        self.read_flag(|out| unsafe { sys::MM_IsContinuousFocusLocked(self.as_raw(), out) })
    }

    /// Whether `label` is the focus drive of a continuous focus device.
    pub fn is_continuous_focus_drive(&self, label: &str) -> Result<bool> {
        let c_label = to_cstring("label", label)?;
        self.read_flag(|out| unsafe {
            sys::MM_IsContinuousFocusDrive(self.as_raw(), c_label.as_ptr(), out)
        })
    }

    /// Run a full autofocus search.
    pub fn full_focus(&self) -> Result<()> {
        self.check(unsafe { sys::MM_FullFocus(self.as_raw()) })
    }

    /// Run one incremental autofocus step.
    pub fn incremental_focus(&self) -> Result<()> {
        self.check(unsafe { sys::MM_IncrementalFocus(self.as_raw()) })
    }

    /// Set the autofocus offset.
    pub fn set_auto_focus_offset(&self, offset: f64) -> Result<()> {
        self.check(unsafe { sys::MM_SetAutoFocusOffset(self.as_raw(), offset) })
    }

    /// Autofocus offset.
    pub fn auto_focus_offset(&self) -> Result<f64> {
        self.read_value(|out| unsafe { sys::MM_GetAutoFocusOffset(self.as_raw(), out) })
    }
}
