//! Focus (Z) and XY stage control.
//!
//! An empty label addresses the current focus or XY stage. Positions are in
//! micrometres.

use mmcore_sys as sys;
use tracing::debug;

use super::Session;
use crate::error::Result;
use crate::marshal::to_cstring;
use crate::types::FocusDirection;

impl Session {
    /// Move a focus stage to `position`.
    pub fn set_position(&self, label: &str, position: f64) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetPosition(self.as_raw(), c_label.as_ptr(), position) })
    }

    /// Position of a focus stage.
    pub fn position(&self, label: &str) -> Result<f64> {
        let c_label = to_cstring("label", label)?;
        self.read_value(|out| unsafe { sys::MM_GetPosition(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Move a focus stage by `delta`.
    pub fn set_relative_position(&self, label: &str, delta: f64) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetRelativePosition(self.as_raw(), c_label.as_ptr(), delta) })
    }

    /// Make the current focus position zero.
    pub fn set_origin(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetOrigin(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make the current focus position read as `z_um` in the adapter.
    pub fn set_adapter_origin(&self, label: &str, z_um: f64) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetAdapterOrigin(self.as_raw(), c_label.as_ptr(), z_um) })
    }

    /// Declare which way positive moves go.
    pub fn set_focus_direction(&self, label: &str, direction: FocusDirection) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe {
            sys::MM_SetFocusDirection(self.as_raw(), c_label.as_ptr(), direction.to_sign())
        })
    }

    /// Which way positive moves go.
    pub fn focus_direction(&self, label: &str) -> Result<FocusDirection> {
        let c_label = to_cstring("label", label)?;
        let sign = self.read_value(|out| unsafe {
            sys::MM_GetFocusDirection(self.as_raw(), c_label.as_ptr(), out)
        })?;
        Ok(FocusDirection::from_sign(sign))
    }

    // --- XY stage ---

    /// Move an XY stage to (`x`, `y`).
    pub fn set_xy_position(&self, label: &str, x: f64, y: f64) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetXYPosition(self.as_raw(), c_label.as_ptr(), x, y) })
    }

    /// Move an XY stage by (`dx`, `dy`).
    pub fn set_relative_xy_position(&self, label: &str, dx: f64, dy: f64) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetRelativeXYPosition(self.as_raw(), c_label.as_ptr(), dx, dy) })
    }

    /// Position of an XY stage as `(x, y)`.
    pub fn xy_position(&self, label: &str) -> Result<(f64, f64)> {
        let c_label = to_cstring("label", label)?;
        let (mut x, mut y) = (0.0, 0.0);
        self.check(unsafe { sys::MM_GetXYPosition(self.as_raw(), c_label.as_ptr(), &mut x, &mut y) })?;
        Ok((x, y))
    }

    /// X coordinate of an XY stage.
    pub fn x_position(&self, label: &str) -> Result<f64> {
        let c_label = to_cstring("label", label)?;
        self.read_value(|out| unsafe { sys::MM_GetXPosition(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Y coordinate of an XY stage.
    pub fn y_position(&self, label: &str) -> Result<f64> {
        let c_label = to_cstring("label", label)?;
        self.read_value(|out| unsafe { sys::MM_GetYPosition(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Halt a moving stage.
    pub fn stop(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_Stop(self.as_raw(), c_label.as_ptr()) })?;
        debug!(label, "Stopped stage");
        Ok(())
    }

    /// Run the stage's homing procedure.
    pub fn home(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_Home(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make the current XY position the origin.
    pub fn set_origin_xy(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetOriginXY(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make the current X coordinate zero.
    pub fn set_origin_x(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetOriginX(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make the current Y coordinate zero.
    pub fn set_origin_y(&self, label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetOriginY(self.as_raw(), c_label.as_ptr()) })
    }

    /// Make the current XY position read as (`x_um`, `y_um`) in the adapter.
    pub fn set_adapter_origin_xy(&self, label: &str, x_um: f64, y_um: f64) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetAdpaterOriginXY(self.as_raw(), c_label.as_ptr(), x_um, y_um) })
    }
}
