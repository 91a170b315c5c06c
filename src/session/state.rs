//! State devices: filter wheels, turrets and other discrete positioners.

use mmcore_sys as sys;

use super::Session;
use crate::error::Result;
use crate::marshal::to_cstring;

impl Session {
    /// Move a state device to position `state`.
    pub fn set_state(&self, label: &str, state: i32) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        self.check(unsafe { sys::MM_SetState(self.as_raw(), c_label.as_ptr(), state) })
    }

    /// Current position of a state device.
    pub fn state(&self, label: &str) -> Result<i32> {
        let c_label = to_cstring("label", label)?;
        self.read_value(|out| unsafe { sys::MM_GetState(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Number of positions of a state device.
    pub fn number_of_states(&self, label: &str) -> Result<i32> {
        let c_label = to_cstring("label", label)?;
        self.read_value(|out| unsafe { sys::MM_GetNumberOfStates(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Move a state device to the position named `state_label`.
    pub fn set_state_label(&self, label: &str, state_label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        let c_state = to_cstring("state_label", state_label)?;
        self.check(unsafe { sys::MM_SetStateLabel(self.as_raw(), c_label.as_ptr(), c_state.as_ptr()) })
    }

    /// Name of the current position.
    pub fn state_label(&self, label: &str) -> Result<String> {
        let c_label = to_cstring("label", label)?;
        self.read_string(|out| unsafe { sys::MM_GetStateLabel(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Name position `state`.
    pub fn define_state_label(&self, label: &str, state: i32, state_label: &str) -> Result<()> {
        let c_label = to_cstring("label", label)?;
        let c_state = to_cstring("state_label", state_label)?;
        self.check(unsafe {
            sys::MM_DefineStateLabel(self.as_raw(), c_label.as_ptr(), state, c_state.as_ptr())
        })
    }

    /// Names of all positions, indexed by state.
    pub fn state_labels(&self, label: &str) -> Result<Vec<String>> {
        let c_label = to_cstring("label", label)?;
        self.read_list(|out| unsafe { sys::MM_GetStateLabels(self.as_raw(), c_label.as_ptr(), out) })
    }

    /// Position carrying the name `state_label`.
    pub fn state_from_label(&self, label: &str, state_label: &str) -> Result<i32> {
        let c_label = to_cstring("label", label)?;
        let c_state = to_cstring("state_label", state_label)?;
        self.read_value(|out| unsafe {
            sys::MM_GetStateFromLabel(self.as_raw(), c_label.as_ptr(), c_state.as_ptr(), out)
        })
    }
}
