//! State and operations of the simulated core.
//!
//! Every operation returns the status code the real core would report. State
//! changes that a device adapter would announce are queued in
//! [`CoreState::pending`] and delivered after the lock is released.

use super::camera::{CameraState, CircularBuffer, Geometry, Roi};
use super::devices::{
    catalogue_entry, format_float, Axis, Device, Hardware, Property, CATALOGUE, MODULE,
};
use super::Notification;
use crate::types::*;

type Outcome<T> = Result<T, MM_Status>;

/// Label under which the core announces its own settings.
pub const CORE_LABEL: &str = "Core";

/// The devices currently assigned to each role.
#[derive(Debug, Default)]
pub struct Roles {
    pub camera: String,
    pub shutter: String,
    pub focus: String,
    pub xy_stage: String,
    pub auto_focus: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Camera,
    Shutter,
    Focus,
    XYStage,
    AutoFocus,
}

impl Role {
    fn kind(self) -> MM_DeviceType {
        match self {
            Role::Camera => MM_CameraDevice,
            Role::Shutter => MM_ShutterDevice,
            Role::Focus => MM_StageDevice,
            Role::XYStage => MM_XYStageDevice,
            Role::AutoFocus => MM_AutoFocusDevice,
        }
    }

    fn mismatch(self) -> MM_Status {
        match self {
            Role::Shutter => MM_ErrInvalidShutterDevice,
            Role::Focus => MM_ErrInvalidStageDevice,
            Role::XYStage => MM_ErrInvalidXYStageDevice,
            Role::Camera | Role::AutoFocus => MM_ErrUnexpectedDevice,
        }
    }

    fn property(self) -> &'static str {
        match self {
            Role::Camera => "Camera",
            Role::Shutter => "Shutter",
            Role::Focus => "Focus",
            Role::XYStage => "XYStage",
            Role::AutoFocus => "AutoFocus",
        }
    }
}

#[derive(Debug, Default)]
pub struct FocusState {
    pub continuous: bool,
    pub offset: f64,
    pub last_score: f64,
}

#[derive(Debug, Default)]
pub struct CoreState {
    pub search_paths: Vec<String>,
    pub devices: Vec<Device>,
    pub roles: Roles,
    pub camera: CameraState,
    pub buffer: CircularBuffer,
    pub focus: FocusState,
    pub pending: Vec<Notification>,
}

fn resolve(label: &str, role: &str) -> String {
    if label.is_empty() {
        role.to_string()
    } else {
        label.to_string()
    }
}

impl CoreState {
    fn property_changed(&mut self, label: &str, property: &str, value: &str) {
        self.pending.push(Notification::Property {
            label: label.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    fn stage_moved(&mut self, label: &str, position: f64) {
        self.pending.push(Notification::StagePosition {
            label: label.to_string(),
            position,
        });
    }

    pub fn device(&self, label: &str) -> Outcome<&Device> {
        self.devices
            .iter()
            .find(|d| d.label == label)
            .ok_or(MM_ErrInvalidLabel)
    }

    fn device_mut(&mut self, label: &str) -> Outcome<&mut Device> {
        self.devices
            .iter_mut()
            .find(|d| d.label == label)
            .ok_or(MM_ErrInvalidLabel)
    }

    fn of_kind_mut(&mut self, label: &str, kind: MM_DeviceType, wrong: MM_Status) -> Outcome<&mut Device> {
        if label.is_empty() {
            return Err(wrong);
        }
        let device = self.device_mut(label)?;
        if device.kind != kind {
            return Err(wrong);
        }
        Ok(device)
    }

    /// Unload everything and forget the configuration.
    pub fn reset(&mut self) {
        self.devices.clear();
        self.roles = Roles::default();
        self.camera = CameraState::default();
        self.buffer.clear();
        self.buffer.capacity = 0;
        self.focus = FocusState::default();
    }

    // --- Device setup ---

    pub fn load_device(&mut self, label: &str, module: &str, name: &str) -> Outcome<()> {
        if label.is_empty() || label == CORE_LABEL {
            return Err(MM_ErrInvalidLabel);
        }
        if self.device(label).is_ok() {
            return Err(MM_ErrDuplicateLabel);
        }
        if module != MODULE {
            return Err(MM_ErrLoadLibraryFailed);
        }
        let device = Device::create(label, name).ok_or(MM_ErrCreateNotFound)?;
        self.devices.push(device);
        Ok(())
    }

    pub fn unload_device(&mut self, label: &str) -> Outcome<()> {
        let index = self
            .devices
            .iter()
            .position(|d| d.label == label)
            .ok_or(MM_ErrInvalidLabel)?;
        self.devices.remove(index);

        for role in [
            &mut self.roles.camera,
            &mut self.roles.shutter,
            &mut self.roles.focus,
            &mut self.roles.xy_stage,
            &mut self.roles.auto_focus,
        ] {
            if *role == label {
                role.clear();
            }
        }
        for device in &mut self.devices {
            if device.parent == label {
                device.parent.clear();
            }
        }
        Ok(())
    }

    pub fn unload_all(&mut self) {
        self.devices.clear();
        self.roles = Roles::default();
    }

    pub fn initialize_all(&mut self) {
        for device in &mut self.devices {
            device.initialized = true;
        }
    }

    pub fn initialize_device(&mut self, label: &str) -> Outcome<()> {
        self.device_mut(label)?.initialized = true;
        Ok(())
    }

    fn check_module(module: &str) -> Outcome<()> {
        if module == MODULE {
            Ok(())
        } else {
            Err(MM_ErrLoadLibraryFailed)
        }
    }

    pub fn available_devices(&self, module: &str) -> Outcome<Vec<String>> {
        Self::check_module(module)?;
        Ok(CATALOGUE.iter().map(|(n, _, _)| n.to_string()).collect())
    }

    pub fn available_descriptions(&self, module: &str) -> Outcome<Vec<String>> {
        Self::check_module(module)?;
        Ok(CATALOGUE.iter().map(|(_, d, _)| d.to_string()).collect())
    }

    pub fn available_types(&self, module: &str) -> Outcome<Vec<MM_DeviceType>> {
        Self::check_module(module)?;
        Ok(CATALOGUE.iter().map(|(_, _, t)| *t).collect())
    }

    // --- Properties ---

    pub fn property_names(&self, label: &str) -> Outcome<Vec<String>> {
        Ok(self.device(label)?.visible_names())
    }

    pub fn has_property(&self, label: &str, name: &str) -> Outcome<bool> {
        Ok(self.device(label)?.visible(name).is_some())
    }

    pub fn property(&self, label: &str, name: &str) -> Outcome<&Property> {
        self.device(label)?.visible(name).ok_or(MM_ErrDEVICE_GENERIC)
    }

    pub fn set_property(&mut self, label: &str, name: &str, value: &str) -> Outcome<()> {
        let device = self.device_mut(label)?;
        let changed = device.set_property(name, value)?;
        let announce = device.initialized;
        let is_camera = device.kind == MM_CameraDevice;

        if is_camera && name == "Binning" {
            self.camera.roi = None;
        }
        if announce {
            for (property, value) in changed {
                self.property_changed(label, &property, &value);
            }
        }
        Ok(())
    }

    pub fn busy(&self, label: &str) -> Outcome<bool> {
        self.device(label).map(|_| false)
    }

    // --- Roles ---

    pub fn set_role(&mut self, role: Role, label: &str) -> Outcome<()> {
        if !label.is_empty() && self.device(label)?.kind != role.kind() {
            return Err(role.mismatch());
        }
        let slot = match role {
            Role::Camera => &mut self.roles.camera,
            Role::Shutter => &mut self.roles.shutter,
            Role::Focus => &mut self.roles.focus,
            Role::XYStage => &mut self.roles.xy_stage,
            Role::AutoFocus => &mut self.roles.auto_focus,
        };
        *slot = label.to_string();
        self.property_changed(CORE_LABEL, role.property(), label);
        Ok(())
    }

    pub fn role(&self, role: Role) -> &str {
        match role {
            Role::Camera => &self.roles.camera,
            Role::Shutter => &self.roles.shutter,
            Role::Focus => &self.roles.focus,
            Role::XYStage => &self.roles.xy_stage,
            Role::AutoFocus => &self.roles.auto_focus,
        }
    }

    // --- Camera ---

    pub fn camera(&self) -> Outcome<&Device> {
        if self.roles.camera.is_empty() {
            return Err(MM_ErrCameraNotAvailable);
        }
        self.device(&self.roles.camera)
    }

    pub fn geometry(&self) -> Outcome<Geometry> {
        let camera = self.camera()?;
        Ok(Geometry::of(camera, self.camera.roi))
    }

    pub fn set_roi(&mut self, x: i32, y: i32, width: i32, height: i32) -> Outcome<()> {
        let sensor = Geometry::sensor(self.camera()?);
        if x < 0 || y < 0 || width <= 0 || height <= 0 || x + width > sensor.width || y + height > sensor.height {
            return Err(MM_ErrDEVICE_GENERIC);
        }
        self.camera.roi = Some(Roi { x, y, width, height });
        Ok(())
    }

    pub fn roi(&self) -> Outcome<Roi> {
        let sensor = Geometry::sensor(self.camera()?);
        Ok(self.camera.roi.unwrap_or(Roi {
            x: 0,
            y: 0,
            width: sensor.width,
            height: sensor.height,
        }))
    }

    pub fn clear_roi(&mut self) -> Outcome<()> {
        self.camera()?;
        self.camera.roi = None;
        Ok(())
    }

    pub fn set_exposure(&mut self, exposure_ms: f64) -> Outcome<()> {
        let label = self.camera()?.label.clone();
        self.set_property(&label, "Exposure", &format_float(exposure_ms))
    }

    pub fn exposure(&self) -> Outcome<f64> {
        let camera = self.camera()?;
        camera
            .visible("Exposure")
            .and_then(|p| p.value.parse().ok())
            .ok_or(MM_ErrDEVICE_GENERIC)
    }

    pub fn snap(&mut self) -> Outcome<()> {
        let camera = self.camera()?;
        if !camera.initialized {
            return Err(MM_ErrCameraNotAvailable);
        }
        let geometry = Geometry::of(camera, self.camera.roi);
        self.camera.frame_counter += 1;
        self.camera.snapped = Some(geometry.render(self.camera.frame_counter));
        Ok(())
    }

    pub fn image(&mut self) -> Outcome<*mut u8> {
        match self.camera.snapped.as_mut() {
            Some(frame) if !frame.is_empty() => Ok(frame.as_mut_ptr()),
            _ => Err(MM_ErrCameraBufferReadFailed),
        }
    }

    // --- Circular buffer ---

    pub fn initialize_buffer(&mut self) -> Outcome<()> {
        let len = self.geometry()?.frame_len();
        if self.buffer.initialize(len) {
            Ok(())
        } else {
            Err(MM_ErrCircularBufferFailedToInitialize)
        }
    }

    pub fn set_footprint(&mut self, size_mb: u32) -> Outcome<()> {
        if size_mb == 0 {
            return Err(MM_ErrCircularBufferFailedToInitialize);
        }
        self.buffer.footprint_mb = size_mb;
        match self.geometry() {
            Ok(geometry) => {
                self.buffer.initialize(geometry.frame_len());
            }
            Err(_) => self.buffer.clear(),
        }
        Ok(())
    }

    pub fn pop_next(&mut self) -> Outcome<*mut u8> {
        let frame = self.buffer.frames.pop_front().ok_or(MM_ErrCircularBufferEmpty)?;
        self.buffer.view = frame;
        Ok(self.buffer.view.as_mut_ptr())
    }

    pub fn last_image(&mut self) -> Outcome<*mut u8> {
        let frame = self.buffer.frames.back().cloned().ok_or(MM_ErrCircularBufferEmpty)?;
        self.buffer.view = frame;
        Ok(self.buffer.view.as_mut_ptr())
    }

    // --- Shutter ---

    pub fn set_shutter_open(&mut self, label: &str, open: bool) -> Outcome<()> {
        let label = resolve(label, &self.roles.shutter);
        let shutter = self.of_kind_mut(&label, MM_ShutterDevice, MM_ErrInvalidShutterDevice)?;
        let changed = shutter.set_property("State", if open { "1" } else { "0" })?;
        for (property, value) in changed {
            self.property_changed(&label, &property, &value);
        }
        Ok(())
    }

    pub fn shutter_open(&mut self, label: &str) -> Outcome<bool> {
        let label = resolve(label, &self.roles.shutter);
        let shutter = self.of_kind_mut(&label, MM_ShutterDevice, MM_ErrInvalidShutterDevice)?;
        Ok(shutter.value("State") == Some("1"))
    }

    // --- Autofocus ---

    fn auto_focus(&self) -> Outcome<&Device> {
        if self.roles.auto_focus.is_empty() {
            return Err(MM_ErrAutoFocusNotAvailable);
        }
        self.device(&self.roles.auto_focus)
    }

    fn focus_z(&self) -> Option<f64> {
        match &self.device(&self.roles.focus).ok()?.hardware {
            Hardware::Stage { z, .. } => Some(z.reported()),
            _ => None,
        }
    }

    fn score_at(&self, z: f64) -> f64 {
        1.0 / (1.0 + (z - self.focus.offset).abs())
    }

    pub fn set_continuous_focus(&mut self, enabled: bool) -> Outcome<()> {
        self.auto_focus()?;
        self.focus.continuous = enabled;
        Ok(())
    }

    pub fn continuous_focus_enabled(&self) -> Outcome<bool> {
        self.auto_focus()?;
        Ok(self.focus.continuous)
    }

    pub fn continuous_focus_locked(&self) -> Outcome<bool> {
        self.auto_focus()?;
        Ok(self.focus.continuous && self.focus_z().is_some())
    }

    pub fn is_continuous_focus_drive(&self, label: &str) -> Outcome<bool> {
        if self.device(label)?.kind != MM_StageDevice {
            return Err(MM_ErrInvalidStageDevice);
        }
        Ok(label == self.roles.focus && !self.roles.auto_focus.is_empty())
    }

    /// Move the focus stage `fraction` of the way to best focus.
    fn focus_towards(&mut self, fraction: f64) -> Outcome<()> {
        self.auto_focus()?;
        let Some(z) = self.focus_z() else {
            self.focus.last_score = 0.0;
            return Ok(());
        };
        let target = z + (self.focus.offset - z) * fraction;
        let label = self.roles.focus.clone();
        self.set_position(&label, target)?;
        self.focus.last_score = self.score_at(target);
        Ok(())
    }

    pub fn full_focus(&mut self) -> Outcome<()> {
        self.focus_towards(1.0)
    }

    pub fn incremental_focus(&mut self) -> Outcome<()> {
        self.focus_towards(0.5)
    }

    pub fn current_focus_score(&self) -> f64 {
        match (self.auto_focus(), self.focus_z()) {
            (Ok(_), Some(z)) => self.score_at(z),
            _ => 0.0,
        }
    }

    pub fn set_auto_focus_offset(&mut self, offset: f64) -> Outcome<()> {
        self.auto_focus()?;
        self.focus.offset = offset;
        Ok(())
    }

    pub fn auto_focus_offset(&self) -> Outcome<f64> {
        self.auto_focus()?;
        Ok(self.focus.offset)
    }

    // --- State devices ---

    fn wheel_mut(&mut self, label: &str) -> Outcome<&mut Device> {
        self.of_kind_mut(label, MM_StateDevice, MM_ErrInvalidStateDevice)
    }

    pub fn set_state(&mut self, label: &str, state: i32) -> Outcome<()> {
        let changed = self.wheel_mut(label)?.set_state(state)?;
        for (property, value) in changed {
            self.property_changed(label, &property, &value);
        }
        Ok(())
    }

    pub fn state(&mut self, label: &str) -> Outcome<i32> {
        self.wheel_mut(label)?.state().ok_or(MM_ErrDEVICE_GENERIC)
    }

    pub fn number_of_states(&mut self, label: &str) -> Outcome<i32> {
        Ok(self.wheel_mut(label)?.state_labels()?.len() as i32)
    }

    pub fn set_state_label(&mut self, label: &str, state_label: &str) -> Outcome<()> {
        let state = self.state_from_label(label, state_label)?;
        self.set_state(label, state)
    }

    pub fn state_label(&mut self, label: &str) -> Outcome<String> {
        let wheel = self.wheel_mut(label)?;
        let state = wheel.state().ok_or(MM_ErrDEVICE_GENERIC)?;
        wheel
            .state_labels()?
            .get(state as usize)
            .cloned()
            .ok_or(MM_ErrDEVICE_GENERIC)
    }

    pub fn define_state_label(&mut self, label: &str, state: i32, state_label: &str) -> Outcome<()> {
        self.wheel_mut(label)?.define_state_label(state, state_label)
    }

    pub fn state_labels(&mut self, label: &str) -> Outcome<Vec<String>> {
        Ok(self.wheel_mut(label)?.state_labels()?.to_vec())
    }

    pub fn state_from_label(&mut self, label: &str, state_label: &str) -> Outcome<i32> {
        self.wheel_mut(label)?
            .state_labels()?
            .iter()
            .position(|l| l == state_label)
            .map(|i| i as i32)
            .ok_or(MM_ErrDEVICE_GENERIC)
    }

    // --- Focus stage ---

    fn stage_mut(&mut self, label: &str) -> Outcome<(String, &mut Device)> {
        let label = resolve(label, &self.roles.focus);
        let device = self.of_kind_mut(&label, MM_StageDevice, MM_ErrInvalidStageDevice)?;
        Ok((label, device))
    }

    fn move_stage(&mut self, label: &str, update: impl FnOnce(&mut Axis)) -> Outcome<()> {
        let (label, device) = self.stage_mut(label)?;
        let Hardware::Stage { z, .. } = &mut device.hardware else {
            return Err(MM_ErrInvalidStageDevice);
        };
        update(z);
        let reported = z.reported();
        self.stage_moved(&label, reported);
        Ok(())
    }

    pub fn set_position(&mut self, label: &str, position: f64) -> Outcome<()> {
        self.move_stage(label, |z| z.set_reported(position))
    }

    pub fn set_relative_position(&mut self, label: &str, delta: f64) -> Outcome<()> {
        self.move_stage(label, |z| {
            let target = z.reported() + delta;
            z.set_reported(target)
        })
    }

    pub fn set_origin(&mut self, label: &str) -> Outcome<()> {
        self.move_stage(label, |z| z.origin = z.raw)
    }

    pub fn set_adapter_origin(&mut self, label: &str, new_z: f64) -> Outcome<()> {
        self.move_stage(label, |z| z.origin = z.raw - new_z)
    }

    pub fn position(&mut self, label: &str) -> Outcome<f64> {
        match &self.stage_mut(label)?.1.hardware {
            Hardware::Stage { z, .. } => Ok(z.reported()),
            _ => Err(MM_ErrInvalidStageDevice),
        }
    }

    pub fn set_focus_direction(&mut self, label: &str, sign: i8) -> Outcome<()> {
        match &mut self.stage_mut(label)?.1.hardware {
            Hardware::Stage { direction, .. } => {
                *direction = sign.signum();
                Ok(())
            }
            _ => Err(MM_ErrInvalidStageDevice),
        }
    }

    pub fn focus_direction(&mut self, label: &str) -> Outcome<i8> {
        match &self.stage_mut(label)?.1.hardware {
            Hardware::Stage { direction, .. } => Ok(*direction),
            _ => Err(MM_ErrInvalidStageDevice),
        }
    }

    // --- XY stage ---

    fn with_xy<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Axis, &mut Axis) -> T,
    ) -> Outcome<T> {
        let label = resolve(label, &self.roles.xy_stage);
        let device = self.of_kind_mut(&label, MM_XYStageDevice, MM_ErrInvalidXYStageDevice)?;
        match &mut device.hardware {
            Hardware::XYStage { x, y } => Ok(f(x, y)),
            _ => Err(MM_ErrInvalidXYStageDevice),
        }
    }

    pub fn set_xy_position(&mut self, label: &str, x: f64, y: f64) -> Outcome<()> {
        self.with_xy(label, |ax, ay| {
            ax.set_reported(x);
            ay.set_reported(y);
        })
    }

    pub fn set_relative_xy_position(&mut self, label: &str, dx: f64, dy: f64) -> Outcome<()> {
        self.with_xy(label, |ax, ay| {
            let (x, y) = (ax.reported() + dx, ay.reported() + dy);
            ax.set_reported(x);
            ay.set_reported(y);
        })
    }

    pub fn xy_position(&mut self, label: &str) -> Outcome<(f64, f64)> {
        self.with_xy(label, |ax, ay| (ax.reported(), ay.reported()))
    }

    pub fn set_origin_xy(&mut self, label: &str, set_x: bool, set_y: bool) -> Outcome<()> {
        self.with_xy(label, |ax, ay| {
            if set_x {
                ax.origin = ax.raw;
            }
            if set_y {
                ay.origin = ay.raw;
            }
        })
    }

    pub fn set_adapter_origin_xy(&mut self, label: &str, new_x: f64, new_y: f64) -> Outcome<()> {
        self.with_xy(label, |ax, ay| {
            ax.origin = ax.raw - new_x;
            ay.origin = ay.raw - new_y;
        })
    }

    pub fn stop(&self, label: &str) -> Outcome<()> {
        match self.device(label)?.kind {
            MM_StageDevice | MM_XYStageDevice => Ok(()),
            _ => Err(MM_ErrInvalidSpecificDevice),
        }
    }

    pub fn home(&mut self, label: &str) -> Outcome<()> {
        match self.device(label)?.kind {
            MM_StageDevice => self.move_stage(label, |z| z.raw = 0.0),
            MM_XYStageDevice => self.with_xy(label, |ax, ay| {
                ax.raw = 0.0;
                ay.raw = 0.0;
            }),
            _ => Err(MM_ErrInvalidSpecificDevice),
        }
    }

    // --- Hub ---

    fn hub(&self, label: &str) -> Outcome<&Device> {
        let device = self.device(label)?;
        if device.kind != MM_HubDevice {
            return Err(MM_ErrInvalidSpecificDevice);
        }
        Ok(device)
    }

    pub fn set_parent_label(&mut self, label: &str, parent: &str) -> Outcome<()> {
        if !parent.is_empty() {
            self.hub(parent)?;
        }
        self.device_mut(label)?.parent = parent.to_string();
        Ok(())
    }

    pub fn parent_label(&self, label: &str) -> Outcome<String> {
        Ok(self.device(label)?.parent.clone())
    }

    pub fn installed_devices(&self, hub: &str) -> Outcome<Vec<String>> {
        self.hub(hub)?;
        Ok(CATALOGUE
            .iter()
            .filter(|(_, _, t)| *t != MM_HubDevice)
            .map(|(n, _, _)| n.to_string())
            .collect())
    }

    pub fn installed_description(&self, hub: &str, name: &str) -> Outcome<String> {
        self.hub(hub)?;
        match catalogue_entry(name) {
            Some((_, description, kind)) if *kind != MM_HubDevice => Ok(description.to_string()),
            _ => Err(MM_ErrDEVICE_GENERIC),
        }
    }

    pub fn loaded_peripherals(&self, hub: &str) -> Outcome<Vec<String>> {
        self.hub(hub)?;
        Ok(self
            .devices
            .iter()
            .filter(|d| d.parent == hub)
            .map(|d| d.label.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> CoreState {
        let mut state = CoreState::default();
        for (label, name) in [
            ("Camera", "DCam"),
            ("Wheel", "DWheel"),
            ("Z", "DStage"),
            ("XY", "DXYStage"),
            ("Shutter", "DShutter"),
            ("AF", "DAutoFocus"),
            ("Hub", "DHub"),
        ] {
            state.load_device(label, MODULE, name).unwrap();
        }
        state.initialize_all();
        state.pending.clear();
        state
    }

    #[test]
    fn test_load_errors() {
        let mut state = loaded();
        assert_eq!(state.load_device("Camera", MODULE, "DCam"), Err(MM_ErrDuplicateLabel));
        assert_eq!(state.load_device("X", "Nope", "DCam"), Err(MM_ErrLoadLibraryFailed));
        assert_eq!(state.load_device("X", MODULE, "Nope"), Err(MM_ErrCreateNotFound));
        assert_eq!(state.load_device("", MODULE, "DCam"), Err(MM_ErrInvalidLabel));
    }

    #[test]
    fn test_roles_check_device_type() {
        let mut state = loaded();
        assert_eq!(state.set_role(Role::Shutter, "Camera"), Err(MM_ErrInvalidShutterDevice));
        assert_eq!(state.set_role(Role::Focus, "XY"), Err(MM_ErrInvalidStageDevice));
        assert_eq!(state.set_role(Role::XYStage, "Z"), Err(MM_ErrInvalidXYStageDevice));
        assert_eq!(state.set_role(Role::Camera, "Nope"), Err(MM_ErrInvalidLabel));

        state.set_role(Role::Camera, "Camera").unwrap();
        assert_eq!(state.role(Role::Camera), "Camera");
        assert_eq!(state.pending.len(), 1);

        state.unload_device("Camera").unwrap();
        assert_eq!(state.role(Role::Camera), "");
    }

    #[test]
    fn test_stage_moves_announce_reported_position() {
        let mut state = loaded();
        state.set_position("Z", 10.0).unwrap();
        state.set_origin("Z").unwrap();
        state.set_relative_position("Z", 2.5).unwrap();
        assert_eq!(state.position("Z").unwrap(), 2.5);

        let positions: Vec<f64> = state
            .pending
            .iter()
            .filter_map(|n| match n {
                Notification::StagePosition { position, .. } => Some(*position),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![10.0, 0.0, 2.5]);
    }

    #[test]
    fn test_empty_label_uses_current_device() {
        let mut state = loaded();
        assert_eq!(state.set_position("", 1.0), Err(MM_ErrInvalidStageDevice));
        state.set_role(Role::Focus, "Z").unwrap();
        state.set_position("", 1.0).unwrap();
        assert_eq!(state.position("Z").unwrap(), 1.0);
    }

    #[test]
    fn test_roi_is_validated_against_sensor() {
        let mut state = loaded();
        assert_eq!(state.set_roi(0, 0, 10, 10), Err(MM_ErrCameraNotAvailable));
        state.set_role(Role::Camera, "Camera").unwrap();
        assert_eq!(state.set_roi(500, 0, 100, 10), Err(MM_ErrDEVICE_GENERIC));
        state.set_roi(10, 20, 100, 50).unwrap();
        assert_eq!(state.geometry().unwrap().frame_len(), 100 * 50);

        state.set_property("Camera", "Binning", "2").unwrap();
        assert_eq!(state.roi().unwrap().width, 256);
    }

    #[test]
    fn test_full_focus_reaches_offset() {
        let mut state = loaded();
        assert_eq!(state.full_focus(), Err(MM_ErrAutoFocusNotAvailable));
        state.set_role(Role::AutoFocus, "AF").unwrap();
        state.set_role(Role::Focus, "Z").unwrap();
        state.set_auto_focus_offset(4.0).unwrap();
        state.full_focus().unwrap();
        assert_eq!(state.position("Z").unwrap(), 4.0);
        assert_eq!(state.focus.last_score, 1.0);
    }

    #[test]
    fn test_hub_peripherals() {
        let mut state = loaded();
        state.set_parent_label("Camera", "Hub").unwrap();
        assert_eq!(state.loaded_peripherals("Hub").unwrap(), vec!["Camera".to_string()]);
        assert_eq!(state.set_parent_label("Camera", "Z"), Err(MM_ErrInvalidSpecificDevice));
        assert!(state.installed_devices("Hub").unwrap().contains(&"DWheel".to_string()));
    }
}
