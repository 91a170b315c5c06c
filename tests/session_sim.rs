//! Integration tests for the safe session API against the simulated core.

#![cfg(not(feature = "hardware"))]

use std::time::{Duration, Instant};

use mmcore::{CoreError, DeviceType, Error, FocusDirection, PropertyType, Roi, Session};

fn demo_session() -> Session {
    let session = Session::open().unwrap();
    for (label, device) in [
        ("Camera", "DCam"),
        ("Wheel", "DWheel"),
        ("Z", "DStage"),
        ("XY", "DXYStage"),
        ("Shutter", "DShutter"),
        ("AF", "DAutoFocus"),
        ("Hub", "DHub"),
    ] {
        session.load_device(label, "DemoCamera", device).unwrap();
    }
    session.initialize_all_devices().unwrap();
    session.set_camera_device("Camera").unwrap();
    session.set_focus_device("Z").unwrap();
    session.set_xy_stage_device("XY").unwrap();
    session.set_shutter_device("Shutter").unwrap();
    session.set_auto_focus_device("AF").unwrap();
    session
}

fn core_error<T: std::fmt::Debug>(result: mmcore::Result<T>) -> CoreError {
    result.unwrap_err().core().unwrap()
}

// =============================================================================
// Discovery and setup
// =============================================================================

#[test]
fn test_search_paths_round_trip_in_order() {
    let session = Session::open().unwrap();
    let paths = ["/opt/mm", "/usr/lib/micro-manager", "C:\\Program Files\\Micro-Manager"];
    session.set_device_adapter_search_paths(&paths).unwrap();
    assert_eq!(session.device_adapter_search_paths(), paths);

    session.set_device_adapter_search_paths::<&str>(&[]).unwrap();
    assert!(session.device_adapter_search_paths().is_empty());
}

#[test]
fn test_search_path_with_nul_is_rejected() {
    let session = Session::open().unwrap();
    let err = session.set_device_adapter_search_paths(&["/ok", "/b\0ad"]).unwrap_err();
    assert!(matches!(err, Error::InteriorNul { argument: "paths" }));
}

#[test]
fn test_available_devices_are_parallel_lists() {
    let session = Session::open().unwrap();
    assert_eq!(session.device_adapter_names().unwrap(), vec!["DemoCamera"]);

    let names = session.available_devices("DemoCamera").unwrap();
    let descriptions = session.available_device_descriptions("DemoCamera").unwrap();
    let types = session.available_device_types("DemoCamera").unwrap();
    assert_eq!(names.len(), descriptions.len());
    assert_eq!(names.len(), types.len());

    let cam = names.iter().position(|n| n == "DCam").unwrap();
    assert_eq!(types[cam], DeviceType::Camera);
    let hub = names.iter().position(|n| n == "DHub").unwrap();
    assert_eq!(types[hub], DeviceType::Hub);
}

#[test]
fn test_unknown_module_fails() {
    let session = Session::open().unwrap();
    assert_eq!(
        core_error(session.load_device("Cam", "NoSuchAdapter", "DCam")),
        CoreError::LoadLibraryFailed
    );
}

#[test]
fn test_duplicate_label_and_unknown_device() {
    let session = Session::open().unwrap();
    session.load_device("Camera", "DemoCamera", "DCam").unwrap();
    assert_eq!(
        core_error(session.load_device("Camera", "DemoCamera", "DCam")),
        CoreError::DuplicateLabel
    );
    assert_eq!(
        core_error(session.load_device("Other", "DemoCamera", "DNothing")),
        CoreError::CreateNotFound
    );
    assert_eq!(core_error(session.unload_device("Missing")), CoreError::InvalidLabel);
}

#[test]
fn test_error_messages_are_verbatim() {
    let session = Session::open().unwrap();
    let err = session.unload_device("Missing").unwrap_err();
    assert_eq!(err.to_string(), CoreError::InvalidLabel.to_string());
}

#[test]
fn test_roles_and_reset() {
    let session = demo_session();
    assert_eq!(session.camera_device(), "Camera");
    assert_eq!(session.focus_device(), "Z");
    assert_eq!(session.xy_stage_device(), "XY");
    assert_eq!(session.shutter_device(), "Shutter");
    assert_eq!(session.auto_focus_device(), "AF");

    // A stage cannot be the camera.
    assert!(session.set_camera_device("Z").is_err());

    session.unload_device("Camera").unwrap();
    assert_eq!(session.camera_device(), "");

    session.reset().unwrap();
    assert_eq!(session.focus_device(), "");
    assert!(session.device_busy("Z").is_err());
}

#[test]
fn test_busy_flags() {
    let session = demo_session();
    assert!(!session.device_busy("Z").unwrap());
    assert!(!session.device_type_busy(DeviceType::Stage).unwrap());
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_pre_init_properties_hidden_until_initialized() {
    let session = Session::open().unwrap();
    session.load_device("Camera", "DemoCamera", "DCam").unwrap();

    assert!(session.is_property_pre_init("Camera", "MaximumExposureMs").unwrap());
    assert!(!session.has_property("Camera", "Exposure").unwrap());
    session.set_property("Camera", "MaximumExposureMs", 5000.0).unwrap();

    session.initialize_device("Camera").unwrap();
    assert!(session.has_property("Camera", "Exposure").unwrap());
    assert!(session
        .device_property_names("Camera")
        .unwrap()
        .contains(&"Binning".to_string()));
}

#[test]
fn test_property_metadata() {
    let session = demo_session();
    assert_eq!(session.property("Camera", "Name").unwrap(), "DCam");
    assert!(session.is_property_read_only("Camera", "Name").unwrap());
    assert!(session.is_property_sequenceable("Camera", "Gain").unwrap());
    assert_eq!(session.property_type("Camera", "Exposure").unwrap(), PropertyType::Float);
    assert_eq!(session.property_type("Camera", "Binning").unwrap(), PropertyType::Integer);

    assert!(session.has_property_limits("Camera", "Gain").unwrap());
    assert_eq!(session.property_lower_limit("Camera", "Gain").unwrap(), -5.0);
    assert_eq!(session.property_upper_limit("Camera", "Gain").unwrap(), 8.0);

    assert_eq!(
        session.allowed_property_values("Camera", "PixelType").unwrap(),
        vec!["8bit", "16bit"]
    );
}

#[test]
fn test_rejected_property_values() {
    let session = demo_session();
    assert_eq!(
        core_error(session.set_property("Camera", "Name", "Other")),
        CoreError::SetPropertyFailed
    );
    assert_eq!(
        core_error(session.set_property("Camera", "Gain", 100)),
        CoreError::SetPropertyFailed
    );
    assert_eq!(
        core_error(session.set_property("Camera", "PixelType", "12bit")),
        CoreError::SetPropertyFailed
    );
    assert!(matches!(
        session.set_property("Camera", "PixelType", "8\0bit"),
        Err(Error::InteriorNul { argument: "value" })
    ));
}

// =============================================================================
// Camera
// =============================================================================

#[test]
fn test_image_format_follows_binning_and_pixel_type() {
    let session = demo_session();
    let format = session.image_format();
    assert_eq!((format.width, format.height), (512, 512));
    assert_eq!(format.bytes_per_pixel, 1);
    assert_eq!(format.buffer_len, 512 * 512);

    session.set_property("Camera", "Binning", 2).unwrap();
    session.set_property("Camera", "PixelType", "16bit").unwrap();
    let format = session.image_format();
    assert_eq!((format.width, format.height), (256, 256));
    assert_eq!(format.bytes_per_pixel, 2);
    assert_eq!(format.buffer_len, 256 * 256 * 2);
    assert_eq!(format.components, 1);
    assert_eq!(format.channels, 1);
}

#[test]
fn test_roi_and_exposure() {
    let session = demo_session();
    let roi = Roi {
        x: 10,
        y: 20,
        width: 100,
        height: 50,
    };
    session.set_roi(roi).unwrap();
    assert_eq!(session.roi().unwrap(), roi);
    assert_eq!((session.image_width(), session.image_height()), (100, 50));

    session.clear_roi().unwrap();
    assert_eq!(session.roi().unwrap().width, 512);

    session.set_exposure(42.5).unwrap();
    assert_eq!(session.exposure().unwrap(), 42.5);
}

#[test]
fn test_snap_copies_full_image() {
    let session = demo_session();
    session.snap_image().unwrap();
    let image = session.image().unwrap();
    assert_eq!(image.len(), session.image_buffer_size() as usize);

    // A second snap produces a new frame; the first copy stays intact.
    let first = image.clone();
    session.snap_image().unwrap();
    assert_eq!(image, first);
    assert_eq!(session.image_of_channel(0).unwrap().len(), image.len());
    assert_eq!(core_error(session.image_of_channel(1)), CoreError::CameraBufferReadFailed);
}

#[test]
fn test_snap_without_camera() {
    let session = Session::open().unwrap();
    assert_eq!(core_error(session.snap_image()), CoreError::CameraNotAvailable);
    assert_eq!(core_error(session.image()), CoreError::CameraBufferReadFailed);
}

#[test]
fn test_sequence_acquisition_fills_buffer() {
    let session = demo_session();
    session.set_circular_buffer_memory_footprint(8).unwrap();
    assert_eq!(session.circular_buffer_memory_footprint(), 8);

    session.start_sequence_acquisition(5, 1.0, false).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while session.is_sequence_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!session.is_sequence_running());
    assert_eq!(session.remaining_image_count(), 5);
    assert!(session.buffer_total_capacity() >= 5);
    assert!(!session.is_buffer_overflowed());

    let last = session.last_image().unwrap();
    assert_eq!(last.len(), session.image_buffer_size() as usize);
    for _ in 0..5 {
        session.pop_next_image().unwrap();
    }
    assert_eq!(core_error(session.pop_next_image()), CoreError::CircularBufferEmpty);
}

#[test]
fn test_continuous_sequence_blocks_settings() {
    let session = demo_session();
    session.start_continuous_sequence_acquisition(0.0).unwrap();
    assert!(session.is_sequence_running());
    assert_eq!(
        core_error(session.set_roi(Roi {
            x: 0,
            y: 0,
            width: 8,
            height: 8
        })),
        CoreError::NotAllowedDuringSequenceAcquisition
    );
    session.stop_sequence_acquisition().unwrap();
    assert!(!session.is_sequence_running());

    session.clear_circular_buffer().unwrap();
    assert_eq!(session.remaining_image_count(), 0);
    session.initialize_circular_buffer().unwrap();
    assert_eq!(session.buffer_free_capacity(), session.buffer_total_capacity());
}

#[test]
fn test_invalid_sequence_length() {
    let session = demo_session();
    assert_eq!(
        core_error(session.start_sequence_acquisition(0, 1.0, true)),
        CoreError::InvalidImageSequence
    );
}

// =============================================================================
// State devices, shutter, stages, autofocus, hub
// =============================================================================

#[test]
fn test_state_device_labels() {
    let session = demo_session();
    assert_eq!(session.number_of_states("Wheel").unwrap(), 10);

    session.set_state("Wheel", 3).unwrap();
    assert_eq!(session.state("Wheel").unwrap(), 3);
    assert_eq!(session.state_label("Wheel").unwrap(), "State-3");

    session.define_state_label("Wheel", 4, "GFP").unwrap();
    session.set_state_label("Wheel", "GFP").unwrap();
    assert_eq!(session.state("Wheel").unwrap(), 4);
    assert_eq!(session.state_from_label("Wheel", "GFP").unwrap(), 4);
    assert_eq!(session.state_labels("Wheel").unwrap()[4], "GFP");

    assert_eq!(core_error(session.set_state("Z", 1)), CoreError::InvalidStateDevice);
}

#[test]
fn test_shutter_uses_current_device_for_empty_label() {
    let session = demo_session();
    assert!(!session.shutter_open("").unwrap());
    session.set_shutter_open("", true).unwrap();
    assert!(session.shutter_open("Shutter").unwrap());
    assert_eq!(core_error(session.shutter_open("Z")), CoreError::InvalidShutterDevice);
}

#[test]
fn test_focus_stage() {
    let session = demo_session();
    session.set_position("Z", 12.5).unwrap();
    assert_eq!(session.position("Z").unwrap(), 12.5);
    session.set_relative_position("", -2.5).unwrap();
    assert_eq!(session.position("").unwrap(), 10.0);

    session.set_origin("Z").unwrap();
    assert_eq!(session.position("Z").unwrap(), 0.0);
    session.set_adapter_origin("Z", 100.0).unwrap();
    assert_eq!(session.position("Z").unwrap(), 100.0);

    session.set_focus_direction("Z", FocusDirection::AwayFromSample).unwrap();
    assert_eq!(session.focus_direction("Z").unwrap(), FocusDirection::AwayFromSample);
}

#[test]
fn test_xy_stage() {
    let session = demo_session();
    session.set_xy_position("XY", 100.0, -50.0).unwrap();
    assert_eq!(session.xy_position("XY").unwrap(), (100.0, -50.0));
    session.set_relative_xy_position("", 1.0, 2.0).unwrap();
    assert_eq!(session.x_position("XY").unwrap(), 101.0);
    assert_eq!(session.y_position("XY").unwrap(), -48.0);

    session.set_origin_x("XY").unwrap();
    assert_eq!(session.xy_position("XY").unwrap(), (0.0, -48.0));
    session.set_origin_y("XY").unwrap();
    assert_eq!(session.xy_position("XY").unwrap(), (0.0, 0.0));

    session.set_adapter_origin_xy("XY", 5.0, 6.0).unwrap();
    assert_eq!(session.xy_position("XY").unwrap(), (5.0, 6.0));
    session.set_origin_xy("XY").unwrap();
    assert_eq!(session.xy_position("XY").unwrap(), (0.0, 0.0));

    session.stop("XY").unwrap();
    session.home("XY").unwrap();
    assert_eq!(core_error(session.xy_position("Z")), CoreError::InvalidXYStageDevice);
}

#[test]
fn test_autofocus_moves_focus_stage() {
    let session = demo_session();
    session.set_position("Z", 0.0).unwrap();
    session.set_auto_focus_offset(4.0).unwrap();
    assert_eq!(session.auto_focus_offset().unwrap(), 4.0);

    session.incremental_focus().unwrap();
    assert_eq!(session.position("Z").unwrap(), 2.0);
    session.full_focus().unwrap();
    assert_eq!(session.position("Z").unwrap(), 4.0);
    assert_eq!(session.last_focus_score(), 1.0);
    assert_eq!(session.current_focus_score(), 1.0);

    session.enable_continuous_focus().unwrap();
    assert!(session.is_continuous_focus_enabled().unwrap());
    assert!(session.is_continuous_focus_locked().unwrap());
    assert!(session.is_continuous_focus_drive("Z").unwrap());
    session.disable_continuous_focus().unwrap();
    assert!(!session.is_continuous_focus_enabled().unwrap());
}

#[test]
fn test_autofocus_requires_device() {
    let session = Session::open().unwrap();
    assert_eq!(core_error(session.full_focus()), CoreError::AutoFocusNotAvailable);
    assert_eq!(session.current_focus_score(), 0.0);
}

#[test]
fn test_hub_peripherals() {
    let session = demo_session();
    let installed = session.installed_devices("Hub").unwrap();
    assert!(installed.contains(&"DCam".to_string()));
    assert_eq!(session.installed_device_description("Hub", "DCam").unwrap(), "Demo camera");

    session.set_parent_label("Camera", "Hub").unwrap();
    session.set_parent_label("Wheel", "Hub").unwrap();
    assert_eq!(session.parent_label("Camera").unwrap(), "Hub");
    assert_eq!(session.parent_label("Z").unwrap(), "");
    assert_eq!(session.loaded_peripheral_devices("Hub").unwrap(), vec!["Camera", "Wheel"]);

    assert_eq!(
        core_error(session.set_parent_label("Camera", "Z")),
        CoreError::InvalidSpecificDevice
    );
}

#[test]
fn test_session_info() {
    let session = Session::open().unwrap();
    assert!(session.version_info().starts_with("MMCore version"));
    assert!(!session.host_name().is_empty());
    assert!(!session.mac_addresses().is_empty());
}
