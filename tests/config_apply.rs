//! Applying a session configuration to the simulated core.

#![cfg(not(feature = "hardware"))]

use std::io::Write;

use mmcore::config::SessionConfig;
use mmcore::{CoreError, DeliveryPolicy, Session};
use serial_test::serial;

const SETUP: &str = r#"
search_paths = ["/opt/mm/adapters", "/usr/local/lib/micro-manager"]

[[devices]]
label = "Camera"
module = "DemoCamera"
device = "DCam"
pre_init = { MaximumExposureMs = 2000.0 }
properties = { Binning = 2, PixelType = "16bit" }

[[devices]]
label = "Emission"
module = "DemoCamera"
device = "DWheel"
properties = { Label = "State-4" }

[[devices]]
label = "Z"
module = "DemoCamera"
device = "DStage"

[roles]
camera = "Camera"
focus = "Z"

[acquisition]
exposure_ms = 33.0
circular_buffer_mb = 16
"#;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_apply_loads_and_configures_devices() {
    let file = write_config(SETUP);
    let config = SessionConfig::load(file.path()).unwrap();
    let session = Session::open().unwrap();
    session.apply_config(&config).unwrap();

    assert_eq!(
        session.device_adapter_search_paths(),
        vec!["/opt/mm/adapters", "/usr/local/lib/micro-manager"]
    );
    assert_eq!(session.property("Camera", "MaximumExposureMs").unwrap(), "2000.0000");
    assert_eq!(session.property("Camera", "Binning").unwrap(), "2");
    assert_eq!(session.state("Emission").unwrap(), 4);

    assert_eq!(session.camera_device(), "Camera");
    assert_eq!(session.focus_device(), "Z");
    assert_eq!(session.shutter_device(), "");

    assert_eq!(session.exposure().unwrap(), 33.0);
    assert_eq!(session.circular_buffer_memory_footprint(), 16);
    assert_eq!(session.image_format().bytes_per_pixel, 2);
}

#[test]
#[serial]
fn test_apply_reports_events_to_configured_policy() {
    let config = SessionConfig::from_toml_str(SETUP).unwrap();
    assert_eq!(config.events.policy, DeliveryPolicy::default());

    let session = Session::open().unwrap();
    let mut events = session.subscribe_property_changed(DeliveryPolicy::DropNewest { capacity: 64 });
    session.apply_config(&config).unwrap();

    let seen = events.drain();
    assert!(seen
        .iter()
        .any(|e| e.label == "Core" && e.property == "Camera" && e.value == "Camera"));
    assert!(seen.iter().any(|e| e.label == "Emission" && e.property == "Label"));
    assert_eq!(events.dropped(), 0);
}

#[test]
#[serial]
fn test_apply_stops_at_first_failure() {
    let text = r#"
        [[devices]]
        label = "Camera"
        module = "DemoCamera"
        device = "DCam"

        [roles]
        camera = "Missing"
    "#;
    let config = SessionConfig::from_toml_str(text).unwrap();
    let session = Session::open().unwrap();

    let err = session.apply_config(&config).unwrap_err();
    assert_eq!(err.core(), Some(CoreError::InvalidLabel));
    // Steps before the failure took effect.
    assert!(session.has_property("Camera", "Exposure").unwrap());
}

#[test]
#[serial]
fn test_env_override_applies() {
    let file = write_config(SETUP);
    std::env::set_var("MMCORE_ACQUISITION__EXPOSURE_MS", "12.5");
    let loaded = SessionConfig::load(file.path());
    std::env::remove_var("MMCORE_ACQUISITION__EXPOSURE_MS");

    let config = loaded.unwrap();
    let session = Session::open().unwrap();
    session.apply_config(&config).unwrap();
    assert_eq!(session.exposure().unwrap(), 12.5);
}

#[test]
#[serial]
fn test_example_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/session.example.toml");
    let config = SessionConfig::load(path).unwrap();
    let session = Session::open().unwrap();
    session.apply_config(&config).unwrap();
    assert_eq!(session.auto_focus_device(), "Autofocus");
}
