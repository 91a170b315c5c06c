//! # mmcore
//!
//! Safe Rust binding to the Micro-Manager core through its C interface
//! (MMCoreC), with an event relay that forwards the core's property and stage
//! notifications to Rust subscribers.
//!
//! ## Crate Structure
//!
//! - **`session`**: [`Session`], one RAII-owned core handle with every device,
//!   camera, stage and hub operation as a method.
//! - **`events`**: the process-wide relay from native callbacks to
//!   [`Subscription`]s, with a per-subscriber [`DeliveryPolicy`].
//! - **`error`**: [`CoreError`] for native status codes and [`Error`] for
//!   everything the binding itself can reject.
//! - **`types`**: device and property types, [`PropertyValue`], ROI and image
//!   format.
//! - **`marshal`**: string, list, flag and image conversions at the ABI.
//! - **`config`**: TOML + environment session configuration loaded with
//!   `figment`, and [`Session::apply_config`].
//! - **`logging`**: `tracing-subscriber` setup for applications.
//!
//! The raw declarations live in the `mmcore-sys` crate. Without the
//! `hardware` feature it links a simulated core that offers the `DemoCamera`
//! module, so everything here can be exercised without Micro-Manager
//! installed.
//!
//! ## Example
//!
//! ```no_run
//! use mmcore::{DeliveryPolicy, Session};
//!
//! # fn main() -> mmcore::Result<()> {
//! let session = Session::open()?;
//! session.load_device("Camera", "DemoCamera", "DCam")?;
//! session.initialize_all_devices()?;
//! session.set_camera_device("Camera")?;
//!
//! let mut events = session.subscribe_property_changed(DeliveryPolicy::default());
//! session.set_exposure(25.0)?;
//! session.snap_image()?;
//! let image = session.image()?;
//! println!("{} bytes, {:?}", image.len(), events.try_recv());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod marshal;
pub mod session;
pub mod types;

pub use error::{CoreError, Error, Result};
pub use events::{
    relay, DeliveryPolicy, Event, EventRelay, PropertyChangedEvent, SessionHandle,
    StagePositionChangedEvent, Subscription, MAX_CAPACITY,
};
pub use session::Session;
pub use types::{DeviceType, FocusDirection, ImageFormat, PropertyType, PropertyValue, Roi};

/// Raw ABI, for calls the safe layer does not cover.
pub use mmcore_sys as sys;
