//! Camera settings, snapping and sequence acquisition.
//!
//! Image pointers handed out by the core point into its own buffers and are
//! only valid until the next acquisition call, so every image is copied into
//! an owned `Vec<u8>` of [`image_buffer_size`](Session::image_buffer_size)
//! bytes before the call returns.

use std::os::raw::c_int;
use std::ptr;

use mmcore_sys as sys;
use tracing::{debug, info};

use super::Session;
use crate::error::Result;
use crate::marshal::{copy_image, from_flag, to_flag};
use crate::types::{ImageFormat, Roi};

impl Session {
    /// Set the region of interest of the current camera.
    pub fn set_roi(&self, roi: Roi) -> Result<()> {
        self.check(unsafe { sys::MM_SetROI(self.as_raw(), roi.x, roi.y, roi.width, roi.height) })
    }

    /// Region of interest of the current camera.
    pub fn roi(&self) -> Result<Roi> {
        let (mut x, mut y, mut width, mut height): (c_int, c_int, c_int, c_int) = (0, 0, 0, 0);
        self.check(unsafe { sys::MM_GetROI(self.as_raw(), &mut x, &mut y, &mut width, &mut height) })?;
        Ok(Roi { x, y, width, height })
    }

    /// Reset the region of interest to the full sensor.
    pub fn clear_roi(&self) -> Result<()> {
        self.check(unsafe { sys::MM_ClearROI(self.as_raw()) })
    }

    /// Set the exposure of the current camera in milliseconds.
    pub fn set_exposure(&self, exposure_ms: f64) -> Result<()> {
        self.check(unsafe { sys::MM_SetExposure(self.as_raw(), exposure_ms) })
    }

    /// Exposure of the current camera in milliseconds.
    pub fn exposure(&self) -> Result<f64> {
        self.read_value(|out| unsafe { sys::MM_GetExposure(self.as_raw(), out) })
    }

    /// Image width in pixels.
    pub fn image_width(&self) -> u16 {
        self.out_value(|out| unsafe { sys::MM_GetImageWidth(self.as_raw(), out) })
    }

    /// Image height in pixels.
    pub fn image_height(&self) -> u16 {
        self.out_value(|out| unsafe { sys::MM_GetImageHeight(self.as_raw(), out) })
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u8 {
        self.out_value(|out| unsafe { sys::MM_GetBytesPerPixel(self.as_raw(), out) })
    }

    /// Significant bits per pixel.
    pub fn image_bit_depth(&self) -> u8 {
        self.out_value(|out| unsafe { sys::MM_GetImageBitDepth(self.as_raw(), out) })
    }

    /// Components per pixel.
    pub fn number_of_components(&self) -> u8 {
        self.out_value(|out| unsafe { sys::MM_GetNumberOfComponents(self.as_raw(), out) })
    }

    /// Number of simultaneous camera channels.
    pub fn number_of_camera_channels(&self) -> u8 {
        self.out_value(|out| unsafe { sys::MM_GetNumberOfCameraChannels(self.as_raw(), out) })
    }

    /// Size of one image in bytes.
    pub fn image_buffer_size(&self) -> u32 {
        self.out_value(|out| unsafe { sys::MM_GetImageBufferSize(self.as_raw(), out) })
    }

    /// All of the image shape queries in one value.
    pub fn image_format(&self) -> ImageFormat {
        ImageFormat {
            width: self.image_width(),
            height: self.image_height(),
            bytes_per_pixel: self.bytes_per_pixel(),
            bit_depth: self.image_bit_depth(),
            components: self.number_of_components(),
            channels: self.number_of_camera_channels(),
            buffer_len: self.image_buffer_size(),
        }
    }

    /// Expose one image with the current camera.
    pub fn snap_image(&self) -> Result<()> {
        self.check(unsafe { sys::MM_SnapImage(self.as_raw()) })
    }

    /// Copy of the last snapped image. Empty if the core has no image.
    pub fn image(&self) -> Result<Vec<u8>> {
        self.read_image(|out| unsafe { sys::MM_GetImage(self.as_raw(), out) })
    }

    /// Copy of one channel of the last snapped image.
    pub fn image_of_channel(&self, channel: u16) -> Result<Vec<u8>> {
        self.read_image(|out| unsafe { sys::MM_GetImageOfChannel(self.as_raw(), channel, out) })
    }

    // --- sequence acquisition ---

    /// Acquire `count` images into the circular buffer, `interval_ms` apart.
    pub fn start_sequence_acquisition(&self, count: i16, interval_ms: f64, stop_on_overflow: bool) -> Result<()> {
        self.check(unsafe {
            sys::MM_StartSequenceAcquisition(self.as_raw(), count, interval_ms, to_flag(stop_on_overflow))
        })?;
        info!(count, interval_ms, "Started sequence acquisition");
        Ok(())
    }

    /// Acquire into the circular buffer until stopped.
    pub fn start_continuous_sequence_acquisition(&self, interval_ms: f64) -> Result<()> {
        self.check(unsafe { sys::MM_StartContinuousSequenceAcquisition(self.as_raw(), interval_ms) })?;
        info!(interval_ms, "Started continuous sequence acquisition");
        Ok(())
    }

    /// Stop a running sequence acquisition.
    pub fn stop_sequence_acquisition(&self) -> Result<()> {
        self.check(unsafe { sys::MM_StopSequenceAcquisition(self.as_raw()) })?;
        info!("Stopped sequence acquisition");
        Ok(())
    }

    /// Whether a sequence acquisition is running.
    pub fn is_sequence_running(&self) -> bool {
        from_flag(self.out_value(|out| unsafe { sys::MM_IsSequenceRunning(self.as_raw(), out) }))
    }

    // --- circular buffer ---

    /// Copy of the most recent image in the circular buffer.
    pub fn last_image(&self) -> Result<Vec<u8>> {
        self.read_image(|out| unsafe { sys::MM_GetLastImage(self.as_raw(), out) })
    }

    /// Remove the oldest image from the circular buffer and return a copy.
    pub fn pop_next_image(&self) -> Result<Vec<u8>> {
        self.read_image(|out| unsafe { sys::MM_PopNextImage(self.as_raw(), out) })
    }

    /// Images waiting in the circular buffer.
    pub fn remaining_image_count(&self) -> i16 {
        self.out_value(|out| unsafe { sys::MM_GetRemainingImageCount(self.as_raw(), out) })
    }

    /// Capacity of the circular buffer in images.
    pub fn buffer_total_capacity(&self) -> i16 {
        self.out_value(|out| unsafe { sys::MM_GetBufferTotalCapacity(self.as_raw(), out) })
    }

    /// Free slots in the circular buffer.
    pub fn buffer_free_capacity(&self) -> i16 {
        self.out_value(|out| unsafe { sys::MM_GetBufferFreeCapacity(self.as_raw(), out) })
    }

    /// Whether the circular buffer overflowed since it was last initialized.
    pub fn is_buffer_overflowed(&self) -> bool {
        from_flag(self.out_value(|out| unsafe { sys::MM_IsBufferOverflowed(self.as_raw(), out) }))
    }

    /// Set the size of the circular buffer in megabytes.
    pub fn set_circular_buffer_memory_footprint(&self, size_mb: u32) -> Result<()> {
        self.check(unsafe { sys::MM_SetCircularBufferMemoryFootprint(self.as_raw(), size_mb) })?;
        debug!(size_mb, "Set circular buffer footprint");
        Ok(())
    }

    /// Size of the circular buffer in megabytes.
    pub fn circular_buffer_memory_footprint(&self) -> u32 {
        self.out_value(|out| unsafe { sys::MM_GetCircularBufferMemoryFootprint(self.as_raw(), out) })
    }

    /// Allocate the circular buffer for the current image size.
    pub fn initialize_circular_buffer(&self) -> Result<()> {
        self.check(unsafe { sys::MM_InitializeCircularBuffer(self.as_raw()) })
    }

    /// Drop every image in the circular buffer.
    pub fn clear_circular_buffer(&self) -> Result<()> {
        self.check(unsafe { sys::MM_ClearCircularBuffer(self.as_raw()) })
    }

    fn read_image(&self, f: impl FnOnce(*mut *mut u8) -> sys::MM_Status) -> Result<Vec<u8>> {
        let mut buffer: *mut u8 = ptr::null_mut();
        self.check(f(&mut buffer))?;
        let len = self.image_buffer_size() as usize;
        // SAFETY: the core guarantees `image_buffer_size` readable bytes at a
        // returned image pointer until the next acquisition call.
        Ok(unsafe { copy_image(buffer, len) }.unwrap_or_default())
    }
}
