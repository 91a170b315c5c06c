//! Demo camera frames, the circular buffer and the sequence generator thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use super::devices::{Device, SENSOR_HEIGHT, SENSOR_WIDTH};
use super::CoreState;

const MIB: usize = 1024 * 1024;

/// Default circular buffer footprint in MB.
pub const DEFAULT_FOOTPRINT_MB: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Default)]
pub struct CameraState {
    pub roi: Option<Roi>,
    /// Last snapped frame, handed out by `MM_GetImage`.
    pub snapped: Option<Vec<u8>>,
    pub frame_counter: u64,
}

/// Shape of the frames the camera currently produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
    pub bytes_per_pixel: u8,
    pub bit_depth: u8,
}

impl Geometry {
    pub fn of(camera: &Device, roi: Option<Roi>) -> Self {
        let binning: i32 = camera
            .value("Binning")
            .and_then(|b| b.parse().ok())
            .filter(|b: &i32| *b > 0)
            .unwrap_or(1);
        let (bytes_per_pixel, bit_depth) = match camera.value("PixelType") {
            Some("16bit") => (2, 16),
            _ => (1, 8),
        };
        let (width, height) = match roi {
            Some(roi) => (roi.width, roi.height),
            None => (SENSOR_WIDTH / binning, SENSOR_HEIGHT / binning),
        };
        Self {
            width,
            height,
            bytes_per_pixel,
            bit_depth,
        }
    }

    /// Full binned sensor, used to validate ROIs.
    pub fn sensor(camera: &Device) -> Self {
        Self::of(camera, None)
    }

    pub fn frame_len(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize) * self.bytes_per_pixel as usize
    }

    /// Deterministic test pattern, shifted by `counter` so consecutive frames
    /// differ.
    pub fn render(&self, counter: u64) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.frame_len());
        let shift = counter as usize;
        for y in 0..self.height.max(0) as usize {
            for x in 0..self.width.max(0) as usize {
                match self.bytes_per_pixel {
                    2 => {
                        let v = ((x * y + shift) % 4096) as u16;
                        frame.extend_from_slice(&v.to_le_bytes());
                    }
                    _ => frame.push(((x + y + shift) % 256) as u8),
                }
            }
        }
        frame
    }
}

/// FIFO of acquired frames with a capacity derived from the memory footprint.
#[derive(Debug)]
pub struct CircularBuffer {
    pub frames: VecDeque<Vec<u8>>,
    pub capacity: usize,
    pub footprint_mb: u32,
    pub overflowed: bool,
    /// Frame most recently handed out by `MM_PopNextImage` or
    /// `MM_GetLastImage`; the pointer stays valid until the next such call.
    pub view: Vec<u8>,
}

impl Default for CircularBuffer {
    fn default() -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: 0,
            footprint_mb: DEFAULT_FOOTPRINT_MB,
            overflowed: false,
            view: Vec::new(),
        }
    }
}

impl CircularBuffer {
    /// Clear and size the buffer for frames of `frame_len` bytes.
    pub fn initialize(&mut self, frame_len: usize) -> bool {
        self.clear();
        if frame_len == 0 {
            self.capacity = 0;
            return false;
        }
        self.capacity = (self.footprint_mb as usize * MIB / frame_len).max(1);
        true
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.overflowed = false;
    }

    /// Append a frame. Returns `false` when acquisition should stop.
    pub fn insert(&mut self, frame: Vec<u8>, stop_on_overflow: bool) -> bool {
        if self.frames.len() >= self.capacity {
            self.overflowed = true;
            if stop_on_overflow {
                return false;
            }
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        true
    }

    pub fn free(&self) -> usize {
        self.capacity.saturating_sub(self.frames.len())
    }
}

/// A running (or finished) sequence acquisition.
pub struct Acquisition {
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Acquisition {
    /// Spawn the generator thread. `count` of `None` runs until stopped.
    pub fn start(
        state: Arc<Mutex<CoreState>>,
        geometry: Geometry,
        count: Option<usize>,
        interval_ms: f64,
        stop_on_overflow: bool,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        // Never spin: continuous acquisition with a zero interval still yields.
        let interval = Duration::from_secs_f64((interval_ms.max(1.0)) / 1000.0);

        let handle = {
            let stop = Arc::clone(&stop);
            let running = Arc::clone(&running);
            std::thread::Builder::new()
                .name("mmcore-sim-sequence".to_string())
                .spawn(move || {
                    let mut produced = 0usize;
                    while !stop.load(Ordering::Acquire) {
                        if count.is_some_and(|n| produced >= n) {
                            break;
                        }
                        let keep_going = {
                            let mut state = state.lock();
                            state.camera.frame_counter += 1;
                            let frame = geometry.render(state.camera.frame_counter);
                            state.buffer.insert(frame, stop_on_overflow)
                        };
                        if !keep_going {
                            break;
                        }
                        produced += 1;
                        std::thread::sleep(interval);
                    }
                    running.store(false, Ordering::Release);
                })
                .ok()
        };
        if handle.is_none() {
            running.store(false, Ordering::Release);
        }

        Self {
            stop,
            running,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_follows_footprint() {
        let mut buffer = CircularBuffer::default();
        assert!(buffer.initialize(MIB));
        assert_eq!(buffer.capacity, DEFAULT_FOOTPRINT_MB as usize);

        buffer.footprint_mb = 1;
        buffer.initialize(4 * MIB);
        assert_eq!(buffer.capacity, 1);
        assert!(!buffer.initialize(0));
    }

    #[test]
    fn test_overflow_drops_oldest_or_stops() {
        let mut buffer = CircularBuffer::default();
        buffer.footprint_mb = 1;
        buffer.initialize(MIB / 2);

        assert!(buffer.insert(vec![1], false));
        assert!(buffer.insert(vec![2], false));
        assert!(buffer.insert(vec![3], false));
        assert!(buffer.overflowed);
        assert_eq!(buffer.frames.front(), Some(&vec![2]));

        buffer.clear();
        assert!(buffer.insert(vec![1], true));
        assert!(buffer.insert(vec![2], true));
        assert!(!buffer.insert(vec![3], true));
        assert_eq!(buffer.frames.len(), 2);
    }

    #[test]
    fn test_render_shape() {
        let g = Geometry {
            width: 4,
            height: 3,
            bytes_per_pixel: 2,
            bit_depth: 16,
        };
        assert_eq!(g.render(0).len(), g.frame_len());
        assert_ne!(g.render(0), g.render(1));
    }
}
