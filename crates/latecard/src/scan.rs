//! Core scan types for latecard.
//!
//! This module defines the camera abstraction the scan session runs against:
//! frames, the bounded detection region, decoded-payload events, and the
//! traits that device backends and payload decoders implement. A simulated
//! loopback backend is provided for tests and the `--simulate` CLI mode.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Logical camera facing preference.
///
/// The station prefers the rear camera so the operator can keep the screen
/// toward themselves while students present their id cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// Rear-facing (environment) camera.
    #[default]
    Rear,
    /// Front-facing (user) camera.
    Front,
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rear => write!(f, "rear"),
            Self::Front => write!(f, "front"),
        }
    }
}

/// Logical device selector passed to a camera backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CameraConstraint {
    /// Facing preference.
    pub facing: CameraFacing,
    /// Explicit device path, overriding facing-based selection.
    pub device: Option<String>,
}

impl CameraConstraint {
    /// Constraint preferring the rear-facing camera.
    #[must_use]
    pub fn rear() -> Self {
        Self {
            facing: CameraFacing::Rear,
            device: None,
        }
    }
}

/// A single camera frame as a luma byte plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Luma plane, row-major, `width * height` bytes for real frames.
    pub data: Vec<u8>,
}

/// Magic prefix marking a simulated frame that carries an encoded payload.
const SIM_PAYLOAD_MAGIC: &[u8] = b"QR1:";

impl Frame {
    /// Create an empty frame with the given dimensions.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: Vec::new(),
        }
    }

    /// Create a simulated frame carrying an encoded payload.
    ///
    /// Only [`SimulatedDecoder`] understands this encoding; real decoders
    /// operate on the luma plane.
    #[must_use]
    pub fn with_payload(width: u32, height: u32, payload: &str) -> Self {
        let mut data = Vec::with_capacity(SIM_PAYLOAD_MAGIC.len() + payload.len());
        data.extend_from_slice(SIM_PAYLOAD_MAGIC);
        data.extend_from_slice(payload.as_bytes());
        Self {
            width,
            height,
            data,
        }
    }
}

/// The bounded, centered detection region a decoder scans per tick.
///
/// Scanning a fixed centered box rather than the full frame bounds CPU cost
/// and false-positive area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegion {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
}

impl ScanRegion {
    /// Compute the centered square region of side `box_size` within a frame,
    /// clamped to the frame dimensions.
    #[must_use]
    pub fn centered(frame_width: u32, frame_height: u32, box_size: u32) -> Self {
        let width = box_size.min(frame_width);
        let height = box_size.min(frame_height);
        Self {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        }
    }
}

/// A decoded payload emitted by the scan session.
///
/// The payload is an opaque string; it is delivered exactly once per decode
/// and is not retained by the session after emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// The raw decoded text.
    pub payload: String,
    /// When the decode happened.
    pub at: DateTime<Utc>,
}

impl ScanEvent {
    /// Create an event for a payload decoded now.
    #[must_use]
    pub fn now(payload: String) -> Self {
        Self {
            payload,
            at: Utc::now(),
        }
    }
}

/// A camera device backend.
///
/// Implementors provide device acquisition for a specific platform or, for
/// tests, a scripted source. Acquisition and release are the only operations
/// that suspend; frame delivery follows the device cadence.
#[async_trait::async_trait]
pub trait CameraBackend: Send + Sync {
    /// The name of this backend (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Acquire the camera matching the given constraint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] when permission is denied, no
    /// device is present, or the device is held by another session.
    async fn open(&self, constraint: &CameraConstraint) -> Result<Box<dyn CameraStream>>;
}

/// An acquired camera stream.
///
/// The stream owns the device handle; `close` releases it deterministically.
#[async_trait::async_trait]
pub trait CameraStream: Send {
    /// Deliver the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamFailed`] on unrecoverable stream errors
    /// (e.g. the device was unplugged).
    async fn next_frame(&mut self) -> Result<Frame>;

    /// Release the camera device.
    ///
    /// Must be safe to call more than once.
    async fn close(&mut self);
}

/// A payload decoder applied to each frame's detection region.
///
/// Decoders are frame-synchronous: a `None` result is expected steady-state
/// noise, not an error.
pub trait PayloadDecoder: Send + Sync {
    /// Attempt to extract a payload from the region of the given frame.
    fn decode(&self, frame: &Frame, region: ScanRegion) -> Option<String>;
}

/// Decoder for the simulated frame encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedDecoder;

impl PayloadDecoder for SimulatedDecoder {
    fn decode(&self, frame: &Frame, region: ScanRegion) -> Option<String> {
        if region.width == 0 || region.height == 0 {
            return None;
        }
        let encoded = frame.data.strip_prefix(SIM_PAYLOAD_MAGIC)?;
        std::str::from_utf8(encoded).ok().map(str::to_string)
    }
}

/// A scripted camera backend for tests and the `--simulate` CLI mode.
///
/// Each script entry is one frame: `Some(payload)` produces a frame the
/// [`SimulatedDecoder`] will decode, `None` an empty frame. After the script
/// is exhausted the stream keeps delivering empty frames. The backend counts
/// concurrent acquisitions so tests can assert the single-acquisition
/// invariant.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    script: Vec<Option<String>>,
    deny: Arc<std::sync::Mutex<Option<String>>>,
    acquired: Arc<AtomicUsize>,
    peak_acquired: Arc<AtomicUsize>,
}

impl SimulatedCamera {
    /// Create a backend that grants acquisition and plays the given script.
    #[must_use]
    pub fn scripted(script: Vec<Option<String>>) -> Self {
        Self {
            script,
            deny: Arc::new(std::sync::Mutex::new(None)),
            acquired: Arc::new(AtomicUsize::new(0)),
            peak_acquired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a backend that refuses acquisition with the given reason.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        let camera = Self::scripted(Vec::new());
        camera.deny(reason);
        camera
    }

    /// Refuse subsequent acquisitions with the given reason.
    pub fn deny(&self, reason: impl Into<String>) {
        *self.deny.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(reason.into());
    }

    /// Grant subsequent acquisitions again.
    pub fn allow(&self) {
        *self.deny.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    /// Number of streams currently holding the device.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous acquisitions observed.
    #[must_use]
    pub fn peak_acquired(&self) -> usize {
        self.peak_acquired.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CameraBackend for SimulatedCamera {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn open(&self, _constraint: &CameraConstraint) -> Result<Box<dyn CameraStream>> {
        if let Some(reason) = self
            .deny
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
        {
            return Err(Error::camera_unavailable(reason));
        }

        let now = self.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_acquired.fetch_max(now, Ordering::SeqCst);

        Ok(Box::new(SimulatedStream {
            script: self.script.clone().into_iter(),
            acquired: Arc::clone(&self.acquired),
            released: false,
        }))
    }
}

struct SimulatedStream {
    script: std::vec::IntoIter<Option<String>>,
    acquired: Arc<AtomicUsize>,
    released: bool,
}

#[async_trait::async_trait]
impl CameraStream for SimulatedStream {
    async fn next_frame(&mut self) -> Result<Frame> {
        match self.script.next() {
            Some(Some(payload)) => Ok(Frame::with_payload(640, 480, &payload)),
            Some(None) | None => Ok(Frame::blank(640, 480)),
        }
    }

    async fn close(&mut self) {
        if !self.released {
            self.released = true;
            self.acquired.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        // A dropped-but-unclosed stream still frees the device; the session
        // is expected to close explicitly before this runs.
        if !self.released {
            self.acquired.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
