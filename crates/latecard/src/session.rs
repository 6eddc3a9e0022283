//! Scan session lifecycle management.
//!
//! This module owns the full lifecycle of a camera-backed decode stream:
//! acquire the camera, drive the decode loop at a bounded rate, emit decoded
//! payloads to a single-subscriber channel, and release the camera
//! deterministically on every exit path.
//!
//! The session is a state machine:
//!
//! ```text
//! Idle -> Starting -> Running -> Stopping -> Idle
//!            |            |
//!            v            v
//!          Failed       Failed
//! ```
//!
//! `Failed` is not terminal; a subsequent [`ScanSession::activate`] is the
//! recovery path. At most one camera acquisition exists per session at any
//! instant: `activate` fully tears down the previous stream (camera released)
//! before a new acquisition begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::scan::{
    CameraBackend, CameraConstraint, CameraStream, PayloadDecoder, ScanEvent, ScanRegion,
};

/// Lifecycle status of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No stream active, no camera held.
    Idle,
    /// Camera acquisition in progress.
    Starting,
    /// Decode loop running against an acquired camera.
    Running,
    /// Teardown in progress.
    Stopping,
    /// Acquisition or stream failed; see [`ScanSession::last_error`].
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Tuning options for a scan session.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Logical camera selector.
    pub constraint: CameraConstraint,
    /// Interval between decode attempts.
    pub interval: Duration,
    /// Side length in pixels of the centered detection region.
    pub scan_box: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            constraint: CameraConstraint::rear(),
            interval: Duration::from_millis(100),
            scan_box: 250,
        }
    }
}

/// Shared state between the session handle and its decode-loop task.
#[derive(Debug)]
struct SessionShared {
    status: Mutex<SessionStatus>,
    last_error: Mutex<Option<String>>,
    stop: AtomicBool,
}

impl SessionShared {
    fn set_status(&self, status: SessionStatus) {
        *self
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn status(&self) -> SessionStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_error(&self, reason: Option<String>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = reason;
    }

    fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A camera-backed scan session.
///
/// The session is owned by whatever renders the scan surface; it is created
/// on activation and must be deactivated (or dropped) when the surface goes
/// away. The decode-loop task owns the camera stream, so the device is
/// released on every exit path — explicit deactivation, subscriber hang-up,
/// stream failure, or the owner dropping the session.
pub struct ScanSession {
    backend: Arc<dyn CameraBackend>,
    decoder: Arc<dyn PayloadDecoder>,
    options: ScanOptions,
    shared: Arc<SessionShared>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("backend", &self.backend.name())
            .field("status", &self.status())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ScanSession {
    /// Create an idle session over the given backend and decoder.
    #[must_use]
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        decoder: Arc<dyn PayloadDecoder>,
        options: ScanOptions,
    ) -> Self {
        Self {
            backend,
            decoder,
            options,
            shared: Arc::new(SessionShared {
                status: Mutex::new(SessionStatus::Idle),
                last_error: Mutex::new(None),
                stop: AtomicBool::new(false),
            }),
            task: None,
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.shared.status()
    }

    /// Reason for the most recent failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error()
    }

    /// Check if the decode loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// Acquire the camera and start the decode loop.
    ///
    /// Any previous stream is fully torn down first — including camera
    /// release — so two acquisitions never overlap. On success the session
    /// is `Running` and decoded payloads flow to `events`; each successful
    /// decode emits exactly one [`ScanEvent`], and per-frame non-detections
    /// emit nothing. The loop keeps scanning after a match; stopping is the
    /// caller's decision via [`ScanSession::deactivate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`](crate::error::Error::CameraUnavailable)
    /// when the camera cannot be
    /// acquired (permission denied, no device, device busy). The session is
    /// left `Failed`; calling `activate` again is the recovery path.
    pub async fn activate(&mut self, events: mpsc::Sender<ScanEvent>) -> Result<()> {
        // Serialize with any prior activation: complete teardown before a
        // new acquisition begins.
        self.deactivate().await;

        self.shared.set_error(None);
        self.shared.stop.store(false, Ordering::SeqCst);
        self.shared.set_status(SessionStatus::Starting);
        debug!(backend = self.backend.name(), "acquiring camera");

        let stream = match self.backend.open(&self.options.constraint).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "camera acquisition failed");
                self.shared.set_error(Some(err.to_string()));
                self.shared.set_status(SessionStatus::Failed);
                return Err(err);
            }
        };

        self.shared.set_status(SessionStatus::Running);
        info!(backend = self.backend.name(), "scan session running");

        let shared = Arc::clone(&self.shared);
        let decoder = Arc::clone(&self.decoder);
        let interval = self.options.interval;
        let scan_box = self.options.scan_box;
        self.task = Some(tokio::spawn(decode_loop(
            stream, shared, decoder, interval, scan_box, events,
        )));

        Ok(())
    }

    /// Stop the decode loop and release the camera.
    ///
    /// Returns only after the stream has been closed and the device
    /// released. Idempotent: a no-op when already `Idle`. A `Failed` status
    /// is left in place so the caller can still read the reason.
    pub async fn deactivate(&mut self) {
        let Some(task) = self.task.take() else {
            // Nothing running; keep Failed visible, otherwise ensure Idle.
            if self.status() != SessionStatus::Failed {
                self.shared.set_status(SessionStatus::Idle);
            }
            return;
        };

        self.shared.set_status(SessionStatus::Stopping);
        self.shared.stop.store(true, Ordering::SeqCst);
        debug!("stopping scan session");

        // The loop task closes the stream before exiting; awaiting it is
        // what makes camera release deterministic.
        if task.await.is_err() {
            warn!("decode loop task panicked during teardown");
        }

        // The loop records a reason whenever it failed; that failure outlives
        // teardown so the caller can still read it.
        if self.shared.last_error().is_some() {
            self.shared.set_status(SessionStatus::Failed);
        } else {
            self.shared.set_status(SessionStatus::Idle);
        }
        info!("scan session stopped");
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // The loop task owns the stream and closes it once it observes the
        // stop flag, so dropping the session never leaves the camera held.
        self.shared.stop.store(true, Ordering::SeqCst);
    }
}

/// The decode loop. Owns the stream for its whole lifetime and closes it on
/// every exit path.
async fn decode_loop(
    mut stream: Box<dyn CameraStream>,
    shared: Arc<SessionShared>,
    decoder: Arc<dyn PayloadDecoder>,
    interval: Duration,
    scan_box: u32,
    events: mpsc::Sender<ScanEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }

        let frame = match stream.next_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "scan stream failed");
                shared.set_error(Some(err.to_string()));
                shared.set_status(SessionStatus::Failed);
                break;
            }
        };
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }

        let region = ScanRegion::centered(frame.width, frame.height, scan_box);
        // Non-detections are steady-state noise; only a hit is reported.
        if let Some(payload) = decoder.decode(&frame, region) {
            debug!(payload = %payload, "decoded payload");
            if events.send(ScanEvent::now(payload)).await.is_err() {
                // Subscriber hung up; treat as a stop request.
                debug!("event subscriber dropped, stopping decode loop");
                shared.set_status(SessionStatus::Idle);
                break;
            }
        }
    }

    stream.close().await;
    debug!("camera released");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::scan::{Frame, SimulatedCamera, SimulatedDecoder};

    fn options() -> ScanOptions {
        ScanOptions {
            interval: Duration::from_millis(1),
            ..ScanOptions::default()
        }
    }

    fn session(camera: &SimulatedCamera) -> ScanSession {
        ScanSession::new(
            Arc::new(camera.clone()),
            Arc::new(SimulatedDecoder),
            options(),
        )
    }

    /// Stream that delivers one good frame, then fails.
    struct FlakyStream {
        delivered: bool,
        acquired: Arc<std::sync::atomic::AtomicUsize>,
        open: bool,
    }

    #[async_trait::async_trait]
    impl CameraStream for FlakyStream {
        async fn next_frame(&mut self) -> Result<Frame> {
            if self.delivered {
                Err(Error::stream_failed("device unplugged"))
            } else {
                self.delivered = true;
                Ok(Frame::blank(640, 480))
            }
        }

        async fn close(&mut self) {
            if self.open {
                self.open = false;
                self.acquired.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    struct FlakyCamera {
        acquired: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl CameraBackend for FlakyCamera {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn open(&self, _constraint: &CameraConstraint) -> Result<Box<dyn CameraStream>> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FlakyStream {
                delivered: false,
                acquired: Arc::clone(&self.acquired),
                open: true,
            }))
        }
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn activate_decodes_and_emits_payload() {
        let camera = SimulatedCamera::scripted(vec![None, Some("12344321".to_string())]);
        let mut session = session(&camera);
        let (tx, mut rx) = mpsc::channel(8);

        session.activate(tx).await.unwrap();
        assert_eq!(session.status(), SessionStatus::Running);

        let event = rx.recv().await.expect("decode event expected");
        assert_eq!(event.payload, "12344321");

        session.deactivate().await;
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn non_detections_emit_nothing() {
        let camera = SimulatedCamera::scripted(vec![None, None, None, None]);
        let mut session = session(&camera);
        let (tx, mut rx) = mpsc::channel(8);

        session.activate(tx).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        session.deactivate().await;

        assert!(rx.try_recv().is_err());
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn each_detection_emits_exactly_one_event() {
        let camera = SimulatedCamera::scripted(vec![
            None,
            Some("12344321".to_string()),
            None,
            Some("67890".to_string()),
        ]);
        let mut session = session(&camera);
        let (tx, mut rx) = mpsc::channel(8);

        session.activate(tx).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.payload, "12344321");
        assert_eq!(second.payload, "67890");

        session.deactivate().await;
        // Script exhausted: no further events were produced.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn denied_camera_fails_without_events() {
        let camera = SimulatedCamera::denied("camera permission denied");
        let mut session = session(&camera);
        let (tx, mut rx) = mpsc::channel(8);

        let err = session.activate(tx).await.unwrap_err();
        assert!(err.is_camera_error());
        assert_eq!(session.status(), SessionStatus::Failed);
        let reason = session.last_error().expect("failure reason expected");
        assert!(!reason.is_empty());

        assert!(rx.try_recv().is_err());
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn failed_session_recovers_on_next_activate() {
        let camera = SimulatedCamera::denied("device busy");
        let mut session = session(&camera);
        let (tx, _rx) = mpsc::channel(8);
        assert!(session.activate(tx).await.is_err());
        assert_eq!(session.status(), SessionStatus::Failed);

        camera.allow();
        let (tx, _rx) = mpsc::channel(8);
        session.activate(tx).await.unwrap();
        assert_eq!(session.status(), SessionStatus::Running);
        assert!(session.last_error().is_none());

        session.deactivate().await;
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn reactivation_never_overlaps_acquisitions() {
        let camera = SimulatedCamera::scripted(vec![None; 16]);
        let mut session = session(&camera);

        for _ in 0..3 {
            let (tx, _rx) = mpsc::channel(8);
            session.activate(tx).await.unwrap();
        }
        session.deactivate().await;

        assert_eq!(camera.peak_acquired(), 1);
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn deactivate_when_idle_is_noop() {
        let camera = SimulatedCamera::scripted(vec![]);
        let mut session = session(&camera);

        session.deactivate().await;
        session.deactivate().await;
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn immediate_deactivate_releases_camera() {
        let camera = SimulatedCamera::scripted(vec![None; 16]);
        let mut session = session(&camera);
        let (tx, _rx) = mpsc::channel(8);

        session.activate(tx).await.unwrap();
        session.deactivate().await;

        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(camera.acquired(), 0);
    }

    #[tokio::test]
    async fn stream_failure_sets_failed_and_releases() {
        let acquired = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let backend = FlakyCamera {
            acquired: Arc::clone(&acquired),
        };
        let mut session = ScanSession::new(Arc::new(backend), Arc::new(SimulatedDecoder), options());
        let (tx, _rx) = mpsc::channel(8);

        session.activate(tx).await.unwrap();
        wait_until(|| session.status() == SessionStatus::Failed).await;

        let reason = session.last_error().expect("failure reason expected");
        assert!(reason.contains("unplugged"));
        wait_until(|| acquired.load(Ordering::SeqCst) == 0).await;

        // Deactivate after failure keeps the failure visible.
        session.deactivate().await;
        assert_eq!(session.status(), SessionStatus::Failed);
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn dropping_session_releases_camera() {
        let camera = SimulatedCamera::scripted(vec![None; 64]);
        {
            let mut session = session(&camera);
            let (tx, _rx) = mpsc::channel(8);
            session.activate(tx).await.unwrap();
            assert_eq!(camera.acquired(), 1);
        }
        wait_until(|| camera.acquired() == 0).await;
    }

    #[tokio::test]
    async fn subscriber_hangup_stops_loop_and_releases() {
        let camera = SimulatedCamera::scripted(vec![Some("12344321".to_string()); 8]);
        let mut session = session(&camera);
        let (tx, rx) = mpsc::channel(1);

        session.activate(tx).await.unwrap();
        drop(rx);
        wait_until(|| camera.acquired() == 0).await;
        // The loop set the session back to Idle before releasing the camera.
        assert!(!session.is_running());
        assert_eq!(session.status(), SessionStatus::Idle);
        session.deactivate().await;
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_session_status_display() {
        assert_eq!(SessionStatus::Idle.to_string(), "idle");
        assert_eq!(SessionStatus::Starting.to_string(), "starting");
        assert_eq!(SessionStatus::Running.to_string(), "running");
        assert_eq!(SessionStatus::Stopping.to_string(), "stopping");
        assert_eq!(SessionStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_scan_options_default() {
        let options = ScanOptions::default();
        assert_eq!(options.interval, Duration::from_millis(100));
        assert_eq!(options.scan_box, 250);
    }
}
