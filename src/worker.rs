//! # Background Scan Worker
//!
//! Runs the scan adapter on a dedicated thread with its own Tokio runtime so
//! the consumer never blocks on radio I/O.
//!
//! ## Key Components
//! - `ScanWorker`: consumer-side handle; submits commands, drains events,
//!   tracks `is_scanning`
//! - `WorkerCommand`: commands sent from the consumer to the worker thread
//! - `ScanEvent`: normalized events sent back, fire-and-forget
//!
//! ## Threading
//! Commands travel over a `std::sync::mpsc` channel and are executed one at a
//! time, so start/stop/shutdown never race each other on the adapter.
//! Events travel over an unbounded crossbeam channel: the worker (and the
//! adapter's own callback context) never waits on the consumer.

use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;

use crate::adapter::{AdvertisementSink, ScanAdapter};
use crate::device::{Device, RawAdvertisement};
use crate::error::{AdapterError, WorkerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    Start,
    Stop,
    Shutdown,
}

/// Update delivered from the worker to the consumer.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Device(Device),
    ScanState(bool),
    Error(AdapterError),
}

/// Consumer-side handle to the scan thread.
///
/// Lives on the consumer's thread. `is_scanning` only changes when the
/// consumer processes a `ScanEvent::ScanState` and reports it back via
/// `set_scanning`.
pub struct ScanWorker {
    commands: mpsc::Sender<WorkerCommand>,
    events: Receiver<ScanEvent>,
    /// Lets the handle itself report a worker that died on its own
    local_events: Sender<ScanEvent>,
    thread: Option<JoinHandle<()>>,
    is_scanning: bool,
}

impl ScanWorker {
    /// Spawns the worker thread, which lives until `shutdown`.
    pub fn spawn<A: ScanAdapter>(adapter: A) -> Self {
        let (command_sender, command_receiver) = mpsc::channel();
        let (event_sender, event_receiver) = unbounded();

        let local_events = event_sender.clone();
        let thread = thread::Builder::new()
            .name("ble-scan-worker".to_string())
            .spawn(move || run(adapter, command_receiver, event_sender));

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn scan worker thread: {}", e);
                None
            }
        };

        Self {
            commands: command_sender,
            events: event_receiver,
            local_events,
            thread,
            is_scanning: false,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.is_scanning
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        self.is_scanning = scanning;
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Submits a start request. No-op while scanning.
    pub fn start_scan(&mut self) {
        if self.is_scanning {
            return;
        }
        self.submit(WorkerCommand::Start);
    }

    /// Submits a stop request. No-op while not scanning.
    pub fn stop_scan(&mut self) {
        if !self.is_scanning {
            return;
        }
        self.submit(WorkerCommand::Stop);
    }

    pub fn toggle_scan(&mut self) {
        if self.is_scanning {
            self.stop_scan();
        } else {
            self.start_scan();
        }
    }

    /// Next pending event, if any. Never blocks.
    pub fn try_next_event(&self) -> Option<ScanEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Stops any running scan and joins the worker thread. Later calls are no-ops.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        log::info!("Shutting down scan worker");
        if self.commands.send(WorkerCommand::Shutdown).is_err() {
            log::warn!("{}", WorkerError::Disconnected);
        }
        if thread.join().is_err() {
            log::error!("Scan worker thread panicked");
        }
        self.is_scanning = false;
    }

    /// Sends `command` to the worker thread. If the thread has exited on its
    /// own (for example because its runtime could not be built), the handle
    /// is reaped and a `Disconnected` error is queued for the consumer.
    fn submit(&mut self, command: WorkerCommand) {
        if self.thread.is_none() {
            log::warn!("Dropping {:?}: {}", command, WorkerError::Disconnected);
            return;
        }
        if self.commands.send(command).is_ok() {
            return;
        }

        log::error!("Dropping {:?}: {}", command, WorkerError::Disconnected);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Scan worker thread panicked");
            }
        }
        self.is_scanning = false;
        let _ = self
            .local_events
            .send(ScanEvent::Error(WorkerError::Disconnected.into()));
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builds the adapter callback: normalize, stamp, hand over.
fn advertisement_sink(events: Sender<ScanEvent>) -> AdvertisementSink {
    Arc::new(move |raw: RawAdvertisement| {
        let device = Device::from_advertisement(raw, Utc::now());
        if events.send(ScanEvent::Device(device)).is_err() {
            log::trace!("Consumer gone, dropping advertisement");
        }
    })
}

/// Worker thread body. Returns when `Shutdown` arrives or every command
/// sender is dropped.
fn run<A: ScanAdapter>(
    mut adapter: A,
    commands: mpsc::Receiver<WorkerCommand>,
    events: Sender<ScanEvent>,
) {
    let rt = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            let error = WorkerError::RuntimeCreation(e.to_string());
            log::error!("{}", error);
            let _ = events.send(ScanEvent::Error(error.into()));
            return;
        }
    };

    let mut session: Option<A::Handle> = None;

    while let Ok(command) = commands.recv() {
        match command {
            WorkerCommand::Start => {
                if session.is_some() {
                    log::debug!("Scan worker: already scanning, ignoring start");
                    continue;
                }

                log::info!("Scan worker: starting scan");
                match rt.block_on(adapter.start(advertisement_sink(events.clone()))) {
                    Ok(handle) => {
                        session = Some(handle);
                        let _ = events.send(ScanEvent::ScanState(true));
                    }
                    Err(e) => {
                        log::warn!("Scan worker: failed to start scan: {}", e);
                        let _ = events.send(ScanEvent::Error(e));
                    }
                }
            }
            WorkerCommand::Stop => {
                stop_session(&rt, &mut adapter, &mut session, &events);
            }
            WorkerCommand::Shutdown => {
                stop_session(&rt, &mut adapter, &mut session, &events);
                break;
            }
        }
    }

    // Commands may also end because the handle was dropped without Shutdown
    stop_session(&rt, &mut adapter, &mut session, &events);
    log::info!("Scan worker: exiting");
}

/// Best-effort stop. A failing adapter stop is logged, and the scan is
/// reported stopped regardless.
fn stop_session<A: ScanAdapter>(
    rt: &Runtime,
    adapter: &mut A,
    session: &mut Option<A::Handle>,
    events: &Sender<ScanEvent>,
) {
    let Some(handle) = session.take() else {
        return;
    };

    log::info!("Scan worker: stopping scan");
    if let Err(e) = rt.block_on(adapter.stop(handle)) {
        log::warn!("Scan worker: ignoring stop failure: {}", e);
    }
    let _ = events.send(ScanEvent::ScanState(false));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapter::mock::{MockControl, MockScanAdapter};
    use crate::device::tests::advertisement;
    use crate::error::AdapterErrorKind;
    use std::time::{Duration, Instant};

    /// Polls `check` until it holds or two seconds pass.
    pub(crate) fn wait_until(mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        check()
    }

    fn next_event(worker: &ScanWorker) -> ScanEvent {
        let mut event = None;
        assert!(wait_until(|| {
            event = worker.try_next_event();
            event.is_some()
        }));
        event.expect("event arrived")
    }

    fn started_worker() -> (ScanWorker, Arc<MockControl>) {
        let (adapter, control) = MockScanAdapter::new();
        let mut worker = ScanWorker::spawn(adapter);
        worker.start_scan();
        match next_event(&worker) {
            ScanEvent::ScanState(true) => worker.set_scanning(true),
            other => panic!("unexpected event {:?}", other),
        }
        (worker, control)
    }

    #[test]
    fn test_start_reports_scanning() {
        let (worker, control) = started_worker();
        assert!(worker.is_scanning());
        assert_eq!(control.starts(), 1);
    }

    #[test]
    fn test_start_is_idempotent_while_scanning() {
        let (mut worker, control) = started_worker();
        worker.start_scan();
        worker.start_scan();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(control.starts(), 1);
        assert!(worker.try_next_event().is_none());
    }

    #[test]
    fn test_duplicate_start_before_ack_starts_once() {
        let (adapter, control) = MockScanAdapter::new();
        let mut worker = ScanWorker::spawn(adapter);
        worker.start_scan();
        worker.start_scan();

        assert!(matches!(next_event(&worker), ScanEvent::ScanState(true)));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(control.starts(), 1);
        assert!(worker.try_next_event().is_none());
    }

    #[test]
    fn test_start_failure_is_reported_not_scanning() {
        let (adapter, control) = MockScanAdapter::new();
        control.fail_next_start(AdapterError::new(AdapterErrorKind::PoweredOff, "NotPowered"));
        let mut worker = ScanWorker::spawn(adapter);
        worker.start_scan();

        match next_event(&worker) {
            ScanEvent::Error(e) => assert_eq!(e.kind, AdapterErrorKind::PoweredOff),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(!worker.is_scanning());
    }

    #[test]
    fn test_advertisements_are_normalized_in_order() {
        let (worker, control) = started_worker();
        assert!(control.advertise(advertisement("AA", "First", -40)));
        assert!(control.advertise(advertisement("AA", "Second", -41)));

        match (next_event(&worker), next_event(&worker)) {
            (ScanEvent::Device(a), ScanEvent::Device(b)) => {
                assert_eq!(a.name, "First");
                assert_eq!(b.name, "Second");
                assert_eq!(b.address.as_str(), "AA");
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_stop_failure_is_swallowed() {
        let (mut worker, control) = started_worker();
        control.fail_next_stop(AdapterError::other("busy"));
        worker.stop_scan();

        assert!(matches!(next_event(&worker), ScanEvent::ScanState(false)));
        assert_eq!(control.stops(), 1);
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (adapter, control) = MockScanAdapter::new();
        let mut worker = ScanWorker::spawn(adapter);
        worker.stop_scan();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(control.stops(), 0);
        assert!(worker.try_next_event().is_none());
    }

    #[test]
    fn test_shutdown_stops_active_scan_once() {
        let (mut worker, control) = started_worker();
        worker.shutdown();
        assert_eq!(control.stops(), 1);
        assert!(!worker.is_running());
        assert!(!worker.is_scanning());

        worker.shutdown();
        assert_eq!(control.stops(), 1);
    }

    #[test]
    fn test_commands_after_shutdown_are_dropped() {
        let (adapter, control) = MockScanAdapter::new();
        let mut worker = ScanWorker::spawn(adapter);
        worker.shutdown();
        worker.start_scan();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(control.starts(), 0);
    }

    /// A handle whose worker thread already exited, as after a failed
    /// runtime build.
    fn exited_worker() -> ScanWorker {
        let (commands, command_receiver) = mpsc::channel::<WorkerCommand>();
        let (local_events, events) = unbounded();
        let thread = thread::spawn(move || drop(command_receiver));
        assert!(wait_until(|| thread.is_finished()));

        ScanWorker {
            commands,
            events,
            local_events,
            thread: Some(thread),
            is_scanning: false,
        }
    }

    #[test]
    fn test_start_on_exited_worker_reports_disconnected() {
        let mut worker = exited_worker();
        assert!(worker.is_running());

        worker.start_scan();
        match worker.try_next_event() {
            Some(ScanEvent::Error(e)) => {
                assert_eq!(e.kind, AdapterErrorKind::Other);
                assert_eq!(e.message, WorkerError::Disconnected.to_string());
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(!worker.is_running());

        worker.start_scan();
        assert!(worker.try_next_event().is_none());
    }
}
