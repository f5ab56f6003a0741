//! # Discovery Engine
//!
//! Consumer-side aggregate: owns the device registry, the refresh scheduler,
//! the availability tracker, the search query and the handle to the scan
//! worker. Everything here runs on one thread; the consumer calls `tick`
//! from its own loop to drain worker events and fire due refreshes.

use std::time::{Duration, Instant};

use crate::adapter::ScanAdapter;
use crate::availability::{AvailabilityTracker, BluetoothAvailability};
use crate::device::Device;
use crate::registry::DeviceRegistry;
use crate::refresh::RefreshScheduler;
use crate::view::ViewState;
use crate::worker::{ScanEvent, ScanWorker};

/// Notifications delivered to the presentation layer, always on the
/// consumer's thread.
pub trait DiscoveryObserver {
    /// One call per normalized advertisement, before coalescing.
    fn on_device_discovered(&mut self, _device: &Device) {}

    fn on_scan_state_changed(&mut self, _is_scanning: bool) {}

    fn on_scan_error(&mut self, _description: &str, _state: BluetoothAvailability) {}

    /// Coalesced refresh carrying the current filtered, sorted snapshot and
    /// the query it was filtered with.
    fn on_refresh(&mut self, _view: ViewState, _devices: &[Device], _query: &str) {}
}

pub struct DiscoveryApp<O: DiscoveryObserver> {
    worker: ScanWorker,
    registry: DeviceRegistry,
    refresh: RefreshScheduler,
    availability: AvailabilityTracker,
    search_query: String,
    observer: O,
}

impl<O: DiscoveryObserver> DiscoveryApp<O> {
    pub fn new<A: ScanAdapter>(adapter: A, observer: O, refresh_delay: Duration) -> Self {
        Self {
            worker: ScanWorker::spawn(adapter),
            registry: DeviceRegistry::new(),
            refresh: RefreshScheduler::new(refresh_delay),
            availability: AvailabilityTracker::new(),
            search_query: String::new(),
            observer,
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn is_scanning(&self) -> bool {
        self.worker.is_scanning()
    }

    pub fn availability(&self) -> BluetoothAvailability {
        self.availability.state()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    /// Clears the list and asks the worker to start scanning. Refused when
    /// availability says retrying cannot help.
    pub fn start_scan(&mut self) {
        if self.availability.blocks_scanning() {
            log::info!(
                "Not starting scan, Bluetooth is {}",
                self.availability.state()
            );
            return;
        }
        self.registry.clear();
        self.refresh.schedule(Instant::now());
        self.worker.start_scan();
    }

    pub fn stop_scan(&mut self) {
        self.worker.stop_scan();
    }

    pub fn toggle_scan(&mut self) {
        if self.worker.is_scanning() {
            self.stop_scan();
        } else {
            self.start_scan();
        }
    }

    pub fn clear_devices(&mut self) {
        self.registry.clear();
        self.refresh.schedule(Instant::now());
    }

    pub fn set_search_query(&mut self, text: &str) {
        self.search_query = text.trim().to_string();
        self.refresh.schedule(Instant::now());
    }

    pub fn snapshot(&self) -> Vec<Device> {
        self.registry.snapshot(&self.search_query)
    }

    /// Which pane the presentation layer should show right now.
    pub fn view_state(&self) -> ViewState {
        ViewState::resolve(
            self.availability.state(),
            self.registry.is_empty(),
            self.worker.is_scanning(),
        )
    }

    /// Drains pending worker events, then runs the refresh if it is due.
    pub fn tick(&mut self, now: Instant) {
        while let Some(event) = self.worker.try_next_event() {
            self.handle_event(event, now);
        }

        if self.refresh.take_due(now) {
            let devices = self.snapshot();
            let view = self.view_state();
            self.observer.on_refresh(view, &devices, &self.search_query);
        }
    }

    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }

    fn handle_event(&mut self, event: ScanEvent, now: Instant) {
        match event {
            ScanEvent::Device(device) => {
                self.observer.on_device_discovered(&device);
                self.registry.upsert(device);
            }
            ScanEvent::ScanState(scanning) => {
                self.worker.set_scanning(scanning);
                if scanning {
                    self.availability.scan_started();
                }
                self.observer.on_scan_state_changed(scanning);
            }
            ScanEvent::Error(error) => {
                let state = self.availability.scan_failed(&error);
                self.worker.set_scanning(false);
                log::warn!("Scan error ({}): {}", state, error);
                self.observer.on_scan_error(&error.to_string(), state);
            }
        }
        self.refresh.schedule(now);
    }
}
