use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{AdvertisementSink, ScanAdapter};
use crate::device::RawAdvertisement;
use crate::error::AdapterError;

/// Shared view into a `MockScanAdapter`, kept by the test after the adapter
/// itself has moved into the worker thread.
#[derive(Default)]
pub struct MockControl {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    start_error: Mutex<Option<AdapterError>>,
    stop_error: Mutex<Option<AdapterError>>,
    sink: Mutex<Option<AdvertisementSink>>,
}

impl MockControl {
    pub fn fail_next_start(&self, error: AdapterError) {
        *self.start_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_stop(&self, error: AdapterError) {
        *self.stop_error.lock().unwrap() = Some(error);
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Delivers an advertisement the way a radio would. Returns false when no
    /// scan is running.
    pub fn advertise(&self, raw: RawAdvertisement) -> bool {
        let sink = self.sink.lock().unwrap().clone();
        match sink {
            Some(sink) => {
                sink(raw);
                true
            }
            None => false,
        }
    }
}

pub struct MockScanAdapter {
    control: Arc<MockControl>,
}

impl MockScanAdapter {
    pub fn new() -> (Self, Arc<MockControl>) {
        let control = Arc::new(MockControl::default());
        (
            Self {
                control: control.clone(),
            },
            control,
        )
    }
}

#[async_trait]
impl ScanAdapter for MockScanAdapter {
    type Handle = ();

    async fn start(&mut self, sink: AdvertisementSink) -> Result<(), AdapterError> {
        self.control.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.control.start_error.lock().unwrap().take() {
            return Err(error);
        }
        *self.control.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    async fn stop(&mut self, _handle: ()) -> Result<(), AdapterError> {
        self.control.stops.fetch_add(1, Ordering::SeqCst);
        *self.control.sink.lock().unwrap() = None;
        match self.control.stop_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
