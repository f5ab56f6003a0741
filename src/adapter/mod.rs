//! # Scan Adapter Abstraction
//!
//! The boundary to the host's BLE radio. The engine only ever talks to a
//! `ScanAdapter`; platform differences stay inside the implementation.
//!
//! Once `start` succeeds the adapter pushes every advertisement it receives
//! into the `AdvertisementSink`, from whatever thread or task it likes and at
//! whatever rate the radio produces them. The sink never blocks.

pub mod platform;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use std::sync::Arc;

use crate::device::RawAdvertisement;
use crate::error::AdapterError;

/// Callback receiving raw advertisements. Must be cheap and non-blocking.
pub type AdvertisementSink = Arc<dyn Fn(RawAdvertisement) + Send + Sync>;

#[async_trait]
pub trait ScanAdapter: Send + 'static {
    /// Token for a running scan, handed back to `stop`.
    type Handle: Send;

    async fn start(&mut self, sink: AdvertisementSink) -> Result<Self::Handle, AdapterError>;

    async fn stop(&mut self, handle: Self::Handle) -> Result<(), AdapterError>;
}
