//! # ble-companion
//!
//! Discovers nearby BLE peripherals from their advertisements and keeps a
//! live, searchable list ranked by signal strength.
//!
//! ## Architecture
//! - **ScanWorker** (`worker`): dedicated thread with its own Tokio runtime
//!   driving a `ScanAdapter`; normalizes advertisements into `Device`s and
//!   hands them over through a non-blocking channel
//! - **DiscoveryApp** (`app`): consumer-side engine owning the registry,
//!   refresh coalescing, search query and Bluetooth availability
//! - **DiscoveryObserver** (`app`): the narrow interface a presentation layer
//!   implements
//!
//! ## Data Flow
//! ```text
//! adapter callback -> ScanWorker -> crossbeam channel -> DiscoveryApp::tick
//!     -> DeviceRegistry::upsert -> RefreshScheduler -> DiscoveryObserver::on_refresh
//! ```

pub mod adapter;
pub mod app;
pub mod availability;
pub mod config;
pub mod console;
pub mod device;
pub mod error;
pub mod refresh;
pub mod registry;
pub mod search;
pub mod view;
pub mod worker;
