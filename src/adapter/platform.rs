//! Scan adapter backed by btleplug, which covers BlueZ, CoreBluetooth and
//! WinRT behind one API.

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::{Stream, StreamExt};
use futures::FutureExt;
use tokio::task::JoinHandle;

use super::{AdvertisementSink, ScanAdapter};
use crate::device::RawAdvertisement;
use crate::error::{AdapterError, AdapterErrorKind};

/// Scans on the first adapter btleplug reports.
#[derive(Debug, Default)]
pub struct PlatformAdapter;

impl PlatformAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// A running scan: the central it runs on and the task forwarding its events.
pub struct PlatformScan {
    central: Adapter,
    events_task: JoinHandle<()>,
}

async fn first_adapter() -> Result<Adapter, AdapterError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters.into_iter().next().ok_or_else(|| {
        AdapterError::new(AdapterErrorKind::NoAdapter, "No adapter available")
    })
}

/// Peripheral an event carries fresh advertisement data for.
fn advertised_id(event: CentralEvent) -> Option<PeripheralId> {
    match event {
        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => Some(id),
        CentralEvent::ManufacturerDataAdvertisement { id, .. }
        | CentralEvent::ServiceDataAdvertisement { id, .. }
        | CentralEvent::ServicesAdvertisement { id, .. } => Some(id),
        _ => None,
    }
}

/// Waits for the next advertisement event, then takes every event already
/// queued behind it. Each id appears once, in first-seen order. BlueZ emits
/// one event per changed property of a packet, so this folds them into one
/// properties read. Returns `None` once the stream ends.
async fn next_batch<S, T, F>(events: &mut S, id_of: F) -> Option<Vec<T>>
where
    S: Stream + Unpin,
    T: PartialEq,
    F: Fn(S::Item) -> Option<T>,
{
    let mut ids = Vec::new();
    while ids.is_empty() {
        if let Some(id) = id_of(events.next().await?) {
            ids.push(id);
        }
    }

    while let Some(Some(event)) = events.next().now_or_never() {
        if let Some(id) = id_of(event) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Some(ids)
}

async fn read_advertisement(
    central: &Adapter,
    id: &PeripheralId,
) -> Result<Option<RawAdvertisement>, btleplug::Error> {
    let peripheral = central.peripheral(id).await?;
    Ok(peripheral.properties().await?.map(to_raw_advertisement))
}

fn to_raw_advertisement(props: PeripheralProperties) -> RawAdvertisement {
    // btleplug keeps manufacturer data in a HashMap; sort so "first" is stable
    let mut manufacturer_data_by_id: Vec<(u16, Vec<u8>)> =
        props.manufacturer_data.into_iter().collect();
    manufacturer_data_by_id.sort_by_key(|(id, _)| *id);

    RawAdvertisement {
        address: props.address.to_string(),
        name: props.local_name.clone(),
        local_name: props.local_name,
        rssi: props.rssi.unwrap_or(0),
        service_uuids: props.services.iter().map(|uuid| uuid.to_string()).collect(),
        tx_power: props.tx_power_level,
        manufacturer_data_by_id,
        // not reported by btleplug
        connectable: false,
    }
}

#[async_trait]
impl ScanAdapter for PlatformAdapter {
    type Handle = PlatformScan;

    async fn start(&mut self, sink: AdvertisementSink) -> Result<PlatformScan, AdapterError> {
        let central = first_adapter().await?;

        // Subscribe before starting so no early advertisement is missed
        let mut events = central.events().await?.fuse();
        central.start_scan(ScanFilter::default()).await?;

        let reader = central.clone();
        let events_task = tokio::spawn(async move {
            while let Some(ids) = next_batch(&mut events, advertised_id).await {
                for id in ids {
                    match read_advertisement(&reader, &id).await {
                        Ok(Some(raw)) => sink(raw),
                        Ok(None) => {}
                        Err(e) => log::debug!("Could not read properties for {:?}: {}", id, e),
                    }
                }
            }
            log::debug!("Central event stream ended");
        });

        log::info!("Platform scan started");
        Ok(PlatformScan {
            central,
            events_task,
        })
    }

    async fn stop(&mut self, handle: PlatformScan) -> Result<(), AdapterError> {
        handle.events_task.abort();
        handle.central.stop_scan().await?;
        log::info!("Platform scan stopped");
        Ok(())
    }
}
