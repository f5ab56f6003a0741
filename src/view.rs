//! # View Model
//!
//! Toolkit-neutral text and pane selection for whatever renders the device
//! list. Nothing here draws; it only decides what should be shown.

use crate::availability::BluetoothAvailability;
use crate::device::Device;

/// Which pane the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Bluetooth cannot be used right now
    Unavailable(BluetoothAvailability),
    /// Nothing found and not scanning
    Empty,
    /// Device list, possibly with an empty-results line
    List,
}

impl ViewState {
    pub fn resolve(
        availability: BluetoothAvailability,
        no_devices: bool,
        is_scanning: bool,
    ) -> Self {
        if availability.is_unavailable() {
            ViewState::Unavailable(availability)
        } else if no_devices && !is_scanning {
            ViewState::Empty
        } else {
            ViewState::List
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    pub title: &'static str,
    pub body: &'static str,
}

pub const EMPTY_MESSAGE: StatusMessage = StatusMessage {
    title: "No Devices",
    body: "Start scanning to discover nearby BLE devices.",
};

/// User-facing message for a failed scan, one per classified state.
pub fn error_message(state: BluetoothAvailability) -> StatusMessage {
    match state {
        BluetoothAvailability::NoPermission => StatusMessage {
            title: "Bluetooth Permission Required",
            body: "Make sure your user has Bluetooth access and try again.",
        },
        BluetoothAvailability::Unsupported => StatusMessage {
            title: "Bluetooth Unsupported",
            body: "This system does not appear to support Bluetooth LE.",
        },
        BluetoothAvailability::Disabled => StatusMessage {
            title: "Bluetooth Disabled",
            body: "Bluetooth is powered off or unavailable. Enable it and retry.",
        },
        BluetoothAvailability::Unknown | BluetoothAvailability::Ready => StatusMessage {
            title: "Scan Failed",
            body: "Bluetooth scanning could not be started. Try again.",
        },
    }
}

/// "3 devices found", or empty when nothing matched.
pub fn count_label(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "1 device found".to_string(),
        n => format!("{} devices found", n),
    }
}

pub fn no_results_message(query: &str) -> String {
    format!("No results for \"{}\"", query)
}

/// Service UUIDs shortened to their first eight characters.
pub fn service_summary(device: &Device) -> String {
    device
        .service_uuids
        .iter()
        .map(|uuid| uuid.chars().take(8).collect::<String>())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn meta_line(device: &Device) -> String {
    let mut parts = vec![format!("RSSI: {} dBm", device.rssi)];
    if let Some(tx) = device.tx_power {
        parts.push(format!("TX: {}", tx));
    }
    if device.manufacturer_data.is_some() {
        parts.push("MFG".to_string());
    }
    parts.join("  ")
}
