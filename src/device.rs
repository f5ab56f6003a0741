//! # Device Model
//!
//! One discovered BLE peripheral, normalized from a raw advertisement report.
//! A `Device` is replaced wholesale on every new advertisement for its address;
//! nothing in here mutates in place.
//!
//! Signal quality (`signal_tier`, `signal_bars`) is derived from `rssi` on
//! demand and never stored.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::search;

/// Hardware address of a peripheral, the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        debug_assert!(!address.trim().is_empty(), "BLE address must not be empty");
        Self(address)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Advertisement as handed over by a scan adapter, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawAdvertisement {
    pub address: String,
    pub name: Option<String>,
    pub local_name: Option<String>,
    pub rssi: i16,
    pub service_uuids: Vec<String>,
    pub tx_power: Option<i16>,
    /// Manufacturer payloads in the order the adapter saw them.
    pub manufacturer_data_by_id: Vec<(u16, Vec<u8>)>,
    pub connectable: bool,
}

/// Coarse signal quality, a total classification over RSSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalTier {
    Excellent,
    Good,
    Fair,
    Weak,
}

impl SignalTier {
    pub fn from_rssi(rssi: i16) -> Self {
        if rssi >= -50 {
            SignalTier::Excellent
        } else if rssi >= -60 {
            SignalTier::Good
        } else if rssi >= -70 {
            SignalTier::Fair
        } else {
            SignalTier::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalTier::Excellent => "Excellent",
            SignalTier::Good => "Good",
            SignalTier::Fair => "Fair",
            SignalTier::Weak => "Weak",
        }
    }
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub address: Address,
    pub name: String,
    pub local_name: Option<String>,
    pub rssi: i16,
    pub service_uuids: Vec<String>,
    pub tx_power: Option<i16>,
    /// Payload of the first manufacturer id only
    pub manufacturer_data: Option<Vec<u8>>,
    pub connectable: bool,
    /// Last time this address was heard
    pub discovered_at: DateTime<Utc>,
}

impl Device {
    /// Normalizes an adapter report. Service UUIDs are replaced, not merged,
    /// since each advertisement is self-contained.
    pub fn from_advertisement(raw: RawAdvertisement, seen_at: DateTime<Utc>) -> Self {
        let manufacturer_data = raw
            .manufacturer_data_by_id
            .into_iter()
            .next()
            .map(|(_, payload)| payload);

        Self {
            address: Address::new(raw.address),
            name: raw.name.unwrap_or_default(),
            local_name: raw.local_name,
            rssi: raw.rssi,
            service_uuids: raw.service_uuids,
            tx_power: raw.tx_power,
            manufacturer_data,
            connectable: raw.connectable,
            discovered_at: seen_at,
        }
    }

    /// `local_name` if non-empty, else `name`, else "Unknown".
    pub fn display_name(&self) -> &str {
        match self.local_name.as_deref() {
            Some(local) if !local.is_empty() => local,
            _ if !self.name.is_empty() => self.name.as_str(),
            _ => "Unknown",
        }
    }

    pub fn signal_tier(&self) -> SignalTier {
        SignalTier::from_rssi(self.rssi)
    }

    /// Five-step signal meter (0..=4) with an extra step at -80 dBm.
    pub fn signal_bars(&self) -> u8 {
        match self.rssi {
            r if r >= -50 => 4,
            r if r >= -60 => 3,
            r if r >= -70 => 2,
            r if r >= -80 => 1,
            _ => 0,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        search::matches(self, query)
    }
}
