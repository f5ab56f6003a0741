//! Bluetooth availability state machine.
//!
//! Starts at `Unknown`, becomes `Ready` on a successful scan start and is
//! reclassified on every adapter error. `NoPermission` and `Unsupported`
//! block further scan attempts for the rest of the session.

use std::fmt;

use crate::error::{AdapterError, AdapterErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BluetoothAvailability {
    #[default]
    Unknown,
    Ready,
    Disabled,
    Unsupported,
    NoPermission,
}

impl BluetoothAvailability {
    /// Conditions that will not clear up without outside action.
    pub fn blocks_scanning(&self) -> bool {
        matches!(
            self,
            BluetoothAvailability::Unsupported | BluetoothAvailability::NoPermission
        )
    }

    /// Disabled, unsupported or no permission.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            BluetoothAvailability::Disabled
                | BluetoothAvailability::Unsupported
                | BluetoothAvailability::NoPermission
        )
    }
}

impl fmt::Display for BluetoothAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BluetoothAvailability::Unknown => "unknown",
            BluetoothAvailability::Ready => "ready",
            BluetoothAvailability::Disabled => "disabled",
            BluetoothAvailability::Unsupported => "unsupported",
            BluetoothAvailability::NoPermission => "no permission",
        };
        f.write_str(label)
    }
}

const PERMISSION_MARKERS: &[&str] = &["Permission", "NotAuthorized"];
const DISABLED_MARKERS: &[&str] = &["NotReady", "NotPowered"];
const UNSUPPORTED_MARKERS: &[&str] = &["No adapter", "NotSupported"];

fn has_marker(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}

/// Maps an adapter error onto an availability state. First match wins:
/// permission, then disabled, then unsupported.
pub fn classify(error: &AdapterError) -> BluetoothAvailability {
    let text = error.message.as_str();

    if error.kind == AdapterErrorKind::PermissionDenied || has_marker(text, PERMISSION_MARKERS) {
        BluetoothAvailability::NoPermission
    } else if error.kind == AdapterErrorKind::PoweredOff || has_marker(text, DISABLED_MARKERS) {
        BluetoothAvailability::Disabled
    } else if matches!(
        error.kind,
        AdapterErrorKind::NoAdapter | AdapterErrorKind::Unsupported
    ) || has_marker(text, UNSUPPORTED_MARKERS)
    {
        BluetoothAvailability::Unsupported
    } else {
        BluetoothAvailability::Unknown
    }
}

/// Current availability for this process run.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    state: BluetoothAvailability,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BluetoothAvailability {
        self.state
    }

    pub fn blocks_scanning(&self) -> bool {
        self.state.blocks_scanning()
    }

    pub fn scan_started(&mut self) {
        self.state = BluetoothAvailability::Ready;
    }

    /// Reclassifies from `error` and returns the new state.
    pub fn scan_failed(&mut self, error: &AdapterError) -> BluetoothAvailability {
        self.state = classify(error);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other(message: &str) -> AdapterError {
        AdapterError::other(message)
    }

    #[test]
    fn test_classify_by_kind() {
        let cases = [
            (AdapterErrorKind::PermissionDenied, BluetoothAvailability::NoPermission),
            (AdapterErrorKind::PoweredOff, BluetoothAvailability::Disabled),
            (AdapterErrorKind::NoAdapter, BluetoothAvailability::Unsupported),
            (AdapterErrorKind::Unsupported, BluetoothAvailability::Unsupported),
            (AdapterErrorKind::Other, BluetoothAvailability::Unknown),
        ];
        for (kind, expected) in cases {
            assert_eq!(classify(&AdapterError::new(kind, "")), expected, "{:?}", kind);
        }
    }

    #[test]
    fn test_classify_by_message_markers() {
        assert_eq!(
            classify(&other("org.bluez.Error.NotAuthorized")),
            BluetoothAvailability::NoPermission
        );
        assert_eq!(
            classify(&other("Permission denied (os error 13)")),
            BluetoothAvailability::NoPermission
        );
        assert_eq!(
            classify(&other("org.bluez.Error.NotReady")),
            BluetoothAvailability::Disabled
        );
        assert_eq!(classify(&other("NotPowered")), BluetoothAvailability::Disabled);
        assert_eq!(
            classify(&other("No adapter available")),
            BluetoothAvailability::Unsupported
        );
        assert_eq!(
            classify(&other("org.bluez.Error.NotSupported")),
            BluetoothAvailability::Unsupported
        );
        assert_eq!(classify(&other("D-Bus timeout")), BluetoothAvailability::Unknown);
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(
            classify(&other("NotReady: Permission missing")),
            BluetoothAvailability::NoPermission
        );
        assert_eq!(
            classify(&other("NotSupported while NotPowered")),
            BluetoothAvailability::Disabled
        );
        // text marker for permission outranks a weaker kind
        assert_eq!(
            classify(&AdapterError::new(AdapterErrorKind::NoAdapter, "NotAuthorized")),
            BluetoothAvailability::NoPermission
        );
    }

    #[test]
    fn test_tracker_transitions() {
        let mut tracker = AvailabilityTracker::new();
        assert_eq!(tracker.state(), BluetoothAvailability::Unknown);
        assert!(!tracker.blocks_scanning());

        tracker.scan_started();
        assert_eq!(tracker.state(), BluetoothAvailability::Ready);

        let state = tracker.scan_failed(&other("NotPowered"));
        assert_eq!(state, BluetoothAvailability::Disabled);
        assert!(!tracker.blocks_scanning());

        tracker.scan_failed(&other("NotAuthorized"));
        assert!(tracker.blocks_scanning());
    }

    #[test]
    fn test_blocking_states() {
        assert!(BluetoothAvailability::NoPermission.blocks_scanning());
        assert!(BluetoothAvailability::Unsupported.blocks_scanning());
        assert!(!BluetoothAvailability::Disabled.blocks_scanning());
        assert!(!BluetoothAvailability::Unknown.blocks_scanning());
        assert!(!BluetoothAvailability::Ready.blocks_scanning());
        assert!(BluetoothAvailability::Disabled.is_unavailable());
        assert!(!BluetoothAvailability::Unknown.is_unavailable());
    }
}
