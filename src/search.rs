//! Free-text device filter.
//!
//! A boolean predicate, no scoring. Ordering is done separately by RSSI.

use crate::device::Device;

/// Case-insensitive match of `query` against a device.
///
/// Matches when the query is a substring of the display name, a subsequence
/// of the display name, or a substring of any service UUID or the address.
/// An empty query matches everything.
pub fn matches(device: &Device, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let query = query.to_lowercase();
    let name = device.display_name().to_lowercase();

    if name.contains(&query) || is_subsequence(&query, &name) {
        return true;
    }

    if device
        .service_uuids
        .iter()
        .any(|uuid| uuid.to_lowercase().contains(&query))
    {
        return true;
    }

    device.address.as_str().to_lowercase().contains(&query)
}

/// Greedy single pass: each needle char is consumed by the earliest
/// matching haystack char.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut wanted = needle.chars().peekable();
    for c in haystack.chars() {
        if wanted.peek() == Some(&c) {
            wanted.next();
        }
    }
    wanted.peek().is_none()
}
