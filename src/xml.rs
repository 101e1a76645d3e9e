//! Shared XML attribute helpers for the OOXML part parsers.
//!
//! All functions handle namespace-prefixed attributes and UTF-8 conversion
//! safely; parse failures surface as `None` so callers can decide whether a
//! missing attribute is structural or ignorable.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by exact key.
pub(crate) fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub(crate) fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

/// Extract a `u32` attribute value by exact key.
pub(crate) fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}
