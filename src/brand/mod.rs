//! Device brand classification
//!
//! A commenter's device is only visible as the free-form "source" string the
//! platform attaches to each post (for example `"iPhone 15 Pro Max"` or
//! `"HUAWEI Mate 60"`). This module normalizes those strings into brand labels.

mod table;

pub use table::BrandTable;

/// Label for a source string that no table entry matches
pub const UNKNOWN_LABEL: &str = "unknown";

/// Label for a user whose posts carry no source string at all
pub const UNKNOWN_DEVICE_LABEL: &str = "unknown device";

/// Maps raw device-source strings to brand labels
///
/// Implementations must be pure and total: every input yields a label, and
/// unmapped input yields [`UNKNOWN_LABEL`] rather than an error.
pub trait Classifier: Send + Sync {
    /// Returns the brand label for a raw device-source string
    fn classify(&self, raw_source: &str) -> String;

    /// Returns true if `label` names a recognized manufacturer
    ///
    /// Generic labels such as "Android" are produced by `classify` but are
    /// not considered known brands.
    fn is_known(&self, label: &str) -> bool;
}
