//! Failure categories reported by cleanup subscribers.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Bitwise union of the failure categories observed during a cycle.
    ///
    /// An empty mask means every pending unit succeeded. Bits outside the
    /// named categories are retained so subscribers may report their own.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FailureMask: u32 {
        const COOKIES = 1 << 0;
        const NETWORK_CACHE = 1 << 1;
        const IMAGE_CACHE = 1 << 2;
        const DOWNLOADS = 1 << 3;
        const MEDIA_DEVICES = 1 << 4;
        const DOM_QUOTA = 1 << 5;
        const DOM_PUSH_NOTIFICATIONS = 1 << 6;
        const HISTORY = 1 << 7;
        const AUTH_TOKENS = 1 << 8;
        const AUTH_CACHE = 1 << 9;
        const PERMISSIONS = 1 << 10;
        const SECURITY_SETTINGS = 1 << 11;
        const STORAGE_ACCESS = 1 << 12;
        const JS_CACHE = 1 << 13;
        const CSS_CACHE = 1 << 14;
        /// Failure reported without a category.
        const UNCATEGORIZED = 1 << 31;
    }
}

impl FailureMask {
    /// Builds a mask from raw bits, keeping bits that have no name.
    pub fn from_raw(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }

    /// Returns true if no failure was recorded.
    pub fn is_success(&self) -> bool {
        self.is_empty()
    }

    /// Names of the categories set in this mask.
    pub fn category_names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for FailureMask {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for FailureMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.bits())
    }
}
