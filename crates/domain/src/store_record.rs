use crate::state::Origin;

/// A record in the persistent store, keyed by address or class key (§3, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub name: String,
    pub origin: Origin,
    /// Whole seconds since the UNIX epoch.
    pub timestamp: i64,
}

impl StoreRecord {
    pub fn new(name: String, origin: Origin, timestamp: i64) -> Self {
        Self {
            name,
            origin,
            timestamp,
        }
    }
}
