use revlog_domain::{ClassState, HostState, StoreRecord};

/// A host's Pending-table entry (§3 "Pending entry").
#[derive(Debug)]
pub struct HostEntry {
    pub refcount: u32,
    pub state: HostState,
    pub cached: Option<StoreRecord>,
    /// Whether a query task is currently bound to this key (§3 "slot").
    pub bound: bool,
}

impl HostEntry {
    pub fn new(cached: Option<StoreRecord>) -> Self {
        Self {
            refcount: 1,
            state: HostState::Pending,
            cached,
            bound: false,
        }
    }
}

/// A class's Pending-table entry — same shape, no recursion variant.
#[derive(Debug)]
pub struct ClassEntry {
    pub refcount: u32,
    pub state: ClassState,
    pub cached: Option<StoreRecord>,
    pub bound: bool,
}

impl ClassEntry {
    pub fn new(cached: Option<StoreRecord>) -> Self {
        Self {
            refcount: 1,
            state: ClassState::Pending,
            cached,
            bound: false,
        }
    }
}
