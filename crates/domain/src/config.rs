use std::net::SocketAddr;
use std::time::Duration;

use crate::mask::NameMask;

/// Database consultation policy (§4.2, §6 `--dbfirst`/`--dbonly`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabasePolicy {
    /// Always query the network; store is write-back only.
    NetworkFirst,
    /// Consult the store before issuing a query.
    DatabaseFirst,
    /// Never issue queries.
    DatabaseOnly,
}

/// Immutable run-wide configuration, built once from CLI flags and handed
/// to every core component (§9 "Global mutable state" design note).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub recursive: bool,
    pub anywhere: bool,
    pub timeout: Duration,
    pub sockets: usize,
    pub line_cache: usize,
    pub mask: NameMask,
    pub database_policy: DatabasePolicy,
    pub progress: bool,
    pub nostats: bool,
    pub nameserver: SocketAddr,
}
