use async_trait::async_trait;
use revlog_domain::{ClassKey, HostKey, RuntimeError};

/// Sends one PTR or NS/SOA query and parses the reply, matching the
/// teacher's `DnsResolver`/`DnsTransport` port shape (one call in, one
/// domain-level answer out). Concurrency, slot bounding, and per-query
/// deadlines are owned by `revlog-application`'s dispatcher, not here
/// (§5) — this trait is the single-query primitive it spawns.
#[async_trait]
pub trait DnsQueryClient: Send + Sync {
    /// Resolves a host's PTR record. `Ok(None)` is a well-formed reply
    /// carrying no usable PTR (§4.4 "No PTR ⇒ treat as failed response").
    async fn query_ptr(&self, host: HostKey) -> Result<Option<String>, RuntimeError>;

    /// Resolves a class's owning nameserver/SOA name, already reduced to
    /// the final class name per the SOA-then-NS split rule (§4.4, §9).
    async fn query_class_ns(&self, class: ClassKey) -> Result<Option<String>, RuntimeError>;

    /// Cheap, synchronous capacity check used by the dispatcher to decide
    /// whether issuing another query would exhaust the transport (§4.3,
    /// §7 "Transport exhaustion"). Default: always has capacity.
    fn has_capacity(&self) -> bool {
        true
    }
}
