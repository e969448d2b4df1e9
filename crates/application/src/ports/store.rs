use async_trait::async_trait;
use revlog_domain::{RuntimeError, StoreRecord};

/// The persistent resolution store (§6 "Persistent store format"),
/// grounded on the teacher's `QueryLogRepository` port shape — a small
/// async trait defined here and implemented against SQLite in
/// `revlog-infrastructure`.
#[async_trait]
pub trait ResolutionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoreRecord>, RuntimeError>;

    async fn put(&self, key: &str, record: &StoreRecord) -> Result<(), RuntimeError>;

    /// All records, in key order, for `--dumpdb` (§4.9).
    async fn dump(&self) -> Result<Vec<(String, StoreRecord)>, RuntimeError>;

    /// Upserts a merged record with origin `M` and the given timestamp,
    /// for `--mergedb` (§4.9).
    async fn merge(&self, key: &str, name: &str, now: i64) -> Result<(), RuntimeError>;

    /// Deletes every record older than `cutoff`, returning the count
    /// removed, for `--expiredb` (§4.9).
    async fn expire(&self, cutoff: i64) -> Result<u64, RuntimeError>;
}
