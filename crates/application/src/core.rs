use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use revlog_domain::{
    ClassKey, ClassState, DatabasePolicy, HostKey, HostState, Origin, RunConfig, RuntimeError,
    StoreRecord,
};

use crate::pending::{ClassEntry, HostEntry};
use crate::ports::{DnsQueryClient, ResolutionStore};
use crate::queue::{WorkItem, WorkQueue};
use crate::stats::Stats;

/// What a dispatched query resolved to, tagged by the `WorkItem` kind that
/// produced it so the reactor doesn't need to re-sniff the key (§9).
enum QueryOutcome {
    Host(Result<Option<String>, RuntimeError>),
    Class(Result<Option<String>, RuntimeError>),
    /// The per-query `tokio::time::timeout` around the spawned task fired
    /// before a reply arrived — distinct from a reply that parsed to no
    /// usable record (§4.5).
    TimedOut,
}

struct CompletedQuery {
    item: WorkItem,
    outcome: QueryOutcome,
    elapsed: Duration,
}

/// Owns the Pending Table, work queue, and in-flight query slot pool
/// (§4.2–§4.5). One instance per run, passed explicitly instead of living
/// behind globals (§9 "Global mutable state").
pub struct ResolverCore {
    config: Arc<RunConfig>,
    dns: Arc<dyn DnsQueryClient>,
    store: Option<Arc<dyn ResolutionStore>>,
    hosts: FxHashMap<HostKey, HostEntry>,
    classes: FxHashMap<ClassKey, ClassEntry>,
    queue: WorkQueue,
    in_flight: JoinSet<CompletedQuery>,
    pub stats: Stats,
}

impl ResolverCore {
    pub fn new(
        config: Arc<RunConfig>,
        dns: Arc<dyn DnsQueryClient>,
        store: Option<Arc<dyn ResolutionStore>>,
    ) -> Self {
        Self {
            config,
            dns,
            store,
            hosts: FxHashMap::default(),
            classes: FxHashMap::default(),
            queue: WorkQueue::new(),
            in_flight: JoinSet::new(),
            stats: Stats::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.len() == 0
    }

    fn consults_store_first(&self) -> bool {
        matches!(
            self.config.database_policy,
            DatabasePolicy::DatabaseFirst | DatabasePolicy::DatabaseOnly
        )
    }

    async fn read_store(&self, key: &str) -> Option<StoreRecord> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(record) => record,
            Err(e) => {
                warn!(key, error = %e, "store read failed");
                None
            }
        }
    }

    /// §4.2 `addHost`.
    pub async fn add_host(&mut self, host: HostKey) {
        if let Some(entry) = self.hosts.get_mut(&host) {
            entry.refcount += 1;
            return;
        }
        self.stats.hosts_added += 1;
        let cached = self.read_store(&host.to_string()).await;
        let mut entry = HostEntry::new(cached.clone());

        if self.consults_store_first() && cached.is_some() {
            entry.state = HostState::FromStore(cached.unwrap().name);
            self.stats.resolved_store += 1;
        } else if matches!(self.config.database_policy, DatabasePolicy::DatabaseOnly) {
            entry.state = HostState::Failed;
            self.stats.failed += 1;
        } else {
            self.queue.push_host(host);
        }
        self.hosts.insert(host, entry);
    }

    /// §4.2 `removeHost`. Returns `true` once the entry's refcount reached
    /// zero and it was deleted.
    pub async fn remove_host(&mut self, host: HostKey) -> bool {
        let Some(entry) = self.hosts.get_mut(&host) else {
            return false;
        };
        entry.refcount = entry.refcount.saturating_sub(1);
        if entry.refcount > 0 {
            return false;
        }
        let write_back = entry
            .state
            .store_origin()
            .map(|origin| (entry.state.resolved_name().unwrap().to_string(), origin));
        self.hosts.remove(&host);
        if let Some((name, origin)) = write_back {
            self.write_back(&host.to_string(), &name, origin).await;
        }
        true
    }

    async fn add_class_single(&mut self, class: ClassKey) -> bool {
        if let Some(entry) = self.classes.get_mut(&class) {
            entry.refcount += 1;
            return false;
        }
        let cached = self.read_store(&class.to_string()).await;
        let mut entry = ClassEntry::new(cached.clone());
        let mut needs_query = false;

        if self.consults_store_first() && cached.is_some() {
            entry.state = ClassState::FromStore(cached.unwrap().name);
        } else if matches!(self.config.database_policy, DatabasePolicy::DatabaseOnly) {
            entry.state = ClassState::Failed;
        } else {
            needs_query = true;
        }
        self.classes.insert(class, entry);
        needs_query
    }

    /// §4.2 `addClass`: adds all three owning prefixes, most-specific
    /// first, prepending only the ones that still need a query.
    pub async fn add_class_group(&mut self, host: HostKey) {
        let mut to_enqueue = Vec::new();
        for class in host.owning_classes() {
            if self.add_class_single(class).await {
                to_enqueue.push(class);
            }
        }
        for class in to_enqueue.into_iter().rev() {
            self.queue.push_class_front(class);
        }
    }

    /// §4.2 `removeClass`: mirrors `remove_host` for all three prefixes.
    pub async fn remove_class_group(&mut self, host: HostKey) {
        for class in host.owning_classes() {
            let Some(entry) = self.classes.get_mut(&class) else {
                continue;
            };
            entry.refcount = entry.refcount.saturating_sub(1);
            if entry.refcount > 0 {
                continue;
            }
            let write_back = entry
                .state
                .store_origin()
                .map(|origin| (entry.state.resolved_name().unwrap().to_string(), origin));
            self.classes.remove(&class);
            if let Some((name, origin)) = write_back {
                self.write_back(&class.to_string(), &name, origin).await;
            }
        }
    }

    async fn write_back(&mut self, key: &str, name: &str, origin: Origin) {
        let Some(store) = &self.store else { return };
        let record = StoreRecord::new(name.to_string(), origin, now_epoch());
        if let Err(e) = store.put(key, &record).await {
            warn!(key, error = %e, "store write-back failed");
            self.stats.store_write_failures += 1;
        }
    }

    /// §4.5 `nsFailed` for a host.
    async fn host_ns_failed(&mut self, host: HostKey) {
        let entry = self.hosts.get_mut(&host).expect("host entry must exist");
        if let Some(cached) = &entry.cached {
            entry.state = HostState::FromStore(cached.name.clone());
            self.stats.resolved_store += 1;
            return;
        }
        if self.config.recursive {
            let entry = self.hosts.get_mut(&host).expect("host entry must exist");
            entry.state = HostState::PendingRecurse;
            self.add_class_group(host).await;
        } else {
            let entry = self.hosts.get_mut(&host).expect("host entry must exist");
            entry.state = HostState::Failed;
            self.stats.failed += 1;
        }
    }

    /// §4.5 `nsFailed` for a class (no recursion branch — classes never
    /// recurse further).
    fn class_ns_failed(&mut self, class: ClassKey) {
        let entry = self.classes.get_mut(&class).expect("class entry must exist");
        if let Some(cached) = &entry.cached {
            entry.state = ClassState::FromStore(cached.name.clone());
        } else {
            entry.state = ClassState::Failed;
        }
    }

    /// §4.6 Recursion Controller, invoked by the committer when a host is
    /// `pending-recurse`. Returns `true` once the host reached a terminal
    /// state (`from-recursion` or `failed`).
    pub async fn advance_recursion(&mut self, host: HostKey) -> bool {
        if !matches!(
            self.hosts.get(&host).map(|e| &e.state),
            Some(HostState::PendingRecurse)
        ) {
            return true;
        }

        let classes = host.owning_classes();

        for class in &classes {
            let state = &self.classes.get(class).expect("class entry must exist").state;
            if !state.is_terminal() {
                return false;
            }
        }

        let mut resolved_name = None;
        for class in &classes {
            let state = &self.classes.get(class).expect("class entry must exist").state;
            if let Some(name) = state.resolved_name() {
                resolved_name = Some(name.to_string());
                break;
            }
        }

        let entry = self.hosts.get_mut(&host).expect("host entry must exist");
        match resolved_name {
            Some(class_name) => {
                let name = self.config.mask.apply(&host.to_string(), &class_name);
                entry.state = HostState::FromRecursion(name);
                self.stats.resolved_recursion += 1;
            }
            None => {
                entry.state = HostState::Failed;
                self.stats.failed += 1;
            }
        }
        self.remove_class_group(host).await;
        true
    }

    /// §4.3 Query Dispatcher: spawns queries while slots are free and the
    /// queue is non-empty, skipping entries retired between enqueue and
    /// dispatch.
    pub fn dispatch(&mut self) {
        while self.in_flight.len() < self.config.sockets {
            let Some(item) = self.queue.pop() else { break };

            if !self.dns.has_capacity() {
                warn!("transport exhausted, pausing dispatch this tick");
                self.queue.push_front_item(item);
                break;
            }

            match item {
                WorkItem::Host(host) => {
                    let Some(entry) = self.hosts.get_mut(&host) else { continue };
                    if entry.state != HostState::Pending {
                        continue;
                    }
                    entry.bound = true;
                    self.stats.queries_sent += 1;
                    let dns = self.dns.clone();
                    let timeout = self.config.timeout;
                    let start = Instant::now();
                    self.in_flight.spawn(async move {
                        let outcome = match tokio::time::timeout(timeout, dns.query_ptr(host)).await {
                            Ok(result) => QueryOutcome::Host(result),
                            Err(_) => QueryOutcome::TimedOut,
                        };
                        CompletedQuery {
                            item: WorkItem::Host(host),
                            outcome,
                            elapsed: start.elapsed(),
                        }
                    });
                }
                WorkItem::Class(class) => {
                    let Some(entry) = self.classes.get_mut(&class) else { continue };
                    if entry.state != ClassState::Pending {
                        continue;
                    }
                    entry.bound = true;
                    self.stats.queries_sent += 1;
                    let dns = self.dns.clone();
                    let timeout = self.config.timeout;
                    let start = Instant::now();
                    self.in_flight.spawn(async move {
                        let outcome = match tokio::time::timeout(timeout, dns.query_class_ns(class)).await
                        {
                            Ok(result) => QueryOutcome::Class(result),
                            Err(_) => QueryOutcome::TimedOut,
                        };
                        CompletedQuery {
                            item: WorkItem::Class(class),
                            outcome,
                            elapsed: start.elapsed(),
                        }
                    });
                }
            }
        }
    }

    /// §4.4/§4.5: waits up to ~5s for any in-flight query to complete and
    /// applies its result. A task that hit its own per-query deadline
    /// reports `QueryOutcome::TimedOut` from the branch above, folding the
    /// sweep into the same readiness wait instead of a separate pass.
    pub async fn react(&mut self) {
        let wait = Duration::from_secs(5);
        let Ok(joined) = tokio::time::timeout(wait, self.in_flight.join_next()).await else {
            return;
        };
        let Some(joined) = joined else { return };
        let Ok(completed) = joined else {
            warn!("query task panicked");
            return;
        };
        self.apply_completed(completed).await;
    }

    async fn apply_completed(&mut self, completed: CompletedQuery) {
        match completed.item {
            WorkItem::Host(host) => {
                if let Some(entry) = self.hosts.get_mut(&host) {
                    entry.bound = false;
                } else {
                    return;
                }
                match completed.outcome {
                    QueryOutcome::Host(Ok(Some(name))) => {
                        self.stats.received += 1;
                        self.stats.note_response_time(completed.elapsed);
                        if let Some(entry) = self.hosts.get_mut(&host) {
                            entry.state = HostState::FromNs(name);
                        }
                        self.stats.resolved_ns += 1;
                    }
                    QueryOutcome::Host(Ok(None)) => {
                        self.stats.received += 1;
                        self.stats.note_response_time(completed.elapsed);
                        self.stats.bogus += 1;
                        self.host_ns_failed(host).await;
                    }
                    QueryOutcome::Host(Err(e)) => {
                        self.stats.received += 1;
                        self.stats.note_response_time(completed.elapsed);
                        debug!(host = %host, error = %e, "host query failed");
                        self.stats.bogus += 1;
                        self.host_ns_failed(host).await;
                    }
                    QueryOutcome::TimedOut => {
                        self.stats.timeouts += 1;
                        self.host_ns_failed(host).await;
                    }
                    QueryOutcome::Class(_) => unreachable!("host item always carries a host outcome"),
                }
            }
            WorkItem::Class(class) => {
                if let Some(entry) = self.classes.get_mut(&class) {
                    entry.bound = false;
                } else {
                    return;
                }
                match completed.outcome {
                    QueryOutcome::Class(Ok(Some(name))) => {
                        self.stats.received += 1;
                        self.stats.note_response_time(completed.elapsed);
                        if let Some(entry) = self.classes.get_mut(&class) {
                            entry.state = ClassState::FromNs(name);
                        }
                    }
                    QueryOutcome::Class(Ok(None)) => {
                        self.stats.received += 1;
                        self.stats.note_response_time(completed.elapsed);
                        self.class_ns_failed(class);
                    }
                    QueryOutcome::Class(Err(e)) => {
                        self.stats.received += 1;
                        self.stats.note_response_time(completed.elapsed);
                        debug!(class = %class, error = %e, "class query failed");
                        self.class_ns_failed(class);
                    }
                    QueryOutcome::TimedOut => {
                        self.stats.timeouts += 1;
                        self.class_ns_failed(class);
                    }
                    QueryOutcome::Host(_) => unreachable!("class item always carries a class outcome"),
                }
            }
        }
    }

    pub fn host_state(&self, host: HostKey) -> Option<HostState> {
        self.hosts.get(&host).map(|e| e.state.clone())
    }
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
