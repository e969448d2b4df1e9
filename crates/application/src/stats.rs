use std::time::Duration;

/// Running counters updated by the response reactor (§4.4 point 5).
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub hosts_added: u64,
    pub queries_sent: u64,
    pub received: u64,
    pub resolved_ns: u64,
    pub resolved_recursion: u64,
    pub resolved_store: u64,
    pub bogus: u64,
    pub timeouts: u64,
    pub failed: u64,
    pub store_write_failures: u64,
    pub max_response: Duration,
}

impl Stats {
    pub fn note_response_time(&mut self, elapsed: Duration) {
        if elapsed > self.max_response {
            self.max_response = elapsed;
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "hosts added {}, queries sent {}, received {}, resolved: ns {} recursion {} store {}, \
             bogus {}, timeouts {}, failed {}, store write failures {}, max response time {:?}",
            self.hosts_added,
            self.queries_sent,
            self.received,
            self.resolved_ns,
            self.resolved_recursion,
            self.resolved_store,
            self.bogus,
            self.timeouts,
            self.failed,
            self.store_write_failures,
            self.max_response
        )
    }
}
