use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use revlog_domain::{scan_line, LineRecord};

use crate::core::ResolverCore;

/// Bounded window of buffered input lines (§4.1). Reading stops once the
/// window is full or the source is exhausted; `done` latches true once EOF
/// has been observed so the driver loop knows not to refill again.
pub struct LineBuffer {
    capacity: usize,
    anywhere: bool,
    lines: VecDeque<LineRecord>,
    done: bool,
}

impl LineBuffer {
    pub fn new(capacity: usize, anywhere: bool) -> Self {
        Self {
            capacity,
            anywhere,
            lines: VecDeque::new(),
            done: false,
        }
    }

    pub fn is_drained(&self) -> bool {
        self.done && self.lines.is_empty()
    }

    pub fn front(&self) -> Option<&LineRecord> {
        self.lines.front()
    }

    pub fn pop_front(&mut self) -> Option<LineRecord> {
        self.lines.pop_front()
    }

    /// Reads lines from `source` into the window, calling `addHost` (§4.2)
    /// for every scanned occurrence, until the window fills or EOF.
    pub async fn refill(
        &mut self,
        source: &mut (impl AsyncBufRead + Unpin),
        core: &mut ResolverCore,
    ) -> std::io::Result<()> {
        if self.done {
            return Ok(());
        }
        while self.lines.len() < self.capacity {
            let mut raw = String::new();
            let read = source.read_line(&mut raw).await?;
            if read == 0 {
                self.done = true;
                break;
            }
            if raw.ends_with('\n') {
                raw.pop();
                if raw.ends_with('\r') {
                    raw.pop();
                }
            }
            let hosts = scan_line(&raw, self.anywhere);
            for occurrence in &hosts {
                core.add_host(occurrence.host).await;
            }
            self.lines.push_back(LineRecord::new(raw, hosts));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::DnsQueryClient;
    use async_trait::async_trait;
    use revlog_domain::{ClassKey, HostKey, RunConfig, RuntimeError};
    use std::net::{Ipv4Addr, SocketAddr};
    use std::sync::Arc;
    use std::time::Duration;

    struct NeverDns;
    #[async_trait]
    impl DnsQueryClient for NeverDns {
        async fn query_ptr(&self, _host: HostKey) -> Result<Option<String>, RuntimeError> {
            Ok(None)
        }
        async fn query_class_ns(&self, _class: ClassKey) -> Result<Option<String>, RuntimeError> {
            Ok(None)
        }
    }

    fn test_core() -> ResolverCore {
        let config = Arc::new(RunConfig {
            recursive: false,
            anywhere: false,
            timeout: Duration::from_secs(30),
            sockets: 64,
            line_cache: 10_000,
            mask: Default::default(),
            database_policy: revlog_domain::DatabasePolicy::NetworkFirst,
            progress: false,
            nostats: false,
            nameserver: "127.0.0.1:53".parse::<SocketAddr>().unwrap(),
        });
        ResolverCore::new(config, Arc::new(NeverDns), None)
    }

    #[tokio::test]
    async fn refill_stops_at_capacity_and_scans_hosts() {
        let mut buf = LineBuffer::new(2, false);
        let mut core = test_core();
        let mut input = std::io::Cursor::new(b"10.0.0.1 connected\nno address here\nignored\n".to_vec());
        buf.refill(&mut input, &mut core).await.unwrap();
        assert_eq!(buf.lines.len(), 2);
        assert_eq!(
            buf.lines[0].hosts,
            vec![revlog_domain::HostOccurrence {
                host: HostKey(Ipv4Addr::new(10, 0, 0, 1)),
                start: 0,
                end: 8,
            }]
        );
        assert!(buf.lines[1].hosts.is_empty());
        assert!(!buf.is_drained());
    }

    #[tokio::test]
    async fn refill_marks_done_on_eof() {
        let mut buf = LineBuffer::new(10, false);
        let mut core = test_core();
        let mut input = std::io::Cursor::new(b"one line\n".to_vec());
        buf.refill(&mut input, &mut core).await.unwrap();
        assert!(buf.done);
        buf.pop_front();
        assert!(buf.is_drained());
    }
}
