use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite};

use revlog_domain::RunConfig;

use crate::committer::commit_ready_lines;
use crate::core::ResolverCore;
use crate::line_buffer::LineBuffer;
use crate::ports::{DnsQueryClient, ResolutionStore};
use crate::progress::ProgressReporter;
use crate::stats::Stats;

/// The five-step tick of §4.8, repeated until the buffer is empty and
/// input is exhausted.
pub async fn run(
    config: Arc<RunConfig>,
    dns: Arc<dyn DnsQueryClient>,
    store: Option<Arc<dyn ResolutionStore>>,
    mut input: impl AsyncBufRead + Unpin,
    mut output: impl AsyncWrite + Unpin,
    mut progress_sink: impl std::io::Write,
) -> std::io::Result<Stats> {
    let mut buffer = LineBuffer::new(config.line_cache, config.anywhere);
    let mut core = ResolverCore::new(config.clone(), dns, store);
    let mut progress = ProgressReporter::new(config.progress);

    loop {
        buffer.refill(&mut input, &mut core).await?;

        core.dispatch();
        core.react().await;

        commit_ready_lines(&mut buffer, &mut core, &mut output, &mut progress, &mut progress_sink)
            .await?;

        if buffer.is_drained() && core.is_idle() {
            break;
        }
    }

    progress.finish(&mut progress_sink);
    Ok(core.stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use revlog_domain::{ClassKey, HostKey, RuntimeError};
    use std::net::SocketAddr;
    use std::time::Duration;

    struct EchoDns;
    #[async_trait]
    impl DnsQueryClient for EchoDns {
        async fn query_ptr(&self, host: HostKey) -> Result<Option<String>, RuntimeError> {
            Ok(Some(format!("host-{}.example.", host)))
        }
        async fn query_class_ns(&self, _class: ClassKey) -> Result<Option<String>, RuntimeError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn resolves_and_rewrites_in_order() {
        let config = Arc::new(RunConfig {
            recursive: false,
            anywhere: true,
            timeout: Duration::from_secs(1),
            sockets: 4,
            line_cache: 100,
            mask: Default::default(),
            database_policy: revlog_domain::DatabasePolicy::NetworkFirst,
            progress: false,
            nostats: true,
            nameserver: "127.0.0.1:53".parse::<SocketAddr>().unwrap(),
        });
        let input = std::io::Cursor::new(b"request from 10.0.0.1\nno address\n".to_vec());
        let mut output = Vec::new();
        let mut progress_sink = Vec::new();

        let stats = run(config, Arc::new(EchoDns), None, input, &mut output, &mut progress_sink)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "request from host-10.0.0.1.example.\nno address\n");
        assert_eq!(stats.resolved_ns, 1);
    }
}
