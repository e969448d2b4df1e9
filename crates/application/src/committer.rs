use tokio::io::{AsyncWrite, AsyncWriteExt};

use revlog_domain::HostState;

use crate::core::ResolverCore;
use crate::line_buffer::LineBuffer;
use crate::progress::ProgressReporter;

/// Walks the buffer head and emits every line whose hosts have all reached
/// a terminal state (§4.7). Stops at the first line still blocked, or once
/// the buffer runs dry.
pub async fn commit_ready_lines(
    buffer: &mut LineBuffer,
    core: &mut ResolverCore,
    out: &mut (impl AsyncWrite + Unpin),
    progress: &mut ProgressReporter,
    progress_sink: &mut impl std::io::Write,
) -> std::io::Result<()> {
    loop {
        let hosts = match buffer.front() {
            Some(line) => line.hosts.clone(),
            None => break,
        };
        if hosts.is_empty() {
            let mut text = buffer.pop_front().unwrap().text;
            text.push('\n');
            out.write_all(text.as_bytes()).await?;
            continue;
        }

        let mut all_ready = true;
        for occurrence in &hosts {
            if matches!(core.host_state(occurrence.host), Some(HostState::PendingRecurse)) {
                core.advance_recursion(occurrence.host).await;
            }
            match core.host_state(occurrence.host) {
                Some(state) if state.is_terminal() => {}
                _ => all_ready = false,
            }
        }
        if !all_ready {
            break;
        }

        let mut record = buffer.pop_front().unwrap();
        // Occurrences are in left-to-right scan order; replacing one shifts
        // the byte offsets of every later occurrence in the same line by
        // the difference between its replacement name and original span.
        let mut shift: isize = 0;
        for occurrence in hosts {
            let state = core.host_state(occurrence.host);
            if let Some(state) = &state {
                if *state != HostState::Failed {
                    if let Some(name) = state.resolved_name() {
                        let start = (occurrence.start as isize + shift) as usize;
                        let end = (occurrence.end as isize + shift) as usize;
                        record.text.replace_range(start..end, name);
                        shift += name.len() as isize - (occurrence.end - occurrence.start) as isize;
                    }
                }
            }
            let deleted = core.remove_host(occurrence.host).await;
            if deleted {
                emit_progress_glyph(state, progress, progress_sink);
            }
        }
        record.text.push('\n');
        out.write_all(record.text.as_bytes()).await?;
    }
    out.flush().await
}

fn emit_progress_glyph(
    state: Option<HostState>,
    progress: &mut ProgressReporter,
    sink: &mut impl std::io::Write,
) {
    match state {
        Some(HostState::FromNs(_)) => progress.network(sink),
        Some(HostState::FromRecursion(_)) => progress.recursion(sink),
        Some(HostState::FromStore(_)) => progress.store_hit(sink),
        _ => {}
    }
}
