//! UDP transport for the single-query primitive the core's dispatcher
//! spawns (§4.3). Grounded on the teacher's bind-ephemeral-per-query UDP
//! transport, generalized from "send one message, get one reply" behind a
//! pooled resolver into the primitive a bounded `JoinSet` of tasks calls
//! directly.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use revlog_application::ports::DnsQueryClient;
use revlog_domain::{ClassKey, HostKey, RuntimeError};

use crate::dns::message::{build_class_ns_query, build_ptr_query, parse_class_ns_response, parse_ptr_response};

const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Sends PTR/NS queries to one fixed upstream nameserver over UDP,
/// binding a fresh ephemeral socket per query.
pub struct UdpDnsClient {
    server: SocketAddr,
    send_timeout: Duration,
    /// Latches true once a socket bind has failed (§7 "transport
    /// exhaustion"), cleared on the next successful bind.
    exhausted: AtomicBool,
}

impl UdpDnsClient {
    pub fn new(server: SocketAddr, send_timeout: Duration) -> Self {
        Self {
            server,
            send_timeout,
            exhausted: AtomicBool::new(false),
        }
    }

    async fn roundtrip(&self, query_id: u16, wire: &[u8]) -> Result<Vec<u8>, RuntimeError> {
        let bind_addr: SocketAddr = if self.server.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = match UdpSocket::bind(bind_addr).await {
            Ok(s) => {
                self.exhausted.store(false, Ordering::Relaxed);
                s
            }
            Err(e) => {
                self.exhausted.store(true, Ordering::Relaxed);
                return Err(RuntimeError::TransportExhausted(format!(
                    "failed to bind UDP socket: {e}"
                )));
            }
        };

        tokio::time::timeout(self.send_timeout, socket.send_to(wire, self.server))
            .await
            .map_err(|_| RuntimeError::MalformedReply("timed out sending query".to_string()))?
            .map_err(|e| RuntimeError::MalformedReply(format!("send failed: {e}")))?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let (received, from) = tokio::time::timeout(self.send_timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| RuntimeError::MalformedReply("timed out awaiting reply".to_string()))?
            .map_err(|e| RuntimeError::MalformedReply(format!("recv failed: {e}")))?;

        if from.ip() != self.server.ip() {
            warn!(expected = %self.server, from = %from, "reply from unexpected source");
        }
        buf.truncate(received);
        if buf.len() < 2 {
            return Err(RuntimeError::MalformedReply("reply shorter than a DNS header".to_string()));
        }

        let reply_id = u16::from_be_bytes([buf[0], buf[1]]);
        if reply_id != query_id {
            debug!(query_id, reply_id, "reply id mismatch, accepting anyway");
        }

        Ok(buf)
    }
}

#[async_trait]
impl DnsQueryClient for UdpDnsClient {
    async fn query_ptr(&self, host: HostKey) -> Result<Option<String>, RuntimeError> {
        let (id, wire) = build_ptr_query(host)?;
        let reply = self.roundtrip(id, &wire).await?;
        parse_ptr_response(&reply)
    }

    async fn query_class_ns(&self, class: ClassKey) -> Result<Option<String>, RuntimeError> {
        let (id, wire) = build_class_ns_query(class)?;
        let reply = self.roundtrip(id, &wire).await?;
        parse_class_ns_response(&reply)
    }

    fn has_capacity(&self) -> bool {
        !self.exhausted.load(Ordering::Relaxed)
    }
}
