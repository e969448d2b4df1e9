pub mod message;
pub mod transport;

pub use transport::UdpDnsClient;
