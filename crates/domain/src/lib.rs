//! revlog domain layer — address/class keys, pending-entry states, line and
//! store records, the name mask, and run configuration. No I/O lives here.

pub mod address;
pub mod config;
pub mod errors;
pub mod line;
pub mod mask;
pub mod state;
pub mod store_record;

pub use address::{scan_line, ClassKey, ClassWidth, HostKey, HostOccurrence};
pub use config::{DatabasePolicy, RunConfig};
pub use errors::{RuntimeError, StartupError};
pub use line::LineRecord;
pub use mask::NameMask;
pub use state::{ClassState, HostState, Origin};
pub use store_record::StoreRecord;
