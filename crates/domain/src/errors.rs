use thiserror::Error;

/// Fatal errors raised before the driver loop starts (§7 "Startup fatal").
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("cannot open input file {path}: {source}")]
    InputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open resolution database {path}: {reason}")]
    Database { path: String, reason: String },

    #[error("--{flag} requires {requirement}")]
    MissingArgument { flag: &'static str, requirement: &'static str },

    #[error("no upstream nameserver configured and /etc/resolv.conf has none")]
    NoNameserver,
}

/// Non-fatal failures surfaced while the pipeline is running (§7).
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("transport exhausted: {0}")]
    TransportExhausted(String),

    #[error("malformed DNS reply: {0}")]
    MalformedReply(String),

    #[error("store I/O error: {0}")]
    Store(String),
}
