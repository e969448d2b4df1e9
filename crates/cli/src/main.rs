mod dbutil;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{error, info};

use revlog_application::ports::ResolutionStore;
use revlog_domain::{DatabasePolicy, NameMask, RunConfig, StartupError};
use revlog_infrastructure::{resolv_conf, SqliteResolutionStore, UdpDnsClient};

#[derive(Parser)]
#[command(name = "revlog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rewrites IPv4 literals in a log stream to resolved hostnames")]
struct Cli {
    /// Input file, or "-" for stdin.
    #[arg(default_value = "-")]
    input: String,

    /// Fall back to a synthesized name from the owning nameserver when a
    /// host's own PTR lookup fails.
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Scan for address literals anywhere in a line, not only at its start.
    #[arg(short = 'a', long)]
    anywhere: bool,

    /// Per-query timeout in seconds.
    #[arg(short = 't', long, default_value_t = 30)]
    timeout: u64,

    /// Maximum number of queries in flight at once.
    #[arg(short = 's', long, default_value_t = 64)]
    sockets: usize,

    /// Number of lines held in the reorder buffer.
    #[arg(short = 'l', long, default_value_t = 10_000)]
    linecache: usize,

    /// Template used to synthesize a hostname from a recursed class.
    #[arg(short = 'm', long, default_value = "%i.%c")]
    mask: String,

    /// Path to the persistent resolution store.
    #[arg(long)]
    database: Option<PathBuf>,

    /// Consult the store before issuing a network query.
    #[arg(long)]
    dbfirst: bool,

    /// Never issue a network query; answer only from the store.
    #[arg(long)]
    dbonly: bool,

    /// Upstream nameserver, overriding /etc/resolv.conf.
    #[arg(long)]
    server: Option<SocketAddr>,

    /// Print a running progress glyph per resolved address.
    #[arg(short = 'p', long)]
    progress: bool,

    /// Suppress the summary line printed after the run.
    #[arg(long)]
    nostats: bool,

    /// Verbose logging.
    #[arg(long)]
    debug: bool,

    /// Dump every store record to stdout and exit.
    #[arg(long)]
    dumpdb: bool,

    /// Read "key name" pairs from this file (or "-" for stdin), upsert
    /// each with origin M, and exit.
    #[arg(long, value_name = "FILE")]
    mergedb: Option<String>,

    /// Delete store records older than this many hours and exit.
    #[arg(long, value_name = "HOURS")]
    expiredb: Option<u64>,

    /// Print address literals from the input that have no store record,
    /// without querying or mutating anything, and exit.
    #[arg(long)]
    unresolved: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!(error = %e, "revlog exiting with an error");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store: Option<Arc<dyn ResolutionStore>> = match &cli.database {
        Some(path) => {
            let path = path.to_string_lossy().into_owned();
            let store = SqliteResolutionStore::open(&path)
                .await
                .map_err(|source| StartupError::Database { path, reason: source.to_string() })?;
            Some(Arc::new(store))
        }
        None => None,
    };

    if cli.dumpdb || cli.mergedb.is_some() || cli.expiredb.is_some() {
        let store = store.ok_or(StartupError::MissingArgument {
            flag: "dumpdb/mergedb/expiredb",
            requirement: "--database=<path>",
        })?;
        return run_db_utility(&cli, store.as_ref()).await;
    }

    let nameserver = cli
        .server
        .or_else(resolv_conf::read_default_nameserver)
        .ok_or(StartupError::NoNameserver)?;
    info!(%nameserver, "using upstream nameserver");

    let database_policy = match (cli.dbonly, cli.dbfirst) {
        (true, _) => DatabasePolicy::DatabaseOnly,
        (false, true) => DatabasePolicy::DatabaseFirst,
        (false, false) => DatabasePolicy::NetworkFirst,
    };

    let input: Box<dyn tokio::io::AsyncRead + Unpin> = if cli.input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let path = cli.input.clone();
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|source| StartupError::InputFile { path, source })?;
        Box::new(file)
    };

    if cli.unresolved {
        let store = store.ok_or(StartupError::MissingArgument {
            flag: "unresolved",
            requirement: "--database=<path>",
        })?;
        let reader = std::io::BufReader::new(SyncBridge::drain(input).await?);
        let mut stdout = std::io::stdout();
        dbutil::unresolved(store.as_ref(), reader, cli.anywhere, &mut stdout).await?;
        return Ok(());
    }

    let config = Arc::new(RunConfig {
        recursive: cli.recursive,
        anywhere: cli.anywhere,
        timeout: Duration::from_secs(cli.timeout),
        sockets: cli.sockets,
        line_cache: cli.linecache,
        mask: NameMask::new(cli.mask),
        database_policy,
        progress: cli.progress,
        nostats: cli.nostats,
        nameserver,
    });

    let dns = Arc::new(UdpDnsClient::new(nameserver, config.timeout));
    let reader = BufReader::new(input);
    let mut stdout = tokio::io::stdout();

    let stats = revlog_application::run(config.clone(), dns, store, reader, &mut stdout, std::io::stderr())
        .await?;
    stdout.flush().await?;

    if !config.nostats {
        eprintln!("{}", stats.summary());
    }

    Ok(())
}

async fn run_db_utility(cli: &Cli, store: &dyn ResolutionStore) -> anyhow::Result<()> {
    if cli.dumpdb {
        let mut stdout = std::io::stdout();
        dbutil::dump(store, &mut stdout).await?;
    }

    if let Some(path) = &cli.mergedb {
        let now = now_unix();
        let reader: Box<dyn std::io::BufRead> = if path == "-" {
            Box::new(std::io::BufReader::new(std::io::stdin()))
        } else {
            Box::new(std::io::BufReader::new(std::fs::File::open(path).map_err(|source| {
                StartupError::InputFile { path: path.clone(), source }
            })?))
        };
        let count = dbutil::merge(store, reader, now).await?;
        info!(count, "merged records");
    }

    if let Some(hours) = cli.expiredb {
        let cutoff = now_unix() - (hours as i64) * 3600;
        let removed = dbutil::expire(store, cutoff).await?;
        info!(removed, "expired records");
    }

    Ok(())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Reads an async input to completion into memory so `--unresolved` can
/// reuse the synchronous scanner without a second I/O abstraction.
struct SyncBridge;

impl SyncBridge {
    async fn drain(mut input: Box<dyn tokio::io::AsyncRead + Unpin>) -> anyhow::Result<std::io::Cursor<Vec<u8>>> {
        use tokio::io::AsyncReadExt;
        let mut buf = Vec::new();
        input.read_to_end(&mut buf).await?;
        Ok(std::io::Cursor::new(buf))
    }
}
