use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "attendanced", about = "School attendance tracking daemon")]
struct Args {
    /// Address to bind. Port 0 picks a free port; the chosen address is
    /// printed on stdout for supervisors.
    #[arg(long, env = "ATTENDANCED_ADDR", default_value = "127.0.0.1:8080")]
    addr: String,

    /// Path to the SQLite workspace (created on first run).
    #[arg(long, env = "ATTENDANCED_DB")]
    db: PathBuf,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let conn = attendanced::db::open_db(&args.db)
        .with_context(|| format!("open workspace {}", args.db.display()))?;

    let server = tiny_http::Server::http(&args.addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", args.addr, e))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| anyhow::anyhow!("listener has no tcp address"))?;
    println!("attendanced listening on http://{}", addr);
    std::io::stdout().flush()?;
    tracing::info!(%addr, db = %args.db.display(), "serving");

    attendanced::http::serve(&server, &conn)
}
