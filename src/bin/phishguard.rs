use clap::Parser;
use phishguard_client::cli::Cli;
use tracing_subscriber::EnvFilter;

// One logical thread of control: every wait is an I/O suspension point
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    // Load .env if present so PHISHGUARD_API_URL and friends are picked up
    let _ = dotenvy::dotenv();

    // Logs go to stderr so --json output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    phishguard_client::cli::run(cli).await
}
