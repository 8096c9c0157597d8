use clap::Parser;

mod cli;
mod commands;

use cli::Args;

#[tokio::main]
async fn main() {
    // Guard keeps the file appender alive for the whole process.
    let _log_guard = hubsync_logging::init_subscriber();

    let args = Args::parse();
    if let Err(e) = commands::execute(args).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}
