// SeekCode - terminal coding assistant
// Main entry point

use clap::Parser;
use tracing_subscriber::EnvFilter;

use seekcode::cli::{self, Cli, EXIT_FAILURE};

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,seekcode=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
