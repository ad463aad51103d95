/// Action CLI
///
/// Runs and validates compiled action programs from the command line.
use action_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
