use looper_core::logging;

mod cli;

use crate::cli::{exit_code, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Initialize logging as early as possible.
    if cli.log_stderr || logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli.run().await {
        eprintln!("looper error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}
