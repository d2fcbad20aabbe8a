// src/main.rs

use dagrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("dagrun error: {err:?}");
        std::process::exit(1);
    }

    // `run` has already reported the failure through the reporter.
    if run(args).await.is_err() {
        std::process::exit(1);
    }
}
