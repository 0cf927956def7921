use clap::Parser;
use portfolio_explorer::api::{self, Cli};

#[tokio::main]
async fn main() {
    api::init_tracing();
    if let Err(e) = api::run(Cli::parse()).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
