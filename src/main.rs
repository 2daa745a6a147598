use clap::Parser;
use storyloom::{cli, logging};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    if let Err(err) = logging::init(args.log_file.as_deref()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    if let Err(err) = cli::run(args).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
