mod args;
mod board;

use clap::Parser;
use log::{debug, LevelFilter};

use crate::args::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    if let Err(e) = board::run(args).await {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
