// SPDX-License-Identifier: MIT

use clap::Parser;
use tracing::error;

use caseview::cli;
use caseview::logger;

#[tokio::main]
async fn main() {
    logger::init_offset();

    let args = cli::Args::parse();

    let log_level = if args.verbose > 1 {
        tracing::Level::TRACE
    } else if args.verbose > 0 {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    logger::init_logger(log_level);
    logger::init_stdlog();

    if let Err(err) = cli::main(args).await {
        error!("{}", err);
        std::process::exit(1);
    }
}
