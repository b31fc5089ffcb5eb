use std::process;

use clap::Parser;

use tileconv::config;
use tileconv::util;

fn main() {
    let config = config::Config::parse();

    if let Err(err) = util::setup_logger(config.verbose) {
        eprintln!("Error setting up logging: {err}");
    }

    tileconv::run(&config).unwrap_or_else(|err| {
        eprintln!("Error running application: {err:#}");
        process::exit(1)
    });
}
