use clap::Parser;
use stockdata::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
