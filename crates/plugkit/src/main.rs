mod cli; // Argument definitions and command handlers

use std::process::ExitCode;

use clap::Parser;
use cli::CliArgs;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} (code {})", e, e.code());
            ExitCode::FAILURE
        }
    }
}
