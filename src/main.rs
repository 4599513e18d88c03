use clap::{Parser, Subcommand};
use serde::Serialize;

mod commands;

use commands::{bundle, fetch, run, status, trigger, CmdResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "farmhand")]
#[command(version = VERSION)]
#[command(about = "CLI for remote build-farm test orchestration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger a build, wait for it, fetch artifacts, run tests, bundle logs
    Run(run::RunArgs),
    /// Trigger a remote build and print its handle
    Trigger(trigger::TriggerArgs),
    /// Query the status of a build once
    Status(status::StatusArgs),
    /// Download and extract a job's artifact archive
    Fetch(fetch::FetchArgs),
    /// Bundle matching result files from a directory into an archive
    Bundle(bundle::BundleArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => finish(run::run(args)),
        Commands::Trigger(args) => finish(trigger::run(args)),
        Commands::Status(args) => finish(status::run(args)),
        Commands::Fetch(args) => finish(fetch::run(args)),
        Commands::Bundle(args) => finish(bundle::run(args)),
    }
}

fn finish<T: Serialize>(result: CmdResult<T>) -> std::process::ExitCode {
    match result {
        Ok((payload, exit_code)) => {
            match serde_json::to_string_pretty(&payload) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error[internal.json_error]: {}", e);
                    return std::process::ExitCode::from(1);
                }
            }
            std::process::ExitCode::from(exit_code_to_u8(exit_code))
        }
        Err(err) => {
            eprintln!("error[{}]: {}", err.code.as_str(), err.message);
            if !err.details.is_null()
                && err.details.as_object().is_none_or(|o| !o.is_empty())
            {
                match serde_json::to_string_pretty(&err.details) {
                    Ok(details) => eprintln!("{}", details),
                    Err(_) => eprintln!("{}", err.details),
                }
            }
            for hint in &err.hints {
                eprintln!("hint: {}", hint.message);
            }
            std::process::ExitCode::from(1)
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
