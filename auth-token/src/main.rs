use std::path::PathBuf;
use std::process::ExitCode;

use auth_token::errors::TokenError;
use auth_token::services::TokenService;
use auth_token::utils::Config;
use clap::{Parser, Subcommand};
use log::error;

#[derive(Parser)]
#[command(name = "auth-token", version, about = "Issue and verify signed auth tokens")]
struct Cli {
    /// TOML file with `Secret` and `Expiration`; defaults to $AUTH_TOKEN_CONFIG or config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a new token for IDENTITY
    Issue { identity: String },
    /// Print the identity carried by a valid TOKEN
    Verify { token: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load config: {err}");
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let token_service = match TokenService::new(&config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Issue { identity } => {
            println!("{}", token_service.issue(&identity).await);
            ExitCode::SUCCESS
        }
        Command::Verify { token } => match token_service.verify(&token).await {
            Ok(identity) => {
                println!("{identity}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{err}");
                exit_code_for(&err)
            }
        },
    }
}

fn exit_code_for(err: &TokenError) -> ExitCode {
    if err.is_expired() {
        ExitCode::from(3)
    } else {
        ExitCode::from(2)
    }
}
