use clap::{Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use wondasteach::prelude::*;

#[derive(Parser)]
#[clap(name = "wondasteach", version, about = "Inspect the WondasTeach data layer")]
struct Cli {
    /// Directory for the local store (overrides WONDASTEACH_DATA_DIR)
    #[clap(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Store local data under the per-user data directory
    #[clap(long, conflicts_with = "data_dir")]
    persist: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which backend is in use and whether it is healthy
    Status,
    /// List the sample accounts available for sign-in
    DemoAccounts,
    /// Print entity counts
    Analytics,
    /// List open jobs, newest first
    Jobs {
        /// Show at most this many jobs
        #[clap(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = BackendConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.with_storage_dir(Some(dir));
    } else if cli.persist {
        config = config.with_storage_dir(Some(BackendConfig::default_data_dir()));
    }

    let app = WondasTeach::new(config)?;
    let data = app.data();

    match cli.command {
        Command::Status => {
            let status = data.connection_status();
            println!("mode:        {:?}", status.mode);
            println!("url:         {}", status.url);
            println!("credentials: {}", status.has_real_credentials);
            let health = data.health_check().await?;
            println!(
                "health:      {} ({} {}, served by {:?})",
                health.status, health.service, health.version, health.mode
            );
        }
        Command::DemoAccounts => {
            for account in data.demo_accounts().await {
                println!(
                    "{:<8} {:<40} {}",
                    account.user_type.as_str(),
                    account.email,
                    account.name
                );
            }
        }
        Command::Analytics => {
            let analytics = data.get_analytics().await?;
            println!("{}", serde_json::to_string_pretty(&analytics)?);
        }
        Command::Jobs { limit } => {
            for job in data.get_jobs().await?.into_iter().take(limit) {
                println!(
                    "{}  {}  {} ({})",
                    job.posted_date, job.title, job.school, job.location
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
