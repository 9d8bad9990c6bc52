use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod core;
mod daemon;
mod engine;
mod remote;

use cli::config::SettingsUpdate;

#[derive(Parser)]
#[command(name = "points-poller")]
#[command(author, version, about = "Periodically grant reward points and track the balance")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start polling until stopped
    Run {
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Show the current account snapshot
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Account to query (defaults to the saved UID)
        #[arg(long)]
        uid: Option<String>,
    },

    /// Run a single cycle and exit
    Once {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or change saved settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the saved settings
    Show,

    /// Print the settings file location
    Path,

    /// Update and save settings
    Set {
        #[command(flatten)]
        account: AccountArgs,

        /// Remote service base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Wait after granting points before re-reading, in milliseconds
        #[arg(long)]
        settle_delay_ms: Option<u64>,

        /// Whether a new cycle may start while the previous one is in flight
        #[arg(long)]
        allow_overlap: Option<bool>,
    },
}

#[derive(Args)]
struct AccountArgs {
    /// User UID
    #[arg(long)]
    uid: Option<String>,

    /// Account e-mail
    #[arg(long)]
    email: Option<String>,

    /// Device ID sent with each grant
    #[arg(long)]
    device_id: Option<String>,

    /// Polling interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

impl From<AccountArgs> for SettingsUpdate {
    fn from(args: AccountArgs) -> Self {
        Self {
            uid: args.uid,
            email: args.email,
            device_id: args.device_id,
            interval: args.interval,
            ..Default::default()
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { account } => {
            init_logging(cli.log_json);
            daemon::run(account.into()).await
        }
        Commands::Status { json, uid } => {
            init_logging(cli.log_json);
            cli::status::run(json, uid).await
        }
        Commands::Once { json } => {
            init_logging(cli.log_json);
            cli::once::run(json).await
        }
        Commands::Config { command } => {
            init_logging(cli.log_json);
            match command {
                ConfigCommand::Show => cli::config::show(),
                ConfigCommand::Path => cli::config::path(),
                ConfigCommand::Set {
                    account,
                    base_url,
                    settle_delay_ms,
                    allow_overlap,
                } => cli::config::set(SettingsUpdate {
                    base_url,
                    settle_delay_ms,
                    allow_overlap,
                    ..SettingsUpdate::from(account)
                }),
            }
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
