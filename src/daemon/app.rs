use crate::cli::config::SettingsUpdate;
use crate::cli::status::print_account_card;
use crate::core::event_log::LogEntry;
use crate::core::settings::Settings;
use crate::engine::{build_controller, Controller, StartError};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorCommand {
    Start,
    Stop,
    Stats,
    Clear,
    Status,
    Help,
    Quit,
}

impl OperatorCommand {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "stats" | "s" => Some(Self::Stats),
            "clear" | "c" => Some(Self::Clear),
            "status" => Some(Self::Status),
            "help" | "h" | "?" => Some(Self::Help),
            "quit" | "q" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub async fn run(update: SettingsUpdate) -> Result<()> {
    let mut settings = Settings::load();
    if update.apply(&mut settings) {
        match settings.save() {
            Ok(path) => tracing::info!(?path, "Saved updated settings"),
            Err(e) => tracing::warn!(error = %e, "Failed to save settings"),
        }
    }

    let controller = build_controller(&settings)?;
    tokio::spawn(print_log_entries(controller.store().subscribe()));

    start(&controller, &settings)
        .await
        .context("Cannot start polling")?;
    println!("Type `help` for commands, Ctrl-C to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let Some(cmd) = OperatorCommand::parse(&line) else {
                            println!("Unknown command: {}. Type `help`.", line.trim());
                            continue;
                        };
                        if cmd == OperatorCommand::Quit {
                            break;
                        }
                        handle_command(cmd, &controller, &settings).await;
                    }
                    Ok(None) => {
                        tracing::debug!("stdin closed, waiting for Ctrl-C");
                        stdin_open = false;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    controller.stop().await;
    print_stats(&controller).await;
    Ok(())
}

async fn start(controller: &Controller, settings: &Settings) -> Result<(), StartError> {
    controller.start(&settings.account).await.map(|_| ())
}

async fn handle_command(cmd: OperatorCommand, controller: &Controller, settings: &Settings) {
    match cmd {
        OperatorCommand::Start => match start(controller, settings).await {
            Ok(()) => {}
            Err(StartError::AlreadyRunning) => println!("Already running"),
            Err(e) => println!("Cannot start: {e}"),
        },
        OperatorCommand::Stop => {
            if !controller.stop().await {
                println!("Already idle");
            }
        }
        OperatorCommand::Stats => print_stats(controller).await,
        OperatorCommand::Clear => {
            controller.clear_log().await;
            println!("Log cleared");
        }
        OperatorCommand::Status => {
            match controller.active_config().await {
                Some(config) => println!(
                    "State: Running for {} every {}s ({} consecutive errors)",
                    config.uid,
                    config.interval.as_secs(),
                    controller.store().consecutive_failures().await
                ),
                None => println!("State: {}", controller.state().await.label()),
            }
            match controller.store().last_snapshot().await {
                Some(account) => print_account_card(&account),
                None => println!("  No account data yet"),
            }
        }
        OperatorCommand::Help => {
            println!("Commands: start, stop, stats (s), clear (c), status, help, quit (q)");
        }
        OperatorCommand::Quit => {}
    }
}

async fn print_stats(controller: &Controller) {
    let stats = controller.stats().await;
    let points = stats
        .last_known_points
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "State: {} | requests: {} | successes: {} | errors: {} | points: {}",
        controller.state().await.label(),
        stats.requests,
        stats.successes,
        stats.errors,
        points
    );
}

async fn print_log_entries(mut rx: broadcast::Receiver<LogEntry>) {
    loop {
        match rx.recv().await {
            Ok(entry) => println!("{entry}"),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Log printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
