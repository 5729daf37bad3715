use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pharmaclear_client::{BearerToken, DashboardBackend, HttpBackend, SessionCredential};
use pharmaclear_dashboard::{ChatOutcome, ChatRejection, Dashboard};
use pharmaclear_types::SearchResultSet;

mod commands;
mod config;
mod sink;

use commands::{Command, HELP};
use config::Config;
use sink::DirectorySink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting PharmaClear dashboard");
    tracing::info!("Backend: {}", config.backend.base_url);

    let backend: Arc<dyn DashboardBackend> = Arc::new(HttpBackend::new(config.backend.clone())?);

    match backend.health().await {
        Ok(health) => tracing::info!("Backend health: {}", health.status),
        Err(e) => tracing::warn!("Backend health check failed: {}", e),
    }

    let token = backend
        .issue_token(&config.username, &config.password)
        .await
        .map_err(|e| anyhow::anyhow!("Sign-in failed: {}", e.user_message()))?;
    tracing::info!("Signed in as {}", config.username);

    let credential = SessionCredential::new(BearerToken::new(token.access_token));
    let dashboard = Dashboard::new(backend, credential, config.dashboard.clone());
    let sink = DirectorySink::new(&config.reports.directory);

    dashboard.start().await;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        run(&dashboard, &sink, command).await?;
    }

    dashboard.shutdown().await;
    Ok(())
}

async fn run(dashboard: &Dashboard, sink: &DirectorySink, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Search(query) => print_search(dashboard.search(&query).await),
        Command::Rerun(id) => print_search(dashboard.select_history(id).await),
        Command::History => {
            let view = dashboard.view().await;
            if let Some(message) = view.history.status.failure() {
                println!("Could not load history: {}", message);
            }
            for entry in &view.history.entries {
                println!(
                    "  [{}] {}  {}",
                    entry.id,
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.query_text
                );
            }
        }
        Command::Watch(query) => match dashboard.add_to_watchlist(&query).await {
            Some(item) => println!("Watching '{}' (id {})", item.query_text, item.id),
            None => println!("'{}' was not added", query.trim()),
        },
        Command::Unwatch(id) => {
            if dashboard.remove_from_watchlist(id).await {
                println!("Removed {}", id);
            } else {
                println!("Nothing removed");
            }
        }
        Command::Watchlist => {
            let view = dashboard.view().await;
            if let Some(message) = view.watchlist.status.failure() {
                println!("Could not load watchlist: {}", message);
            }
            for item in &view.watchlist.items {
                println!("  [{}] {}", item.id, item.query_text);
            }
        }
        Command::Ask(question) => match dashboard.send_chat(&question).await {
            ChatOutcome::Replied(message) | ChatOutcome::Fallback(message) => {
                println!("Assistant: {}", message.text)
            }
            ChatOutcome::Discarded => println!("The conversation was reset before the reply arrived"),
            ChatOutcome::Rejected(ChatRejection::NoContext) => println!("Search for something first"),
            ChatOutcome::Rejected(ChatRejection::Busy) => println!("Still waiting on the last answer"),
            ChatOutcome::Rejected(ChatRejection::EmptyQuestion) => println!("usage: ask <question>"),
        },
        Command::Bell => {
            let visible = dashboard.toggle_notifications().await;
            if visible {
                for notification in dashboard.view().await.notifications.items {
                    println!(
                        "  {} {}",
                        if notification.is_read { " " } else { "*" },
                        notification.message
                    );
                }
            } else {
                println!("Notifications closed");
            }
        }
        Command::Report => match dashboard.generate_report(sink).await {
            Ok(location) => println!("Report saved to {}", location),
            Err(e) => println!("Report failed: {}", e.user_message()),
        },
        Command::View => {
            println!("{}", serde_json::to_string_pretty(&dashboard.view().await)?);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }

    Ok(())
}

fn print_search(outcome: pharmaclear_client::Result<Option<Arc<SearchResultSet>>>) {
    match outcome {
        Ok(Some(results)) if results.is_empty() => println!("No alerts found for '{}'", results.query),
        Ok(Some(results)) => {
            println!("{} alert(s) for '{}'", results.total, results.query);
            for alert in &results.alerts {
                println!("  #{} [{}] {} ({})", alert.id, alert.severity, alert.title, alert.date);
                println!("      {}", alert.description);
            }
        }
        Ok(None) => {}
        Err(e) => println!("Search failed: {}", e.user_message()),
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so they never interleave with command output
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
