//! Linkup CLI - search users and send friend requests from the terminal.
//!
//! Drives the same `FriendRequestDialog` a UI would, over the REST client.

mod repl;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use linkup_core::{
    Candidate, DialogServices, DialogState, FriendRequestDialog, Keyword, LinkupConfig, Notice,
    NoticeKind, Notifier, SubmitOutcome,
};
use linkup_http::{stub, ApiClient, StubState};
use tokio::sync::watch;
use tracing::{error, info};

/// Linkup CLI - find people and send them friend requests.
#[derive(Parser)]
#[command(name = "linkup", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Directory containing .linkup.toml (default: current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides config and LINKUP_API_URL
    #[arg(long, global = true)]
    api: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up users by name or username
    Search {
        /// Search keyword
        keyword: String,
    },
    /// Find a user and send them a friend request
    Request {
        /// Search keyword, resolved to one user
        keyword: String,

        /// Message sent with the request
        #[arg(long, short, default_value = "")]
        message: String,

        /// Pick the N-th search result (1-indexed) instead of resolving the keyword
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Interactive dialog driven by line commands on stdin
    Dialog,
    /// Run a local stand-in for the user API
    ServeStub {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: String,

        /// JSON file with the user list (default: built-in demo users)
        #[arg(long)]
        users: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Prints notices as they happen.
struct ConsoleNotifier {
    json: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if self.json {
            println!("{}", serde_json::json!({ "notice": notice }));
            return;
        }
        match notice.kind {
            NoticeKind::Success => eprintln!("\u{2713} {}", notice.text),
            NoticeKind::Error => eprintln!("\u{2717} {}", notice.text),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing(default_level: &str) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for krate in ["linkup_core", "linkup_http", "linkup"] {
        if let Ok(directive) = format!("{krate}={default_level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> LinkupConfig {
    let dir = cli
        .config
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let mut config = linkup_core::load_config(&dir).with_env_overrides();
    if let Some(api) = &cli.api {
        config.api_base_url = api.trim_end_matches('/').to_string();
    }
    config
}

fn build_dialog(config: &LinkupConfig, json: bool) -> FriendRequestDialog {
    let client = match ApiClient::new(config) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Could not create API client: {e}");
            std::process::exit(1);
        }
    };
    let services = DialogServices {
        directory: client.clone(),
        edges: client,
        notifier: Arc::new(ConsoleNotifier { json }),
    };
    FriendRequestDialog::new(services, config)
}

/// Wait until results for `keyword` have landed (a failed lookup lands as an
/// empty list). Returns the snapshot at that point.
async fn wait_for_results(
    rx: &mut watch::Receiver<DialogState>,
    keyword: &Keyword,
    limit: Duration,
) -> Option<DialogState> {
    let landed = tokio::time::timeout(limit, async {
        loop {
            {
                let state = rx.borrow_and_update();
                if state.results_for.as_ref() == Some(keyword) {
                    return Some(state.clone());
                }
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    })
    .await;
    landed.ok().flatten()
}

pub(crate) fn print_results(results: &[Candidate]) {
    for (i, c) in results.iter().enumerate() {
        println!("{:>3}. {:<10} {:<30} @{}", i + 1, c.id, c.display_name, c.username);
    }
}

async fn search_and_wait(dialog: &FriendRequestDialog, raw: &str, config: &LinkupConfig) -> DialogState {
    let keyword = Keyword::new(raw);
    if keyword.is_empty() {
        eprintln!("Keyword is empty");
        std::process::exit(1);
    }
    let mut rx = dialog.subscribe();
    dialog.on_keyword_change(raw);
    let limit = config.debounce() + config.request_timeout() + Duration::from_secs(1);
    match wait_for_results(&mut rx, &keyword, limit).await {
        Some(state) => state,
        None => {
            eprintln!("Search for '{keyword}' did not complete");
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Graceful shutdown signal
// ---------------------------------------------------------------------------

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                error!(error = %e, "Could not register SIGTERM handler");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let level = if matches!(cli.command, Commands::ServeStub { .. }) { "info" } else { "warn" };
    init_tracing(level);

    let config = resolve_config(&cli);

    match &cli.command {
        Commands::Search { keyword } => {
            let dialog = build_dialog(&config, cli.json);
            let state = search_and_wait(&dialog, keyword, &config).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&state.results).unwrap_or_default());
            } else {
                if state.results.is_empty() {
                    eprintln!("No users for '{}'", state.keyword);
                    std::process::exit(1);
                }
                print_results(&state.results);
                eprintln!("\n{} results", state.results.len());
            }
        }
        Commands::Request { keyword, message, pick } => {
            let dialog = build_dialog(&config, cli.json);
            let state = search_and_wait(&dialog, keyword, &config).await;

            match pick {
                Some(n) => match n.checked_sub(1).and_then(|i| state.results.get(i)) {
                    Some(candidate) => dialog.on_select_candidate(candidate.clone()),
                    None => {
                        eprintln!("No result #{n} ({} results)", state.results.len());
                        std::process::exit(1);
                    }
                },
                None => {
                    if dialog.on_confirm_submit(keyword).is_none() {
                        let msg = dialog
                            .snapshot()
                            .inline_message()
                            .unwrap_or_else(|| format!("No users for '{keyword}'"));
                        eprintln!("{msg}");
                        std::process::exit(1);
                    }
                }
            }

            if let Some(target) = dialog.snapshot().selected {
                if !cli.json {
                    eprintln!("Sending request to {} (@{})", target.display_name, target.username);
                }
            }
            dialog.set_message(message);

            let outcome = dialog.on_submit().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome).unwrap_or_default());
            }
            match outcome {
                SubmitOutcome::Sent(_) => {}
                SubmitOutcome::Failed(_) | SubmitOutcome::Skipped => std::process::exit(1),
            }
        }
        Commands::Dialog => {
            let dialog = build_dialog(&config, cli.json);
            repl::run(&dialog, cli.json).await;
            dialog.teardown();
        }
        Commands::ServeStub { addr, users } => {
            let state = match users {
                Some(path) => StubState::from_json_file(path).unwrap_or_else(|e| {
                    eprintln!("{e}");
                    std::process::exit(1);
                }),
                None => StubState::demo(),
            };
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
                error!(addr = addr.as_str(), error = %e, "Could not bind");
                std::process::exit(1);
            });
            let local = listener.local_addr().map(|a| a.to_string()).unwrap_or_else(|_| addr.clone());
            info!(users = state.users().len(), "Serving stub API");
            info!("http://{local}/api");

            if let Err(e) = stub::serve(listener, Arc::new(state), shutdown_signal()).await {
                error!(error = %e, "Stub server failed");
                std::process::exit(1);
            }
        }
    }
}
