//! Line-driven dialog: each stdin line is one UI event.
//!
//! ```text
//! type <text>      keyword input (debounced lookup)
//! confirm          resolve the current keyword
//! select <n>       pick the n-th result
//! message <text>   edit the request message
//! submit | back | cancel | show | help | quit
//! ```

use linkup_core::{DialogPhase, DialogState, FriendRequestDialog, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::print_results;

const HELP: &str = "commands: type <text>, confirm, select <n>, message <text>, submit, back, cancel, show, quit";

/// Parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Type(&'a str),
    Confirm,
    Select(usize),
    Message(&'a str),
    Submit,
    Back,
    Cancel,
    Show,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Command<'_>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, rest) = match line.trim_start().split_once(' ') {
        Some((verb, rest)) => (verb, rest),
        None => (line.trim(), ""),
    };
    match verb {
        "type" | "t" => Ok(Command::Type(rest)),
        "confirm" | "c" => Ok(Command::Confirm),
        "select" | "s" => rest
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(Command::Select)
            .ok_or_else(|| format!("select needs a result number, got '{}'", rest.trim())),
        "message" | "msg" | "m" => Ok(Command::Message(rest)),
        "submit" => Ok(Command::Submit),
        "back" => Ok(Command::Back),
        "cancel" => Ok(Command::Cancel),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' ({HELP})")),
    }
}

fn show(state: &DialogState, json: bool) {
    if json {
        println!("{}", serde_json::to_string(state).unwrap_or_default());
        return;
    }
    match state.phase() {
        DialogPhase::Searching => {
            println!("[search] keyword: '{}'", state.keyword);
            if let Some(msg) = state.inline_message() {
                println!("  {msg}");
            }
            print_results(&state.results);
        }
        DialogPhase::Confirming => {
            if let (Some(c), Some(p)) = (&state.selected, &state.pending) {
                println!("[confirm] to {} (@{})", c.display_name, c.username);
                println!("  message: '{}'", p.message);
            }
            if state.submitting {
                println!("  sending...");
            }
        }
    }
}

/// Run until `quit` or end of input.
pub async fn run(dialog: &FriendRequestDialog, json: bool) {
    // Print results as lookups land.
    let mut rx = dialog.subscribe();
    let watcher = tokio::spawn(async move {
        let mut last = None;
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            if state.results_for.is_some() && state.results_for != last {
                last = state.results_for.clone();
                if json {
                    println!("{}", serde_json::json!({ "results": state.results }));
                } else {
                    println!("{} results for '{}'", state.results.len(), state.keyword);
                    print_results(&state.results);
                }
            } else if state.results_for.is_none() {
                last = None;
            }
        }
    });

    if !json {
        eprintln!("{HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse(&line) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        debug!(?command, "dialog command");

        match command {
            Command::Type(text) => dialog.on_keyword_change(text),
            Command::Confirm => {
                let keyword = dialog.snapshot().keyword;
                dialog.on_confirm_submit(keyword.as_str());
                show(&dialog.snapshot(), json);
            }
            Command::Select(n) => {
                let state = dialog.snapshot();
                match state.results.get(n - 1) {
                    Some(c) => {
                        dialog.on_select_candidate(c.clone());
                        show(&dialog.snapshot(), json);
                    }
                    None => eprintln!("no result #{n}"),
                }
            }
            Command::Message(text) => {
                if !dialog.set_message(text) {
                    eprintln!("pick someone first");
                }
            }
            Command::Submit => match dialog.on_submit().await {
                SubmitOutcome::Skipped => eprintln!("nothing to submit"),
                SubmitOutcome::Sent(_) | SubmitOutcome::Failed(_) => show(&dialog.snapshot(), json),
            },
            Command::Back => {
                dialog.on_back();
                show(&dialog.snapshot(), json);
            }
            Command::Cancel => dialog.on_cancel(),
            Command::Show => show(&dialog.snapshot(), json),
            Command::Help => eprintln!("{HELP}"),
            Command::Quit => break,
        }
    }

    watcher.abort();
}
