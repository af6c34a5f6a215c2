//! shiftcal-provider-local - file-backed calendar provider for shiftcal
//!
//! This binary implements the shiftcal provider protocol, communicating
//! with shiftcal via JSON over stdin/stdout.
//!
//! Each calendar is a JSON file holding its events:
//!   <local_dir>/<calendar_id>.json
//!
//! `local_dir` comes from `[provider_config]` and defaults to
//! ~/.local/share/shiftcal/calendars.

mod calendar_dir;
mod commands;

use shiftcal_core::gateway::protocol::{Command, Request, Response};
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        if writeln!(stdout, "{}", response).and_then(|_| stdout.flush()).is_err() {
            break;
        }
    }
}

async fn handle_request(request: Request) -> String {
    let result = match request.command {
        Command::ListCalendars => commands::list_calendars::handle(&request.params),
        Command::InsertEvent => commands::insert_event::handle(&request.params),
        Command::EventExists => commands::event_exists::handle(&request.params),
        Command::DeleteEvent => commands::delete_event::handle(&request.params),
        Command::QueryByTitle => commands::query_by_title::handle(&request.params),
        Command::ListTagged => commands::list_tagged::handle(&request.params),
    };

    match result {
        Ok(data) => Response::success(data),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
