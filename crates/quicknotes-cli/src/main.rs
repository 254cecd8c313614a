//! QuickNotes interactive terminal client.

mod commands;
mod export;
mod render;

use std::io::Write as _;
use std::sync::Arc;

use chrono::{Datelike, Local};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quicknotes_backend::{SupabaseAuth, SupabaseClient, SupabaseConfig, SupabaseNotes};
use quicknotes_core::{Error, EventBus, EventEnvelope, NoteFilter, NoteId, SessionEvent};
use quicknotes_session::{App, AppPhase, Backends, Session};

use crate::commands::{Command, DaySelection, NoteRef, ParseError};

/// Build the Supabase collaborators from the environment.
fn connect(events: &EventBus) -> quicknotes_core::Result<Backends> {
    let client = SupabaseClient::new(SupabaseConfig::from_env())?;
    Ok(Backends {
        auth: Arc::new(SupabaseAuth::new(client.clone(), events.clone())),
        notes: Arc::new(SupabaseNotes::new(client)),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "warn")
    //
    // Console logs go to stderr so they do not interleave with the prompt.
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("quicknotes.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );

    let events = EventBus::default();
    let receiver = events.subscribe();
    let mut app = App::new(events, Box::new(connect));

    println!("QuickNotes. Type 'help' for commands.");
    app.start().await;
    announce(app.phase());

    let mut shell = Shell {
        app,
        input: BufReader::new(tokio::io::stdin()).lines(),
        receiver,
        listing: Vec::new(),
        filter: NoteFilter::new(),
        line_numbers: false,
    };
    shell.run().await
}

fn announce(phase: &AppPhase) {
    match phase {
        AppPhase::Loading => println!("Loading..."),
        AppPhase::ConfigurationError(message) => {
            println!("!! Configuration required: {}", message);
            println!("   Fix the settings (SUPABASE_URL, SUPABASE_ANON_KEY) and type 'retry'.");
        }
        AppPhase::SignedOut => println!("Not signed in. Use 'login' or 'signup'."),
        AppPhase::Ready(session) => println!(
            "Signed in as {}. {} notes, {} new notes left today.",
            session.user().email,
            session.notes().len(),
            session.remaining_today()
        ),
    }
}

fn report(error: &Error) {
    match error {
        Error::Admission(denied) => println!("{}", render::admission_notice(denied)),
        other => println!("error: {}", other),
    }
}

struct Shell {
    app: App,
    input: Lines<BufReader<Stdin>>,
    receiver: Receiver<EventEnvelope>,
    /// Ids of the last listing, for `#n` references.
    listing: Vec<NoteId>,
    filter: NoteFilter,
    /// Number lines when showing the active note.
    line_numbers: bool,
}

impl Shell {
    async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.prompt()?;
            let Some(line) = self.input.next_line().await? else {
                break;
            };

            let command = match commands::parse(&line) {
                Ok(command) => command,
                Err(ParseError::Empty) => continue,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }

            if let Err(e) = self.execute(command).await {
                report(&e);
            }
            self.drain_events().await;
        }
        Ok(())
    }

    fn prompt(&self) -> std::io::Result<()> {
        let label = match self.app.phase() {
            AppPhase::Ready(session) => match session.active_note() {
                Some(note) => format!("quicknotes [{}]> ", note.display_title()),
                None => "quicknotes> ".to_string(),
            },
            other => format!("quicknotes ({})> ", other.name()),
        };
        print!("{}", label);
        std::io::stdout().flush()
    }

    /// Apply auth transitions and surface background failures.
    async fn drain_events(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if let SessionEvent::PersistFailed {
                        ref note_id,
                        ref error,
                    } = envelope.payload
                    {
                        println!("!! Could not save note {}: {}", note_id, error);
                    }
                    let was_ready = self.app.session().is_some();
                    self.app.handle_event(&envelope.payload).await;
                    if was_ready && self.app.session().is_none() {
                        announce(self.app.phase());
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event receiver lagged");
                }
                Err(_) => break,
            }
        }
    }

    async fn execute(&mut self, command: Command) -> quicknotes_core::Result<()> {
        match command {
            Command::Login { email, password } => {
                self.app.sign_in(&email, &password).await?;
                announce(self.app.phase());
            }
            Command::Signup { email, password } => {
                self.app.sign_up(&email, &password).await?;
                announce(self.app.phase());
            }
            Command::Logout => {
                self.app.sign_out().await?;
                self.listing.clear();
                announce(self.app.phase());
            }
            Command::Retry => {
                self.app.retry().await;
                announce(self.app.phase());
            }
            Command::Help => println!("{}", commands::HELP),
            Command::LineNumbers => {
                self.line_numbers = !self.line_numbers;
                println!(
                    "Line numbers {}.",
                    if self.line_numbers { "on" } else { "off" }
                );
            }
            Command::Quit => {}
            Command::Delete(target) => self.delete(target).await?,
            other => {
                let Some(session) = self.app.session_mut() else {
                    println!("Sign in first ('login <email> <password>').");
                    return Ok(());
                };
                Self::session_command(
                    session,
                    &mut self.listing,
                    &mut self.filter,
                    self.line_numbers,
                    other,
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn session_command(
        session: &mut Session,
        listing: &mut Vec<NoteId>,
        filter: &mut NoteFilter,
        line_numbers: bool,
        command: Command,
    ) -> quicknotes_core::Result<()> {
        match command {
            Command::List { query } => {
                let shown = filter.clone().with_query(query.unwrap_or_default());
                let notes = session.filtered(&shown, &Local);
                if notes.is_empty() {
                    println!("(no notes)");
                }
                listing.clear();
                for (i, note) in notes.iter().enumerate() {
                    println!(
                        "{}",
                        render::note_line(i + 1, note, session.tab_state(&note.id))
                    );
                    listing.push(note.id.clone());
                }
            }
            Command::Day(DaySelection::All) => {
                *filter = filter.clone().all_days();
                println!("Listing notes from every day.");
            }
            Command::Day(DaySelection::On(day)) => {
                *filter = filter.clone().on_day(day);
                println!("Listing notes created on {}.", day);
            }
            Command::Calendar { month } => {
                let now = Local::now();
                let (year, month) = month.unwrap_or((now.year(), now.month()));
                match session.calendar(year, month, &Local) {
                    Some(grid) => println!("{}", render::calendar(&grid)),
                    None => println!("No such month."),
                }
            }
            Command::New => {
                let id = session.create_note().await?;
                if session.active_id() == Some(&id) {
                    println!("Created and opened a new note.");
                } else {
                    println!("Created a new note, but it could not be opened.");
                }
                println!("{}", render::tab_strip(session));
            }
            Command::Open(target) => {
                let id = resolve(session, listing, &target)?;
                session.open_note(&id)?;
                println!("{}", render::tab_strip(session));
            }
            Command::Close(target) => {
                let id = match target {
                    Some(target) => resolve(session, listing, &target)?,
                    None => match active_or_notice(session) {
                        Some(id) => id,
                        None => return Ok(()),
                    },
                };
                session.close_note(&id);
                println!("{}", render::tab_strip(session));
            }
            Command::Tabs => println!("{}", render::tab_strip(session)),
            Command::Show => println!("{}", render::active_note(session, line_numbers)),
            Command::Export(target) => match session.active_note() {
                Some(note) => {
                    let path = export::write_note(note, target.as_deref())?;
                    println!("Saved '{}' to {}.", note.display_title(), path.display());
                }
                None => println!("(no active note)"),
            },
            Command::Write(text) => {
                if session.active_id().is_none() {
                    println!("(no active note)");
                } else {
                    session.edit_active(&text)?;
                }
            }
            Command::Append(text) => {
                if session.active_id().is_none() {
                    println!("(no active note)");
                } else {
                    let content = format!("{}{}", session.editor().content(), text);
                    session.edit_active(&content)?;
                }
            }
            Command::Title(title) => {
                if session.rename_active(&title)?.is_none() {
                    println!("(no active note)");
                }
            }
            Command::Undo => {
                if session.undo_active()?.is_none() {
                    println!("Nothing to undo.");
                }
            }
            Command::Stats => match session.stats() {
                Some(stats) => println!(
                    "{}",
                    render::status_line(stats, session.can_undo(), session.remaining_today())
                ),
                None => println!("(no active note)"),
            },
            // Handled by the shell.
            Command::Login { .. }
            | Command::Signup { .. }
            | Command::Logout
            | Command::Retry
            | Command::Help
            | Command::LineNumbers
            | Command::Quit
            | Command::Delete(_) => {}
        }
        Ok(())
    }

    /// Delete after an explicit y/N confirmation.
    async fn delete(&mut self, target: Option<NoteRef>) -> quicknotes_core::Result<()> {
        let Some(session) = self.app.session() else {
            println!("Sign in first ('login <email> <password>').");
            return Ok(());
        };
        let id = match target {
            Some(ref target) => resolve(session, &self.listing, target)?,
            None => match active_or_notice(session) {
                Some(id) => id,
                None => return Ok(()),
            },
        };
        let title = session
            .note(&id)
            .map(|n| n.display_title().to_string())
            .ok_or_else(|| Error::NoteNotFound(id.clone()))?;

        print!("Delete '{}'? This cannot be undone. [y/N] ", title);
        let answer = match std::io::stdout().flush() {
            Ok(()) => self.input.next_line().await.ok().flatten(),
            Err(_) => None,
        };
        if !answer.as_deref().is_some_and(commands::confirmed) {
            println!("Kept.");
            return Ok(());
        }

        if let Some(session) = self.app.session_mut() {
            session.delete_note(&id).await?;
            self.listing.retain(|listed| listed != &id);
            println!("Deleted '{}'.", title);
            println!("{}", render::tab_strip(session));
        }
        Ok(())
    }
}

fn resolve(session: &Session, listing: &[NoteId], target: &NoteRef) -> quicknotes_core::Result<NoteId> {
    match target {
        NoteRef::Id(id) => Ok(id.clone()),
        NoteRef::Index(n) => {
            let from_listing = listing.get(n - 1).cloned();
            let fallback = || session.notes().get(n - 1).map(|note| note.id.clone());
            from_listing
                .or_else(fallback)
                .ok_or_else(|| Error::NoteNotFound(NoteId::new(format!("#{}", n))))
        }
    }
}

/// The active note's id, or a printed notice when there is none.
fn active_or_notice(session: &Session) -> Option<NoteId> {
    let active = session.active_id().cloned();
    if active.is_none() {
        println!("(no active note)");
    }
    active
}
