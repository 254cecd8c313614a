//! Command line parsing for the interactive shell.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use quicknotes_core::NoteId;

/// A note named on the command line: an id, or `#n` for the n-th entry
/// (1-based) of the last listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteRef {
    Id(NoteId),
    Index(usize),
}

/// Day filter for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelection {
    All,
    On(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Signup { email: String, password: String },
    Logout,
    List { query: Option<String> },
    Day(DaySelection),
    Calendar { month: Option<(i32, u32)> },
    New,
    Open(NoteRef),
    Close(Option<NoteRef>),
    Tabs,
    Show,
    Write(String),
    Append(String),
    Title(String),
    Undo,
    LineNumbers,
    Export(Option<PathBuf>),
    Delete(Option<NoteRef>),
    Stats,
    Retry,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid {what}: '{value}'")]
    InvalidArgument { what: &'static str, value: String },
}

pub const HELP: &str = "\
Commands:
  login <email> <password>   sign in
  signup <email> <password>  create an account
  logout                     sign out
  list [query]               list notes (filtered by query and day)
  day <YYYY-MM-DD|all>       restrict listings to one creation day
  calendar [YYYY-MM]         month view, '*' marks days with notes
  new                        create a note and open it
  open <id|#n>               open a note as a tab
  close [id|#n]              close a tab (default: active)
  tabs                       show open tabs
  show                       print the active note
  write <text>               replace the active note's content (\\n for newline)
  append <text>              append to the active note's content
  title <text>               rename the active note
  undo                       revert the last edit
  numbers                    toggle line numbers in 'show'
  export [path]              save the active note as a .txt file
                             (default: <title>.txt here; a directory keeps that name)
  delete [id|#n]             delete a note (default: active), asks to confirm
  stats                      characters and lines of the active note
  retry                      retry connecting to the backend
  help                       this text
  quit                       exit";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        "login" | "signin" => {
            let (email, password) = credentials("login", rest)?;
            Command::Login { email, password }
        }
        "signup" | "register" => {
            let (email, password) = credentials("signup", rest)?;
            Command::Signup { email, password }
        }
        "logout" | "signout" => Command::Logout,
        "list" | "ls" => Command::List {
            query: non_empty(rest),
        },
        "day" => Command::Day(day_selection(rest)?),
        "calendar" | "cal" => Command::Calendar {
            month: match non_empty(rest) {
                Some(value) => Some(year_month(&value)?),
                None => None,
            },
        },
        "new" => Command::New,
        "open" => Command::Open(required_ref("open", rest)?),
        "close" => Command::Close(optional_ref(rest)),
        "tabs" => Command::Tabs,
        "show" | "cat" => Command::Show,
        "write" => Command::Write(unescape(rest)),
        "append" => Command::Append(unescape(rest)),
        "title" | "rename" => Command::Title(rest.to_string()),
        "undo" => Command::Undo,
        "numbers" | "ln" => Command::LineNumbers,
        "export" | "save" => Command::Export(non_empty(rest).map(PathBuf::from)),
        "delete" | "rm" => Command::Delete(optional_ref(rest)),
        "stats" => Command::Stats,
        "retry" => Command::Retry,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(ParseError::Unknown(name.to_string())),
    };
    Ok(command)
}

/// True for an affirmative answer to a y/N prompt.
pub fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn credentials(command: &'static str, rest: &str) -> Result<(String, String), ParseError> {
    let mut parts = rest.split_whitespace();
    let email = parts.next().ok_or(ParseError::MissingArgument {
        command,
        argument: "an email",
    })?;
    let password = parts.next().ok_or(ParseError::MissingArgument {
        command,
        argument: "a password",
    })?;
    Ok((email.to_string(), password.to_string()))
}

fn non_empty(rest: &str) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn note_ref(value: &str) -> NoteRef {
    match value.strip_prefix('#').map(str::parse::<usize>) {
        Some(Ok(n)) if n > 0 => NoteRef::Index(n),
        _ => NoteRef::Id(NoteId::from(value)),
    }
}

fn required_ref(command: &'static str, rest: &str) -> Result<NoteRef, ParseError> {
    optional_ref(rest).ok_or(ParseError::MissingArgument {
        command,
        argument: "a note id or #n",
    })
}

fn optional_ref(rest: &str) -> Option<NoteRef> {
    rest.split_whitespace().next().map(note_ref)
}

fn day_selection(rest: &str) -> Result<DaySelection, ParseError> {
    match rest {
        "" => Err(ParseError::MissingArgument {
            command: "day",
            argument: "a date (YYYY-MM-DD) or 'all'",
        }),
        "all" => Ok(DaySelection::All),
        value => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(DaySelection::On)
            .map_err(|_| ParseError::InvalidArgument {
                what: "date",
                value: value.to_string(),
            }),
    }
}

fn year_month(value: &str) -> Result<(i32, u32), ParseError> {
    let invalid = || ParseError::InvalidArgument {
        what: "month",
        value: value.to_string(),
    };
    let (year, month) = value.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Turn `\n` and `\t` escapes into the characters they name.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
