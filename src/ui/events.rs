use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::LoadError;
use crate::media::{MediaEvent, MediaSource};
use crate::playback::LoadTicket;

/// Which playlist `view` should show. Indices are zero-based here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    All,
    Playlist(usize),
}

/// A user command. Track indices point into the visible list, playlist
/// indices into the playlist list, both zero-based.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Library
    Add(Vec<PathBuf>),
    Import(Vec<PathBuf>),
    Scan(PathBuf),
    Open,
    Remove(usize),

    // Transport
    Play(usize),
    Toggle,
    Next,
    Previous,
    Seek(Duration),
    Volume(f32),

    // Playlists
    NewPlaylist(String),
    RenamePlaylist(usize, String),
    DeletePlaylist(usize),
    AddToPlaylist { playlist: usize, track: usize },
    RemoveFromPlaylist { playlist: usize, track: usize },

    // View
    View(ViewTarget),
    Search(String),
    List,
    Status,
    Help,
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    Command(Command),
    Media(MediaEvent),
    SourceResolved {
        ticket: LoadTicket,
        result: Result<MediaSource, LoadError>,
    },
    ReadyTimeout {
        wait: u64,
    },
    Tick,
    InputClosed,
}

pub struct EventHandler {
    event_sender: mpsc::UnboundedSender<AppEvent>,
    event_receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        Self {
            event_sender,
            event_receiver,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.event_sender.clone()
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.event_receiver.recv().await
    }

    /// Read commands from stdin, one per line, until EOF.
    pub fn spawn_console_reader(&self) -> tokio::task::JoinHandle<()> {
        let sender = self.sender();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(Some(command)) => {
                            if sender.send(AppEvent::Command(command)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(message) => eprintln!("{message} (try `help`)"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        debug!("stdin closed: {}", e);
                        break;
                    }
                }
            }
            let _ = sender.send(AppEvent::InputClosed);
        })
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one console line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = split_word(line);

    let command = match word {
        "add" => Command::Add(paths(rest)?),
        "import" => Command::Import(paths(rest)?),
        "scan" => Command::Scan(single_path(required(rest, "scan <dir>")?)?),
        "open" => Command::Open,
        "rm" => Command::Remove(index(rest)?),

        "play" => Command::Play(index(rest)?),
        "toggle" | "p" => Command::Toggle,
        "next" | "n" => Command::Next,
        "prev" | "b" => Command::Previous,
        "seek" => {
            let secs: f64 = required(rest, "seek <seconds>")?
                .parse()
                .map_err(|_| format!("not a number of seconds: {rest}"))?;
            if secs.is_nan() || secs < 0.0 {
                return Err(format!("cannot seek to {rest}"));
            }
            // past the end is the element's to clamp
            Command::Seek(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
        }
        "vol" => {
            let volume: f32 = required(rest, "vol <0..1>")?
                .parse()
                .map_err(|_| format!("not a volume: {rest}"))?;
            if !volume.is_finite() {
                return Err(format!("not a volume: {rest}"));
            }
            Command::Volume(volume.clamp(0.0, 1.0))
        }

        "pl" => parse_playlist(rest)?,

        "view" => match required(rest, "view all|<n>")? {
            "all" => Command::View(ViewTarget::All),
            other => Command::View(ViewTarget::Playlist(index(other)?)),
        },
        "search" => Command::Search(rest.to_string()),
        "ls" => Command::List,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}`")),
    };
    Ok(Some(command))
}

fn parse_playlist(rest: &str) -> Result<Command, String> {
    let (sub, rest) = split_word(rest);
    match sub {
        "new" => Ok(Command::NewPlaylist(required(rest, "pl new <name>")?.to_string())),
        "rename" => {
            let (n, name) = split_word(rest);
            Ok(Command::RenamePlaylist(index(n)?, required(name, "pl rename <n> <name>")?.to_string()))
        }
        "rm" => Ok(Command::DeletePlaylist(index(rest)?)),
        "add" => {
            let (playlist, track) = two_indices(rest)?;
            Ok(Command::AddToPlaylist { playlist, track })
        }
        "drop" => {
            let (playlist, track) = two_indices(rest)?;
            Ok(Command::RemoveFromPlaylist { playlist, track })
        }
        "" => Err("pl new|rename|rm|add|drop ...".to_string()),
        other => Err(format!("unknown playlist command `{other}`")),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}

/// One-based console index to zero-based.
fn index(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("not a position: `{}`", raw.trim())),
    }
}

fn two_indices(rest: &str) -> Result<(usize, usize), String> {
    let (first, second) = split_word(rest);
    Ok((index(first)?, index(second)?))
}

fn paths(rest: &str) -> Result<Vec<PathBuf>, String> {
    let parts: Vec<PathBuf> = split_args(rest)?.into_iter().map(PathBuf::from).collect();
    if parts.is_empty() {
        return Err("expected at least one path".to_string());
    }
    Ok(parts)
}

/// A lone directory may be quoted or not; unquoted spaces stay part of it.
fn single_path(rest: &str) -> Result<PathBuf, String> {
    let mut parts = split_args(rest)?;
    if parts.len() == 1 {
        Ok(PathBuf::from(parts.remove(0)))
    } else {
        Ok(PathBuf::from(rest))
    }
}

/// Whitespace separated words. Single or double quotes group a word with
/// spaces in it, and a backslash outside single quotes escapes the next char.
fn split_args(input: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => {
                let escaped = chars.next().ok_or("dangling backslash")?;
                current.push(escaped);
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

pub const HELP: &str = "\
add <path>...          add files by path, quote paths with spaces
import <path>...       load files into memory (not saved)
scan <dir>             add every audio file under a directory
open                   pick files with the native dialog
rm <n>                 delete track n from the library
play <n> | toggle | next | prev | seek <secs> | vol <0..1>
pl new <name> | pl rename <n> <name> | pl rm <n>
pl add <pl> <track> | pl drop <pl> <track>
view all|<pl> | search <text> | ls | status | quit";
