//! Interactive mode: the clipboard watcher runs in the background while
//! stdin takes commands and session events are printed as they arrive.

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use cliptube_core::VideoId;
use cliptube_runtime::{OpenOutcome, Runtime, SessionEvent};
use cliptube_scan::has_video_ids;

use crate::settings::parse_bool;

const HELP: &str = "\
commands:
  paste             open every video link on the clipboard
  <text with links> open every video link in the line
  history           list recently opened videos
  reopen N          open history entry N again
  copy N            copy the URL of open history entry N
  clear             clear history (open videos are kept)
  open              list open videos
  watch on|off      toggle clipboard watching
  volume V          set volume for new windows (0.0 - 1.0)
  size N            set history size
  notes             list notifications
  dismiss ID        dismiss a notification
  quit              close all windows and exit";

#[derive(Debug, PartialEq)]
enum Input {
    Paste,
    OpenText(String),
    History,
    Reopen(usize),
    Copy(usize),
    Clear,
    ListOpen,
    Watch(bool),
    Volume(f32),
    Size(usize),
    Notes,
    Dismiss(u64),
    Help,
    Quit,
    Empty,
}

fn parse(line: &str) -> Result<Input> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    if has_video_ids(line) {
        return Ok(Input::OpenText(line.to_string()));
    }

    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    let input = match cmd {
        "paste" | "p" => Input::Paste,
        "history" | "h" => Input::History,
        "reopen" | "r" => Input::Reopen(index(arg)?),
        "copy" | "c" => Input::Copy(index(arg)?),
        "clear" => Input::Clear,
        "open" | "o" => Input::ListOpen,
        "watch" => Input::Watch(parse_bool(arg)?),
        "volume" => Input::Volume(arg.parse()?),
        "size" => Input::Size(arg.parse()?),
        "notes" | "n" => Input::Notes,
        "dismiss" => Input::Dismiss(arg.parse()?),
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        _ => bail!("unknown command `{cmd}` (try `help`)"),
    };
    Ok(input)
}

/// 1-based list position.
fn index(arg: &str) -> Result<usize> {
    match arg.parse::<usize>()? {
        0 => bail!("entries are numbered from 1"),
        n => Ok(n - 1),
    }
}

pub async fn run() -> Result<()> {
    let (runtime, mut events) = Runtime::new()?;
    if runtime.is_watching().await {
        println!("Watching the clipboard for YouTube links. Type `help` for commands.");
    } else {
        println!("Clipboard watching is off. Type `help` for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => {
                        if let Err(e) = execute(&runtime, input).await {
                            println!("error: {e}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Some(event) = events.recv() => print_event(&event),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    runtime.shutdown().await?;
    Ok(())
}

async fn execute(runtime: &Runtime, input: Input) -> Result<()> {
    match input {
        Input::Paste => {
            if !runtime.clipboard_has_videos().await? {
                println!("No video links on the clipboard.");
                return Ok(());
            }
            report(runtime.paste_and_open().await?);
        }
        Input::OpenText(text) => report(runtime.open_in_text(&text).await?),
        Input::History => {
            let open = runtime.open_videos().await?;
            let history = runtime.history().await?;
            if history.is_empty() {
                println!("No recently opened videos.");
            }
            for (n, entry) in history.iter().enumerate() {
                let marker = if open.contains(&entry.id) { '*' } else { ' ' };
                println!("{marker}{:>3}. {}  {}", n + 1, entry.title, entry.id.canonical_url());
            }
        }
        Input::Reopen(n) => {
            let id = history_entry(runtime, n).await?;
            report(vec![(id.clone(), runtime.reopen(id).await?)]);
        }
        Input::Copy(n) => {
            let id = history_entry(runtime, n).await?;
            runtime.copy_url(&id).await?;
            println!("Copied {}", id.canonical_url());
        }
        Input::Clear => {
            if !runtime.can_clear_history().await? {
                println!("Nothing to clear.");
                return Ok(());
            }
            let remaining = runtime.clear_history().await?;
            println!("History cleared ({remaining} open kept).");
        }
        Input::ListOpen => {
            let open = runtime.open_videos().await?;
            if open.is_empty() {
                println!("No open videos.");
            }
            for id in open {
                println!("  {}", id.canonical_url());
            }
        }
        Input::Watch(enabled) => {
            runtime.set_watch_clipboard(enabled).await?;
            println!("Clipboard watching {}.", if enabled { "on" } else { "off" });
        }
        Input::Volume(volume) => {
            runtime.set_volume(volume).await?;
            println!("Volume {:.2}.", runtime.get_config().await.player.volume);
        }
        Input::Size(size) => {
            runtime.set_history_size(size).await?;
            println!("History size {size}.");
        }
        Input::Notes => {
            let notes = runtime.notifications().await?;
            if notes.is_empty() {
                println!("No notifications.");
            }
            for note in notes {
                println!("  [{}] {} {}", note.id, note.at.format("%H:%M:%S"), note.message);
            }
        }
        Input::Dismiss(id) => {
            if !runtime.dismiss_notification(id).await? {
                println!("No notification {id}.");
            }
        }
        Input::Help => println!("{HELP}"),
        Input::Quit | Input::Empty => {}
    }
    Ok(())
}

async fn history_entry(runtime: &Runtime, n: usize) -> Result<VideoId> {
    let history = runtime.history().await?;
    match history.into_iter().nth(n) {
        Some(entry) => Ok(entry.id),
        None => bail!("no history entry {}", n + 1),
    }
}

fn report(outcomes: Vec<(VideoId, OpenOutcome)>) {
    for (id, outcome) in outcomes {
        match outcome {
            OpenOutcome::Focused(_) => println!("Already open: {id}"),
            OpenOutcome::Resolving => println!("Opening {id}..."),
            OpenOutcome::AlreadyResolving => println!("Still opening {id}..."),
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Opened {
            id,
            title,
            author,
            length_seconds,
            ..
        } => println!("Playing: {} [{id}]", describe(title, author.as_deref(), *length_seconds)),
        SessionEvent::Focused { .. } => {}
        SessionEvent::Failed(note) => println!("[{}] {}", note.id, note.message),
        SessionEvent::Closed { id, .. } => tracing::debug!(%id, "Window closed"),
    }
}

/// `Title by Author (3:33)`, leaving out whatever is unknown.
fn describe(title: &str, author: Option<&str>, length_seconds: Option<u64>) -> String {
    let mut line = title.to_string();
    if let Some(author) = author {
        line.push_str(&format!(" by {author}"));
    }
    match length_seconds {
        Some(secs) if secs >= 3600 => {
            line.push_str(&format!(" ({}:{:02}:{:02})", secs / 3600, secs / 60 % 60, secs % 60));
        }
        Some(secs) => line.push_str(&format!(" ({}:{:02})", secs / 60, secs % 60)),
        None => {}
    }
    line
}
