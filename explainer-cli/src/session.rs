use anyhow::Context as _;
use explainer_core::{ExplainError, FileInput, Orchestrator, ViewMode};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::{export_html, terminal::TerminalView};

const HELP: &str = "\
Commands:
  text <line>      use a single line of report text
  paste            paste multi-line text, finish with a line containing only '.'
  file <path>      select a PDF or TXT file
  analyze          explain the current input
  patient          show the patient explanation
  clinician        show the clinician explanation
  back             return to the input screen and clear it
  html <path>      save the current results as an HTML page
  status           show what is selected
  help             show this list
  quit             leave";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Text(String),
    Paste,
    File(PathBuf),
    Analyze,
    Mode(ViewMode),
    Back,
    Html(PathBuf),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word.to_ascii_lowercase().as_str(), rest) {
        ("", _) => Command::Empty,
        ("text", text) => Command::Text(text.to_string()),
        ("paste", "") => Command::Paste,
        ("file", path) if !path.is_empty() => Command::File(PathBuf::from(path)),
        ("analyze" | "a", "") => Command::Analyze,
        ("patient" | "p", "") => Command::Mode(ViewMode::Patient),
        ("clinician" | "c", "") => Command::Mode(ViewMode::Clinician),
        ("back" | "reset", "") => Command::Back,
        ("html", path) if !path.is_empty() => Command::Html(PathBuf::from(path)),
        ("status", "") => Command::Status,
        ("help" | "?", "") => Command::Help,
        ("quit" | "exit" | "q", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Line-oriented session over stdin. Returns when the user quits or input ends.
pub async fn run(orchestrator: &Orchestrator<TerminalView>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}\n");
    draw(orchestrator)?;

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = parse_command(&line);
        debug!("Session command: {:?}", command);

        match command {
            Command::Empty => {}
            Command::Text(text) => {
                orchestrator.set_text(text);
                println!("Report text set.");
            }
            Command::Paste => {
                let mut pasted = Vec::new();
                while let Some(line) = lines.next_line().await? {
                    if line.trim() == "." {
                        break;
                    }
                    pasted.push(line);
                }
                println!("Report text set ({} lines).", pasted.len());
                orchestrator.set_text(pasted.join("\n"));
            }
            Command::File(path) => match FileInput::from_path(&path).await {
                Ok(file) => {
                    orchestrator.select_file(file);
                    draw(orchestrator)?;
                }
                Err(e) => eprintln!("Error: cannot read {}: {}", path.display(), e),
            },
            Command::Analyze => match orchestrator.analyze().await {
                Ok(()) => draw(orchestrator)?,
                Err(ExplainError::FlowNotIdle(_)) => {
                    println!("Results are showing. Type 'back' to start a new analysis.")
                }
                // already reported through the view
                Err(_) => {}
            },
            Command::Mode(mode) => {
                if orchestrator.set_mode(mode) {
                    draw(orchestrator)?;
                } else {
                    println!("No results yet. Type 'analyze' first.");
                }
            }
            Command::Back => match orchestrator.reset() {
                Ok(()) => draw(orchestrator)?,
                Err(e) => eprintln!("Error: {}", e),
            },
            Command::Html(path) => match export_html(orchestrator, &path).await {
                Ok(()) => println!("Saved {}", path.display()),
                Err(e) => eprintln!("Error: {:#}", e),
            },
            Command::Status => print_status(orchestrator),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(line) => println!("Unknown command '{line}'. Type 'help'."),
        }
    }

    Ok(())
}

fn draw(orchestrator: &Orchestrator<TerminalView>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    orchestrator
        .with_view(|view| view.surface().draw(&mut stdout))
        .context("failed to draw screen")
}

fn print_status(orchestrator: &Orchestrator<TerminalView>) {
    let input = orchestrator.input();
    println!("flow:   {}", orchestrator.state());
    println!("screen: {:?}", orchestrator.screen());
    println!("mode:   {}", orchestrator.mode());
    println!(
        "text:   {}",
        if input.text.trim().is_empty() {
            "(none)".to_string()
        } else {
            format!("{} characters", input.text.trim().len())
        }
    );
    match &input.file {
        Some(file) => println!("file:   {} ({}, {} bytes)", file.name, file.mime_type, file.bytes.len()),
        None => println!("file:   (none)"),
    }
}
