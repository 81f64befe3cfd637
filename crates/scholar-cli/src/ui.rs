//! Terminal input and startup screens

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use scholar_core::Result;
use std::io::{self, IsTerminal, Write};

const PROMPT: &str = "scholar>";

/// What an interactive session talks about
#[derive(Debug, Clone, Copy)]
pub enum ChatMode<'a> {
    /// Q&A over one uploaded document
    Document(&'a str),
    /// Web research with the agent
    Research,
}

impl ChatMode<'_> {
    fn subject_line(&self) -> String {
        match self {
            ChatMode::Document(name) => format!("Document: {}", name),
            ChatMode::Research => "Mode: web research".to_string(),
        }
    }

    fn feature_lines(&self) -> [&'static str; 2] {
        match self {
            ChatMode::Document(_) => [
                "Ask questions grounded in the uploaded document",
                "Answers cite the passages they were built from",
            ],
            ChatMode::Research => [
                "Ask research questions answered from the web",
                "Answers cite the sources the agent consulted",
            ],
        }
    }

    fn examples(&self) -> [&'static str; 3] {
        match self {
            ChatMode::Document(_) => [
                "What problem does the paper address?",
                "Which datasets were used in the evaluation?",
                "Summarize the main limitations",
            ],
            ChatMode::Research => [
                "What are the latest advances in RLHF?",
                "Compare diffusion and flow matching models",
                "Which benchmarks evaluate code generation?",
            ],
        }
    }
}

/// Display the chat banner for a session
pub fn display_banner(mode: ChatMode<'_>) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);
    let inner = banner_width - 2;

    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));
    let pad = |text: &str| " ".repeat(inner.saturating_sub(text.chars().count() + 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "Scholar - Research Assistant";
    println!("│  {}{}│", title.blue().bold(), pad(title));

    println!("{}", empty_line.blue());

    let subject_line = mode.subject_line();
    let [grounding, citing] = mode.feature_lines();
    let feature_lines = [
        subject_line.as_str(),
        "",
        grounding,
        citing,
        "History navigation with the up and down arrows",
        "",
        "v0.1.0",
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else if line.starts_with("v0.1.0") {
            println!("│  {}{}│", line.dimmed(), pad(line));
        } else {
            println!("{}", format!("│  {}{}│", line, pad(line)).blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "💡 Tip: Type a question, or 'help' for commands".dimmed()
    );
    println!();
}

/// Read one line, with history navigation when attached to a terminal
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    enable_raw_mode()?;
    let result = read_raw_line(history);
    disable_raw_mode()?;
    println!();

    let input = result?;
    if !input.is_empty() {
        history.push(input.clone());
    }
    Ok(input)
}

fn redraw(input: &str, previous_len: usize) -> Result<()> {
    let clear = " ".repeat(previous_len + 1);
    print!("\r{} {}\r{} {}", PROMPT.green().bold(), clear, PROMPT.green().bold(), input);
    io::stdout().flush()?;
    Ok(())
}

fn read_raw_line(history: &[String]) -> Result<String> {
    let mut input: Vec<char> = Vec::new();
    let mut history_index: Option<usize> = None;
    let mut cursor_pos = 0;

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        let previous_len = input.len();
        match key_event.code {
            KeyCode::Enter => return Ok(input.into_iter().collect::<String>().trim().to_string()),
            KeyCode::Esc => return Ok(String::new()),
            KeyCode::Char(c) => {
                input.insert(cursor_pos, c);
                cursor_pos += 1;
            }
            KeyCode::Backspace if cursor_pos > 0 => {
                input.remove(cursor_pos - 1);
                cursor_pos -= 1;
            }
            KeyCode::Up if !history.is_empty() => {
                let new_index = match history_index {
                    None => history.len() - 1,
                    Some(idx) => idx.saturating_sub(1),
                };
                history_index = Some(new_index);
                input = history[new_index].chars().collect();
                cursor_pos = input.len();
            }
            KeyCode::Down => match history_index {
                Some(idx) if idx + 1 < history.len() => {
                    history_index = Some(idx + 1);
                    input = history[idx + 1].chars().collect();
                    cursor_pos = input.len();
                }
                Some(_) => {
                    history_index = None;
                    input.clear();
                    cursor_pos = 0;
                }
                None => continue,
            },
            _ => continue,
        }

        redraw(&input.iter().collect::<String>(), previous_len)?;
    }
}

/// Display help for the document chat
pub fn print_help(mode: ChatMode<'_>) {
    let ask = match mode {
        ChatMode::Document(_) => "Ask a question about the document",
        ChatMode::Research => "Research a question on the web",
    };

    println!("{}", "Available commands:".bold());
    println!("  {} - {}", "<question>".green(), ask);
    println!("  {} - Show the questions asked so far", "history".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the chat", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    for example in mode.examples() {
        println!("  {}", example);
    }
}

/// Lines of `history` as a numbered list
pub fn format_history(history: &[String]) -> String {
    if history.is_empty() {
        return "No questions asked yet".to_string();
    }

    history
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{:>3}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}
