//! The human at the terminal.

use std::io::Write;

use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::error::{ClientError, Result};

/// One entry in a single-choice menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }
}

/// Interactive prompts and console output.
///
/// The sampling callback may prompt while the menu loop is also prompting, so
/// implementations must serialize their own input.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Ask the operator to pick one of `choices`; returns the chosen value.
    async fn select(&self, message: &str, choices: &[Choice]) -> Result<String>;
    async fn input(&self, message: &str) -> Result<String>;
    async fn confirm(&self, message: &str, default: bool) -> Result<bool>;
    /// Show `context` and ask `message` as one uninterrupted exchange.
    async fn confirm_with_context(&self, context: &str, message: &str, default: bool) -> Result<bool> {
        self.show(context);
        self.confirm(message, default).await
    }
    /// Print a result line.
    fn show(&self, text: &str);
    /// Print a non-fatal problem.
    fn warn(&self, text: &str);
}

/// Reads answers from stdin (or any line source) and writes to stdout.
pub struct TerminalOperator<R = BufReader<Stdin>> {
    lines: Mutex<Lines<R>>,
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> TerminalOperator<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    async fn ask(lines: &mut Lines<R>, prompt: &str) -> Result<String> {
        print!("{} {} ", "?".green().bold(), prompt.bold());
        std::io::stdout().flush()?;
        match lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(ClientError::InputClosed),
        }
    }
}

/// Parse a 1-based menu answer.
fn parse_selection(answer: &str, count: usize) -> Option<usize> {
    answer
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}

fn parse_confirmation(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: AsyncBufRead + Unpin> TerminalOperator<R> {
    async fn confirm_locked(lines: &mut Lines<R>, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            let answer = Self::ask(lines, &format!("{} {}", message, hint)).await?;
            match parse_confirmation(&answer, default) {
                Some(yes) => return Ok(yes),
                None => println!("{}", "Please answer y or n".yellow()),
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Operator for TerminalOperator<R> {
    async fn select(&self, message: &str, choices: &[Choice]) -> Result<String> {
        let mut lines = self.lines.lock().await;
        println!("{} {}", "?".green().bold(), message.bold());
        for (i, choice) in choices.iter().enumerate() {
            match &choice.description {
                Some(desc) => println!("  {}) {} {}", i + 1, choice.label, desc.dimmed()),
                None => println!("  {}) {}", i + 1, choice.label),
            }
        }

        loop {
            let answer = Self::ask(&mut lines, &format!("Choose 1-{}:", choices.len())).await?;
            match parse_selection(&answer, choices.len()) {
                Some(index) => return Ok(choices[index].value.clone()),
                None => println!("{}", "Please enter one of the listed numbers".yellow()),
            }
        }
    }

    async fn input(&self, message: &str) -> Result<String> {
        let mut lines = self.lines.lock().await;
        Self::ask(&mut lines, message).await
    }

    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let mut lines = self.lines.lock().await;
        Self::confirm_locked(&mut lines, message, default).await
    }

    // Context and question share one hold on the input.
    async fn confirm_with_context(&self, context: &str, message: &str, default: bool) -> Result<bool> {
        let mut lines = self.lines.lock().await;
        println!("{}", context);
        Self::confirm_locked(&mut lines, message, default).await
    }

    fn show(&self, text: &str) {
        println!("{}", text);
    }

    fn warn(&self, text: &str) {
        eprintln!("{}", text.red());
    }
}
