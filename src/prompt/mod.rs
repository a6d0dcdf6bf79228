//! Interactive questions asked during a paste: overwrite confirmation and the
//! optional file name edit.

use async_trait::async_trait;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question. Anything but an explicit yes declines.
    async fn confirm(&self, message: &str, accept_label: &str) -> bool;

    /// Ask for a value, offering `default`. `None` means the user cancelled.
    async fn input(&self, prompt: &str, default: &str) -> Option<String>;
}

/// Prompts on stderr and reads answers line by line, so stdout stays free for
/// printed output.
pub struct TerminalPrompter<R = BufReader<Stdin>> {
    reader: Mutex<R>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TerminalPrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }

    /// One line without its terminator; `None` on EOF or a read error.
    async fn read_answer(&self) -> Option<String> {
        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn flush_stderr() {
    let _ = io::stderr().flush();
}

#[async_trait]
impl<R> Prompter for TerminalPrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, message: &str, accept_label: &str) -> bool {
        eprintln!("{}", message);
        eprint!("  {}? (y/n): ", accept_label);
        flush_stderr();

        match self.read_answer().await {
            Some(answer) => {
                let answer = answer.trim();
                answer.eq_ignore_ascii_case("y")
                    || answer.eq_ignore_ascii_case("yes")
                    || answer.eq_ignore_ascii_case(accept_label)
            }
            None => false,
        }
    }

    async fn input(&self, prompt: &str, default: &str) -> Option<String> {
        eprintln!("{}", prompt);
        eprint!("  [{}]: ", default);
        flush_stderr();

        let answer = self.read_answer().await?;
        let answer = answer.trim();
        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer.to_string())
        }
    }
}

/// Answers yes to every confirmation and takes every default. Used for `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

#[async_trait]
impl Prompter for AutoConfirm {
    async fn confirm(&self, _message: &str, _accept_label: &str) -> bool {
        true
    }

    async fn input(&self, _prompt: &str, default: &str) -> Option<String> {
        Some(default.to_string())
    }
}
