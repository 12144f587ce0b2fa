//! Line-oriented prompts with a bounded number of retries.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Why a prompt produced no value.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("input closed")]
    Eof,

    #[error("too many invalid answers ({0})")]
    TooManyAttempts(u32),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type PromptResult<T> = Result<T, PromptError>;

/// Reads answers from `input`, writes prompts and messages to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    max_attempts: u32,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, max_attempts: u32) -> Self {
        Self {
            input,
            output,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Print a line.
    pub fn say(&mut self, message: impl Display) -> PromptResult<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    /// Ask once and return the trimmed answer.
    pub fn line(&mut self, prompt: &str) -> PromptResult<String> {
        write!(self.output, "{}: ", prompt)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(PromptError::Eof);
        }
        Ok(answer.trim().to_string())
    }

    /// Ask until `validate` accepts the answer, at most `max_attempts` times.
    pub fn ask<T, E, F>(&mut self, prompt: &str, validate: F) -> PromptResult<T>
    where
        E: Display,
        F: Fn(&str) -> Result<T, E>,
    {
        for _ in 0..self.max_attempts {
            let answer = self.line(prompt)?;
            match validate(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => self.say(format!("  {}, try again", e))?,
            }
        }
        Err(PromptError::TooManyAttempts(self.max_attempts))
    }

    /// Show a numbered list and let the user pick one entry; `0` cancels.
    pub fn choose<'a, T>(
        &mut self,
        prompt: &str,
        items: &'a [T],
        label: impl Fn(&T) -> String,
    ) -> PromptResult<Option<&'a T>> {
        for (i, item) in items.iter().enumerate() {
            self.say(format!("  {}. {}", i + 1, label(item)))?;
        }

        let count = items.len();
        let index = self.ask(&format!("{} (0 to cancel)", prompt), |answer| {
            match answer.parse::<usize>() {
                Ok(n) if n <= count => Ok(n),
                _ => Err(format!("enter a number between 0 and {}", count)),
            }
        })?;

        Ok(index.checked_sub(1).map(|i| &items[i]))
    }

    /// Ask a yes/no question.
    pub fn confirm(&mut self, prompt: &str) -> PromptResult<bool> {
        self.ask(&format!("{} (y/n)", prompt), |answer| {
            match answer.to_lowercase().as_str() {
                "y" | "yes" => Ok(true),
                "n" | "no" => Ok(false),
                _ => Err("answer y or n"),
            }
        })
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
