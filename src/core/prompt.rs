//! Interactive input
//!
//! Every prompt returns `None` when the user provides nothing, which callers
//! treat as cancellation of the current step.

use std::io::{self, BufRead, Write};

use crate::error::{ExtsyncError, Result};

/// Source of interactive user input
pub trait Prompter: Send + Sync {
    /// Ask for a line of text
    fn input(&self, prompt: &str) -> Result<Option<String>>;

    /// Ask for a line of text without echoing it
    fn secret(&self, prompt: &str) -> Result<Option<String>>;

    /// Let the user pick any number of items; returns the chosen indices in
    /// list order, or `None` if the selection was cancelled
    fn select_many(&self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>>;
}

/// Prompter reading from the controlling terminal
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line() -> Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(non_empty(&line))
    }
}

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str) -> Result<Option<String>> {
        print!("{} ", prompt);
        io::stdout().flush()?;
        Self::read_line()
    }

    fn secret(&self, prompt: &str) -> Result<Option<String>> {
        let value = rpassword::prompt_password(format!("{} ", prompt))?;
        Ok(non_empty(&value))
    }

    fn select_many(&self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        println!("{}", title);
        println!();
        for (i, item) in items.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, item);
        }
        println!();
        print!("Select items ('all', or e.g. 1,3-5; empty to cancel): ");
        io::stdout().flush()?;

        match Self::read_line()? {
            Some(answer) => parse_selection(&answer, items.len()).map(Some),
            None => Ok(None),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a selection like `all`, `2`, or `1,3-5` into sorted zero-based indices
pub fn parse_selection(answer: &str, len: usize) -> Result<Vec<usize>> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("all") || answer == "*" {
        return Ok((0..len).collect());
    }

    let invalid = || ExtsyncError::InvalidInput(format!("Invalid selection '{}'", answer));
    let mut picked = vec![false; len];

    for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (
                a.trim().parse::<usize>().map_err(|_| invalid())?,
                b.trim().parse::<usize>().map_err(|_| invalid())?,
            ),
            None => {
                let n = part.parse::<usize>().map_err(|_| invalid())?;
                (n, n)
            }
        };

        if start == 0 || end > len || start > end {
            return Err(ExtsyncError::InvalidInput(format!(
                "Selection '{}' is out of range (1-{})",
                part, len
            )));
        }
        for slot in &mut picked[start - 1..end] {
            *slot = true;
        }
    }

    Ok(picked
        .iter()
        .enumerate()
        .filter_map(|(i, &p)| p.then_some(i))
        .collect())
}
