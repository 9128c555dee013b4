//! Typed confirmation gate before the destination commit

use crate::core::error::ReleaseResult;
use std::io::{self, BufRead, Write};

/// Exact answer that lets the commit proceed
pub const CONFIRM_TOKEN: &str = "YES";

/// Source of operator answers
pub trait Prompt {
  /// Show `message` and return the answer with the line terminator removed
  fn ask(&mut self, message: &str) -> ReleaseResult<String>;
}

/// Ask `message` and report whether the operator typed [`CONFIRM_TOKEN`].
///
/// Surrounding whitespace is ignored; case is not.
pub fn confirm(prompt: &mut dyn Prompt, message: &str) -> ReleaseResult<bool> {
  let answer = prompt.ask(message)?;
  Ok(answer.trim() == CONFIRM_TOKEN)
}

/// Prompt on the controlling terminal
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
  fn ask(&mut self, message: &str) -> ReleaseResult<String> {
    print!("\n{}: ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    Ok(input.trim_end_matches(['\r', '\n']).to_string())
  }
}

/// Replays canned answers, recording each question
#[cfg(test)]
pub struct ScriptedPrompt {
  answers: std::collections::VecDeque<String>,
  pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
  pub fn new(answers: &[&str]) -> Self {
    Self {
      answers: answers.iter().map(|a| a.to_string()).collect(),
      asked: Vec::new(),
    }
  }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
  fn ask(&mut self, message: &str) -> ReleaseResult<String> {
    self.asked.push(message.to_string());
    // An exhausted script behaves like EOF on stdin
    Ok(self.answers.pop_front().unwrap_or_default())
  }
}
