//! Line input for the chat prompt.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// What the user did at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl+C.
    Interrupted,
    /// Ctrl+D or closed stdin.
    Eof,
}

/// Source of user input lines.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Input>;
}

/// Interactive input backed by rustyline, with in-session history.
pub struct Readline {
    editor: DefaultEditor,
}

impl Readline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Readline {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replays a fixed list of inputs, then reports end of input.
#[cfg(test)]
pub struct Scripted {
    inputs: std::collections::VecDeque<Input>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl Scripted {
    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Input::Line(l.to_string())).collect())
    }

    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs: inputs.into(),
            prompts: Vec::new(),
        }
    }
}

#[cfg(test)]
impl LineSource for Scripted {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front().unwrap_or(Input::Eof))
    }
}
