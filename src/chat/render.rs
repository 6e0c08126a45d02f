//! Console rendering of runtime traces.

use crate::protocol::{Button, Trace};
use crossterm::style::Stylize;
use std::io::{self, Write};

/// What a turn's traces mean for the conversation loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Keep going. `buttons` holds the latest choice offered, if any.
    Continue { buttons: Vec<Button> },
    /// The dialog sent an `end` trace.
    Ended,
    /// The runtime returned no traces at all.
    NoResponse,
}

/// Writes traces and status lines to a terminal (or any writer).
pub struct Renderer<W: Write> {
    out: W,
    color: bool,
}

impl Renderer<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Render a turn's traces in order. Rendering stops at an `end` trace.
    pub fn render(&mut self, traces: &[Trace]) -> io::Result<TurnOutcome> {
        if traces.is_empty() {
            self.warning("No response from Voiceflow. Make sure your agent is published.")?;
            return Ok(TurnOutcome::NoResponse);
        }

        let mut buttons = Vec::new();
        for trace in traces {
            match trace {
                Trace::Text { message } => {
                    let label = if self.color {
                        "Bot:".cyan().bold().to_string()
                    } else {
                        "Bot:".to_string()
                    };
                    writeln!(self.out, "{} {}", label, message)?;
                }
                Trace::Choice { buttons: offered } => {
                    self.menu(offered)?;
                    buttons = offered.clone();
                }
                Trace::Visual { visual_type, image } => match (visual_type.as_str(), image) {
                    ("image", url) => {
                        writeln!(self.out, "Image: {}", url.as_deref().unwrap_or_default())?
                    }
                    (other, _) => writeln!(self.out, "Visual content: {}", other)?,
                },
                Trace::End => {
                    self.info("Conversation ended by Voiceflow")?;
                    self.out.flush()?;
                    return Ok(TurnOutcome::Ended);
                }
                Trace::Path => {}
                Trace::Unknown { kind, raw } => {
                    writeln!(self.out, "Unhandled trace type '{}':", kind)?;
                    let pretty = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
                    writeln!(self.out, "{}", pretty)?;
                }
            }
        }

        self.out.flush()?;
        Ok(TurnOutcome::Continue { buttons })
    }

    /// Print a numbered button menu.
    pub fn menu(&mut self, buttons: &[Button]) -> io::Result<()> {
        writeln!(self.out, "\nChoose one of the following:")?;
        for (i, button) in buttons.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, button.name)?;
        }
        Ok(())
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", message.dark_grey())
        } else {
            writeln!(self.out, "{}", message)
        }
    }

    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", message.yellow())
        } else {
            writeln!(self.out, "{}", message)
        }
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", message.red())
        } else {
            writeln!(self.out, "{}", message)
        }
    }

    /// Indented follow-up line under an error or warning.
    pub fn hint(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "   {}", message)
    }

    pub fn line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
