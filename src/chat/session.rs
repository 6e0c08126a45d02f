//! The conversation loop.
//!
//! A session starts with a `launch` request and then alternates between
//! reading a line from the user and sending it to the runtime. Buttons from
//! the most recent `choice` trace stay pending until the next turn.

use crate::api::{DialogClient, TranscriptClient};
use crate::chat::input::{Input, LineSource};
use crate::chat::render::{Renderer, TurnOutcome};
use crate::error::ApiError;
use crate::protocol::{Button, Request};
use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use tracing::{debug, info};

const QUIT_COMMANDS: [&str; 3] = ["quit", "exit", "bye"];

const TEXT_PROMPT: &str = "You: ";
const BUTTON_PROMPT: &str = "Choose button number or type message: ";

/// In-chat help text.
pub const HELP: &str = "\
During conversation, you can:
  - Type any message to chat with your Voiceflow agent
  - When buttons appear, type the number (1, 2, 3...) to select
  - Type 'quit', 'exit', or 'bye' to end the conversation
  - Press Ctrl+C to force quit";

/// Resolves when the user asks to stop while a request is in flight.
pub type Interrupt = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Ctrl+C as a future. If the signal handler can't be installed, never fires.
fn ctrl_c() -> Interrupt {
    Box::pin(async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
}

/// What a line of user input asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Help,
    Empty,
    /// Zero-based index into the pending buttons.
    Select(usize),
    Send(Request),
}

/// Interpret a line of input against the pending buttons.
///
/// A number in `1..=buttons.len()` picks a button. Anything else, including
/// out-of-range numbers, is sent as free text.
pub fn resolve(line: &str, buttons: &[Button]) -> Action {
    let trimmed = line.trim();
    let lowered = trimmed.to_lowercase();

    if QUIT_COMMANDS.contains(&lowered.as_str()) {
        return Action::Quit;
    }
    if lowered == "help" {
        return Action::Help;
    }
    if trimmed.is_empty() {
        return Action::Empty;
    }

    if let Ok(n) = trimmed.parse::<usize>() {
        if (1..=buttons.len()).contains(&n) {
            return Action::Select(n - 1);
        }
    }

    Action::Send(Request::text(trimmed))
}

/// Why the conversation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    DialogEnded,
    NoResponse,
    UserQuit,
    Interrupted,
    InputClosed,
    Error,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::DialogEnded => "dialog ended",
            EndReason::NoResponse => "no response from agent",
            EndReason::UserQuit => "user quit",
            EndReason::Interrupted => "interrupted",
            EndReason::InputClosed => "input closed",
            EndReason::Error => "request failed",
        };
        f.write_str(s)
    }
}

/// End-of-conversation statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub user: String,
    pub interactions: usize,
    pub transcripts_enabled: bool,
    pub transcripts_saved: usize,
    pub reason: EndReason,
}

impl Summary {
    /// True when the conversation never got past the launch request.
    pub fn launch_failed(&self) -> bool {
        self.interactions == 0 && matches!(self.reason, EndReason::Error | EndReason::NoResponse)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conversation Summary:")?;
        writeln!(f, "   - User: {}", self.user)?;
        writeln!(f, "   - Interactions: {}", self.interactions)?;
        writeln!(f, "   - Ended: {}", self.reason)?;
        if self.transcripts_enabled {
            write!(f, "   - Transcripts saved: Yes ({})", self.transcripts_saved)
        } else {
            write!(f, "   - Transcripts saved: No")
        }
    }
}

/// One user's conversation with the agent.
pub struct ChatSession<W: Write> {
    dialog: DialogClient,
    transcripts: Option<TranscriptClient>,
    user_id: String,
    renderer: Renderer<W>,
    buttons: Vec<Button>,
    interactions: usize,
    transcripts_saved: usize,
    interrupt: Box<dyn Fn() -> Interrupt + Send>,
}

impl<W: Write> ChatSession<W> {
    /// Create a session. Pass `None` for `transcripts` to skip saving.
    pub fn new(
        dialog: DialogClient,
        transcripts: Option<TranscriptClient>,
        user_id: impl Into<String>,
        renderer: Renderer<W>,
    ) -> Self {
        Self {
            dialog,
            transcripts,
            user_id: user_id.into(),
            renderer,
            buttons: Vec::new(),
            interactions: 0,
            transcripts_saved: 0,
            interrupt: Box::new(ctrl_c),
        }
    }

    /// Replace the Ctrl+C source used while waiting on the runtime.
    #[cfg(test)]
    pub fn with_interrupt<F>(mut self, interrupt: F) -> Self
    where
        F: Fn() -> Interrupt + Send + 'static,
    {
        self.interrupt = Box::new(interrupt);
        self
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    /// Buttons offered by the last turn.
    #[cfg(test)]
    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// Launch the dialog and chat until it ends.
    ///
    /// Request failures are reported on the renderer and end the loop; only
    /// terminal I/O errors are returned.
    pub async fn run<S: LineSource>(&mut self, input: &mut S) -> Result<Summary> {
        info!(user = %self.user_id, "launching conversation");

        if let Some(reason) = self.turn(&Request::launch().to_value()).await? {
            if matches!(reason, EndReason::Error | EndReason::NoResponse) {
                self.renderer.error("\nFailed to start conversation.")?;
                self.renderer.hint("- Check that your API key is correct")?;
                self.renderer.hint("- Make sure your Voiceflow project is published")?;
                self.renderer.hint("- Verify your internet connection")?;
            }
            return Ok(self.summary(reason));
        }

        let reason = loop {
            let prompt = if self.buttons.is_empty() {
                TEXT_PROMPT
            } else {
                BUTTON_PROMPT
            };

            self.renderer.line("")?;
            self.renderer.flush()?;
            let line = match input.read_line(prompt)? {
                Input::Line(line) => line,
                Input::Interrupted => {
                    self.renderer.info("\nConversation interrupted by user.")?;
                    break EndReason::Interrupted;
                }
                Input::Eof => break EndReason::InputClosed,
            };

            let request = match resolve(&line, &self.buttons) {
                Action::Quit => {
                    self.renderer.line("Goodbye!")?;
                    break EndReason::UserQuit;
                }
                Action::Help => {
                    self.renderer.line(HELP)?;
                    continue;
                }
                Action::Empty => {
                    self.renderer.info("Please enter a message or 'quit' to exit")?;
                    continue;
                }
                Action::Select(index) => {
                    let button = &self.buttons[index];
                    self.renderer.info(&format!("Selected: {}", button.name))?;
                    button.request.clone()
                }
                Action::Send(request) => request.to_value(),
            };

            self.interactions += 1;
            if let Some(reason) = self.turn(&request).await? {
                break reason;
            }
        };

        debug!(%reason, interactions = self.interactions, "conversation finished");
        Ok(self.summary(reason))
    }

    /// Send one request, render the reply and save the transcript.
    /// Returns the end reason if the conversation is over.
    async fn turn(&mut self, request: &Value) -> Result<Option<EndReason>> {
        let interrupt = (self.interrupt)();
        let result = tokio::select! {
            biased;
            _ = interrupt => None,
            result = self.dialog.interact(&self.user_id, request) => Some(result),
        };
        let Some(result) = result else {
            self.renderer.info("\nConversation interrupted by user.")?;
            return Ok(Some(EndReason::Interrupted));
        };
        let traces = match result {
            Ok(traces) => traces,
            Err(e) => {
                self.report_error("Error talking to Voiceflow", &e)?;
                return Ok(Some(EndReason::Error));
            }
        };

        let outcome = self.renderer.render(&traces)?;
        self.save_transcript().await?;

        Ok(match outcome {
            TurnOutcome::Continue { buttons } => {
                self.buttons = buttons;
                None
            }
            TurnOutcome::Ended => Some(EndReason::DialogEnded),
            TurnOutcome::NoResponse => Some(EndReason::NoResponse),
        })
    }

    async fn save_transcript(&mut self) -> Result<()> {
        let Some(client) = &self.transcripts else {
            return Ok(());
        };

        let result = client.save(&self.user_id).await;
        match result {
            Ok(status) => {
                self.transcripts_saved += 1;
                self.renderer
                    .info(&format!("Transcript saved (status: {})", status))?;
            }
            Err(e) => match e.status() {
                Some(status) => {
                    self.renderer
                        .warning(&format!("Failed to save transcript (status: {})", status))?;
                    if let Some(hint) = e.hint() {
                        self.renderer.hint(hint)?;
                    }
                }
                None => self.report_error("Error saving transcript", &e)?,
            },
        }
        Ok(())
    }

    fn report_error(&mut self, context: &str, error: &ApiError) -> Result<()> {
        self.renderer.error(&format!("{}: {}", context, error))?;
        if let Some(hint) = error.hint() {
            self.renderer.hint(hint)?;
        }
        Ok(())
    }

    fn summary(&self, reason: EndReason) -> Summary {
        Summary {
            user: self.user_id.clone(),
            interactions: self.interactions,
            transcripts_enabled: self.transcripts.is_some(),
            transcripts_saved: self.transcripts_saved,
            reason,
        }
    }
}
