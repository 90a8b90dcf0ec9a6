// Interactive REPL and single-task driver
//
// The agent loop runs as one future; permission questions arrive over the
// confirmation channel and are answered on the terminal while that future
// is suspended. Answers are read through the line editor on the current
// worker thread, so Ctrl-C at the prompt comes back as an interrupt and no
// reader is left holding stdin. Ctrl-C abandons the running task.

use anyhow::{anyhow, Context, Result};
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::commands::{self, ReplCommand};
use super::display;
use crate::agent::{
    AgentError, AgentLoop, ConfirmationRequest, Conversation, ConversationCompactor, Decision,
    Session, TaskOutcome,
};

/// How a single task ended, from the terminal's point of view
#[derive(Debug)]
pub enum RunOutcome {
    Finished(TaskOutcome),
    Interrupted,
}

pub struct Repl {
    agent: AgentLoop,
    compactor: ConversationCompactor,
    conversation: Conversation,
    session: Session,
    /// None when stdin is not a terminal (every ask is auto-denied)
    confirmations: Option<mpsc::Receiver<ConfirmationRequest>>,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new(
        agent: AgentLoop,
        compactor: ConversationCompactor,
        conversation: Conversation,
        session: Session,
        confirmations: Option<mpsc::Receiver<ConfirmationRequest>>,
    ) -> Self {
        Self {
            agent,
            compactor,
            conversation,
            session,
            confirmations,
            history_path: None,
        }
    }

    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run one task to completion, exhaustion, or interruption
    pub async fn run_task(&mut self, task: &str) -> Result<RunOutcome, AgentError> {
        if self.conversation.needs_compaction() {
            display::print_info("Compacting conversation history…");
            self.compactor
                .compact(&mut self.conversation, &mut self.session.usage)
                .await;
        }

        let outcome = drive(
            &self.agent,
            &mut self.conversation,
            &mut self.session,
            self.confirmations.as_mut(),
            task,
        )
        .await;

        if matches!(outcome, Ok(RunOutcome::Interrupted)) && self.conversation.discard_unanswered() {
            debug!("Dropped unanswered tool calls after interrupt");
        }
        outcome
    }

    /// Interactive loop until `quit` or EOF
    pub async fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
        if let Some(path) = &self.history_path {
            load_history(&mut editor, path);
        }

        loop {
            let readline = tokio::task::block_in_place(|| editor.readline("\n> "));
            let line = match readline {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    display::print_info("Use 'quit' to exit");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(anyhow!("failed to read input: {}", e)),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(input);

            if let Some(command) = ReplCommand::parse(input) {
                if command == ReplCommand::Quit {
                    break;
                }
                self.handle_command(command).await;
                continue;
            }

            match self.run_task(input).await {
                Ok(RunOutcome::Finished(outcome)) => display::print_outcome(&outcome),
                Ok(RunOutcome::Interrupted) => println!("\n{}", "Interrupted".yellow()),
                Err(e) => display::print_error(&e.to_string()),
            }
        }

        if let Some(path) = &self.history_path {
            save_history(&mut editor, path);
        }
        println!("Goodbye!");
        Ok(())
    }

    async fn handle_command(&mut self, command: ReplCommand) {
        match command {
            ReplCommand::Quit => {}
            ReplCommand::Clear => {
                self.conversation.clear();
                display::print_info("Conversation cleared.");
            }
            ReplCommand::Help => println!("{}", commands::format_help(self.session.mode)),
            ReplCommand::Yolo => {
                self.session.mode = commands::toggle_yolo(self.session.mode);
                println!("{}", commands::mode_notice(self.session.mode));
            }
            ReplCommand::Trust => {
                self.session.mode = commands::toggle_trust(self.session.mode);
                println!("{}", commands::mode_notice(self.session.mode));
            }
            ReplCommand::Status => {
                let model = match self.agent.settings().model.as_str() {
                    "" => self.agent.provider().default_model().to_string(),
                    m => m.to_string(),
                };
                println!(
                    "{}",
                    commands::format_status(&self.session, &model, self.conversation.len())
                );
            }
            ReplCommand::Compact => {
                if self
                    .compactor
                    .compact(&mut self.conversation, &mut self.session.usage)
                    .await
                {
                    display::print_info(&format!(
                        "Compacted to {} messages.",
                        self.conversation.len()
                    ));
                } else {
                    display::print_info("Nothing to compact.");
                }
            }
        }
    }
}

/// Poll the agent future, answering confirmation requests as they arrive
async fn drive(
    agent: &AgentLoop,
    conversation: &mut Conversation,
    session: &mut Session,
    mut confirmations: Option<&mut mpsc::Receiver<ConfirmationRequest>>,
    task: &str,
) -> Result<RunOutcome, AgentError> {
    let run = agent.run(conversation, session, task);
    tokio::pin!(run);
    let mut prompter: Option<DefaultEditor> = None;

    loop {
        tokio::select! {
            outcome = &mut run => return outcome.map(RunOutcome::Finished),
            Some(request) = next_request(&mut confirmations) => {
                let Some(decision) = ask_terminal(&mut prompter, &request.prompt) else {
                    return Ok(RunOutcome::Interrupted);
                };
                if request.respond_to.send(decision).is_err() {
                    warn!("Confirmation answered after the loop stopped waiting");
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(RunOutcome::Interrupted),
        }
    }
}

async fn next_request(
    confirmations: &mut Option<&mut mpsc::Receiver<ConfirmationRequest>>,
) -> Option<ConfirmationRequest> {
    match confirmations {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// One line read at the confirmation prompt, interpreted
#[derive(Debug, PartialEq, Eq)]
enum ConfirmStep {
    Answer(Decision),
    Retry,
    Interrupted,
}

fn confirm_step(line: Result<String, ReadlineError>) -> ConfirmStep {
    match line {
        Ok(line) => Decision::parse_answer(&line).map_or(ConfirmStep::Retry, ConfirmStep::Answer),
        Err(ReadlineError::Interrupted) => ConfirmStep::Interrupted,
        Err(ReadlineError::Eof) => ConfirmStep::Answer(Decision::No),
        Err(e) => {
            warn!("Failed to read confirmation: {}", e);
            ConfirmStep::Answer(Decision::No)
        }
    }
}

/// Ask on the terminal until the answer parses. None means Ctrl-C.
fn ask_terminal(prompter: &mut Option<DefaultEditor>, prompt: &str) -> Option<Decision> {
    if prompter.is_none() {
        match DefaultEditor::new() {
            Ok(editor) => *prompter = Some(editor),
            Err(e) => {
                warn!("Failed to open confirmation prompt: {}", e);
                return Some(Decision::No);
            }
        }
    }
    let Some(editor) = prompter.as_mut() else {
        return Some(Decision::No);
    };

    println!("\n{} {}", "⚠".yellow(), prompt.bold());
    loop {
        let line =
            tokio::task::block_in_place(|| editor.readline("Allow? [y]es / [n]o / [a]lways: "));
        match confirm_step(line) {
            ConfirmStep::Answer(decision) => return Some(decision),
            ConfirmStep::Retry => continue,
            ConfirmStep::Interrupted => return None,
        }
    }
}

fn load_history(editor: &mut DefaultEditor, path: &Path) {
    if let Err(e) = editor.load_history(path) {
        if !matches!(e, ReadlineError::Io(ref err) if err.kind() == io::ErrorKind::NotFound) {
            warn!("Failed to load REPL history from {}: {}", path.display(), e);
        }
    }
}

fn save_history(editor: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = editor.save_history(path) {
        warn!("Failed to save REPL history to {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_c_at_confirmation_interrupts() {
        assert_eq!(confirm_step(Err(ReadlineError::Interrupted)), ConfirmStep::Interrupted);
    }

    #[test]
    fn test_eof_at_confirmation_denies() {
        assert_eq!(
            confirm_step(Err(ReadlineError::Eof)),
            ConfirmStep::Answer(Decision::No)
        );
    }

    #[test]
    fn test_confirmation_answers() {
        assert_eq!(confirm_step(Ok("y".into())), ConfirmStep::Answer(Decision::Yes));
        assert_eq!(confirm_step(Ok(" Always ".into())), ConfirmStep::Answer(Decision::Always));
        assert_eq!(confirm_step(Ok(String::new())), ConfirmStep::Answer(Decision::No));
        assert_eq!(confirm_step(Ok("maybe".into())), ConfirmStep::Retry);
    }

    #[test]
    fn test_read_error_at_confirmation_denies() {
        let err = ReadlineError::Io(io::Error::new(io::ErrorKind::Other, "tty gone"));
        assert_eq!(confirm_step(Err(err)), ConfirmStep::Answer(Decision::No));
    }
}
