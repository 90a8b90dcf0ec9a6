// CLI module
// Argument parsing, `init`, and wiring config into a runnable session

mod commands;
mod display;
mod repl;

pub use commands::{format_help, format_status, toggle_trust, toggle_yolo, ReplCommand};
pub use display::{format_tool_label, TerminalObserver};
pub use repl::{Repl, RunOutcome};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::agent::{
    AgentLoop, AutoDeny, ChannelConfirmer, Confirmer, Conversation, ConversationCompactor, Session,
    TaskOutcome,
};
use crate::config::constants::{CONFIG_DIR, HISTORY_FILE, PROJECT_CONTEXT_FILE};
use crate::config::{load_config, Config};
use crate::context::{ProjectContext, INIT_TEMPLATE};
use crate::providers::{LlmProvider, OpenAiCompatProvider};
use crate::tools::permissions::PermissionMode;
use crate::tools::registry::ToolRegistry;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INCOMPLETE: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug, Default)]
#[command(
    name = "seekcode",
    version,
    about = "Terminal coding assistant powered by DeepSeek"
)]
pub struct Cli {
    /// Task to execute; starts the interactive REPL when omitted
    pub task: Option<String>,

    /// Model to use (e.g. deepseek-chat, deepseek-coder)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Auto-approve file edits and shell commands (blocked commands stay blocked)
    #[arg(short, long)]
    pub trust: bool,

    /// Skip all permission prompts (blocked commands stay blocked)
    #[arg(long = "yolo", alias = "dangerously-skip-permissions")]
    pub yolo: bool,

    /// Maximum model round-trips per task
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't load SEEKCODE.md into the system prompt
    #[arg(long)]
    pub no_context: bool,

    /// Working directory (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a SEEKCODE.md template in the working directory
    Init,
}

impl Cli {
    /// Overlay command-line flags on loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.provider.model = model.clone();
        }
        if let Some(max_turns) = self.max_turns {
            config.agent.max_turns = max_turns;
        }
        if self.trust {
            config.agent.trust_mode = true;
        }
    }

    pub fn permission_mode(&self, config: &Config) -> PermissionMode {
        if self.yolo {
            PermissionMode::BypassAll
        } else if config.agent.trust_mode {
            PermissionMode::Trust
        } else {
            PermissionMode::Normal
        }
    }

    fn working_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) if dir.is_dir() => Ok(dir.clone()),
            Some(dir) => bail!("--cwd {} is not a directory", dir.display()),
            None => std::env::current_dir().context("Could not determine current directory"),
        }
    }
}

/// Write the SEEKCODE.md template into `dir`; never overwrites
pub fn init_project(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(PROJECT_CONTEXT_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(&path, INIT_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Exit code for a finished task
pub fn exit_code(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Finished(TaskOutcome::Completed { .. }) => EXIT_OK,
        RunOutcome::Finished(TaskOutcome::Incomplete { .. }) => EXIT_INCOMPLETE,
        RunOutcome::Interrupted => EXIT_INTERRUPTED,
    }
}

/// Entry point after argument parsing. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let working_dir = cli.working_dir()?;

    if cli.command == Some(Command::Init) {
        let path = init_project(&working_dir)?;
        println!("Created {}", path.display());
        println!("Edit this file to add project-specific context for the assistant.");
        return Ok(EXIT_OK);
    }

    let mut config = load_config()?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let project = ProjectContext::discover(&working_dir, !cli.no_context);
    let mode = cli.permission_mode(&config);

    let api_key = config.api_key().unwrap_or_default().to_string();
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::new(
        api_key,
        config.provider.base_url.clone(),
        config.provider.model.clone(),
    )?);

    let interactive_stdin = std::io::stdin().is_terminal();
    let (confirmer, confirmations) = if interactive_stdin {
        let (confirmer, rx) = ChannelConfirmer::new(1);
        (Arc::new(confirmer) as Arc<dyn Confirmer>, Some(rx))
    } else {
        info!("stdin is not a terminal; permission prompts will be denied");
        (Arc::new(AutoDeny) as Arc<dyn Confirmer>, None)
    };

    let agent = AgentLoop::new(
        Arc::clone(&provider),
        ToolRegistry::with_defaults(),
        confirmer,
        config.tool_context(&working_dir),
    )
    .with_settings(config.agent_settings())
    .with_observer(Arc::new(TerminalObserver::new(cli.verbose)));

    let conversation = Conversation::with_system(project.system_prompt())
        .with_compaction_threshold(config.agent.compaction_threshold);
    let mut repl = Repl::new(
        agent,
        ConversationCompactor::new(provider),
        conversation,
        Session::new(mode),
        confirmations,
    );

    let banner = match mode {
        PermissionMode::BypassAll => Some("⚠️  YOLO MODE: all permission prompts are skipped"),
        _ => None,
    };

    match cli.task.as_deref() {
        Some(task) => {
            let outcome = repl.run_task(task).await?;
            if let RunOutcome::Finished(finished) = &outcome {
                display::print_outcome(finished);
            }
            if cli.verbose {
                display::print_usage(&repl.session().usage);
            }
            Ok(exit_code(&outcome))
        }
        None => {
            display::print_welcome(env!("CARGO_PKG_VERSION"), &project.root, project.has_notes(), banner);
            let history = dirs::home_dir().map(|h| h.join(CONFIG_DIR).join(HISTORY_FILE));
            repl = repl.with_history_path(history);
            repl.run().await?;
            Ok(EXIT_OK)
        }
    }
}
