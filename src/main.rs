//! vfchat - chat with a Voiceflow agent from your terminal.
//!
//! Sends your messages to the Voiceflow Dialog Manager API, prints the
//! agent's replies and button choices, and optionally saves a transcript
//! after every turn.

mod api;
mod chat;
mod check;
mod config;
mod error;
mod protocol;

use anyhow::{Context, Result};
use api::{DialogClient, TranscriptClient};
use chat::{ChatSession, Input, LineSource, Readline, Renderer};
use clap::{Parser, Subcommand};
use config::{Config, ConfigStatus};
use error::ConfigError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ANONYMOUS_USER: &str = "anonymous_user";

#[derive(Parser)]
#[command(name = "vfchat")]
#[command(author, version, about = "Chat with a Voiceflow agent from your terminal")]
#[command(after_help = chat::session::HELP)]
struct Cli {
    /// User/session ID for the conversation (prompted if omitted)
    #[arg(short, long, value_name = "NAME")]
    user: Option<String>,

    /// Use this config file instead of the default location
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Don't save transcripts, even if project and version IDs are set
    #[arg(long)]
    no_transcript: bool,

    /// Override the dialog runtime URL
    #[arg(long, value_name = "URL")]
    runtime_url: Option<String>,

    /// Override the version alias (e.g. production, development)
    #[arg(long, value_name = "ALIAS")]
    version_alias: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the API key and both endpoints without starting a chat
    Check,
    /// Open configuration file in $EDITOR
    Config,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Some(Commands::Check) => handle_check(&cli).await,
        Some(Commands::Config) => handle_config(&cli),
        Some(Commands::Path) => handle_path(&cli),
        None => handle_chat(&cli).await,
    }
}

/// Logs go to stderr so they never mix with the conversation.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vfchat=debug,reqwest=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vfchat=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::config_path(),
    }
}

/// Load config and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(url) = &cli.runtime_url {
        config.runtime_url = url.clone();
    }
    if let Some(alias) = &cli.version_alias {
        config.version_alias = alias.clone();
    }
    Ok(config)
}

/// Print setup instructions for a configuration problem.
fn print_config_error<W: Write>(out: &mut Renderer<W>, err: &ConfigError, path: &Path) -> Result<()> {
    out.error(&format!("Error: {}", err))?;
    match err {
        ConfigError::MissingApiKey => {
            out.hint("1. Get your API key from: Voiceflow Project > Settings > API Keys")?;
            out.hint(&format!(
                "2. Set VOICEFLOW_API_KEY, or run 'vfchat config' to edit {}",
                path.display()
            ))?;
            out.hint("3. Your API key should look like: VF.DM.XXXXXXX.XXXXXX...")?;
        }
        ConfigError::MalformedApiKey { .. } => {
            out.hint("Your API key should look like: VF.DM.XXXXXXX.XXXXXX...")?;
        }
        ConfigError::InvalidUrl { .. } => {
            out.hint(&format!("Fix the URL in {} or unset the override", path.display()))?;
        }
        ConfigError::InvalidTimeout => {
            out.hint(&format!("Set timeout_secs to a positive number in {}", path.display()))?;
        }
    }
    out.line("\nTip: run 'vfchat --help' for usage, or 'vfchat check' to test your setup")?;
    Ok(())
}

/// Run an interactive conversation.
async fn handle_chat(cli: &Cli) -> Result<()> {
    let mut out = Renderer::stdout(!cli.no_color);
    out.line("Voiceflow Chat")?;
    out.line(&"=".repeat(60))?;

    let config = load_config(cli)?;
    let status = match config.validate() {
        Ok(status) => status,
        Err(e) => {
            print_config_error(&mut out, &e, &config_path(cli)?)?;
            std::process::exit(1);
        }
    };

    if status == ConfigStatus::Partial {
        out.warning("Warning: Project ID and Version ID not configured")?;
        out.hint("- Chat functionality will work")?;
        out.hint("- Transcript saving will be disabled")?;
        out.hint("- To enable transcripts, set project_id and version_id")?;
    }

    let api_key = config
        .api_key()
        .context("API key missing after validation")?;

    out.line(&format!("\nAPI Key: {}", config.masked_api_key()))?;
    out.line(&format!("Runtime: {}", config.runtime_url))?;
    out.line(&format!("Version: {}", config.version_alias))?;
    out.flush()?;

    let mut input = Readline::new().context("Failed to initialize line editor")?;
    let user = match &cli.user {
        Some(user) => user.trim().to_string(),
        None => match input.read_line("\nWhat is your name? ")? {
            Input::Line(line) => line.trim().to_string(),
            Input::Interrupted | Input::Eof => return Ok(()),
        },
    };
    let user = if user.is_empty() {
        ANONYMOUS_USER.to_string()
    } else {
        user
    };

    let http = api::http_client(config.timeout_secs).context("Failed to create HTTP client")?;
    let dialog = DialogClient::new(
        http.clone(),
        &config.runtime_url,
        api_key,
        &config.version_alias,
    );
    let transcripts = match (status, config.project_id(), config.version_id()) {
        (ConfigStatus::Valid, Some(project_id), Some(version_id)) if !cli.no_transcript => {
            Some(TranscriptClient::new(
                http,
                &config.transcripts_url,
                api_key,
                project_id,
                version_id,
            ))
        }
        _ => None,
    };
    info!(user = %user, transcripts = transcripts.is_some(), "starting chat");

    out.line(&format!("\nStarting conversation for: {}", user))?;
    out.line(&"-".repeat(40))?;

    let mut session = ChatSession::new(dialog, transcripts, user, out);
    let summary = session.run(&mut input).await?;

    println!("\n{}", "=".repeat(60));
    println!("{}", summary);
    println!("\nThank you for using vfchat!");

    if summary.launch_failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Handle the check subcommand.
async fn handle_check(cli: &Cli) -> Result<()> {
    let mut out = Renderer::stdout(!cli.no_color);
    out.line("Voiceflow API Configuration Test")?;
    out.line(&"=".repeat(50))?;

    let config = load_config(cli)?;
    let report = check::run_check(&config, &mut out).await?;
    if !report.ready() {
        std::process::exit(1);
    }
    Ok(())
}

/// Handle the config command.
fn handle_config(cli: &Cli) -> Result<()> {
    let config_path = config_path(cli)?;

    // Create a template if it doesn't exist
    if !config_path.exists() {
        Config::template().save_to(&config_path)?;
        println!("Created config template at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}

/// Handle the path command.
fn handle_path(cli: &Cli) -> Result<()> {
    println!("{}", config_path(cli)?.display());
    Ok(())
}
