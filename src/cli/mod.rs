//! CLI entry point for Parley.

use clap::{Args, Parser, Subcommand};

use crate::controller::TurnOutcome;

/// Parley chat CLI
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Chat with a hosted LLM from the terminal")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat; one line per question
    Chat(SessionArgs),
    /// Ask a single question and exit
    Ask(AskArgs),
}

/// Options shared by both commands.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Model identifier (overrides MODEL_NAME)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Keep the user's prompts in the history too
    #[arg(long)]
    pub record_user_turns: bool,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Max tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

/// Arguments for `parley ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// The question
    pub prompt: String,
}

/// A line typed into the interactive chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Clear,
    History,
    Help,
    Prompt(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/clear" => Self::Clear,
            "/history" => Self::History,
            "/help" => Self::Help,
            _ => Self::Prompt(line.to_string()),
        }
    }
}

pub const REPL_HELP: &str = "Commands: /history  /clear  /help  /quit";

/// Log filter for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Exit status for a finished turn. A failure was already shown by the
/// renderer, so it only changes the status.
pub fn exit_status(outcome: &TurnOutcome) -> u8 {
    match outcome {
        TurnOutcome::Failed { .. } => 1,
        _ => 0,
    }
}
