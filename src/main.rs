//! Parley CLI binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use parley::cli::{exit_status, log_filter, Cli, Commands, ReplCommand, SessionArgs, REPL_HELP};
use parley::config::ParleyConfig;
use parley::controller::TurnController;
use parley::error::ParleyError;
use parley::render::TerminalRenderer;
use parley::session::SessionStore;
use parley::types::GenerationSettings;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Chat(args) => handle_chat(args).await.map(|()| 0),
        Commands::Ask(args) => handle_ask(args.session, &args.prompt).await,
    };

    match result {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve config and credentials; a missing key stops here, before any input.
fn build_controller(args: &SessionArgs) -> Result<TurnController, ParleyError> {
    let mut config = ParleyConfig::load()?;
    if let Some(model) = &args.model {
        config = config.with_model_name(model.clone());
    }
    let provider = parley::provider::create_provider(&config)?;
    info!(
        provider = provider.provider_name(),
        model = provider.model_id(),
        "ready"
    );

    let settings = GenerationSettings {
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        ..Default::default()
    };

    Ok(TurnController::new(Arc::from(provider))
        .with_streaming(!args.no_stream)
        .with_user_turns(args.record_user_turns)
        .with_settings(settings))
}

/// Model failures are shown by the renderer and only set the exit status.
async fn handle_ask(args: SessionArgs, prompt: &str) -> Result<u8, ParleyError> {
    let controller = build_controller(&args)?;
    let mut session = SessionStore::new();
    let mut renderer = TerminalRenderer::stdout();

    let outcome = controller.submit(&mut session, prompt, &mut renderer).await?;
    Ok(exit_status(&outcome))
}

async fn handle_chat(args: SessionArgs) -> Result<(), ParleyError> {
    let controller = build_controller(&args)?;
    let mut session = SessionStore::new();
    let mut renderer = TerminalRenderer::stdout();
    info!(session = %session.id(), "chat started");
    println!("{REPL_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{REPL_HELP}"),
            ReplCommand::Clear => {
                session.clear();
                println!("(history cleared)");
            }
            ReplCommand::History => {
                if session.is_empty() {
                    println!("(no history)");
                }
                for turn in session.all() {
                    println!("{}: {}", turn.role(), turn.text());
                }
            }
            ReplCommand::Prompt(text) => {
                // Failures are already shown by the renderer; keep chatting.
                controller.submit(&mut session, &text, &mut renderer).await?;
            }
        }
    }

    Ok(())
}
