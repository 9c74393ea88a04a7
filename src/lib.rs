//! Parley: a conversational turn engine for hosted LLM chat.
//!
//! Forwards a user's question to a hosted language model, renders the answer
//! progressively (streamed) or whole (atomic), and keeps the conversation
//! history for the session.
//!
//! # Quick Start
//!
//! ```no_run
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = ParleyConfig::load()?;
//! let provider = parley::provider::create_provider(&config)?;
//! let controller = TurnController::new(provider.into());
//! let mut session = SessionStore::new();
//! let mut renderer = parley::render::TerminalRenderer::stdout();
//! controller.submit(&mut session, "2+2?", &mut renderer).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod render;
pub mod session;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
