//! Convenience re-exports for common use.

pub use crate::aggregator::{AggregatedResponse, ResponseAggregator};
pub use crate::config::ParleyConfig;
pub use crate::controller::{TurnController, TurnOutcome, TurnState};
pub use crate::error::{ErrorKind, ParleyError, Result};
pub use crate::provider::{Completion, ModelProvider};
pub use crate::render::Renderer;
pub use crate::session::{SessionId, SessionStore};
pub use crate::types::{GenerationSettings, Role, StreamFragment, Turn};
