//! Streaming types.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::ParleyError;

/// An incremental piece of model output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamFragment {
    pub text_delta: String,
}

impl StreamFragment {
    pub fn new(text_delta: impl Into<String>) -> Self {
        Self {
            text_delta: text_delta.into(),
        }
    }
}

/// A finite, non-restartable sequence of fragments from the model.
pub type FragmentStream = BoxStream<'static, Result<StreamFragment, ParleyError>>;
