//! Assembles model output into a final message.
//!
//! Streaming mode concatenates fragment deltas in arrival order and reports
//! every intermediate prefix to a callback. Atomic mode passes a complete
//! text through untouched.

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::ParleyError;
use crate::types::StreamFragment;

/// Result of aggregating one response.
///
/// `text` holds everything received, even when `error` is set.
#[derive(Debug)]
pub struct AggregatedResponse {
    pub text: String,
    pub error: Option<ParleyError>,
    pub fragments: usize,
}

impl AggregatedResponse {
    /// Whether the upstream sequence ran to its end.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// The final text, or the fault that cut the response short.
    pub fn into_result(self) -> Result<String, ParleyError> {
        match self.error {
            None => Ok(self.text),
            Some(err) => Err(err),
        }
    }
}

/// Stateless aggregator for streamed and atomic responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseAggregator;

impl ResponseAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Consume `stream` to its end, calling `on_update` with the accumulated
    /// text after each fragment.
    ///
    /// A fault stops consumption; the text gathered so far is kept and the
    /// fault is returned in [`AggregatedResponse::error`], wrapped as a
    /// partial-stream error when some text had already been reported.
    pub async fn aggregate_stream<S, F>(&self, stream: S, mut on_update: F) -> AggregatedResponse
    where
        S: Stream<Item = Result<StreamFragment, ParleyError>>,
        F: FnMut(&str),
    {
        futures::pin_mut!(stream);
        let mut text = String::new();
        let mut fragments = 0;

        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    fragments += 1;
                    text.push_str(&fragment.text_delta);
                    on_update(&text);
                }
                Err(err) => {
                    warn!(fragments, received = text.len(), error = %err, "stream interrupted");
                    let error = ParleyError::interrupted(text.chars().count(), err);
                    return AggregatedResponse {
                        text,
                        error: Some(error),
                        fragments,
                    };
                }
            }
        }

        debug!(fragments, len = text.len(), "stream complete");
        AggregatedResponse {
            text,
            error: None,
            fragments,
        }
    }

    /// Atomic mode: no intermediate updates.
    pub fn aggregate_text(&self, result: Result<String, ParleyError>) -> AggregatedResponse {
        match result {
            Ok(text) => AggregatedResponse {
                text,
                error: None,
                fragments: 0,
            },
            Err(err) => AggregatedResponse {
                text: String::new(),
                error: Some(err),
                fragments: 0,
            },
        }
    }
}
