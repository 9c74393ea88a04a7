//! Error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad error kind, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Credential or configuration absent at startup. Fatal.
    ConfigMissing,
    /// Blank or whitespace-only input.
    EmptyInput,
    /// The model call failed before or during streaming.
    FetchFailed,
    /// A turn is already in flight.
    Busy,
    Internal,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    EditInput,
    WaitForCompletion,
    ContactSupport,
}
