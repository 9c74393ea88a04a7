//! Generation settings.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Settings forwarded with every request.
///
/// ```
/// use parley::types::GenerationSettings;
///
/// let settings = GenerationSettings::builder().temperature(0.2).max_tokens(512).build();
/// assert_eq!(settings.max_tokens, Some(512));
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
    pub user: Option<String>,
}
