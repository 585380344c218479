//! Static expected-values configuration.
//!
//! Loaded once before sequencing begins and treated as read-only input
//! data. The currency and language lists drive the click/assert choreography
//! of the currency- and language-switching scenarios.

use crate::result::PasoResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected option values used to drive assertions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    /// Currency codes offered by the storefront dropdown
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
    /// Language names offered by the language selector
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

fn default_currencies() -> Vec<String> {
    ["EUR", "GBP", "USD"].map(String::from).to_vec()
}

fn default_languages() -> Vec<String> {
    ["English", "Deutsch", "Espa\u{f1}ol", "Fran\u{e7}ais"]
        .map(String::from)
        .to_vec()
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            currencies: default_currencies(),
            languages: default_languages(),
        }
    }
}

impl Constants {
    /// Parse from a JSON string; absent keys fall back to the defaults
    pub fn from_json(json: &str) -> PasoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> PasoResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
