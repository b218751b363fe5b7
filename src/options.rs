//! Extraction options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which engine entry point serves a whole-document extraction.
///
/// Both modes return the page texts concatenated in ascending page order;
/// the mode only selects the engine implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Extract pages one after another
    Sequential,
    /// Let the engine extract pages concurrently
    #[default]
    Parallel,
}

impl ExtractMode {
    pub fn is_parallel(self) -> bool {
        matches!(self, ExtractMode::Parallel)
    }
}

impl From<bool> for ExtractMode {
    /// `true` selects [`ExtractMode::Parallel`].
    fn from(parallel: bool) -> Self {
        if parallel {
            ExtractMode::Parallel
        } else {
            ExtractMode::Sequential
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractMode::Sequential => f.write_str("sequential"),
            ExtractMode::Parallel => f.write_str("parallel"),
        }
    }
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(ExtractMode::Sequential),
            "parallel" | "par" => Ok(ExtractMode::Parallel),
            other => Err(format!("unknown extraction mode: {}", other)),
        }
    }
}
