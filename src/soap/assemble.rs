//! Final note assembly and the on-disk artifact.

use crate::error::Result;
use crate::soap::note::{SectionQuotes, SoapNote};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The final artifact: the pruned note plus the supporting transcript quotes
/// collected during verification. Contains no text that did not survive a
/// claim verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalNote {
    pub soap: SoapNote,
    pub quotes: SectionQuotes,
}

impl FinalNote {
    /// Merge pruned sections and their quotes into the canonical structure.
    pub fn assemble(soap: SoapNote, quotes: SectionQuotes) -> Self {
        Self { soap, quotes }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::error::ScribeError::Other(e.to_string()))
    }

    /// Write the artifact to disk.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read an artifact back from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| crate::error::ScribeError::Other(e.to_string()))
    }
}
