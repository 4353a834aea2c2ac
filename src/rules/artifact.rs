use super::ConditionalRule;
use crate::error::ArtifactError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A rule set prepared for repeated evaluation: inactive rules dropped and the rest
/// stably ordered by priority.
///
/// It is immutable once built, so one instance can be shared across sessions, and it
/// can be cached on disk with `save` / `from_file`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompiledRuleSet {
    rules: Vec<ConditionalRule>,
}

impl CompiledRuleSet {
    pub fn compile(rules: impl IntoIterator<Item = ConditionalRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|rule| rule.is_active)
            .sorted_by_key(|rule| rule.priority)
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(rules, _)| rules) // bincode 2 returns (data, bytes_read)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }

    /// Saves the rule set to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let io_error = |e: std::io::Error| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        };
        let mut file = fs::File::create(path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        Ok(())
    }

    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let io_error = |e: std::io::Error| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        };
        let mut file = fs::File::open(path).map_err(io_error)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(io_error)?;
        Self::from_bytes(&bytes)
    }
}
