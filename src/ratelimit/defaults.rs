//! Documented default ceilings per canonical model.
//!
//! The table is a data asset (`defaults.json`) kept apart from the matching
//! logic. It can be replaced at runtime with [`DefaultTable::from_file`].

use super::model::RateLimitFields;
use log::error;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Default ceilings for one model. Every populated field is written on reset.
pub type DefaultLimits = RateLimitFields;

pub const FALLBACK_KEY: &str = "default";

/// Used when neither the model nor the fallback key is present.
pub const UNLIMITED: i64 = i32::MAX as i64;

const BUILTIN_JSON: &str = include_str!("defaults.json");

static BUILTIN: LazyLock<DefaultTable> = LazyLock::new(|| {
    DefaultTable::from_json(BUILTIN_JSON).unwrap_or_else(|e| {
        error!("built-in rate limit defaults are invalid: {}", e);
        DefaultTable::default()
    })
});

#[derive(Debug, Error)]
pub enum DefaultTableError {
    #[error("failed to read default table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse default table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("default table entry '{model}' sets no limits")]
    EmptyEntry { model: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultTable {
    entries: BTreeMap<String, DefaultLimits>,
}

impl DefaultTable {
    pub fn builtin() -> &'static DefaultTable {
        &BUILTIN
    }

    pub fn from_json(raw: &str) -> Result<Self, DefaultTableError> {
        let entries: BTreeMap<String, DefaultLimits> = serde_json::from_str(raw)?;
        // a reset must never send a name-only update
        if let Some((model, _)) = entries.iter().find(|(_, limits)| limits.is_empty()) {
            return Err(DefaultTableError::EmptyEntry {
                model: model.clone(),
            });
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, DefaultTableError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DefaultTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Exact model key, then the `"default"` entry, then an unlimited entry. Never fails.
    pub fn lookup(&self, model: &str) -> DefaultLimits {
        self.entries
            .get(model)
            .or_else(|| self.entries.get(FALLBACK_KEY))
            .copied()
            .unwrap_or_else(unlimited)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|k| *k != FALLBACK_KEY)
    }
}

fn unlimited() -> DefaultLimits {
    DefaultLimits {
        max_requests_per_1_minute: Some(UNLIMITED),
        max_tokens_per_1_minute: Some(UNLIMITED),
        max_images_per_1_minute: Some(UNLIMITED),
        max_audio_megabytes_per_1_minute: Some(UNLIMITED),
        max_requests_per_1_day: Some(UNLIMITED),
        batch_1_day_max_input_tokens: Some(UNLIMITED),
    }
}
