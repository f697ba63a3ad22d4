//! Keyword profile loading.
//!
//! A profile is a JSON document mapping spoken keywords (or multi-word
//! phrases) to keymap arrays:
//!
//! ```json
//! { "keywords": [ { "keyword": "jump", "keymap": ["pressXUSB_GAMEPAD_A", 0.1, "releaseXUSB_GAMEPAD_A"] } ] }
//! ```
//!
//! An optional synonyms document widens the vocabulary without editing the
//! profile: each synonym word inherits the keymap of its base keyword,
//! never overriding a mapping that already exists.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::keymap::{Token, tokens_from_array};

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    keywords: Vec<KeywordEntry>,
}

#[derive(Debug, Deserialize)]
struct KeywordEntry {
    keyword: Option<String>,
    keymap: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SynonymsFile {
    #[serde(default)]
    synonyms: Vec<SynonymEntry>,
}

#[derive(Debug, Deserialize)]
struct SynonymEntry {
    keyword_match: String,
    #[serde(default)]
    synonym_words: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Profile {
    pub mappings: HashMap<String, Vec<Token>>,
}

impl Profile {
    /// Loads a profile, expanding synonyms when a synonyms file is given.
    /// A missing synonyms file is skipped silently; a missing profile is an
    /// error.
    pub fn load(path: &Path, synonyms: Option<&Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("reading profile {}", path.display()))?;
        let file: ProfileFile = serde_json::from_str(&raw)
            .context(format!("parsing profile {}", path.display()))?;

        let mut mappings = HashMap::new();
        for entry in file.keywords {
            let (Some(keyword), Some(Value::Array(values))) = (entry.keyword, entry.keymap) else {
                warn!("skipping profile entry without keyword or keymap array");
                continue;
            };
            mappings.insert(keyword.trim().to_lowercase(), tokens_from_array(&values));
        }

        if let Some(path) = synonyms {
            if path.exists() {
                apply_synonyms(&mut mappings, path)?;
            }
        }

        info!("loaded {} keyword mappings", mappings.len());
        Ok(Self { mappings })
    }
}

fn apply_synonyms(mappings: &mut HashMap<String, Vec<Token>>, path: &Path) -> Result<()> {
    let raw =
        std::fs::read_to_string(path).context(format!("reading synonyms {}", path.display()))?;
    let file: SynonymsFile = serde_json::from_str(&raw)
        .context(format!("parsing synonyms {}", path.display()))?;

    for entry in file.synonyms {
        let base = entry.keyword_match.trim().to_lowercase();
        let Some(base_keymap) = mappings.get(&base).cloned() else {
            continue;
        };
        for synonym in entry.synonym_words {
            let synonym = synonym.trim().to_lowercase();
            mappings.entry(synonym).or_insert_with(|| base_keymap.clone());
        }
    }
    Ok(())
}
