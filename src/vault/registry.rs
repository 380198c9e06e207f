// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Bidirectional real value <-> alias mapping for one session

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use uuid::Uuid;

use super::config::SecretLabel;
use super::error::{Result, VaultError};

/// Attempts at drawing a free suffix before giving up
pub const MAX_MINT_ATTEMPTS: usize = 16;

/// Accepted alias suffix lengths
pub const SUFFIX_LEN_RANGE: RangeInclusive<usize> = 4..=32;

/// Produces candidate alias suffixes
pub type SuffixSource = Box<dyn FnMut() -> String + Send + Sync>;

struct Entry {
    alias: String,
    label: SecretLabel,
}

/// Owns both directions of the alias mapping
///
/// Entries are only ever added. An alias, once minted for a value, keeps
/// resolving to that value for the lifetime of the registry, and the label
/// recorded at first mint is the one embedded in the alias.
pub struct AliasRegistry {
    by_real: HashMap<String, Entry>,
    by_alias: HashMap<String, String>,
    suffix_len: usize,
    next_suffix: SuffixSource,
}

impl AliasRegistry {
    /// Registry drawing suffixes from random v4 UUIDs
    pub fn new(suffix_len: usize) -> Result<Self> {
        Self::with_suffix_source(suffix_len, Box::new(move || uuid_suffix(suffix_len)))
    }

    /// Registry with an explicit suffix generator
    ///
    /// Drawn suffixes that are not `suffix_len` lowercase hex digits are
    /// discarded, so every minted alias keeps the shape restore scans for.
    pub fn with_suffix_source(suffix_len: usize, next_suffix: SuffixSource) -> Result<Self> {
        if !SUFFIX_LEN_RANGE.contains(&suffix_len) {
            return Err(VaultError::Config {
                reason: format!(
                    "alias suffix length must be between {} and {}, got {}",
                    SUFFIX_LEN_RANGE.start(),
                    SUFFIX_LEN_RANGE.end(),
                    suffix_len
                ),
            });
        }
        Ok(Self {
            by_real: HashMap::new(),
            by_alias: HashMap::new(),
            suffix_len,
            next_suffix,
        })
    }

    /// Alias for `real`, minting one on first sight
    ///
    /// First mint wins: later calls return the same alias whatever `label`
    /// they pass.
    pub fn alias_for(&mut self, real: &str, label: SecretLabel) -> Result<String> {
        if let Some(entry) = self.by_real.get(real) {
            return Ok(entry.alias.clone());
        }

        let mut well_formed = 0;
        for _ in 0..MAX_MINT_ATTEMPTS {
            let suffix = (self.next_suffix)();
            if !self.is_valid_suffix(&suffix) {
                tracing::debug!(label = label.as_str(), "malformed alias suffix, redrawing");
                continue;
            }
            well_formed += 1;

            let alias = format_alias(label, &suffix);
            if self.by_alias.contains_key(&alias) {
                tracing::debug!(label = label.as_str(), "alias suffix collision, redrawing");
                continue;
            }

            self.by_alias.insert(alias.clone(), real.to_string());
            self.by_real.insert(
                real.to_string(),
                Entry {
                    alias: alias.clone(),
                    label,
                },
            );
            return Ok(alias);
        }

        if well_formed == 0 {
            return Err(VaultError::Config {
                reason: format!(
                    "suffix source produced no {}-digit lowercase hex suffix in {} draws",
                    self.suffix_len, MAX_MINT_ATTEMPTS
                ),
            });
        }
        Err(VaultError::AliasCollision {
            label: label.as_str().to_string(),
            attempts: MAX_MINT_ATTEMPTS,
        })
    }

    fn is_valid_suffix(&self, suffix: &str) -> bool {
        suffix.len() == self.suffix_len
            && suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Original value behind a minted alias, `None` for anything else
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.by_alias.get(alias).map(String::as_str)
    }

    /// Alias already assigned to `real`, without minting
    pub fn lookup(&self, real: &str) -> Option<&str> {
        self.by_real.get(real).map(|e| e.alias.as_str())
    }

    /// Label recorded when `real` was first minted
    pub fn label_of(&self, real: &str) -> Option<SecretLabel> {
        self.by_real.get(real).map(|e| e.label)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.by_alias.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

// Never print real values
impl fmt::Debug for AliasRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasRegistry")
            .field("entries", &self.by_alias.len())
            .field("suffix_len", &self.suffix_len)
            .finish()
    }
}

/// `<TAG_suffix>`
pub fn format_alias(label: SecretLabel, suffix: &str) -> String {
    format!("<{}_{}>", label.as_str(), suffix)
}

fn uuid_suffix(len: usize) -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(len);
    suffix
}
