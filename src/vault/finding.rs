// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Detected sensitive substrings

use serde::Serialize;

use super::config::SecretLabel;

/// Which detection layer produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    Pattern,
    Semantic,
}

/// A detected sensitive substring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub value: String,
    pub label: SecretLabel,
    pub source: FindingSource,
}

impl Finding {
    pub fn pattern(value: impl Into<String>, label: SecretLabel) -> Self {
        Self {
            value: value.into(),
            label,
            source: FindingSource::Pattern,
        }
    }

    pub fn semantic(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: SecretLabel::Secret,
            source: FindingSource::Semantic,
        }
    }

    /// Length in chars, used for filtering and ordering
    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }
}
