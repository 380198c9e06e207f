// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Merge, filter and substitute findings in both directions
//
// Masking selects non-overlapping match spans longest-first before touching
// the text, so a value that is a substring of a longer one never fragments
// it, and inserted aliases are never rescanned.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::config::{SecretLabel, VaultConfig};
use super::error::Result;
use super::finding::{Finding, FindingSource};
use super::patterns::CompiledPatterns;
use super::registry::AliasRegistry;

/// Words a detector may flag that are never worth masking
pub const DENYLIST: &[&str] = &[
    "the", "and", "or", "not", "if", "else", "return", "error", "true", "false", "null", "none",
    "connect", "fail", "failed", "retry", "success", "ok", "yes", "no", "localhost", "password",
    "secret", "token",
];

/// Any `<TAG_hex>` token, minted by this registry or not
static ALIAS_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Z][A-Z0-9_]*_[0-9a-f]+>").expect("alias shape regex"));

pub fn is_alias_shaped(value: &str) -> bool {
    ALIAS_SHAPE
        .find(value)
        .map(|m| m.start() == 0 && m.end() == value.len())
        .unwrap_or(false)
}

/// Union both layers, one entry per exact value
///
/// A pattern-layer label replaces the generic semantic label when both layers
/// report the same value. First-seen order is kept.
pub fn merge_findings(pattern: Vec<Finding>, semantic: Vec<Finding>) -> Vec<Finding> {
    let mut merged: Vec<Finding> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for finding in pattern.into_iter().chain(semantic) {
        match index.get(&finding.value) {
            Some(&i) => {
                let existing = &mut merged[i];
                if existing.label.is_generic() && !finding.label.is_generic() {
                    existing.label = finding.label;
                    existing.source = finding.source;
                }
            }
            None => {
                index.insert(finding.value.clone(), merged.len());
                merged.push(finding);
            }
        }
    }

    merged
}

/// Drops near-certain false positives
#[derive(Debug)]
pub struct CandidateFilter {
    denylist: HashSet<String>,
    min_pattern_length: usize,
    min_semantic_length: usize,
}

impl CandidateFilter {
    pub fn from_config(config: &VaultConfig) -> Self {
        let denylist = DENYLIST
            .iter()
            .map(|w| w.to_string())
            .chain(config.extra_denylist.iter().map(|w| w.to_lowercase()))
            .collect();

        Self {
            denylist,
            min_pattern_length: config.min_pattern_length,
            min_semantic_length: config.semantic.min_length,
        }
    }

    pub fn accepts(&self, finding: &Finding, patterns: &CompiledPatterns) -> bool {
        let min_length = match finding.source {
            FindingSource::Pattern => self.min_pattern_length,
            FindingSource::Semantic => self.min_semantic_length,
        };
        if finding.char_len() < min_length {
            return false;
        }
        if self.denylist.contains(&finding.value.to_lowercase()) {
            return false;
        }
        if is_alias_shaped(&finding.value) {
            return false;
        }
        !patterns.is_allowlisted(&finding.value)
    }

    pub fn apply(&self, findings: Vec<Finding>, patterns: &CompiledPatterns) -> Vec<Finding> {
        findings
            .into_iter()
            .filter(|f| self.accepts(f, patterns))
            .collect()
    }
}

/// Longest value first; ties broken by value for a stable order
pub fn order_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.char_len()
            .cmp(&a.char_len())
            .then_with(|| a.value.cmp(&b.value))
    });
}

/// One alias inserted by a masking pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub label: SecretLabel,
    pub alias: String,
    pub occurrences: usize,
}

/// Output of a masking pass
#[derive(Debug)]
pub struct Masked<'a> {
    pub text: Cow<'a, str>,
    pub replaced: Vec<Replacement>,
}

/// Replace every occurrence of every candidate with its alias
///
/// Spans are claimed longest candidate first; an occurrence overlapping an
/// already-claimed span is left alone. Aliases are only minted for
/// candidates that claimed at least one span. Matching is literal and
/// case-sensitive. With nothing claimed the input is returned borrowed.
pub fn mask_text<'a>(
    text: &'a str,
    candidates: &[Finding],
    registry: &mut AliasRegistry,
) -> Result<Masked<'a>> {
    let mut ordered = candidates.to_vec();
    order_findings(&mut ordered);

    // start -> (end, candidate index)
    let mut spans: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    let mut counts = vec![0usize; ordered.len()];

    for (idx, candidate) in ordered.iter().enumerate() {
        if candidate.value.is_empty() {
            continue;
        }
        for (start, matched) in text.match_indices(candidate.value.as_str()) {
            let end = start + matched.len();
            let overlaps = spans
                .range(..end)
                .next_back()
                .map(|(_, &(prev_end, _))| prev_end > start)
                .unwrap_or(false);
            if !overlaps {
                spans.insert(start, (end, idx));
                counts[idx] += 1;
            }
        }
    }

    if spans.is_empty() {
        return Ok(Masked {
            text: Cow::Borrowed(text),
            replaced: Vec::new(),
        });
    }

    let mut aliases: Vec<Option<String>> = vec![None; ordered.len()];
    let mut replaced = Vec::new();
    for (idx, candidate) in ordered.iter().enumerate() {
        if counts[idx] == 0 {
            continue;
        }
        let alias = registry.alias_for(&candidate.value, candidate.label)?;
        replaced.push(Replacement {
            label: registry
                .label_of(&candidate.value)
                .unwrap_or(candidate.label),
            alias: alias.clone(),
            occurrences: counts[idx],
        });
        aliases[idx] = Some(alias);
    }

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for (&start, &(end, idx)) in &spans {
        output.push_str(&text[cursor..start]);
        if let Some(alias) = &aliases[idx] {
            output.push_str(alias);
        }
        cursor = end;
    }
    output.push_str(&text[cursor..]);

    Ok(Masked {
        text: Cow::Owned(output),
        replaced,
    })
}

/// Swap every known alias back to its real value
///
/// Alias-shaped tokens the registry never minted are left verbatim.
pub fn restore_text<'a>(text: &'a str, registry: &AliasRegistry) -> Cow<'a, str> {
    if registry.is_empty() {
        return Cow::Borrowed(text);
    }
    ALIAS_SHAPE.replace_all(text, |caps: &Captures| {
        let token = &caps[0];
        registry.resolve(token).unwrap_or(token).to_string()
    })
}
