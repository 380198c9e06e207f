// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Per-session vault: detection, masking and restoring over one registry

use super::config::VaultConfig;
use super::error::Result;
use super::finding::Finding;
use super::patterns::{compile_patterns, detect_patterns, CompiledPatterns};
use super::registry::AliasRegistry;
use super::rewriter::{mask_text, merge_findings, restore_text, CandidateFilter, Replacement};
use super::semantic::{SemanticMatcher, SemanticOutcome};
use crate::client::ReasoningClient;

/// Merged, filtered findings for one text
#[derive(Debug, Clone)]
pub struct Detection {
    pub findings: Vec<Finding>,
    pub semantic: SemanticOutcome,
}

/// Result of `VaultSession::encrypt`
#[derive(Debug, Clone)]
pub struct MaskOutcome {
    pub text: String,
    pub replaced: Vec<Replacement>,
    pub semantic: SemanticOutcome,
}

impl MaskOutcome {
    /// True when nothing was masked and `text` equals the input
    pub fn is_unchanged(&self) -> bool {
        self.replaced.is_empty()
    }
}

/// One trust-boundary session
///
/// Owns the only copy of its alias mapping. Sessions never share
/// registries; dropping the session discards the mapping.
pub struct VaultSession {
    config: VaultConfig,
    patterns: CompiledPatterns,
    filter: CandidateFilter,
    semantic: Option<SemanticMatcher>,
    registry: AliasRegistry,
}

impl VaultSession {
    /// Session with pattern rules only
    pub fn new(config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let patterns = compile_patterns(&config)?;
        let filter = CandidateFilter::from_config(&config);
        let registry = AliasRegistry::new(config.alias_suffix_len)?;
        Ok(Self {
            config,
            patterns,
            filter,
            semantic: None,
            registry,
        })
    }

    /// Session with pattern rules plus a semantic detection client
    ///
    /// The client is ignored when `config.semantic.enabled` is false.
    pub fn with_semantic(config: VaultConfig, client: Box<dyn ReasoningClient>) -> Result<Self> {
        let mut session = Self::new(config)?;
        if session.config.semantic.enabled {
            session.semantic = Some(SemanticMatcher::new(client, session.config.semantic.clone()));
        }
        Ok(session)
    }

    /// Replace the registry, e.g. with one using a scripted suffix source
    pub fn with_registry(mut self, registry: AliasRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn registry(&self) -> &AliasRegistry {
        &self.registry
    }

    /// Run both detection layers, merge and filter
    pub fn detect(&self, text: &str) -> Detection {
        let pattern = detect_patterns(text, &self.patterns);
        let semantic = match &self.semantic {
            Some(matcher) => matcher.scan(text),
            None => SemanticOutcome::Disabled,
        };

        let merged = merge_findings(pattern, semantic.findings().to_vec());
        let findings = self.filter.apply(merged, &self.patterns);

        tracing::debug!(
            candidates = findings.len(),
            semantic_degraded = semantic.is_degraded(),
            "detection complete"
        );

        Detection { findings, semantic }
    }

    /// Mask every detected secret in `text`
    ///
    /// Either the whole pass completes or an error is returned and no masked
    /// text is produced.
    pub fn encrypt(&mut self, text: &str) -> Result<MaskOutcome> {
        let detection = self.detect(text);
        let masked = mask_text(text, &detection.findings, &mut self.registry)?;

        if !masked.replaced.is_empty() {
            let labels: Vec<&str> = masked.replaced.iter().map(|r| r.label.as_str()).collect();
            tracing::info!(
                masked = masked.replaced.len(),
                labels = ?labels,
                registry_size = self.registry.len(),
                "prompt masked"
            );
        }

        Ok(MaskOutcome {
            text: masked.text.into_owned(),
            replaced: masked.replaced,
            semantic: detection.semantic,
        })
    }

    /// Restore every alias this session minted
    pub fn decrypt(&self, text: &str) -> String {
        restore_text(text, &self.registry).into_owned()
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("rules", &self.patterns.patterns.len())
            .field("semantic", &self.semantic.is_some())
            .field("registry", &self.registry)
            .finish()
    }
}
