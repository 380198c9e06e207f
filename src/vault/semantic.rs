// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Model-driven detection of free-form confidential strings

use std::collections::HashSet;

use serde_json::Value;

use super::config::SemanticConfig;
use super::finding::Finding;
use crate::client::{ChatRequest, ReasoningClient};

/// Instruction sent with every scan
pub const DLP_INSTRUCTION: &str = r#"You are a Data Loss Prevention (DLP) system.
Analyze the user's text and extract ALL confidential information.

Categories to detect:
1. PII (Names, Emails, Phones)
2. Infrastructure (IP addresses, Hostnames, Internal URLs)
3. Secrets (API Keys, Tokens, Passwords, Hashes)
4. Internal Project Names (e.g. 'Project Obsidian', 'Falcon-9')

Output ONLY a JSON object with a single key "secrets" containing a list of strings.
Example: {"secrets": ["192.168.1.1", "sk-12345", "John Doe"]}"#;

/// Result of one semantic scan
///
/// `Found(vec![])` means the service answered and reported nothing;
/// `Degraded` means it could not be asked or its answer was unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Found(Vec<Finding>),
    Degraded { reason: String },
    Disabled,
}

impl SemanticOutcome {
    pub fn findings(&self) -> &[Finding] {
        match self {
            SemanticOutcome::Found(findings) => findings,
            _ => &[],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SemanticOutcome::Degraded { .. })
    }
}

/// Asks a trusted local service for confidential substrings
pub struct SemanticMatcher {
    client: Box<dyn ReasoningClient>,
    config: SemanticConfig,
}

impl SemanticMatcher {
    pub fn new(client: Box<dyn ReasoningClient>, config: SemanticConfig) -> Self {
        Self { client, config }
    }

    /// Scan `text`; failures degrade instead of propagating
    pub fn scan(&self, text: &str) -> SemanticOutcome {
        if text.trim().is_empty() {
            return SemanticOutcome::Found(Vec::new());
        }

        let request = ChatRequest::new(DLP_INSTRUCTION, text)
            .temperature(self.config.temperature)
            .json_object()
            .model(self.config.model.clone());

        let content = match self.client.complete(&request) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "semantic scan unavailable, continuing with pattern rules only");
                return SemanticOutcome::Degraded {
                    reason: e.to_string(),
                };
            }
        };

        match parse_secrets(&content, self.config.min_length) {
            Ok(findings) => {
                tracing::debug!(count = findings.len(), "semantic scan complete");
                SemanticOutcome::Found(findings)
            }
            Err(reason) => {
                tracing::warn!(%reason, "semantic scan returned an unusable response");
                SemanticOutcome::Degraded { reason }
            }
        }
    }
}

/// Parse `{"secrets": [...]}` into findings
///
/// Non-string entries and strings shorter than `min_length` chars are
/// dropped; the object itself and its `secrets` list are required.
pub fn parse_secrets(content: &str, min_length: usize) -> Result<Vec<Finding>, String> {
    let v: Value = serde_json::from_str(content.trim())
        .map_err(|e| format!("response is not valid JSON: {e}"))?;

    let list = v
        .get("secrets")
        .and_then(Value::as_array)
        .ok_or_else(|| "response has no `secrets` list".to_string())?;

    let mut seen = HashSet::new();
    let findings = list
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| s.chars().count() >= min_length)
        .filter(|s| seen.insert(*s))
        .map(Finding::semantic)
        .collect();

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::vault::config::SecretLabel;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, ()>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ReasoningClient for Canned {
        fn complete(&self, request: &ChatRequest) -> Result<String, ClientError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(|_| ClientError::Transport {
                reason: "connection refused".to_string(),
            })
        }
    }

    fn matcher(reply: Result<&str, ()>) -> SemanticMatcher {
        SemanticMatcher::new(
            Box::new(Canned {
                reply: reply.map(str::to_string),
                seen: Mutex::new(Vec::new()),
            }),
            SemanticConfig::default(),
        )
    }

    #[test]
    fn test_parse_secrets() {
        let findings =
            parse_secrets(r#"{"secrets": ["admin_corp", "Titan-DB", "ab", 42, "admin_corp"]}"#, 3)
                .unwrap();
        let values: Vec<_> = findings.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["admin_corp", "Titan-DB"]);
        assert!(findings.iter().all(|f| f.label == SecretLabel::Secret));
    }

    #[test]
    fn test_parse_secrets_malformed() {
        assert!(parse_secrets("not json", 3).is_err());
        assert!(parse_secrets(r#"{"found": []}"#, 3).is_err());
        assert!(parse_secrets(r#"{"secrets": "admin"}"#, 3).is_err());
    }

    #[test]
    fn test_parse_secrets_counts_chars() {
        // Three chars, more than three bytes
        let findings = parse_secrets(r#"{"secrets": ["Łód"]}"#, 3).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_scan_found() {
        let outcome = matcher(Ok(r#"{"secrets": ["Titan-DB"]}"#)).scan("project Titan-DB");
        assert_eq!(outcome.findings().len(), 1);
        assert!(!outcome.is_degraded());
    }

    #[test]
    fn test_scan_found_nothing_is_not_degraded() {
        let outcome = matcher(Ok(r#"{"secrets": []}"#)).scan("hello world");
        assert_eq!(outcome, SemanticOutcome::Found(vec![]));
    }

    #[test]
    fn test_scan_transport_error_degrades() {
        let outcome = matcher(Err(())).scan("project Titan-DB");
        assert!(outcome.is_degraded());
        assert!(outcome.findings().is_empty());
    }

    #[test]
    fn test_scan_bad_json_degrades() {
        let outcome = matcher(Ok("Sure! Here are the secrets: Titan-DB")).scan("project Titan-DB");
        assert!(outcome.is_degraded());
    }

    #[test]
    fn test_scan_request_shape() {
        let canned = Canned {
            reply: Ok(r#"{"secrets": []}"#.to_string()),
            seen: Mutex::new(Vec::new()),
        };
        let seen = std::sync::Arc::new(canned);

        struct Shared(std::sync::Arc<Canned>);
        impl ReasoningClient for Shared {
            fn complete(&self, request: &ChatRequest) -> Result<String, ClientError> {
                self.0.complete(request)
            }
        }

        let m = SemanticMatcher::new(Box::new(Shared(seen.clone())), SemanticConfig::default());
        m.scan("some text");

        let requests = seen.seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert!(requests[0].json_object);
        assert_eq!(requests[0].system, DLP_INSTRUCTION);
        assert_eq!(requests[0].user, "some text");
        assert_eq!(requests[0].model.as_deref(), Some("mistral"));
    }

    #[test]
    fn test_scan_skips_blank_input() {
        let outcome = matcher(Err(())).scan("   ");
        assert_eq!(outcome, SemanticOutcome::Found(vec![]));
    }
}
