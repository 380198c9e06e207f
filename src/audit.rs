// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Append-only audit trail of bridge turns

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};

/// Pipeline stage recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStage {
    RawInput,
    MaskedPrompt,
    NoSecrets,
    RemoteResponse,
    RestoredOutput,
    RemoteError,
}

impl AuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStage::RawInput => "RAW_INPUT",
            AuditStage::MaskedPrompt => "MASKED_PROMPT",
            AuditStage::NoSecrets => "NO_SECRETS",
            AuditStage::RemoteResponse => "REMOTE_RESPONSE",
            AuditStage::RestoredOutput => "RESTORED_OUTPUT",
            AuditStage::RemoteError => "REMOTE_ERROR",
        }
    }
}

/// One line per stage; the alias mapping itself is never written
#[derive(Debug)]
pub struct AuditLog {
    file: Option<File>,
}

impl AuditLog {
    /// Open (or create) `path` for appending
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Some(file) })
    }

    /// Sink that drops every record
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn record(&mut self, stage: AuditStage, text: &str) -> std::io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let line = format_record(
            &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            stage,
            text,
        );
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

fn format_record(timestamp: &str, stage: AuditStage, text: &str) -> String {
    let escaped = text.trim().replace('\r', "\\r").replace('\n', "\\n");
    format!("{} [{}] {}\n", timestamp, stage.as_str(), escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record_single_line() {
        let line = format_record("2025-01-01T00:00:00.000Z", AuditStage::RawInput, "a\nb\n");
        assert_eq!(line, "2025-01-01T00:00:00.000Z [RAW_INPUT] a\\nb\n");
    }

    #[test]
    fn test_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        let mut log = AuditLog::open(&path).unwrap();
        log.record(AuditStage::RawInput, "first").unwrap();
        drop(log);

        let mut log = AuditLog::open(&path).unwrap();
        log.record(AuditStage::NoSecrets, "second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[RAW_INPUT] first"));
        assert!(lines[1].ends_with("[NO_SECRETS] second"));
    }

    #[test]
    fn test_disabled_is_noop() {
        let mut log = AuditLog::disabled();
        assert!(!log.is_enabled());
        log.record(AuditStage::RawInput, "ignored").unwrap();
    }
}
