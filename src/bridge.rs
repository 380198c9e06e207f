// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// One masked round trip to a remote reasoning service

use crate::audit::{AuditLog, AuditStage};
use crate::client::{ChatRequest, ReasoningClient};
use crate::vault::{Result, SemanticOutcome, VaultSession};

/// Default instruction for the remote model
pub const DEVELOPER_INSTRUCTION: &str = "You are a Senior Developer.
You will receive code with placeholders like <SECRET_x>.
Write working code using those EXACT placeholders.
Do not ask for the real values.";

/// What happened during one turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Text actually sent across the trust boundary
    pub masked_prompt: String,
    pub secrets_masked: usize,
    pub semantic: SemanticOutcome,
    /// Raw remote reply, still holding aliases
    pub remote_output: String,
    pub restored: String,
}

/// Masks a prompt, asks the remote model, restores the reply
pub struct Bridge {
    vault: VaultSession,
    remote: Box<dyn ReasoningClient>,
    audit: AuditLog,
    instruction: String,
    temperature: f32,
}

impl Bridge {
    pub fn new(vault: VaultSession, remote: Box<dyn ReasoningClient>, audit: AuditLog) -> Self {
        Self {
            vault,
            remote,
            audit,
            instruction: DEVELOPER_INSTRUCTION.to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn vault(&self) -> &VaultSession {
        &self.vault
    }

    /// Run one turn
    ///
    /// A remote failure abandons the turn and is returned to the caller; the
    /// vault session and its mapping are unaffected. No retries.
    pub fn run_turn(&mut self, input: &str) -> Result<TurnReport> {
        self.audit.record(AuditStage::RawInput, input)?;

        let masked = self.vault.encrypt(input)?;
        if masked.is_unchanged() {
            tracing::info!("no secrets detected, prompt sent unchanged");
            self.audit.record(AuditStage::NoSecrets, "no secrets detected")?;
        } else {
            self.audit.record(AuditStage::MaskedPrompt, &masked.text)?;
        }

        let request =
            ChatRequest::new(self.instruction.as_str(), masked.text.as_str()).temperature(self.temperature);
        let remote_output = match self.remote.complete(&request) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "remote reasoning failed, turn abandoned");
                self.audit.record(AuditStage::RemoteError, &e.to_string())?;
                return Err(e.into());
            }
        };
        self.audit.record(AuditStage::RemoteResponse, &remote_output)?;

        let restored = self.vault.decrypt(&remote_output);
        self.audit.record(AuditStage::RestoredOutput, &restored)?;

        Ok(TurnReport {
            secrets_masked: masked.replaced.len(),
            masked_prompt: masked.text,
            semantic: masked.semantic,
            remote_output,
            restored,
        })
    }
}
