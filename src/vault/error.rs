// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Error types for the prompt vault

use crate::client::ClientError;

/// Errors surfaced by vault sessions and the bridge
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A detection or allowlist regex failed to compile
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Every drawn alias suffix was already taken by another value
    #[error("alias collision for label {label} after {attempts} attempts")]
    AliasCollision { label: String, attempts: usize },

    #[error("config error: {reason}")]
    Config { reason: String },

    /// The reasoning service failed on a required (non best-effort) call
    #[error("reasoning service error: {0}")]
    Client(#[from] ClientError),

    /// Reading input or writing the audit log failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;
