// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Prompt vault - reversible secret masking
//
// Hybrid detection feeding a per-session alias registry:
// - RegexSet rules for addresses, emails and credential-shaped tokens
// - Best-effort semantic scan through a trusted local model
// - Span selection so overlapping values never corrupt the text

pub mod config;
pub mod error;
pub mod finding;
pub mod patterns;
pub mod registry;
pub mod rewriter;
pub mod semantic;
pub mod session;

pub use config::{SecretLabel, VaultConfig};
pub use error::{Result, VaultError};
pub use finding::{Finding, FindingSource};
pub use registry::AliasRegistry;
pub use semantic::SemanticOutcome;
pub use session::{MaskOutcome, VaultSession};
