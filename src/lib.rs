// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Reversible secret masking for prompts sent to remote models
// Optional PyO3 bindings behind the `python` feature

// Allow non-local definitions for PyO3 macros
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audit;
pub mod bridge;
pub mod client;
pub mod vault;

#[cfg(feature = "python")]
pub mod python;

pub use bridge::{Bridge, TurnReport};
pub use client::{ChatRequest, ClientConfig, ClientError, OpenAiClient, ReasoningClient};
pub use vault::{MaskOutcome, SemanticOutcome, VaultConfig, VaultError, VaultSession};

/// Python module: prompt_vault
///
/// # Examples
///
/// ```python
/// from prompt_vault import PromptVaultRust
///
/// vault = PromptVaultRust({"detect_email": True})
/// masked = vault.encrypt("mail ops@corp.io")
/// print(masked)  # "mail <EMAIL_5be1c0d2>"
/// print(vault.decrypt(masked))  # "mail ops@corp.io"
/// ```
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn prompt_vault(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::prelude::*;

    m.add_class::<python::PromptVaultRust>()?;

    // Module metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add(
        "__doc__",
        "Reversible secret masking for prompts sent to remote models",
    )?;

    Ok(())
}
