// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// PyO3 bindings for the prompt vault

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::client::{ClientConfig, OpenAiClient};
use crate::vault::{VaultConfig, VaultError, VaultSession};

fn to_py_err(e: VaultError) -> PyErr {
    match e {
        VaultError::InvalidPattern { .. } | VaultError::Config { .. } => {
            PyValueError::new_err(e.to_string())
        }
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

/// Vault session exposed to Python
///
/// # Example (Python)
/// ```python
/// from prompt_vault import PromptVaultRust
///
/// vault = PromptVaultRust({"local_base_url": "http://localhost:8080/v1"})
/// masked = vault.encrypt("DB at 10.50.22.19, project 'Titan-DB'")
/// print(masked)  # "DB at <IP_3f9a01c2>, project '<SECRET_77d0e1aa>'"
///
/// print(vault.decrypt(masked))  # original text
/// ```
#[pyclass]
pub struct PromptVaultRust {
    session: VaultSession,
}

#[pymethods]
impl PromptVaultRust {
    /// Create a new vault session
    ///
    /// # Configuration Keys
    /// * `detect_ip_address`, `detect_email`, `detect_api_keys`, `detect_aws_keys` (bool)
    /// * `custom_patterns` (list[dict]): `pattern`, `description`, `enabled`
    /// * `extra_denylist` (list[str]): additional words never masked
    /// * `allowlist_patterns` (list[str]): regexes exempt from masking
    /// * `semantic_enabled` (bool), `semantic_model` (str)
    /// * `local_base_url` (str): OpenAI-compatible endpoint for semantic scans;
    ///   when absent only pattern rules run
    #[new]
    pub fn new(config_dict: &Bound<'_, PyDict>) -> PyResult<Self> {
        let config = VaultConfig::from_py_dict(config_dict)?;

        let base_url: Option<String> = match config_dict.get_item("local_base_url")? {
            Some(value) => Some(value.extract()?),
            None => None,
        };

        let session = match base_url {
            Some(url) if config.semantic.enabled => {
                let client_config = ClientConfig::local()
                    .with_base_url(url)
                    .with_model(config.semantic.model.clone());
                let client = OpenAiClient::new(client_config)
                    .map_err(|e| PyValueError::new_err(e.to_string()))?;
                VaultSession::with_semantic(config, Box::new(client))
            }
            _ => VaultSession::new(config),
        }
        .map_err(to_py_err)?;

        Ok(Self { session })
    }

    /// Mask secrets in `text`; returns the text unchanged when nothing is found
    pub fn encrypt(&mut self, py: Python<'_>, text: &str) -> PyResult<String> {
        let session = &mut self.session;
        py.detach(|| session.encrypt(text))
            .map(|outcome| outcome.text)
            .map_err(to_py_err)
    }

    /// Restore aliases minted by this session
    pub fn decrypt(&self, text: &str) -> String {
        self.session.decrypt(text)
    }

    /// Detected values grouped by label, without masking
    pub fn detect(&self, py: Python<'_>, text: &str) -> PyResult<Py<PyAny>> {
        let session = &self.session;
        let detection = py.detach(|| session.detect(text));
        let py_dict = PyDict::new(py);

        for finding in &detection.findings {
            let key = finding.label.as_str();
            match py_dict.get_item(key)? {
                Some(existing) => {
                    existing.downcast::<PyList>()?.append(finding.value.as_str())?;
                }
                None => {
                    let py_list = PyList::empty(py);
                    py_list.append(finding.value.as_str())?;
                    py_dict.set_item(key, py_list)?;
                }
            }
        }

        Ok(py_dict.into_any().unbind())
    }

    /// Number of aliases minted so far
    pub fn registry_size(&self) -> usize {
        self.session.registry().len()
    }
}
