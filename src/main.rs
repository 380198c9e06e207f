// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// prompt-vault: run one masked turn against a remote model

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use prompt_vault::audit::AuditLog;
use prompt_vault::{
    Bridge, ClientConfig, OpenAiClient, ReasoningClient, VaultConfig, VaultError, VaultSession,
};

/// Mask secrets locally, ask a remote model, restore its answer.
#[derive(Parser, Debug)]
#[command(name = "prompt-vault", version, about, long_about = None)]
struct Cli {
    /// File holding the prompt; reads stdin when omitted
    input: Option<PathBuf>,

    /// JSON vault configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// OpenAI-compatible endpoint used for semantic scans
    #[arg(long, env = "VAULT_LOCAL_URL", default_value = "http://localhost:8080/v1")]
    local_url: String,

    /// Skip the semantic scan and rely on pattern rules only
    #[arg(long)]
    no_semantic: bool,

    /// Remote endpoint override (defaults to the OpenAI API)
    #[arg(long, env = "VAULT_REMOTE_URL")]
    remote_url: Option<String>,

    #[arg(long, default_value = "gpt-4o")]
    remote_model: String,

    /// Replace the default instruction sent to the remote model
    #[arg(long)]
    instruction: Option<String>,

    /// Sampling temperature for the remote model
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Request timeout for both endpoints, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Append stage records to this file
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Print the masked prompt and stop before contacting the remote model
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("prompt_vault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: Option<&PathBuf>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<VaultConfig, VaultError> {
    match path {
        Some(path) => VaultConfig::from_json_str(&std::fs::read_to_string(path)?),
        None => Ok(VaultConfig::default()),
    }
}

fn with_timeout(config: ClientConfig, timeout_secs: Option<u64>) -> ClientConfig {
    match timeout_secs {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
    }
}

fn build_vault(cli: &Cli) -> Result<VaultSession, VaultError> {
    let mut config = load_config(cli.config.as_ref())?;
    if cli.no_semantic {
        config.semantic.enabled = false;
    }
    if !config.semantic.enabled {
        return VaultSession::new(config);
    }

    let local = with_timeout(
        ClientConfig::local()
            .with_base_url(cli.local_url.clone())
            .with_model(config.semantic.model.clone()),
        cli.timeout_secs,
    );
    tracing::info!(url = %local.base_url, "semantic scans via local endpoint");
    let client = OpenAiClient::new(local)?;
    VaultSession::with_semantic(config, Box::new(client))
}

fn build_remote(cli: &Cli) -> Result<Box<dyn ReasoningClient>, VaultError> {
    let mut remote = ClientConfig::openai(cli.api_key.clone(), cli.remote_model.clone());
    if let Some(url) = &cli.remote_url {
        remote = remote.with_base_url(url.clone());
    }
    Ok(Box::new(OpenAiClient::new(with_timeout(
        remote,
        cli.timeout_secs,
    ))?))
}

fn run(cli: &Cli) -> Result<(), VaultError> {
    let input = read_input(cli.input.as_ref())?;
    let mut vault = build_vault(cli)?;

    if cli.dry_run {
        let outcome = vault.encrypt(&input)?;
        if outcome.is_unchanged() {
            eprintln!("No secrets detected.");
        }
        println!("{}", outcome.text.trim());
        return Ok(());
    }

    let audit = match &cli.audit_log {
        Some(path) => AuditLog::open(path)?,
        None => AuditLog::disabled(),
    };

    let mut bridge =
        Bridge::new(vault, build_remote(cli)?, audit).with_temperature(cli.temperature);
    if let Some(instruction) = &cli.instruction {
        bridge = bridge.with_instruction(instruction.as_str());
    }
    let report = bridge.run_turn(&input)?;

    if report.secrets_masked == 0 {
        eprintln!("No secrets detected.");
    } else {
        eprintln!("MASKED PROMPT (sent to remote):\n{}\n", report.masked_prompt.trim());
    }
    if report.semantic.is_degraded() {
        eprintln!("warning: semantic scan unavailable, only pattern rules were applied");
    }

    println!("{}", report.restored);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "turn failed");
            eprintln!("prompt-vault: {e}");
            ExitCode::FAILURE
        }
    }
}
