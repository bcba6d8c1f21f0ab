//! Clients for the external text-analysis service.
//!
//! The extraction step only needs "send a prompt, get text back", so every
//! provider sits behind [`LlmClient`]. Prompting and response healing live in
//! `crate::suggestion`.
//!
//! # Configuration
//!
//! - CLI arguments: `--llm-provider`, `--llm-model`, `--opencode-backend`
//! - Environment variables: `READINESS_LLM_PROVIDER`, `READINESS_LLM_MODEL`,
//!   `READINESS_OPENCODE_BACKEND`
//!
//! CLI arguments take precedence over environment variables.

use std::env;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use log::debug;

pub const PROVIDER_ENV: &str = "READINESS_LLM_PROVIDER";
pub const MODEL_ENV: &str = "READINESS_LLM_MODEL";
pub const OPENCODE_BACKEND_ENV: &str = "READINESS_OPENCODE_BACKEND";

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Claude CLI (default)
    #[default]
    Claude,
    /// OpenCode CLI
    OpenCode,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claude => write!(f, "claude"),
            Self::OpenCode => write!(f, "opencode"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "opencode" => Ok(Self::OpenCode),
            _ => Err(format!(
                "Unknown LLM provider: '{}'. Valid options: claude, opencode",
                s
            )),
        }
    }
}

/// Configuration for the extraction service client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: Option<String>,
    /// Backend provider for opencode (e.g., "lmstudio", "ollama").
    pub opencode_backend: Option<String>,
}

impl LlmConfig {
    /// Read provider, model and opencode backend from the environment.
    ///
    /// An unparseable provider falls back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = lookup(PROVIDER_ENV)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            provider,
            model: lookup(MODEL_ENV).filter(|s| !s.trim().is_empty()),
            opencode_backend: lookup(OPENCODE_BACKEND_ENV).filter(|s| !s.trim().is_empty()),
        }
    }

    /// Merge with CLI overrides. CLI values take precedence.
    pub fn with_overrides(
        mut self,
        provider: Option<LlmProvider>,
        model: Option<String>,
        opencode_backend: Option<String>,
    ) -> Self {
        if let Some(p) = provider {
            self.provider = p;
        }
        if let Some(m) = model {
            self.model = Some(m);
        }
        if let Some(b) = opencode_backend {
            self.opencode_backend = Some(b);
        }
        self
    }

    pub fn create_client(&self) -> Arc<dyn LlmClient> {
        match self.provider {
            LlmProvider::Claude => Arc::new(ClaudeCliClient {
                model: self.model.clone(),
            }),
            LlmProvider::OpenCode => Arc::new(OpenCodeClient {
                model: self.model.clone(),
                backend: self.opencode_backend.clone(),
            }),
        }
    }
}

/// Trait for LLM completion clients.
pub trait LlmClient: Send + Sync {
    /// Send a prompt and return the raw completion text.
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Runs `claude --print`, feeding the prompt on stdin.
#[derive(Debug, Default)]
pub struct ClaudeCliClient {
    pub model: Option<String>,
}

impl ClaudeCliClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LlmClient for ClaudeCliClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut args = vec!["--print".to_string()];
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        let mut child = Command::new("claude")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LlmError::ClientError(format!("Failed to run claude CLI: {}", e)))?;

        // Company documents can be long; stdin avoids argv length limits.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|e| LlmError::ClientError(format!("Failed to write to stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| LlmError::ClientError(format!("Failed to wait for claude CLI: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(LlmError::ClientError(format!(
                "claude CLI failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            debug!("Claude CLI stderr: {}", stderr.trim());
        }

        let response = String::from_utf8_lossy(&output.stdout).to_string();
        if response.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(response)
    }
}

/// Runs `opencode run <prompt> --format json` and joins the text events.
#[derive(Debug, Default)]
pub struct OpenCodeClient {
    pub model: Option<String>,
    /// Backend provider (e.g., "lmstudio", "ollama").
    pub backend: Option<String>,
}

impl OpenCodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model argument in opencode's "backend/model" form, if any.
    fn model_arg(&self) -> Option<String> {
        match (&self.backend, &self.model) {
            (Some(backend), Some(model)) if !model.contains('/') => {
                Some(format!("{}/{}", backend, model))
            }
            (_, Some(model)) => Some(model.clone()),
            // A backend alone is not a usable model path; let opencode pick.
            (_, None) => None,
        }
    }
}

impl LlmClient for OpenCodeClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut args = vec![
            "run".to_string(),
            prompt.to_string(),
            "--format".to_string(),
            "json".to_string(),
        ];
        if let Some(model) = self.model_arg() {
            args.push("-m".to_string());
            args.push(model);
        }

        let output = Command::new("opencode")
            .args(&args)
            .output()
            .map_err(|e| LlmError::ClientError(format!("Failed to run opencode CLI: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LlmError::ClientError(format!(
                "opencode CLI failed (exit {}): stderr={} stdout={}",
                output.status.code().unwrap_or(-1),
                stderr.trim(),
                stdout.trim()
            )));
        }

        let text = collect_opencode_text(&stdout);
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Each stdout line is a JSON event; keep the `part.text` of `"text"` events.
fn collect_opencode_text(stdout: &str) -> String {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter(|event| event.get("type").and_then(|v| v.as_str()) == Some("text"))
        .filter_map(|event| {
            event
                .get("part")
                .and_then(|p| p.get("text"))
                .and_then(|t| t.as_str())
                .map(str::to_string)
        })
        .collect()
}

/// Errors from the extraction service transport.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM client error: {0}")]
    ClientError(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
