use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::assemble::Strictness;
use crate::cli::ProviderKind;
use crate::errors::PipelineError;
use crate::pipeline::SkipPolicy;
use crate::provider::retry::RetryPolicy;
use crate::provider::CompletionParams;

/// Run configuration. Built from defaults, an optional config file, then CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    pub archive: bool,
    pub templates_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub strictness: Strictness,
    pub skip_policy: SkipPolicy,
    pub save_prompts: bool,
    /// Overrides the name derived from the idea's first line.
    pub product_name: Option<String>,
    pub openai_api_base: String,
    pub anthropic_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: "gpt-4".into(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout_secs: 300,
            output_dir: "output".into(),
            archive: true,
            templates_dir: None,
            retry: RetryPolicy::default(),
            strictness: Strictness::Lenient,
            skip_policy: SkipPolicy::Degrade,
            save_prompts: false,
            product_name: None,
            openai_api_base: "https://api.openai.com".into(),
            anthropic_api_base: "https://api.anthropic.com".into(),
        }
    }
}

impl Config {
    /// Load a config file: YAML for `.yaml`/`.yml`, TOML otherwise. Absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|e| PipelineError::Config(e.to_string()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        } else {
            toml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    pub fn completion_params(&self) -> CompletionParams {
        CompletionParams { model: self.model.clone(), temperature: self.temperature, max_tokens: self.max_tokens }
    }

    /// The provider credential from the process environment.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(self.provider.api_key_var()).ok().filter(|k| !k.trim().is_empty())
    }
}
