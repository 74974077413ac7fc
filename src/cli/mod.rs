use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::assemble::Strictness;
use crate::config::Config;
use crate::model::Stage;
use crate::pipeline::{SkipPolicy, StageOptions};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    #[value(name = "anthropic")]
    Anthropic,
}

impl ProviderKind {
    /// Environment variable holding this provider's credential.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "vibe_docgen",
    about = "Generate PRD, tech spec, action plan, milestone and go-to-market documents from a product idea",
    disable_version_flag = true
)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// TOML or YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, short = 'o', global = true)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub templates_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub product_name: Option<String>,

    /// Write every artifact of this run at version V instead of the next free one
    #[arg(long = "version", value_name = "V", global = true)]
    pub pin_version: Option<u32>,

    #[arg(long, global = true)]
    pub no_archive: bool,

    /// Abort a stage when any section completion is empty or malformed
    #[arg(long, global = true)]
    pub strict: bool,

    /// Refuse to skip a stage unless an existing document is supplied for it
    #[arg(long, global = true)]
    pub require_overrides: bool,

    /// Save every prompt and completion under <output>/.runs/<run-id>/
    #[arg(long, global = true)]
    pub save_prompts: bool,

    /// Use the offline client; no credential or network needed
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[arg(long, global = true)]
    pub no_progress: bool,

    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalArgs {
    /// Layer the command-line flags over `cfg`.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(p) = self.provider {
            cfg.provider = p;
        }
        if let Some(m) = &self.model {
            cfg.model = m.clone();
        }
        if let Some(t) = self.temperature {
            cfg.temperature = t;
        }
        if let Some(n) = self.max_tokens {
            cfg.max_tokens = n;
        }
        if let Some(s) = self.timeout_secs {
            cfg.timeout_secs = s;
        }
        if let Some(d) = &self.output_dir {
            cfg.output_dir = d.clone();
        }
        if let Some(d) = &self.templates_dir {
            cfg.templates_dir = Some(d.clone());
        }
        if let Some(n) = &self.product_name {
            cfg.product_name = Some(n.clone());
        }
        if self.no_archive {
            cfg.archive = false;
        }
        if self.strict {
            cfg.strictness = Strictness::Strict;
        }
        if self.require_overrides {
            cfg.skip_policy = SkipPolicy::RequireOverride;
        }
        if self.save_prompts {
            cfg.save_prompts = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline: PRD, tech spec, action plan, milestones, GTM
    Run(RunArgs),
    /// Generate a PRD from an idea (text or path to a file)
    Prd { idea: String },
    /// Generate a technical specification from a PRD
    Techspec {
        prd_file: PathBuf,
        #[arg(long)]
        idea_file: Option<PathBuf>,
    },
    /// Generate an action plan from a technical specification
    Actionplan {
        techspec_file: PathBuf,
        #[arg(long)]
        prd_file: Option<PathBuf>,
    },
    /// Generate milestone specifications from a technical specification
    Milestones {
        techspec_file: PathBuf,
        #[arg(long)]
        action_plan_file: Option<PathBuf>,
    },
    /// Generate a go-to-market plan from a PRD
    Gtm {
        prd_file: PathBuf,
        #[arg(long)]
        techspec_file: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Product idea text, or a path to a file holding it
    pub idea: String,

    #[arg(long)]
    pub skip_prd: bool,
    #[arg(long)]
    pub skip_spec: bool,
    #[arg(long)]
    pub skip_action_plan: bool,
    #[arg(long)]
    pub skip_milestones: bool,
    #[arg(long)]
    pub skip_gtm: bool,

    #[arg(long, value_name = "FILE")]
    pub existing_prd: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub existing_spec: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub existing_action_plan: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub existing_milestones: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub existing_gtm: Option<PathBuf>,
}

impl RunArgs {
    pub fn stage_options(&self, version: Option<u32>) -> StageOptions {
        let mut opts = StageOptions { version, ..StageOptions::default() };
        let flags = [
            (Stage::Prd, self.skip_prd, &self.existing_prd),
            (Stage::TechSpec, self.skip_spec, &self.existing_spec),
            (Stage::ActionPlan, self.skip_action_plan, &self.existing_action_plan),
            (Stage::Milestones, self.skip_milestones, &self.existing_milestones),
            (Stage::Gtm, self.skip_gtm, &self.existing_gtm),
        ];
        for (stage, skip, existing) in flags {
            if skip {
                opts.skip.insert(stage);
            }
            if let Some(path) = existing {
                opts.existing.insert(stage, path.clone());
            }
        }
        opts
    }
}
