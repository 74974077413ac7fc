use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assemble::{self, Assembled, SectionResult, Strictness};
use crate::config::Config;
use crate::context::{self, IdeaInput};
use crate::errors::{CompletionError, PipelineError, RunError, StageFailure};
use crate::log::Transcript;
use crate::model::{
    Document, DocumentKind, DocumentRecord, DocumentSection, DocumentSource, GenerationContext, GenerationSummary,
    Stage, Template,
};
use crate::output::lock::RunLock;
use crate::output::{VersionedWriter, WrittenDocument};
use crate::prompt::{self, PromptInput};
use crate::provider::retry::complete_with_retry;
use crate::provider::DynClient;
use crate::template::TemplateStore;

/// What a skipped stage without an existing-file override means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// The document is simply absent from later context.
    #[default]
    Degrade,
    /// Refuse to start the run.
    RequireOverride,
}

/// Per-run stage selection. An existing-file override implies skipping that stage.
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    pub version: Option<u32>,
    pub skip: BTreeSet<Stage>,
    pub existing: BTreeMap<Stage, PathBuf>,
}

impl StageOptions {
    pub fn skips(&self, stage: Stage) -> bool {
        self.skip.contains(&stage) || self.existing.contains_key(&stage)
    }
}

/// Observer hooks for progress display. Every method defaults to doing nothing.
pub trait Progress: Send + Sync {
    fn stage_started(&self, _stage: Stage, _sections: usize) {}
    fn section_started(&self, _stage: Stage, _index: usize, _name: &str) {}
    fn section_finished(&self, _stage: Stage, _index: usize, _name: &str, _ok: bool) {}
    fn stage_skipped(&self, _stage: Stage, _existing: Option<&Path>) {}
    fn stage_written(&self, _stage: Stage, _written: &WrittenDocument) {}
}

pub struct Silent;

impl Progress for Silent {}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: GenerationSummary,
    pub summary_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub written: WrittenDocument,
    pub validation: Option<WrittenDocument>,
}

struct StageOutput {
    text: String,
    written: WrittenDocument,
    validation: Vec<DocumentSection>,
}

/// Sequences the generation stages over one output directory.
pub struct Pipeline {
    config: Config,
    client: DynClient,
    templates: TemplateStore,
    writer: VersionedWriter,
    progress: Box<dyn Progress>,
    run_id: Uuid,
    transcript: Option<Transcript>,
}

impl Pipeline {
    pub fn new(config: Config, client: DynClient) -> Self {
        let run_id = Uuid::new_v4();
        let transcript = config.save_prompts.then(|| Transcript::new(&config.output_dir, run_id));
        Self {
            templates: TemplateStore::new(config.templates_dir.clone()),
            writer: VersionedWriter::fs(config.archive),
            progress: Box::new(Silent),
            client,
            run_id,
            transcript,
            config,
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_writer(mut self, writer: VersionedWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn transcript_dir(&self) -> Option<&Path> {
        self.transcript.as_ref().map(Transcript::dir)
    }

    /// Name used for `{{PRODUCT_NAME}}`.
    pub fn product_name(&self, idea: Option<&str>) -> String {
        match (&self.config.product_name, idea) {
            (Some(name), _) => name.clone(),
            (None, Some(idea)) => context::product_name(idea),
            (None, None) => "the product".to_string(),
        }
    }

    /// Run every stage in order, then write the generation summary.
    pub async fn run_full(&self, idea: &IdeaInput, opts: &StageOptions) -> Result<RunReport, RunError> {
        // ===== PREFLIGHT =====
        let mut templates: BTreeMap<Stage, Template> = BTreeMap::new();
        for stage in Stage::ALL {
            if opts.skips(stage) {
                if !opts.existing.contains_key(&stage) && self.config.skip_policy == SkipPolicy::RequireOverride {
                    return Err(StageFailure::new(
                        stage,
                        PipelineError::Input(format!("{stage} is skipped but no existing file was supplied")),
                    )
                    .into());
                }
                continue;
            }
            let template = self.templates.load_for(stage).map_err(|e| StageFailure::new(stage, e))?;
            templates.insert(stage, template);
        }

        let mut lock = RunLock::open(&self.config.output_dir).map_err(RunError::Run)?;
        let _held = lock.try_hold().map_err(RunError::Run)?;
        info!(run_id = %self.run_id, output = %self.config.output_dir.display(), "pipeline started");

        // ===== STAGES =====
        let mut ctx = GenerationContext::new(Some(idea.text.clone()), self.product_name(Some(&idea.text)));
        let mut files = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut validation: Vec<(Stage, DocumentSection)> = Vec::new();

        for stage in Stage::ALL {
            let kind = stage.document_kind();
            if let Some(path) = opts.existing.get(&stage) {
                let text = context::read_input(path).map_err(|e| StageFailure::new(stage, e))?;
                info!(%stage, path = %path.display(), "using existing document");
                self.progress.stage_skipped(stage, Some(path));
                files.insert(
                    kind,
                    DocumentRecord {
                        path: path.clone(),
                        version: None,
                        source: DocumentSource::Existing,
                        bytes: text.len() as u64,
                    },
                );
                ctx.add_document(kind, text);
                skipped.push(stage);
                continue;
            }
            let Some(template) = templates.get(&stage) else {
                warn!(%stage, "stage skipped without an existing document; later stages get degraded context");
                self.progress.stage_skipped(stage, None);
                skipped.push(stage);
                continue;
            };

            let out = self.run_one(stage, template, &ctx, opts.version).await?;
            files.insert(kind, record(&out.written));
            validation.extend(out.validation.into_iter().map(|s| (stage, s)));
            ctx.add_document(kind, out.text);
        }

        // ===== FINALIZE =====
        if let Some(written) = self.write_validation(validation, opts.version).map_err(RunError::Run)? {
            files.insert(DocumentKind::Validation, record(&written));
        }

        let summary = GenerationSummary {
            run_id: self.run_id,
            timestamp: Utc::now(),
            input: idea.reference(),
            output_directory: self.config.output_dir.clone(),
            generated_files: files,
            skipped,
        };
        let written = self
            .writer
            .write_summary(&summary, &self.config.output_dir, opts.version)
            .map_err(|e| RunError::Run(e.into()))?;
        info!(path = %written.path.display(), "pipeline complete");
        Ok(RunReport { summary, summary_path: written.path })
    }

    /// Run a single stage against a caller-built context (the per-stage subcommands).
    pub async fn run_stage(
        &self,
        stage: Stage,
        ctx: &GenerationContext,
        version: Option<u32>,
    ) -> Result<StageReport, RunError> {
        let template = self.templates.load_for(stage).map_err(|e| StageFailure::new(stage, e))?;
        let mut lock = RunLock::open(&self.config.output_dir).map_err(RunError::Run)?;
        let _held = lock.try_hold().map_err(RunError::Run)?;

        let out = self.run_one(stage, &template, ctx, version).await?;
        let validation = out.validation.into_iter().map(|s| (stage, s)).collect();
        let validation = self.write_validation(validation, version).map_err(RunError::Run)?;
        Ok(StageReport { stage, written: out.written, validation })
    }

    async fn run_one(
        &self,
        stage: Stage,
        template: &Template,
        ctx: &GenerationContext,
        version: Option<u32>,
    ) -> Result<StageOutput, StageFailure> {
        info!(%stage, template = %template.name, sections = template.sections.len(), "{}", stage.label());
        self.progress.stage_started(stage, template.sections.len());

        let assembled = self.generate(stage, template, ctx).await?;
        let text = assembled.document.render();
        let written = self
            .writer
            .write(&assembled.document, &self.config.output_dir, version)
            .map_err(|e| StageFailure::new(stage, e))?;
        self.progress.stage_written(stage, &written);
        Ok(StageOutput { text, written, validation: assembled.validation })
    }

    /// One completion per section, strictly in template order.
    async fn generate(
        &self,
        stage: Stage,
        template: &Template,
        ctx: &GenerationContext,
    ) -> Result<Assembled, StageFailure> {
        let params = self.config.completion_params();
        let mut results = Vec::with_capacity(template.sections.len());
        let mut prior: Vec<(String, String)> = Vec::new();

        for (index, section) in template.sections.iter().enumerate() {
            let prompt = prompt::build(section, &PromptInput { stage, context: ctx, prior_sections: &prior });
            self.progress.section_started(stage, index, &section.name);

            let outcome = complete_with_retry(self.client.as_ref(), &prompt, &params, &self.config.retry).await;
            self.progress.section_finished(stage, index, &section.name, outcome.is_ok());
            if let Some(transcript) = &self.transcript {
                let response = outcome.as_deref().map_err(|e| e.to_string());
                let saved = transcript
                    .save_section(stage, index, &section.name, &prompt, response)
                    .map_err(|e| StageFailure::new(stage, e).in_section(&section.name))?;
                debug!(prompt = %saved.prompt.display(), response = %saved.response.display(), "saved transcript");
            }

            match outcome {
                Ok(text) => {
                    prior.push((section.name.clone(), text.clone()));
                    results.push(SectionResult::generated(&section.name, text));
                }
                Err(err @ CompletionError::InvalidResponse(_)) => {
                    if self.config.strictness == Strictness::Strict {
                        return Err(StageFailure::new(stage, err).in_section(&section.name));
                    }
                    warn!(%stage, section = %section.name, error = %err, "section left as placeholder");
                    results.push(SectionResult::failed(&section.name, err));
                }
                Err(err) => return Err(StageFailure::new(stage, err).in_section(&section.name)),
            }
        }

        assemble::assemble(stage.document_kind(), template, results, self.config.strictness)
            .map_err(|f| StageFailure::new(stage, f.error).in_section(f.section))
    }

    fn write_validation(
        &self,
        sections: Vec<(Stage, DocumentSection)>,
        version: Option<u32>,
    ) -> Result<Option<WrittenDocument>, PipelineError> {
        if sections.is_empty() {
            return Ok(None);
        }
        let document = Document {
            kind: DocumentKind::Validation,
            sections: sections
                .into_iter()
                .map(|(stage, s)| DocumentSection { name: format!("{stage}: {}", s.name), body: s.body })
                .collect(),
            render_headings: true,
        };
        Ok(Some(self.writer.write(&document, &self.config.output_dir, version)?))
    }
}

fn record(written: &WrittenDocument) -> DocumentRecord {
    DocumentRecord {
        path: written.path.clone(),
        version: Some(written.version),
        source: DocumentSource::Generated,
        bytes: written.bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::IdeaSource;
    use crate::errors::ErrorKind;
    use crate::provider::fake::FakeClient;
    use crate::provider::retry::RetryPolicy;
    use std::sync::Arc;
    use tempfile::TempDir;

    const PRD_TITLE: &str = "# Product Requirements Document (PRD)";

    fn config(dir: &Path) -> Config {
        Config {
            output_dir: dir.to_path_buf(),
            retry: RetryPolicy { max_attempts: 2, initial_backoff_ms: 0, max_backoff_ms: 0 },
            ..Config::default()
        }
    }

    fn idea() -> IdeaInput {
        IdeaInput { text: "Build a grocery app".into(), source: IdeaSource::Inline }
    }

    fn only(stages: &[Stage]) -> StageOptions {
        StageOptions {
            skip: Stage::ALL.into_iter().filter(|s| !stages.contains(s)).collect(),
            ..StageOptions::default()
        }
    }

    fn section_count(stage: Stage) -> usize {
        TemplateStore::default().load_for(stage).unwrap().sections.len()
    }

    #[tokio::test]
    async fn tech_spec_prompts_embed_the_generated_prd() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new());
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());
        pipeline.run_full(&idea(), &only(&[Stage::Prd, Stage::TechSpec])).await.unwrap();

        let prd = std::fs::read_to_string(dir.path().join("prd_v1.md")).unwrap();
        let calls = fake.calls();
        let prd_sections = section_count(Stage::Prd);
        assert_eq!(calls.len(), prd_sections + section_count(Stage::TechSpec));
        for call in &calls[prd_sections..] {
            assert!(call.user.contains(prd.trim()), "tech spec prompt lacks PRD content");
        }
        assert!(calls[..prd_sections].iter().all(|c| c.user.contains("Build a grocery app")));
    }

    #[tokio::test]
    async fn skipped_stage_with_override_makes_no_calls_and_feeds_context() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("my_prd.md");
        std::fs::write(&existing, "## Product Overview\n\nEXISTING PRD BODY\n").unwrap();

        let fake = Arc::new(FakeClient::new());
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());
        let mut opts = only(&[Stage::TechSpec]);
        opts.existing.insert(Stage::Prd, existing.clone());
        let report = pipeline.run_full(&idea(), &opts).await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), section_count(Stage::TechSpec));
        assert!(calls.iter().all(|c| c.user.contains("EXISTING PRD BODY")));
        assert!(!dir.path().join("prd_v1.md").exists());

        let prd = &report.summary.generated_files[&DocumentKind::Prd];
        assert_eq!(prd.source, DocumentSource::Existing);
        assert_eq!(prd.path, existing);
        assert!(report.summary.skipped.contains(&Stage::Prd));
    }

    #[tokio::test]
    async fn fatal_failure_halts_and_keeps_earlier_documents() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new().on(PRD_TITLE, Err(CompletionError::Auth("401 bad key".into()))));
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());

        let err = pipeline.run_full(&idea(), &StageOptions::default()).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::TechSpec));
        assert_eq!(err.kind(), ErrorKind::AuthError);
        assert!(err.to_string().contains("Purpose & Scope"));

        let prd = std::fs::read_to_string(dir.path().join("prd_v1.md")).unwrap();
        assert!(prd.starts_with(PRD_TITLE));
        assert_eq!(fake.calls().len(), section_count(Stage::Prd) + 1);
        for stem in ["tech_spec_v1.md", "action_plan_v1.md", "generation_summary_v1.json"] {
            assert!(!dir.path().join(stem).exists(), "{stem} should not exist");
        }
    }

    #[tokio::test]
    async fn dropped_run_leaves_only_whole_documents_and_releases_the_lock() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new().hang_on("PRD Content:"));
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());

        let idea_input = idea();
        let opts = StageOptions::default();
        let run = pipeline.run_full(&idea_input, &opts);
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(500), run).await;
        assert!(outcome.is_err(), "run should still be waiting on the tech spec");
        assert_eq!(fake.calls().len(), section_count(Stage::Prd) + 1);

        let prd = std::fs::read_to_string(dir.path().join("prd_v1.md")).unwrap();
        assert!(prd.starts_with(PRD_TITLE));
        assert!(prd.contains(&format!("generated {}", section_count(Stage::Prd) - 1)));
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, [".vibe_docgen.lock", "prd_v1.md"]);

        let mut lock = RunLock::open(dir.path()).unwrap();
        assert!(lock.try_hold().is_ok());
    }

    #[tokio::test]
    async fn exhausted_service_retries_fail_the_stage() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new().on("Write the product overview", Err(CompletionError::Service("503".into()))));
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());
        let err = pipeline.run_full(&idea(), &StageOptions::default()).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Prd));
        assert_eq!(err.kind(), ErrorKind::ServiceError);
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn full_run_twice_produces_v1_then_v2() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new());
        let first = Pipeline::new(config(dir.path()), fake.clone());
        let report = first.run_full(&idea(), &StageOptions::default()).await.unwrap();
        assert_eq!(report.summary_path, dir.path().join("generation_summary_v1.json"));

        let stems = ["prd", "tech_spec", "action_plan", "milestone_specs", "gtm_plan", "validation_tracking"];
        let v1: Vec<Vec<u8>> = stems
            .iter()
            .map(|s| std::fs::read(dir.path().join(format!("{s}_v1.md"))).unwrap())
            .collect();

        let prd = String::from_utf8(v1[0].clone()).unwrap();
        let template = TemplateStore::default().load_for(Stage::Prd).unwrap();
        let positions: Vec<usize> = template
            .sections
            .iter()
            .filter(|s| !s.is_validation())
            .map(|s| prd.find(&format!("## {}\n", s.name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!prd.contains("## Technical Validation"));

        let second = Pipeline::new(config(dir.path()), fake.clone());
        second.run_full(&idea(), &StageOptions::default()).await.unwrap();
        for (stem, original) in stems.iter().zip(&v1) {
            assert!(dir.path().join(format!("{stem}_v2.md")).is_file(), "{stem}_v2.md missing");
            assert_eq!(&std::fs::read(dir.path().join(format!("{stem}_v1.md"))).unwrap(), original);
        }
        assert!(dir.path().join("generation_summary_v2.json").is_file());
        assert!(dir.path().join("archive").is_dir());
    }

    #[tokio::test]
    async fn require_override_policy_fails_before_any_call() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new());
        let cfg = Config { skip_policy: SkipPolicy::RequireOverride, ..config(dir.path()) };
        let pipeline = Pipeline::new(cfg, fake.clone());
        let mut opts = StageOptions::default();
        opts.skip.insert(Stage::Gtm);

        let err = pipeline.run_full(&idea(), &opts).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Gtm));
        assert_eq!(err.kind(), ErrorKind::InputError);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_override_file_fails_that_stage_only() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config(dir.path()), Arc::new(FakeClient::new()));
        let mut opts = only(&[Stage::Prd]);
        opts.existing.insert(Stage::TechSpec, dir.path().join("nope.md"));

        let err = pipeline.run_full(&idea(), &opts).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::TechSpec));
        assert_eq!(err.kind(), ErrorKind::InputError);
        assert!(dir.path().join("prd_v1.md").is_file());
    }

    #[tokio::test]
    async fn invalid_section_is_a_placeholder_unless_strict() {
        let dir = TempDir::new().unwrap();
        let empty = || Err(CompletionError::InvalidResponse("completion was empty".into()));

        let needle = "Define how success will be measured";
        let lenient = Pipeline::new(config(dir.path()), Arc::new(FakeClient::new().on(needle, empty())));
        lenient.run_full(&idea(), &only(&[Stage::Prd])).await.unwrap();
        let prd = std::fs::read_to_string(dir.path().join("prd_v1.md")).unwrap();
        assert!(prd.contains("## Success Metrics\n\n> **[generation failed:"));

        let cfg = Config { strictness: Strictness::Strict, ..config(dir.path()) };
        let strict = Pipeline::new(cfg, Arc::new(FakeClient::new().on(needle, empty())));
        let err = strict.run_full(&idea(), &only(&[Stage::Prd])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert!(!dir.path().join("prd_v2.md").exists());
    }

    #[tokio::test]
    async fn pinned_version_applies_to_every_artifact() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config(dir.path()), Arc::new(FakeClient::new()));
        let opts = StageOptions { version: Some(5), ..only(&[Stage::Prd]) };
        let report = pipeline.run_full(&idea(), &opts).await.unwrap();
        assert!(dir.path().join("prd_v5.md").is_file());
        assert!(dir.path().join("validation_tracking_v5.md").is_file());
        assert_eq!(report.summary_path, dir.path().join("generation_summary_v5.json"));
        assert_eq!(report.summary.generated_files[&DocumentKind::Prd].version, Some(5));
    }

    #[tokio::test]
    async fn concurrent_run_on_same_directory_is_refused() {
        let dir = TempDir::new().unwrap();
        let mut lock = RunLock::open(dir.path()).unwrap();
        let _held = lock.try_hold().unwrap();

        let fake = Arc::new(FakeClient::new());
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());
        let err = pipeline.run_full(&idea(), &StageOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert_eq!(err.stage(), None);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn version_strategy_is_pluggable() {
        use crate::errors::WriteError;
        use crate::output::{ArtifactName, VersionStrategy};

        struct Fixed;
        impl VersionStrategy for Fixed {
            fn latest_version(&self, _: &ArtifactName, _: &Path) -> Result<Option<u32>, WriteError> {
                Ok(Some(41))
            }
        }

        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config(dir.path()), Arc::new(FakeClient::new()))
            .with_writer(VersionedWriter::new(Box::new(Fixed), false));
        let report = pipeline.run_full(&idea(), &only(&[Stage::Prd])).await.unwrap();
        assert_eq!(report.summary.generated_files[&DocumentKind::Prd].version, Some(42));
        assert!(dir.path().join("prd_v42.md").is_file());
    }

    #[tokio::test]
    async fn transcripts_are_saved_when_enabled() {
        let dir = TempDir::new().unwrap();
        let cfg = Config { save_prompts: true, ..config(dir.path()) };
        let pipeline = Pipeline::new(cfg, Arc::new(FakeClient::new()));
        pipeline.run_full(&idea(), &only(&[Stage::Prd])).await.unwrap();
        let stage_dir = pipeline.transcript_dir().unwrap().join("prd");
        assert!(stage_dir.join("01-product-overview.prompt.md").is_file());
        assert!(stage_dir.join("01-product-overview.response.md").is_file());
    }

    #[tokio::test]
    async fn single_stage_run_uses_supplied_context() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeClient::new());
        let pipeline = Pipeline::new(config(dir.path()), fake.clone());
        let mut ctx = GenerationContext::new(None, "Grocery");
        ctx.add_document(DocumentKind::Prd, "PRD FROM FILE");
        ctx.add_document(DocumentKind::TechSpec, "SPEC FROM FILE");

        let report = pipeline.run_stage(Stage::Gtm, &ctx, None).await.unwrap();
        assert_eq!(report.written.path, dir.path().join("gtm_plan_v1.md"));
        assert!(report.validation.is_none());
        assert!(fake.calls().iter().all(|c| c.user.contains("PRD FROM FILE") && c.user.contains("SPEC FROM FILE")));
    }
}
