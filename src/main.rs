use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};

use vibe_docgen::cli::{Args, Command};
use vibe_docgen::config::Config;
use vibe_docgen::context::{self, read_input};
use vibe_docgen::errors::{ErrorKind, PipelineError, RunError};
use vibe_docgen::model::{DocumentKind, GenerationContext, Stage};
use vibe_docgen::pipeline::Pipeline;
use vibe_docgen::provider::make_client;
use vibe_docgen::ux::{self, ConsoleProgress};

fn init_tracing(debug: bool) {
    let default_level = if debug { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = if let Some(run) = err.downcast_ref::<RunError>() {
        Some(run.kind())
    } else {
        err.downcast_ref::<PipelineError>().map(PipelineError::kind)
    };
    match kind {
        Some(ErrorKind::ConfigError) => 2,
        Some(ErrorKind::Cancelled) => 3,
        _ => 1,
    }
}

/// Race `fut` against Ctrl-C. Dropping the future abandons the in-flight completion;
/// documents are only ever persisted whole, so nothing partial is left behind.
async fn cancellable<T>(fut: impl Future<Output = Result<T, RunError>>) -> anyhow::Result<T> {
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        res = fut => Ok(res?),
        _ = interrupted => {
            warn!("interrupted; stopping without writing the current document");
            Err(PipelineError::Cancelled.into())
        }
    }
}

/// Build the context for a single-stage command from the files it was given.
fn stage_context(
    pipeline: &Pipeline,
    idea: Option<String>,
    docs: &[(DocumentKind, Option<&PathBuf>)],
) -> anyhow::Result<GenerationContext> {
    let name = pipeline.product_name(idea.as_deref());
    let mut ctx = GenerationContext::new(idea, name);
    for (kind, path) in docs {
        if let Some(path) = path {
            ctx.add_document(*kind, read_input(path)?);
        }
    }
    Ok(ctx)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let global = args.global;
    let mut cfg = match &global.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    global.apply(&mut cfg);
    debug!(?cfg, "effective configuration");

    let api_key = if global.dry_run { None } else { cfg.api_key() };
    let client = make_client(&cfg, api_key, global.dry_run)?;
    if global.dry_run {
        println!("dry run: using the offline client, no requests will be sent");
    }

    let version = global.pin_version;
    let pipeline = Pipeline::new(cfg, client).with_progress(Box::new(ConsoleProgress::new(!global.no_progress)));
    if let Some(dir) = pipeline.transcript_dir() {
        println!("transcripts: {}", dir.display());
    }

    let (stage, ctx) = match args.command {
        Command::Run(run) => {
            let idea = context::resolve_idea(&run.idea)?;
            let opts = run.stage_options(version);
            let report = cancellable(pipeline.run_full(&idea, &opts)).await?;
            ux::print_run_summary(&report);
            return Ok(());
        }
        Command::Prd { idea } => {
            let idea = context::resolve_idea(&idea)?;
            (Stage::Prd, stage_context(&pipeline, Some(idea.text), &[])?)
        }
        Command::Techspec { prd_file, idea_file } => {
            let idea = idea_file.as_deref().map(read_input).transpose()?;
            (Stage::TechSpec, stage_context(&pipeline, idea, &[(DocumentKind::Prd, Some(&prd_file))])?)
        }
        Command::Actionplan { techspec_file, prd_file } => (
            Stage::ActionPlan,
            stage_context(
                &pipeline,
                None,
                &[(DocumentKind::TechSpec, Some(&techspec_file)), (DocumentKind::Prd, prd_file.as_ref())],
            )?,
        ),
        Command::Milestones { techspec_file, action_plan_file } => (
            Stage::Milestones,
            stage_context(
                &pipeline,
                None,
                &[
                    (DocumentKind::TechSpec, Some(&techspec_file)),
                    (DocumentKind::ActionPlan, action_plan_file.as_ref()),
                ],
            )?,
        ),
        Command::Gtm { prd_file, techspec_file } => (
            Stage::Gtm,
            stage_context(
                &pipeline,
                None,
                &[(DocumentKind::Prd, Some(&prd_file)), (DocumentKind::TechSpec, techspec_file.as_ref())],
            )?,
        ),
    };

    let report = cancellable(pipeline.run_stage(stage, &ctx, version)).await?;
    ux::print_stage_report(&report);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    // Load .env before the subscriber so RUST_LOG from it applies. Existing variables win.
    let dotenv = dotenvy::dotenv();
    init_tracing(args.global.debug);
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "could not load .env");
        }
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RunError>() {
                Some(run_err) => ux::print_failure(run_err),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::from(exit_code(&err))
        }
    }
}
