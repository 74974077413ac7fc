use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::Stage;

/// Failure classes reported by a completion backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("rate limited by the completion service")]
    RateLimited { retry_after: Option<Duration> },
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Service(_))
    }
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("template {template} is malformed: {reason}")]
    Malformed { template: String, reason: String },
    #[error("reading template {template}: {source}")]
    Io {
        template: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
#[error("writing {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl WriteError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self { path: path.into(), source }
    }
}

/// Stable classification of a pipeline failure, used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigError,
    InputError,
    RateLimited,
    ServiceError,
    AuthError,
    InvalidResponse,
    WriteError,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::InputError => "InputError",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ServiceError => "ServiceError",
            ErrorKind::AuthError => "AuthError",
            ErrorKind::InvalidResponse => "InvalidResponse",
            ErrorKind::WriteError => "WriteError",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("input error: {0}")]
    Input(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("cancelled by user")]
    Cancelled,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::ConfigError,
            PipelineError::Template(_) => ErrorKind::ConfigError,
            PipelineError::Input(_) => ErrorKind::InputError,
            PipelineError::Completion(CompletionError::RateLimited { .. }) => ErrorKind::RateLimited,
            PipelineError::Completion(CompletionError::Service(_)) => ErrorKind::ServiceError,
            PipelineError::Completion(CompletionError::Auth(_)) => ErrorKind::AuthError,
            PipelineError::Completion(CompletionError::InvalidResponse(_)) => ErrorKind::InvalidResponse,
            PipelineError::Write(_) => ErrorKind::WriteError,
            PipelineError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// A fatal failure attributed to one stage (and optionally one section of it).
#[derive(Error, Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub section: Option<String>,
    #[source]
    pub error: PipelineError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: impl Into<PipelineError>) -> Self {
        Self { stage, section: None, error: error.into() }
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} failed", self.stage)?;
        if let Some(section) = &self.section {
            write!(f, " in section \"{section}\"")?;
        }
        write!(f, " [{}]: {}", self.kind(), self.error)
    }
}

/// Why a pipeline invocation ended early.
#[derive(Error, Debug)]
pub enum RunError {
    /// Failed outside any stage: locking the output directory or writing the run summary.
    #[error("pipeline failed [{kind}]: {0}", kind = .0.kind())]
    Run(PipelineError),
    #[error(transparent)]
    Stage(#[from] StageFailure),
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Run(e) => e.kind(),
            RunError::Stage(f) => f.kind(),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            RunError::Run(_) => None,
            RunError::Stage(f) => Some(f.stage),
        }
    }
}
