use fs_err as fs;
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

pub mod excerpt;

const PRODUCT_NAME_MAX_CHARS: usize = 60;

/// Where the product idea came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdeaSource {
    File(PathBuf),
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaInput {
    pub text: String,
    pub source: IdeaSource,
}

impl IdeaInput {
    /// Human-readable reference recorded in the generation summary.
    pub fn reference(&self) -> String {
        match &self.source {
            IdeaSource::File(p) => p.display().to_string(),
            IdeaSource::Inline => "<inline idea text>".to_string(),
        }
    }
}

/// Treat `arg` as a path when it names an existing file, otherwise as the idea text itself.
pub fn resolve_idea(arg: &str) -> Result<IdeaInput, PipelineError> {
    let path = Path::new(arg);
    let (text, source) = if path.is_file() {
        (read_input(path)?, IdeaSource::File(path.to_path_buf()))
    } else {
        (arg.to_string(), IdeaSource::Inline)
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(PipelineError::Input("product idea is empty".into()));
    }
    Ok(IdeaInput { text, source })
}

/// Read a caller-supplied document (input file or existing-stage override).
/// It must exist, be a regular file and be valid UTF-8.
pub fn read_input(path: &Path) -> Result<String, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::Input(format!("file not found: {}", path.display())));
    }
    if !path.is_file() {
        return Err(PipelineError::Input(format!("not a regular file: {}", path.display())));
    }
    let text = fs::read_to_string(path).map_err(|e| PipelineError::Input(e.to_string()))?;
    Ok(text.trim().to_string())
}

/// Derive a short product name from the first non-empty line of the idea.
pub fn product_name(idea: &str) -> String {
    let first = idea
        .lines()
        .map(|l| l.trim().trim_start_matches('#').trim())
        .find(|l| !l.is_empty())
        .unwrap_or("Product");
    let mut name: String = first.chars().take(PRODUCT_NAME_MAX_CHARS).collect();
    if first.chars().count() > PRODUCT_NAME_MAX_CHARS {
        name = name.trim_end().to_string();
        name.push('…');
    }
    name
}
