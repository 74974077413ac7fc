use fs_err as fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::WriteError;
use crate::model::Stage;
use crate::prompt::PromptText;

pub const RUNS_DIR: &str = ".runs";

pub struct SavedPaths {
    pub prompt: PathBuf,
    pub response: PathBuf,
}

fn run_dir(output_dir: &Path, run: Uuid) -> PathBuf {
    output_dir.join(RUNS_DIR).join(run.to_string())
}

/// Lowercase, dash-separated file-name fragment for a section name.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("section");
    }
    out
}

/// Audit trail of every prompt and completion in one run, under `<output>/.runs/<run>/`.
#[derive(Debug, Clone)]
pub struct Transcript {
    dir: PathBuf,
}

impl Transcript {
    pub fn new(output_dir: &Path, run: Uuid) -> Self {
        Self { dir: run_dir(output_dir, run) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn base(&self, stage: Stage, index: usize, section: &str) -> (PathBuf, String) {
        let dir = self.dir.join(stage.document_kind().file_stem());
        (dir, format!("{:02}-{}", index + 1, slug(section)))
    }

    pub fn save_section(
        &self,
        stage: Stage,
        index: usize,
        section: &str,
        prompt: &PromptText,
        response: Result<&str, String>,
    ) -> Result<SavedPaths, WriteError> {
        let (dir, base) = self.base(stage, index, section);
        fs::create_dir_all(&dir).map_err(|e| WriteError::new(&dir, e))?;

        let prompt_path = dir.join(format!("{base}.prompt.md"));
        let mut text = String::new();
        if let Some(system) = &prompt.system {
            text.push_str(&format!("<!-- system -->\n{system}\n\n<!-- user -->\n"));
        }
        text.push_str(&prompt.user);
        fs::write(&prompt_path, text).map_err(|e| WriteError::new(&prompt_path, e))?;

        let response_path = dir.join(format!("{base}.response.md"));
        let body = match response {
            Ok(text) => text.to_string(),
            Err(err) => format!("<!-- generation failed -->\n{err}\n"),
        };
        fs::write(&response_path, body).map_err(|e| WriteError::new(&response_path, e))?;

        Ok(SavedPaths { prompt: prompt_path, response: response_path })
    }
}
