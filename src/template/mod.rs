use fs_err as fs;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::TemplateError;
use crate::model::{SectionDefinition, Stage, Template};

pub mod markdown;

const PRD_CSV: &str = include_str!("../../templates/prd_instructions.csv");
const SPEC_CSV: &str = include_str!("../../templates/spec_instructions.csv");
const GTM_CSV: &str = include_str!("../../templates/gtm_instructions.csv");
const ACTION_PLAN_MD: &str = include_str!("../../templates/action_plan_template.md");
const MILESTONES_MD: &str = include_str!("../../templates/milestones_template.md");

/// Where a template comes from: a file on disk or one of the templates compiled into the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Builtin(&'static str),
    File(PathBuf),
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRef::Builtin(name) => write!(f, "builtin:{name}"),
            TemplateRef::File(p) => write!(f, "{}", p.display()),
        }
    }
}

pub fn file_name_for(stage: Stage) -> &'static str {
    match stage {
        Stage::Prd => "prd_instructions.csv",
        Stage::TechSpec => "spec_instructions.csv",
        Stage::ActionPlan => "action_plan_template.md",
        Stage::Milestones => "milestones_template.md",
        Stage::Gtm => "gtm_instructions.csv",
    }
}

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "prd_instructions.csv" => Some(PRD_CSV),
        "spec_instructions.csv" => Some(SPEC_CSV),
        "gtm_instructions.csv" => Some(GTM_CSV),
        "action_plan_template.md" => Some(ACTION_PLAN_MD),
        "milestones_template.md" => Some(MILESTONES_MD),
        _ => None,
    }
}

/// Resolves and parses stage templates. A file in `dir` overrides the built-in of the same name.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// A configured directory must exist; a file missing from it falls back to the built-in.
    pub fn resolve(&self, stage: Stage) -> Result<TemplateRef, TemplateError> {
        let name = file_name_for(stage);
        if let Some(dir) = &self.dir {
            if !dir.is_dir() {
                return Err(TemplateError::NotFound(format!("templates directory {}", dir.display())));
            }
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(TemplateRef::File(candidate));
            }
            debug!(dir = %dir.display(), template = name, "no override in templates directory, using built-in");
        }
        Ok(TemplateRef::Builtin(name))
    }

    pub fn load_for(&self, stage: Stage) -> Result<Template, TemplateError> {
        let template_ref = self.resolve(stage)?;
        self.load(&template_ref, stage.document_kind().title())
    }

    /// Loads a template. `default_section` names the section of a heading-less markdown template.
    pub fn load(&self, template_ref: &TemplateRef, default_section: &str) -> Result<Template, TemplateError> {
        let name = template_ref.to_string();
        let (text, is_markdown) = match template_ref {
            TemplateRef::Builtin(file) => {
                let text = builtin(file).ok_or_else(|| TemplateError::NotFound(name.clone()))?;
                (text.to_string(), file.ends_with(".md"))
            }
            TemplateRef::File(path) => (read_template(path)?, is_markdown_path(path)),
        };
        debug!(template = %name, "loading template");
        let template = if is_markdown {
            markdown::parse(&name, &text, default_section)?
        } else {
            parse_csv(&name, &text)?
        };
        validate(&template)?;
        Ok(template)
    }
}

fn is_markdown_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("md") | Some("markdown")
    )
}

fn read_template(path: &Path) -> Result<String, TemplateError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TemplateError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(TemplateError::Io { template: path.display().to_string(), source: e }),
    }
}

const COL_SECTION: &str = "Section";
const COL_ROLE: &str = "Role Emulated";
const COL_INSTRUCTION: &str = "Prompt Instruction";
const COL_FORMAT: &str = "Output Format";
const COL_ACCEPTANCE: &str = "Acceptance Criteria";
const COL_DEPENDS: &str = "Depends On";

/// Parse the tabular template format: one row per section.
///
/// When the optional `Depends On` column is present, an empty cell means the section
/// reads no earlier sections; without the column every section reads all earlier ones.
pub fn parse_csv(name: &str, text: &str) -> Result<Template, TemplateError> {
    let malformed = |reason: String| TemplateError::Malformed { template: name.to_string(), reason };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| malformed(format!("unreadable header row: {e}")))?
        .clone();

    let column = |col: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(col));
    let mut idx = Vec::with_capacity(5);
    for col in [COL_SECTION, COL_ROLE, COL_INSTRUCTION, COL_FORMAT, COL_ACCEPTANCE] {
        idx.push(column(col).ok_or_else(|| malformed(format!("missing column \"{col}\"")))?);
    }
    let depends_idx = column(COL_DEPENDS);

    let mut sections = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|e| malformed(format!("row {row}: {e}")))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let get = |j: usize| record.get(j).unwrap_or("").to_string();
        let required = |j: usize, col: &str| {
            let v = get(j);
            if v.is_empty() {
                Err(malformed(format!("row {row}: empty \"{col}\"")))
            } else {
                Ok(v)
            }
        };

        sections.push(SectionDefinition {
            name: required(idx[0], COL_SECTION)?,
            role: required(idx[1], COL_ROLE)?,
            instruction: required(idx[2], COL_INSTRUCTION)?,
            output_format: get(idx[3]),
            acceptance_criteria: get(idx[4]),
            depends_on: depends_idx.map(|j| split_list(&get(j))),
        });
    }

    Ok(Template { name: name.to_string(), sections, render_headings: true })
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Structural checks shared by every template format.
fn validate(t: &Template) -> Result<(), TemplateError> {
    let malformed = |reason: String| TemplateError::Malformed { template: t.name.clone(), reason };
    if t.sections.is_empty() {
        return Err(malformed("no sections defined".into()));
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for s in &t.sections {
        if let Some(deps) = &s.depends_on {
            for d in deps {
                if !seen.contains(d.as_str()) {
                    return Err(malformed(format!(
                        "section \"{}\" depends on \"{d}\", which is not an earlier section",
                        s.name
                    )));
                }
            }
        }
        if !seen.insert(s.name.as_str()) {
            return Err(malformed(format!("duplicate section \"{}\"", s.name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_templates_load_for_every_stage() {
        let store = TemplateStore::default();
        for stage in Stage::ALL {
            let t = store.load_for(stage).unwrap();
            assert!(!t.sections.is_empty(), "{stage} has no sections");
        }
    }

    #[test]
    fn builtin_spec_template_declares_dependencies() {
        let t = TemplateStore::default().load_for(Stage::TechSpec).unwrap();
        let flow = &t.sections[t.position("Data Flow & Sequence Diagrams").unwrap()];
        assert_eq!(flow.depends_on.as_deref(), Some(&["High-Level Architecture Diagram".to_string()][..]));
        let scope = &t.sections[0];
        assert_eq!(scope.depends_on.as_deref(), Some(&[][..]));
    }

    #[test]
    fn csv_keeps_row_order_and_quoted_commas() {
        let text = "Section,Role Emulated,Prompt Instruction,Output Format,Acceptance Criteria\n\
                    A,PM,\"Do a, then b\",List,Clear\n\
                    B,Eng,Do c,,\n";
        let t = parse_csv("t.csv", text).unwrap();
        assert_eq!(t.sections.len(), 2);
        assert_eq!(t.sections[0].instruction, "Do a, then b");
        assert_eq!(t.sections[1].name, "B");
        assert_eq!(t.sections[1].output_format, "");
        assert!(t.sections[0].depends_on.is_none());
    }

    #[test]
    fn missing_column_is_malformed() {
        let text = "Section,Prompt Instruction\nA,Do it\n";
        let err = parse_csv("t.csv", text).unwrap_err();
        assert!(matches!(err, TemplateError::Malformed { .. }));
        assert!(err.to_string().contains("Role Emulated"));
    }

    #[test]
    fn empty_required_cell_names_the_row() {
        let text = "Section,Role Emulated,Prompt Instruction,Output Format,Acceptance Criteria\n\
                    A,PM,,List,Clear\n";
        let err = parse_csv("t.csv", text).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn duplicate_and_forward_dependencies_are_rejected() {
        let store = TemplateStore::default();
        let dir = TempDir::new().unwrap();

        let dup = dir.path().join("dup.csv");
        std::fs::write(
            &dup,
            "Section,Role Emulated,Prompt Instruction,Output Format,Acceptance Criteria\nA,r,i,,\nA,r,i,,\n",
        )
        .unwrap();
        let err = store.load(&TemplateRef::File(dup), "x").unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        let fwd = dir.path().join("fwd.csv");
        std::fs::write(
            &fwd,
            "Section,Role Emulated,Prompt Instruction,Output Format,Acceptance Criteria,Depends On\nA,r,i,,,B\nB,r,i,,,\n",
        )
        .unwrap();
        let err = store.load(&TemplateRef::File(fwd), "x").unwrap_err();
        assert!(err.to_string().contains("not an earlier section"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let store = TemplateStore::default();
        let err = store
            .load(&TemplateRef::File("/definitely/not/here.csv".into()), "x")
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn templates_dir_overrides_builtin_by_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("prd_instructions.csv"),
            "Section,Role Emulated,Prompt Instruction,Output Format,Acceptance Criteria\nOnly,PM,Write it,,\n",
        )
        .unwrap();
        let store = TemplateStore::new(Some(dir.path().to_path_buf()));
        assert!(matches!(store.resolve(Stage::Prd), Ok(TemplateRef::File(_))));
        assert!(matches!(store.resolve(Stage::Gtm), Ok(TemplateRef::Builtin(_))));
        let t = store.load_for(Stage::Prd).unwrap();
        assert_eq!(t.sections.len(), 1);
        assert_eq!(t.sections[0].name, "Only");
    }

    #[test]
    fn missing_templates_dir_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = TemplateStore::new(Some(dir.path().join("tempaltes")));
        let err = store.load_for(Stage::Prd).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
        assert!(err.to_string().contains("tempaltes"));
    }
}
