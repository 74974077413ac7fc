use serde::{Deserialize, Serialize};

use crate::errors::CompletionError;
use crate::model::{Document, DocumentKind, DocumentSection, Template};

/// What happens to a section whose completion came back unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Render a visible placeholder and keep the rest of the document.
    #[default]
    Lenient,
    /// Abort the whole document.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    Generated(String),
    Failed(CompletionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionResult {
    pub name: String,
    pub outcome: SectionOutcome,
}

impl SectionResult {
    pub fn generated(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), outcome: SectionOutcome::Generated(text.into()) }
    }

    pub fn failed(name: impl Into<String>, error: CompletionError) -> Self {
        Self { name: name.into(), outcome: SectionOutcome::Failed(error) }
    }
}

/// Strict-mode abort: the first failed section in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFailed {
    pub section: String,
    pub error: CompletionError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub document: Document,
    /// Review sections routed to the validation tracking document.
    pub validation: Vec<DocumentSection>,
}

pub fn failure_placeholder(error: &CompletionError) -> String {
    format!("> **[generation failed: {error}]**")
}

/// Order `results` by template position and build the stage document.
/// Results for sections the template does not define are dropped.
pub fn assemble(
    kind: DocumentKind,
    template: &Template,
    mut results: Vec<SectionResult>,
    strictness: Strictness,
) -> Result<Assembled, SectionFailed> {
    results.retain(|r| template.position(&r.name).is_some());
    results.sort_by_key(|r| template.position(&r.name));

    let mut sections = Vec::with_capacity(results.len());
    let mut validation = Vec::new();
    for result in results {
        let body = match result.outcome {
            SectionOutcome::Generated(text) => text.trim().to_string(),
            SectionOutcome::Failed(error) => match strictness {
                Strictness::Strict => return Err(SectionFailed { section: result.name, error }),
                Strictness::Lenient => failure_placeholder(&error),
            },
        };
        let is_validation = template
            .position(&result.name)
            .map(|i| template.sections[i].is_validation())
            .unwrap_or(false);
        let section = DocumentSection { name: result.name, body };
        if is_validation && template.render_headings {
            validation.push(section);
        } else {
            sections.push(section);
        }
    }

    Ok(Assembled {
        document: Document { kind, sections, render_headings: template.render_headings },
        validation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionDefinition;

    fn template(names: &[&str]) -> Template {
        Template {
            name: "t.csv".into(),
            sections: names
                .iter()
                .map(|n| SectionDefinition {
                    name: n.to_string(),
                    role: "PM".into(),
                    instruction: "write".into(),
                    output_format: String::new(),
                    acceptance_criteria: String::new(),
                    depends_on: None,
                })
                .collect(),
            render_headings: true,
        }
    }

    #[test]
    fn output_follows_template_order_not_arrival_order() {
        let t = template(&["A", "B", "C"]);
        let results = vec![
            SectionResult::generated("C", "c"),
            SectionResult::generated("A", "a"),
            SectionResult::generated("B", "b"),
        ];
        let out = assemble(DocumentKind::Prd, &t, results, Strictness::Lenient).unwrap();
        let names: Vec<_> = out.document.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn lenient_mode_leaves_a_visible_placeholder() {
        let t = template(&["A", "B"]);
        let results = vec![
            SectionResult::generated("A", "a"),
            SectionResult::failed("B", CompletionError::InvalidResponse("completion was empty".into())),
        ];
        let out = assemble(DocumentKind::Prd, &t, results, Strictness::Lenient).unwrap();
        assert!(out.document.sections[1].body.starts_with("> **[generation failed:"));
        assert!(out.document.render().contains("## B"));
    }

    #[test]
    fn strict_mode_aborts_on_first_failure_in_template_order() {
        let t = template(&["A", "B", "C"]);
        let results = vec![
            SectionResult::failed("C", CompletionError::InvalidResponse("c".into())),
            SectionResult::failed("B", CompletionError::InvalidResponse("b".into())),
            SectionResult::generated("A", "a"),
        ];
        let err = assemble(DocumentKind::Prd, &t, results, Strictness::Strict).unwrap_err();
        assert_eq!(err.section, "B");
    }

    #[test]
    fn validation_sections_are_split_out() {
        let t = template(&["Overview", "Technical Validation (CTO)"]);
        let results = vec![
            SectionResult::generated("Overview", "o"),
            SectionResult::generated("Technical Validation (CTO)", "looks feasible"),
        ];
        let out = assemble(DocumentKind::Prd, &t, results, Strictness::Lenient).unwrap();
        assert_eq!(out.document.sections.len(), 1);
        assert_eq!(out.validation[0].body, "looks feasible");
    }
}
