use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// ========================================
/// Pipeline data model
/// ========================================

/// The five ordered generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Prd,
    TechSpec,
    ActionPlan,
    Milestones,
    Gtm,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Prd,
        Stage::TechSpec,
        Stage::ActionPlan,
        Stage::Milestones,
        Stage::Gtm,
    ];

    pub fn document_kind(self) -> DocumentKind {
        match self {
            Stage::Prd => DocumentKind::Prd,
            Stage::TechSpec => DocumentKind::TechSpec,
            Stage::ActionPlan => DocumentKind::ActionPlan,
            Stage::Milestones => DocumentKind::Milestones,
            Stage::Gtm => DocumentKind::Gtm,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Prd => "PRD Generation",
            Stage::TechSpec => "Technical Specification Generation",
            Stage::ActionPlan => "Action Plan Generation",
            Stage::Milestones => "Milestone Specifications Generation",
            Stage::Gtm => "Go-To-Market Plan Generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Prd => "PRD",
            Stage::TechSpec => "TECH_SPEC",
            Stage::ActionPlan => "ACTION_PLAN",
            Stage::Milestones => "MILESTONES",
            Stage::Gtm => "GTM",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Prd,
    TechSpec,
    ActionPlan,
    Milestones,
    Gtm,
    /// Companion document collecting validation/CTO review sections.
    Validation,
}

impl DocumentKind {
    pub fn file_stem(self) -> &'static str {
        match self {
            DocumentKind::Prd => "prd",
            DocumentKind::TechSpec => "tech_spec",
            DocumentKind::ActionPlan => "action_plan",
            DocumentKind::Milestones => "milestone_specs",
            DocumentKind::Gtm => "gtm_plan",
            DocumentKind::Validation => "validation_tracking",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Prd => "Product Requirements Document (PRD)",
            DocumentKind::TechSpec => "Technical Specification",
            DocumentKind::ActionPlan => "Action Plan",
            DocumentKind::Milestones => "Milestone Specifications",
            DocumentKind::Gtm => "Go-To-Market Plan",
            DocumentKind::Validation => "Technical Validation Tracking",
        }
    }

    fn intro(self) -> &'static str {
        match self {
            DocumentKind::Prd => "This document outlines the product requirements and specifications.",
            DocumentKind::TechSpec => "This document provides detailed technical specifications based on the Product Requirements Document (PRD).",
            DocumentKind::ActionPlan => "This document breaks the technical specification into an ordered implementation plan.",
            DocumentKind::Milestones => "This document details each milestone for developers and AI agents.",
            DocumentKind::Gtm => "This document outlines the go-to-market strategy for the product.",
            DocumentKind::Validation => "This document tracks validation findings raised while generating the planning documents.",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// One entry of a template: drives the generation of one document section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub name: String,
    pub role: String,
    pub instruction: String,
    pub output_format: String,
    pub acceptance_criteria: String,
    /// Earlier sections of the same template this one reads. `None` means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
}

impl SectionDefinition {
    /// Review sections go to the validation tracking document instead of their stage's document.
    pub fn is_validation(&self) -> bool {
        self.name.contains("Validation") || self.name.contains("CTO")
    }
}

/// Ordered, immutable set of section definitions loaded from one template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub sections: Vec<SectionDefinition>,
    /// Single-section markdown templates produce a document body without a section heading.
    pub render_headings: bool,
}

impl Template {
    pub fn position(&self, section: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == section)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSection {
    pub name: String,
    pub body: String,
}

/// The assembled output of one stage, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub kind: DocumentKind,
    pub sections: Vec<DocumentSection>,
    pub render_headings: bool,
}

impl Document {
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.render_headings {
            out.push_str(&format!("# {}\n\n{}\n\n", self.kind.title(), self.kind.intro()));
            for s in &self.sections {
                out.push_str(&format!("## {}\n\n{}\n\n", s.name, s.body.trim_end()));
            }
        } else {
            let bodies: Vec<&str> = self.sections.iter().map(|s| s.body.trim()).collect();
            out.push_str(&bodies.join("\n\n---\n\n"));
            out.push('\n');
        }
        out
    }
}

/// Text threaded forward between stages. Grows as stages complete.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub idea: Option<String>,
    pub product_name: String,
    documents: BTreeMap<DocumentKind, String>,
}

impl GenerationContext {
    pub fn new(idea: Option<String>, product_name: impl Into<String>) -> Self {
        Self { idea, product_name: product_name.into(), documents: BTreeMap::new() }
    }

    /// Adds a stage document. An already-present document is kept, never replaced.
    pub fn add_document(&mut self, kind: DocumentKind, text: impl Into<String>) {
        self.documents.entry(kind).or_insert_with(|| text.into());
    }

    pub fn document(&self, kind: DocumentKind) -> Option<&str> {
        self.documents.get(&kind).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Generated,
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub source: DocumentSource,
    pub bytes: u64,
}

/// Record of one full-pipeline run, written once at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub output_directory: PathBuf,
    pub generated_files: BTreeMap<DocumentKind, DocumentRecord>,
    #[serde(default)]
    pub skipped: Vec<Stage>,
}
