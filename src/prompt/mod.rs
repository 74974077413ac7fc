use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

use crate::context::excerpt::{
    excerpt_or_full, milestones_or_default, render_milestones, PRD_FOR_ACTION_PLAN, SPEC_FOR_ACTION_PLAN,
    SPEC_FOR_MILESTONES,
};
use crate::model::{DocumentKind, GenerationContext, SectionDefinition, Stage};

const NO_PRD: &str = "No PRD provided - using technical specification only.";
const NO_SPEC: &str = "No technical specification provided.";
const NO_ACTION_PLAN: &str = "No action plan provided.";

/// The text handed to a completion backend for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub user: String,
}

/// Everything a section prompt may draw on.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub stage: Stage,
    pub context: &'a GenerationContext,
    /// Completed sections of the current document, in template order.
    pub prior_sections: &'a [(String, String)],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Placeholder {
    Idea,
    PrdMd,
    SpecMd,
    ActionPlanMd,
    Milestones,
    ProductName,
    Section,
    Role,
    OutputFormat,
    Acceptance,
    PriorSections,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "IDEA" => Self::Idea,
            "PRD_MD" => Self::PrdMd,
            "SPEC_MD" => Self::SpecMd,
            "ACTION_PLAN_MD" => Self::ActionPlanMd,
            "MILESTONES" => Self::Milestones,
            "PRODUCT_NAME" => Self::ProductName,
            "SECTION" => Self::Section,
            "ROLE" => Self::Role,
            "OUTPUT_FORMAT" => Self::OutputFormat,
            "ACCEPTANCE" => Self::Acceptance,
            "PRIOR_SECTIONS" => Self::PriorSections,
            _ => return None,
        })
    }

    fn is_upstream(self) -> bool {
        matches!(
            self,
            Self::Idea | Self::PrdMd | Self::SpecMd | Self::ActionPlanMd | Self::Milestones
        )
    }
}

fn system_prompt(role: &str) -> String {
    format!(
        "You are acting as the {role}. Write clear, specific, implementation-focused markdown. \
         Do not restate the instructions or the acceptance criteria in your answer."
    )
}

/// Build the prompt for one section. Pure: identical inputs give identical prompts.
pub fn build(section: &SectionDefinition, input: &PromptInput<'_>) -> PromptText {
    let prior = relevant_prior_sections(section, input.prior_sections);
    let (instruction, used) = substitute(&section.instruction, |p| resolve(p, section, input, &prior));

    let mut user = instruction;
    if !used.iter().any(|p| p.is_upstream()) {
        user.push_str("\n\n");
        user.push_str(&upstream_block(input));
    }
    if !prior.is_empty() && !used.contains(&Placeholder::PriorSections) {
        user.push_str("\n\nDependent Sections:\n");
        user.push_str(&render_prior(&prior));
    }
    if !section.output_format.is_empty() && !used.contains(&Placeholder::OutputFormat) {
        user.push_str("\n\nFormat:\n");
        user.push_str(&section.output_format);
    }
    if !section.acceptance_criteria.is_empty() && !used.contains(&Placeholder::Acceptance) {
        user.push_str("\n\nAcceptance Criteria:\n");
        user.push_str(&section.acceptance_criteria);
    }
    user.push('\n');

    PromptText { system: Some(system_prompt(&section.role)), user }
}

fn relevant_prior_sections<'a>(
    section: &SectionDefinition,
    prior: &'a [(String, String)],
) -> Vec<&'a (String, String)> {
    match &section.depends_on {
        None => prior.iter().collect(),
        Some(deps) => prior.iter().filter(|(name, _)| deps.contains(name)).collect(),
    }
}

fn render_prior(prior: &[&(String, String)]) -> String {
    prior
        .iter()
        .map(|(name, text)| format!("--- {name} ---\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Replace every recognized `{{NAME}}` in one left-to-right pass. Substituted text is not rescanned
/// and unknown placeholders are kept verbatim.
fn substitute<'a, F>(template: &str, mut lookup: F) -> (String, HashSet<Placeholder>)
where
    F: FnMut(Placeholder) -> Cow<'a, str>,
{
    let mut out = String::with_capacity(template.len());
    let mut used = HashSet::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                // An unclosed `{{` earlier on: keep it as text and rescan from the inner one.
                if let Some(inner) = after[..close].find("{{") {
                    out.push_str(&rest[open..open + 2 + inner]);
                    rest = &after[inner..];
                    continue;
                }
                let name = after[..close].trim();
                match Placeholder::from_name(name) {
                    Some(p) => {
                        out.push_str(&lookup(p));
                        used.insert(p);
                    }
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    (out, used)
}

fn resolve<'a>(
    p: Placeholder,
    section: &'a SectionDefinition,
    input: &PromptInput<'a>,
    prior: &[&(String, String)],
) -> Cow<'a, str> {
    let ctx = input.context;
    match p {
        Placeholder::Idea => Cow::Borrowed(ctx.idea.as_deref().unwrap_or("")),
        Placeholder::PrdMd => match (ctx.document(DocumentKind::Prd), input.stage) {
            (Some(prd), Stage::ActionPlan) => Cow::Owned(excerpt_or_full(prd, PRD_FOR_ACTION_PLAN)),
            (Some(prd), _) => Cow::Borrowed(prd),
            (None, _) => Cow::Borrowed(NO_PRD),
        },
        Placeholder::SpecMd => match ctx.document(DocumentKind::TechSpec) {
            Some(spec) => Cow::Owned(spec_for(input.stage, spec)),
            None => Cow::Borrowed(NO_SPEC),
        },
        Placeholder::ActionPlanMd => Cow::Borrowed(ctx.document(DocumentKind::ActionPlan).unwrap_or(NO_ACTION_PLAN)),
        Placeholder::Milestones => Cow::Owned(render_milestones(&milestones_or_default(
            ctx.document(DocumentKind::ActionPlan),
        ))),
        Placeholder::ProductName => Cow::Borrowed(ctx.product_name.as_str()),
        Placeholder::Section => Cow::Borrowed(section.name.as_str()),
        Placeholder::Role => Cow::Borrowed(section.role.as_str()),
        Placeholder::OutputFormat => Cow::Borrowed(section.output_format.as_str()),
        Placeholder::Acceptance => Cow::Borrowed(section.acceptance_criteria.as_str()),
        Placeholder::PriorSections => Cow::Owned(render_prior(prior)),
    }
}

fn spec_for(stage: Stage, spec: &str) -> String {
    match stage {
        Stage::ActionPlan => excerpt_or_full(spec, SPEC_FOR_ACTION_PLAN),
        Stage::Milestones => excerpt_or_full(spec, SPEC_FOR_MILESTONES),
        _ => spec.to_string(),
    }
}

fn idea_block(ctx: &GenerationContext) -> String {
    format!("Product Idea:\n{}", ctx.idea.as_deref().unwrap_or("(not provided)"))
}

/// Upstream context appended to instructions that do not place it themselves.
fn upstream_block(input: &PromptInput<'_>) -> String {
    let ctx = input.context;
    let prd = ctx.document(DocumentKind::Prd);
    let spec = ctx.document(DocumentKind::TechSpec);
    match input.stage {
        Stage::Prd => idea_block(ctx),
        Stage::TechSpec => match prd {
            Some(prd) => {
                let mut block = format!("PRD Content:\n{prd}");
                if let Some(idea) = &ctx.idea {
                    block.push_str(&format!("\n\nOriginal Product Idea:\n{idea}"));
                }
                block
            }
            None => idea_block(ctx),
        },
        Stage::ActionPlan => match spec {
            Some(spec) => {
                let prd_part = prd
                    .map(|p| excerpt_or_full(p, PRD_FOR_ACTION_PLAN))
                    .unwrap_or_else(|| NO_PRD.to_string());
                format!(
                    "TECHNICAL SPECIFICATION (critical sections):\n{}\n\nPRODUCT REQUIREMENTS:\n{prd_part}",
                    spec_for(Stage::ActionPlan, spec)
                )
            }
            None => match prd {
                Some(prd) => format!("{}\n\nPRD Content:\n{prd}", idea_block(ctx)),
                None => idea_block(ctx),
            },
        },
        Stage::Milestones => {
            let milestones = render_milestones(&milestones_or_default(ctx.document(DocumentKind::ActionPlan)));
            let spec_part = spec
                .map(|s| spec_for(Stage::Milestones, s))
                .unwrap_or_else(|| NO_SPEC.to_string());
            format!("TECHNICAL SPECIFICATION (critical sections):\n{spec_part}\n\nMILESTONES:\n{milestones}")
        }
        Stage::Gtm => match (prd, spec) {
            (None, None) => idea_block(ctx),
            (prd, spec) => format!(
                "PRD CONTENT:\n{}\n\nTECHNICAL SPECIFICATION:\n{}",
                prd.map(str::to_string).unwrap_or_else(|| idea_block(ctx)),
                spec.unwrap_or(NO_SPEC)
            ),
        },
    }
}
