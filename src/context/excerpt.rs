/// Tech-spec sections the action plan is built from.
pub const SPEC_FOR_ACTION_PLAN: &[&str] = &[
    "Purpose & Scope",
    "High-Level Architecture Diagram",
    "Key Components",
    "External Integrations & APIs",
    "Data Models & Schemas",
    "Non-Functional Requirements",
];

/// PRD sections the action plan is built from.
pub const PRD_FOR_ACTION_PLAN: &[&str] = &["Product Overview", "User Requirements"];

/// Tech-spec sections the milestone specifications are built from.
pub const SPEC_FOR_MILESTONES: &[&str] = &[
    "Purpose & Scope",
    "High-Level Architecture Diagram",
    "Key Components",
    "Data Models & Schemas",
    "External Integrations & APIs",
    "Implementation Roadmap",
];

pub const MILESTONE_START: &str = "<!-- MILESTONE_START -->";
pub const MILESTONE_END: &str = "<!-- MILESTONE_END -->";

/// Used when no action plan (or no milestone markers) is available.
pub const DEFAULT_MILESTONES: &str = "\
<!-- MILESTONE_START -->
## Milestone 1 - Core Infrastructure

**Goal:** Set up basic project structure, database, and core infrastructure

**Key Tasks:**
- Initialize project structure
- Set up database schema
- Configure development environment

**Deliverables:**
- Working development environment
- Basic database schema
- Project structure

**Exit Tests:**
- Environment can be set up successfully
- Database connections work
- Basic functionality tests pass
<!-- MILESTONE_END -->";

/// Keep only the `## ` sections of `markdown` whose heading is in `names`, in document order.
pub fn extract_sections(markdown: &str, names: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut keep = false;
    for line in markdown.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            keep = names.contains(&heading.trim());
            if keep {
                out.push("");
                out.push(line);
            }
        } else if keep {
            out.push(line);
        }
    }
    out.join("\n").trim().to_string()
}

/// Like [`extract_sections`], but falls back to the whole document when none of the sections exist.
pub fn excerpt_or_full(markdown: &str, names: &[&str]) -> String {
    let excerpt = extract_sections(markdown, names);
    if excerpt.is_empty() {
        markdown.trim().to_string()
    } else {
        excerpt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub name: String,
    pub content: String,
}

/// Pull the marked milestone blocks out of an action plan. An unterminated block is ignored.
pub fn extract_milestones(action_plan: &str) -> Vec<Milestone> {
    let mut out = Vec::new();
    let mut rest = action_plan;
    while let Some(start) = rest.find(MILESTONE_START) {
        let after = &rest[start + MILESTONE_START.len()..];
        let Some(end) = after.find(MILESTONE_END) else { break };
        let content = after[..end].trim().to_string();
        let name = content
            .lines()
            .find_map(|l| l.strip_prefix("## Milestone").map(|tail| format!("Milestone{tail}")))
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| format!("Milestone {}", out.len() + 1));
        out.push(Milestone { name, content });
        rest = &after[end + MILESTONE_END.len()..];
    }
    out
}

/// Milestones of `action_plan`, or the default structure when there are none.
pub fn milestones_or_default(action_plan: Option<&str>) -> Vec<Milestone> {
    let found = action_plan.map(extract_milestones).unwrap_or_default();
    if found.is_empty() {
        extract_milestones(DEFAULT_MILESTONES)
    } else {
        found
    }
}

pub fn render_milestones(milestones: &[Milestone]) -> String {
    milestones
        .iter()
        .map(|m| format!("{MILESTONE_START}\n{}\n{MILESTONE_END}", m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "# Technical Specification\n\nintro\n\n## Purpose & Scope\n\nscope text\n\n\
                        ## Security & Privacy\n\nsecret stuff\n\n## Key Components\n\ncomponents\n";

    #[test]
    fn extract_keeps_only_named_sections_in_document_order() {
        let out = extract_sections(SPEC, &["Key Components", "Purpose & Scope"]);
        assert!(out.starts_with("## Purpose & Scope"));
        assert!(out.contains("components"));
        assert!(!out.contains("secret stuff"));
        assert!(!out.contains("intro"));
    }

    #[test]
    fn excerpt_falls_back_to_full_text() {
        let doc = "no headings here";
        assert_eq!(excerpt_or_full(doc, SPEC_FOR_ACTION_PLAN), "no headings here");
    }

    #[test]
    fn milestones_are_named_from_their_heading() {
        let plan = "## Milestones\n\n<!-- MILESTONE_START -->\n## Milestone 1 - Auth\nGoal: login\n<!-- MILESTONE_END -->\n\
                    text\n<!-- MILESTONE_START -->\nno heading\n<!-- MILESTONE_END -->";
        let ms = extract_milestones(plan);
        assert_eq!(ms.len(), 2);
        assert_eq!(ms[0].name, "Milestone 1 - Auth");
        assert!(ms[0].content.contains("Goal: login"));
        assert_eq!(ms[1].name, "Milestone 2");
    }

    #[test]
    fn default_milestones_apply_without_markers() {
        let ms = milestones_or_default(Some("a plan with no markers"));
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].name, "Milestone 1 - Core Infrastructure");
        assert_eq!(milestones_or_default(None), ms);
    }

    #[test]
    fn rendered_milestones_round_trip_through_markers() {
        let ms = milestones_or_default(None);
        assert_eq!(extract_milestones(&render_milestones(&ms)), ms);
    }
}
