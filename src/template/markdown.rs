//! Markdown template format.
//!
//! Sections are introduced by `<!-- SECTION: <name> -->` marker lines. A section may start
//! with labelled metadata lines (`Role:`, `Format:`, `Acceptance:`, `Depends On:`); the rest
//! of the section is the instruction. A file without markers is a single section that is
//! rendered without a section heading.

use crate::errors::TemplateError;
use crate::model::{SectionDefinition, Template};

use super::split_list;

const SECTION_OPEN: &str = "<!-- SECTION:";
const MARKER_CLOSE: &str = "-->";
const DEFAULT_ROLE: &str = "Technical Lead";

fn section_marker(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix(SECTION_OPEN)?;
    Some(rest.strip_suffix(MARKER_CLOSE)?.trim())
}

pub fn parse(name: &str, text: &str, default_section: &str) -> Result<Template, TemplateError> {
    let malformed = |reason: String| TemplateError::Malformed { template: name.to_string(), reason };

    let mut blocks: Vec<(String, Vec<&str>)> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();
    for line in text.lines() {
        if let Some(section) = section_marker(line) {
            if section.is_empty() {
                return Err(malformed("section marker without a name".into()));
            }
            blocks.push((section.to_string(), Vec::new()));
        } else if let Some((_, body)) = blocks.last_mut() {
            body.push(line);
        } else {
            preamble.push(line);
        }
    }

    let render_headings = !blocks.is_empty();
    if blocks.is_empty() {
        blocks.push((default_section.to_string(), preamble));
    } else if preamble.iter().any(|l| !l.trim().is_empty()) {
        return Err(malformed("text before the first section marker".into()));
    }

    let sections = blocks
        .into_iter()
        .map(|(section, lines)| parse_section(name, section, &lines))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Template { name: name.to_string(), sections, render_headings })
}

fn parse_section(template: &str, name: String, lines: &[&str]) -> Result<SectionDefinition, TemplateError> {
    let mut role = None;
    let mut output_format = String::new();
    let mut acceptance = String::new();
    let mut depends_on = None;

    let mut body_start = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() && i == body_start {
            body_start += 1;
            continue;
        }
        let Some((label, value)) = trimmed.split_once(':') else { break };
        let value = value.trim().to_string();
        match label.trim().to_ascii_lowercase().as_str() {
            "role" => role = Some(value),
            "format" => output_format = value,
            "acceptance" => acceptance = value,
            "depends on" => depends_on = Some(split_list(&value)),
            _ => break,
        }
        body_start = i + 1;
    }

    let instruction = lines[body_start..].join("\n").trim().to_string();
    if instruction.is_empty() {
        return Err(TemplateError::Malformed {
            template: template.to_string(),
            reason: format!("section \"{name}\" has no instruction"),
        });
    }

    Ok(SectionDefinition {
        name,
        role: role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        instruction,
        output_format,
        acceptance_criteria: acceptance,
        depends_on,
    })
}
