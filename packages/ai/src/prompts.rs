// ABOUTME: Prompt templates for idea extraction, requirement derivation and change request drafting
// ABOUTME: Each builder renders the user message; the system prompts fix the JSON answer shape

use std::fmt::Write;

use reqtrack_ideas::Idea;
use reqtrack_requirements::RequirementVersion;

use crate::generation::ProjectContext;

pub const EXTRACT_IDEAS_SYSTEM: &str = r#"You are an expert product analyst and requirements engineer.

Extract zero or more actionable ideas from the user's text. Each idea must be:
- Directly relevant to the project context.
- Clear, specific and feasible for that project.
- Not a duplicate of an idea or requirement that already exists in the context.

Ignore unrelated, unclear or joking content. Return no ideas when nothing in the text
clearly contributes to the project.

Score every idea with ICE:
- impact (0-10): expected benefit to the system or its users.
- confidence (0-10): how certain it is to succeed within the project's capacity.
- effort (1-10): estimated work required.
- priority: one of LOW, MEDIUM, HIGH, CRITICAL.

Answer with JSON only, no prose, in exactly this shape:
{"ideas": [{"title": "...", "description": "...", "category": "...", "priority": "MEDIUM",
  "impact": 5, "confidence": 5, "effort": 5, "conflicts": null, "dependencies": null}]}"#;

pub const DERIVE_REQUIREMENTS_SYSTEM: &str = r#"You are an expert requirements engineer.

Convert the given ideas into clear, testable requirements that are consistent with the
existing requirements of the project. For each requirement:
- Use standard requirement language ("The system shall ...").
- Give a detailed description with acceptance criteria.
- Reuse existing categories where they fit.
- Pick a type from BUSINESS, STAKEHOLDER, FUNCTIONAL, NON_FUNCTIONAL, CONSTRAINT, SYSTEM,
  TRANSITION, INTERFACE, USER, REGULATORY, OPERATIONAL, SECURITY, PERFORMANCE.
- Set priority from 1 (critical) to 5 (nice to have).
- Note conflicts and dependencies with existing requirements, or null.

Answer with JSON only, no prose, in exactly this shape:
{"requirements": [{"title": "...", "description": "...", "category": "...",
  "type": "FUNCTIONAL", "priority": 3, "conflicts": null, "dependencies": null}]}"#;

pub const DRAFT_CHANGE_REQUEST_SYSTEM: &str = r#"You are an expert requirements engineer and change management analyst.

Analyse the change from the base version of a requirement to the proposed version.
Consider which existing requirements and ideas are affected, the risks, the effort and the
benefit, and finish the summary with a recommendation (approve, reject or modify).

Answer with JSON only, no prose, in exactly this shape:
{"title": "...", "summary": "...", "cost": "...", "benefit": "..."}"#;

pub fn extract_ideas_prompt(text: &str, context: &ProjectContext) -> String {
    format!(
        "# User text\n{}\n\n---\n\nExtract the actionable ideas discussed in the text above \
         that are relevant to this project.\n\n{}",
        text.trim(),
        context.render()
    )
}

pub fn derive_requirements_prompt(ideas: &[Idea], context: &ProjectContext) -> String {
    let mut prompt = String::from("# Ideas to convert\n");
    for (index, idea) in ideas.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} [{}] priority={:?}{}",
            index + 1,
            idea.title.as_deref().unwrap_or("(untitled)"),
            idea.category,
            idea.priority,
            idea.ice_score
                .map(|score| format!(" ice={:.2}", score))
                .unwrap_or_default()
        );
        if let Some(description) = &idea.description {
            let _ = writeln!(prompt, "   {}", description);
        }
    }
    let _ = write!(
        prompt,
        "\n---\n\nGenerate formal requirements for the ideas above.\n\n{}",
        context.render()
    );
    prompt
}

pub fn draft_change_request_prompt(
    base: &RequirementVersion,
    proposed: &RequirementVersion,
    context: &ProjectContext,
) -> String {
    format!(
        "# Change analysis\n\n## Base version (v{})\n{}\n---\n\n## Proposed version (v{})\n{}\n---\n\n{}",
        base.version_number,
        describe_version(base),
        proposed.version_number,
        describe_version(proposed),
        context.render()
    )
}

fn describe_version(version: &RequirementVersion) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title: {}", version.title);
    let _ = writeln!(out, "Category: {}", version.category);
    let _ = writeln!(out, "Type: {:?}", version.req_type);
    let _ = writeln!(out, "Status: {}", version.status.as_str());
    let _ = writeln!(out, "Priority: {}", version.priority);
    let _ = writeln!(out, "Description:\n{}", version.description);
    if let Some(dependencies) = &version.dependencies {
        let _ = writeln!(out, "Dependencies: {}", dependencies);
    }
    if let Some(conflicts) = &version.conflicts {
        let _ = writeln!(out, "Conflicts: {}", conflicts);
    }
    out
}
