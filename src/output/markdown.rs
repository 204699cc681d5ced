use crate::output::{copy_text, step_fields, string_items};
use crate::workflow::session::Session;
use crate::workflow::step::Step;
use serde_json::Value;
use std::fmt::Write as _;

pub(crate) fn render(session: &Session) -> String {
    let hero = step_fields(session, Step::Hero);
    let pas = step_fields(session, Step::PasCopy);
    let social = step_fields(session, Step::SocialProof);
    let final_cta = step_fields(session, Step::FinalCta);
    let assembly = step_fields(session, Step::Assembly);

    let mut doc = String::new();
    let _ = writeln!(doc, "# {}", session.project_name);
    let _ = writeln!(doc);
    let _ = writeln!(doc, "Generated: {}", session.updated_at);
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## Hero");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "**{}**", copy_text(hero.get("headline_primary")));
    let _ = writeln!(doc);
    let _ = writeln!(doc, "{}", copy_text(hero.get("subheadline_primary")));
    let _ = writeln!(doc);
    let _ = writeln!(doc, "CTA: {}", copy_text(hero.get("cta_button_primary")));
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## Problem & Solution");
    let _ = writeln!(doc);
    if let Some(problem) = pas.get("problem_identification").and_then(Value::as_object) {
        let _ = writeln!(doc, "### {}", copy_text(problem.get("problem_headline")));
        let _ = writeln!(doc);
        let _ = writeln!(doc, "{}", copy_text(problem.get("empathetic_paragraph")));
        let _ = writeln!(doc);
    }
    if let Some(solution) = pas.get("solution_reveal").and_then(Value::as_object) {
        let _ = writeln!(doc, "### {}", copy_text(solution.get("solution_headline")));
        let _ = writeln!(doc);
    }

    let _ = writeln!(doc, "## Social Proof");
    let _ = writeln!(doc);
    if let Some(Value::Array(testimonials)) = social.get("testimonials") {
        for testimonial in testimonials {
            let Some(map) = testimonial.as_object() else {
                continue;
            };
            let quote = map.get("quote").and_then(Value::as_str).unwrap_or_default();
            let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
            if !quote.is_empty() {
                let _ = writeln!(doc, "> {quote}");
                let _ = writeln!(doc, "> — {name}");
                let _ = writeln!(doc);
            }
        }
    }

    let _ = writeln!(doc, "## Final Call To Action");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "**{}**", copy_text(final_cta.get("cta_headline")));
    let _ = writeln!(doc);
    let _ = writeln!(doc, "{}", copy_text(final_cta.get("sub_copy")));
    let _ = writeln!(doc);
    let _ = writeln!(doc, "Button: {}", copy_text(final_cta.get("primary_cta_button")));
    let trust_signals = string_items(final_cta.get("trust_signals"));
    if !trust_signals.is_empty() {
        let _ = writeln!(doc);
        for signal in trust_signals {
            let _ = writeln!(doc, "- {signal}");
        }
    }
    let _ = writeln!(doc);

    if let Some(score) = assembly.get("quality_score").and_then(Value::as_object) {
        let _ = writeln!(doc, "## Quality Review");
        let _ = writeln!(doc);
        for (name, value) in score {
            let _ = writeln!(doc, "- {name}: {value}");
        }
    }

    doc
}
