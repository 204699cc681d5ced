use crate::workflow::session::Session;
use crate::workflow::step::Step;
use crate::workflow::WorkflowError;
use serde_json::{Map, Value};

fn resolve_json_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        let object = current.as_object()?;
        current = object.get(*segment)?;
    }
    Some(current)
}

fn value_to_rendered_text(value: &Value) -> Result<String, WorkflowError> {
    if let Some(text) = value.as_str() {
        return Ok(text.to_string());
    }
    serde_json::to_string(value).map_err(|err| WorkflowError::PromptRender {
        step: "unknown".to_string(),
        reason: format!("failed to render placeholder value: {err}"),
    })
}

fn render_template_with_placeholders<F>(
    template: &str,
    step: Step,
    mut resolve: F,
) -> Result<String, WorkflowError>
where
    F: FnMut(&str) -> Result<String, WorkflowError>,
{
    let mut rendered = String::new();
    let mut cursor = template;

    while let Some(start) = cursor.find("{{") {
        rendered.push_str(&cursor[..start]);
        let after_open = &cursor[start + 2..];
        let Some(close_offset) = after_open.find("}}") else {
            return Err(WorkflowError::PromptRender {
                step: step.slug().to_string(),
                reason: "unclosed placeholder in template".to_string(),
            });
        };
        let token = after_open[..close_offset].trim();
        if token.is_empty() {
            return Err(WorkflowError::PromptRender {
                step: step.slug().to_string(),
                reason: "empty placeholder in template".to_string(),
            });
        }
        rendered.push_str(&resolve(token)?);
        cursor = &after_open[close_offset + 2..];
    }

    rendered.push_str(cursor);
    Ok(rendered)
}

/// Compose the prompt for `step` from the session's prior outputs and the
/// validated user input. Supported placeholders:
/// `{{inputs.<path>}}`, `{{steps.<index>.<path>}}` (prior step output fields;
/// a missing field renders empty), `{{session.project_name}}`,
/// `{{session.model}}`, `{{step.title}}`, `{{step.output_schema_json}}`.
pub fn render_step_prompt(
    session: &Session,
    step: Step,
    input: &Map<String, Value>,
) -> Result<String, WorkflowError> {
    let input_value = Value::Object(input.clone());
    let output_schema_json = serde_json::to_string(step.required_output_keys()).map_err(|err| {
        WorkflowError::PromptRender {
            step: step.slug().to_string(),
            reason: format!("failed to render output schema json: {err}"),
        }
    })?;

    render_template_with_placeholders(template_for(step), step, |token| {
        if let Some(path) = token.strip_prefix("inputs.") {
            let segments: Vec<&str> = path
                .split('.')
                .filter(|segment| !segment.trim().is_empty())
                .collect();
            let Some(value) = resolve_json_path(&input_value, &segments) else {
                // Optional inputs render as an explicit marker rather than
                // failing the whole prompt.
                return Ok("not provided".to_string());
            };
            return value_to_rendered_text(value);
        }

        if let Some(path) = token.strip_prefix("steps.") {
            let mut segments: Vec<&str> = path.split('.').collect();
            if segments.is_empty() {
                return Err(WorkflowError::PromptRender {
                    step: step.slug().to_string(),
                    reason: format!("unsupported placeholder `{{{{{token}}}}}`"),
                });
            }
            let index: u8 =
                segments
                    .remove(0)
                    .parse()
                    .map_err(|_| WorkflowError::PromptRender {
                        step: step.slug().to_string(),
                        reason: format!("non-numeric step index in `{{{{{token}}}}}`"),
                    })?;
            let source = Step::from_index(index).ok_or_else(|| WorkflowError::PromptRender {
                step: step.slug().to_string(),
                reason: format!("unknown step index in `{{{{{token}}}}}`"),
            })?;
            let Some(output) = session.step_output(source) else {
                return Err(WorkflowError::PromptRender {
                    step: step.slug().to_string(),
                    reason: format!("missing prior output for placeholder `{{{{{token}}}}}`"),
                });
            };
            let output_value = Value::Object(output.fields.clone());
            if segments.is_empty() {
                return value_to_rendered_text(&output_value);
            }
            let Some(value) = resolve_json_path(&output_value, &segments) else {
                return Ok(String::new());
            };
            return value_to_rendered_text(value);
        }

        match token {
            "session.project_name" => Ok(session.project_name.clone()),
            "session.model" => Ok(session.selected_model.clone()),
            "step.title" => Ok(step.title().to_string()),
            "step.output_schema_json" => Ok(output_schema_json.clone()),
            _ => Err(WorkflowError::PromptRender {
                step: step.slug().to_string(),
                reason: format!("unsupported placeholder `{{{{{token}}}}}`"),
            }),
        }
    })
}

fn template_for(step: Step) -> &'static str {
    match step {
        Step::Research => RESEARCH_TEMPLATE,
        Step::Outline => OUTLINE_TEMPLATE,
        Step::Hero => HERO_TEMPLATE,
        Step::PasCopy => PAS_COPY_TEMPLATE,
        Step::SocialProof => SOCIAL_PROOF_TEMPLATE,
        Step::FinalCta => FINAL_CTA_TEMPLATE,
        Step::Assembly => ASSEMBLY_TEMPLATE,
        Step::Design => DESIGN_TEMPLATE,
    }
}

const RESEARCH_TEMPLATE: &str = "\
You are a senior product research analyst specializing in direct response marketing and PPC campaign optimization.

Conduct product intelligence gathering for a landing page project.

Project: {{session.project_name}}
Product name: {{inputs.product_name}}
Product URL: {{inputs.target_url}}
Industry: {{inputs.industry}}
Target audience: {{inputs.target_audience}}
Monthly PPC budget: {{inputs.budget_range}}

Cover: core value proposition, features and benefits, pricing and offers, audience demographics and psychographics, primary pain points with severity 1-10, top 3-5 direct competitors with positioning gaps, high-intent PPC keywords, emotional triggers and objections, trust signals, and recommended landing page structure.

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const OUTLINE_TEMPLATE: &str = "\
You are a conversion-rate strategist designing a landing page outline.

Project: {{session.project_name}}
Page type: {{inputs.page_type}}
Product type: {{inputs.product_type}}
Include agitation module: {{inputs.include_agitation}}
Include comparison table: {{inputs.include_comparison}}
Include audience qualifier: {{inputs.include_qualifier}}
Include before/after showcase: {{inputs.include_before_after}}

Research findings to build on:
{{steps.1.target_audience_profile}}
{{steps.1.conversion_intelligence}}

Produce a numbered section structure (hero, problem, agitation, solution, benefits, qualifier, social proof, comparison, final CTA, footer) with a one-line purpose per section, plus terminology standards: the primary pain point phrase, the primary benefit phrase, and the primary timeframe claim, all taken verbatim from the research.

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const HERO_TEMPLATE: &str = "\
You are a direct response copywriter drafting above-the-fold hero copy.

Project: {{session.project_name}}
Headline style: {{inputs.headline_style}}
Tone of voice: {{inputs.tone}}
Primary emotion: {{inputs.target_emotion}}
CTA style: {{inputs.cta_style}}
Number of A/B variants: {{inputs.variants}}

Audience and pain points:
{{steps.1.target_audience_profile}}

Terminology standards (use these phrases verbatim):
{{steps.2.terminology_standards}}

Write headline_primary (with copy and character_count), subheadline_primary (copy, word_count), cta_button_primary (copy under 25 characters), and the requested number of variants, each with headline, subheadline, and cta.

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const PAS_COPY_TEMPLATE: &str = "\
You are a direct response copywriter writing the Problem-Agitate-Solution body of a landing page.

Project: {{session.project_name}}
Agitation format: {{inputs.agitation_format}}
Benefits format: {{inputs.benefits_format}}
Emotional intensity (1-10): {{inputs.emotional_intensity}}
Include statistics: {{inputs.include_statistics}}

Research context:
{{steps.1.target_audience_profile}}

Outline and terminology:
{{steps.2.structure}}
{{steps.2.terminology_standards}}

Hero copy already approved (stay consistent with its claims):
{{steps.3.headline_primary}}

Write problem_identification (problem_headline, empathetic_paragraph), agitation_module (agitation_headline, consequence content in the requested format), solution_reveal (solution_headline, how_it_works steps with action and outcome), and benefits_matrix (benefit blocks with headline, feature_statement, benefit_statement, emotional_payoff).

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const SOCIAL_PROOF_TEMPLATE: &str = "\
You are a conversion copywriter building the social proof section of a landing page.

Project: {{session.project_name}}
Testimonials to draft: {{inputs.testimonial_count}}
Competitors to compare: {{inputs.competitors_count}}

Competitive landscape from research:
{{steps.1.competitive_landscape}}

Claims made so far (testimonials must not contradict them):
{{steps.3.headline_primary}}
{{steps.4.solution_reveal}}

Write testimonials (name, rating, quote, result), a comparison_table (products with name, price, guarantee, rating, key_feature; mark ours recommended), an audience_qualifier (is_for_you and not_for_you lists), and data_points (aggregate proof numbers).

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const FINAL_CTA_TEMPLATE: &str = "\
You are a direct response copywriter closing a landing page.

Project: {{session.project_name}}
Urgency type: {{inputs.urgency_type}}
Guarantee: {{inputs.guarantee_type}}
Include what-happens-next roadmap: {{inputs.include_roadmap}}
Include secondary CTA: {{inputs.include_secondary_cta}}

Proof points available:
{{steps.5.data_points}}

Hero CTA for consistency:
{{steps.3.cta_button_primary}}

Write cta_headline, sub_copy, a what_happens_next_roadmap (numbered steps with action and outcome), primary_cta_button (copy, style), button_subtext referencing the guarantee, an ethical urgency_element matching the urgency type, and trust_signals.

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const ASSEMBLY_TEMPLATE: &str = "\
You are an editor performing a consistency pass over assembled landing page copy.

Project: {{session.project_name}}
Check terminology consistency: {{inputs.check_terminology}}
Check claims consistency: {{inputs.check_claims}}
Check emotional arc: {{inputs.check_emotional_arc}}

Terminology standards:
{{steps.2.terminology_standards}}

Sections to audit:
Hero: {{steps.3.headline_primary}}
PAS: {{steps.4.problem_identification}}
Social proof data points: {{steps.5.data_points}}
Final CTA: {{steps.6.cta_headline}}

Report assembly_summary (total_word_count, sections_included), consistency_results (issues, warnings, validations — empty arrays when clean), and a quality_score object with overall, consistency, readability, and conversion_potential on a 0-100 scale.

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

const DESIGN_TEMPLATE: &str = "\
You are a web designer producing implementation-ready specifications for a landing page.

Project: {{session.project_name}}
Layout type: {{inputs.layout_type}}
WCAG level: {{inputs.wcag_level}}
Hero viewport height (percent): {{inputs.hero_viewport}}
Mobile-first: {{inputs.mobile_first}}
Interactive comparison table: {{inputs.interactive_comparison}}

Page structure:
{{steps.2.structure}}

Produce layout_specifications (type, breakpoints, hero_viewport_height), visual_design (color_palette as hex values including primary_cta, text_primary, background and accent; typography; spacing_system), performance_targets (load_time, lcp, cls, total_page_weight), and accessibility (wcag_level, contrast ratios, focus indicators).

Return ONLY one valid JSON object. Top-level keys must include: {{step.output_schema_json}}. No markdown fences, no prose outside the object.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ids::SessionId;
    use crate::workflow::session::StepOutput;
    use serde_json::json;

    fn session_with_research() -> Session {
        let mut session = Session::new(
            SessionId::parse("sess-test-0001").expect("session id"),
            "KetoBurn Launch",
            "gpt-4",
            "2026-01-01T00:00:00Z",
        );
        let mut fields = Map::new();
        fields.insert(
            "target_audience_profile".to_string(),
            json!({"summary": "keto beginners fighting keto flu"}),
        );
        fields.insert("conversion_intelligence".to_string(), json!({}));
        session.put_step_output(
            Step::Research,
            StepOutput {
                fields,
                model_used: "gpt-4".to_string(),
                tokens_used: None,
                generated_at: "2026-01-01T00:00:30Z".to_string(),
            },
            "2026-01-01T00:00:30Z",
        );
        session
    }

    #[test]
    fn research_prompt_embeds_inputs_and_schema() {
        let session = session_with_research();
        let mut input = Map::new();
        input.insert("product_name".to_string(), json!("KetoBurn Pro"));
        input.insert("industry".to_string(), json!("Health & Wellness"));
        input.insert("target_audience".to_string(), json!("keto beginners"));
        let prompt = render_step_prompt(&session, Step::Research, &input).expect("render");
        assert!(prompt.contains("KetoBurn Pro"));
        assert!(prompt.contains("Health & Wellness"));
        assert!(prompt.contains("\"product_analysis\""));
        // Optional inputs render an explicit marker.
        assert!(prompt.contains("Product URL: not provided"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn later_prompts_pull_prior_step_outputs() {
        let session = session_with_research();
        let mut input = Map::new();
        input.insert("page_type".to_string(), json!("Affiliate/Review"));
        input.insert("product_type".to_string(), json!("Supplement/Health"));
        let prompt = render_step_prompt(&session, Step::Outline, &input).expect("render");
        assert!(prompt.contains("keto beginners fighting keto flu"));
    }

    #[test]
    fn missing_prior_output_is_a_prompt_render_error() {
        let session = Session::new(
            SessionId::parse("sess-test-0002").expect("session id"),
            "Empty",
            "gpt-4",
            "2026-01-01T00:00:00Z",
        );
        let input = Map::new();
        let err = render_step_prompt(&session, Step::Outline, &input).expect_err("no research yet");
        assert!(matches!(err, WorkflowError::PromptRender { .. }));
    }
}
