use pageforge::validation::validate_step_input;
use pageforge::workflow::Step;
use serde_json::{json, Map, Value};

fn fields(value: Value) -> Map<String, Value> {
    value.as_object().expect("object literal").clone()
}

#[test]
fn validation_module_flags_must_be_booleans() {
    let input = fields(json!({
        "page_type": "SaaS/Software",
        "product_type": "Software/App",
        "include_agitation": "yes",
    }));
    let violations = validate_step_input(Step::Outline, &input);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "include_agitation");
    assert!(violations[0].message.contains("true or false"));
}

#[test]
fn validation_module_choices_are_matched_exactly() {
    let input = fields(json!({
        "layout_type": "single column",
        "wcag_level": "AA",
    }));
    let violations = validate_step_input(Step::Design, &input);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "layout_type");

    let input = fields(json!({
        "layout_type": "Single Column",
        "wcag_level": "AA",
    }));
    assert!(validate_step_input(Step::Design, &input).is_empty());
}

#[test]
fn validation_module_null_optionals_pass_and_null_requireds_fail() {
    let input = fields(json!({
        "urgency_type": null,
        "guarantee_type": "60-day",
        "include_roadmap": null,
    }));
    let violations = validate_step_input(Step::FinalCta, &input);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "urgency_type");
}

#[test]
fn validation_module_steps_without_required_inputs_accept_empty_maps() {
    assert!(validate_step_input(Step::SocialProof, &Map::new()).is_empty());
    assert!(validate_step_input(Step::Assembly, &Map::new()).is_empty());
}
