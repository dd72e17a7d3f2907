use std::sync::Arc;

use clipsight::tools::TimecodeHandler;
use clipsight::{
    ClipsightError, DispatchOutcome, FunctionCall, GenerationResponse, ResultItem,
    SelectionPolicy, ToolCallDispatcher, ToolHandler, ToolInvocation, ToolKind, ToolRegistry,
};
use serde_json::json;

fn registry() -> ToolRegistry {
    ToolRegistry::builtin().expect("builtin tools")
}

#[test]
fn empty_call_list_is_a_no_op() {
    let outcome = ToolCallDispatcher::default()
        .dispatch(&GenerationResponse::default(), &registry())
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::NoOp);
    assert!(outcome.items().is_none());
}

#[test]
fn escaped_apostrophes_are_normalized() {
    let response = GenerationResponse::with_calls(vec![FunctionCall::new(
        "set_timecodes",
        json!({ "timecodes": [{ "time": "00:01", "text": "A\\'B" }] }),
    )]);

    let outcome = ToolCallDispatcher::default()
        .dispatch(&response, &registry())
        .unwrap();

    let items = outcome.items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].time, "00:01");
    assert_eq!(items[0].text.as_deref(), Some("A'B"));
    assert_eq!(items[0].seconds, Some(1.0));
}

#[test]
fn unknown_tool_name_is_a_contract_violation() {
    let response = GenerationResponse::with_calls(vec![FunctionCall::new(
        "set_subtitles",
        json!({ "timecodes": [] }),
    )]);

    let err = ToolCallDispatcher::default()
        .dispatch(&response, &registry())
        .unwrap_err();
    assert!(matches!(err, ClipsightError::ContractViolation(_)));
}

#[test]
fn known_but_undeclared_tool_is_a_contract_violation() {
    let only_text = ToolRegistry::declare(vec![
        Arc::new(TimecodeHandler::new(ToolKind::SetTimecodes)) as Arc<dyn ToolHandler>
    ])
    .unwrap();
    let response = GenerationResponse::with_calls(vec![FunctionCall::new(
        "set_timecodes_with_numeric_values",
        json!({ "timecodes": [{ "time": "00:01", "value": 2 }] }),
    )]);

    let err = ToolCallDispatcher::default()
        .dispatch(&response, &only_text)
        .unwrap_err();
    assert!(matches!(err, ClipsightError::ContractViolation(_)));
}

#[test]
fn only_the_first_call_is_dispatched_by_default() {
    let response = GenerationResponse::with_calls(vec![
        FunctionCall::new(
            "set_timecodes",
            json!({ "timecodes": [{ "time": "00:01", "text": "first" }] }),
        ),
        FunctionCall::new("no_such_tool", json!({})),
    ]);

    let dispatcher = ToolCallDispatcher::default();
    assert_eq!(dispatcher.policy(), SelectionPolicy::FirstOnly);
    let outcome = dispatcher.dispatch(&response, &registry()).unwrap();
    assert_eq!(outcome.items().unwrap()[0].text.as_deref(), Some("first"));
}

#[test]
fn all_policy_concatenates_calls_in_order() {
    let response = GenerationResponse::with_calls(vec![
        FunctionCall::new(
            "set_timecodes",
            json!({ "timecodes": [{ "time": "00:01", "text": "one" }] }),
        ),
        FunctionCall::new(
            "set_timecodes_with_objects",
            json!({ "timecodes": [{ "time": "00:02", "text": "two", "objects": ["🐶 dog"] }] }),
        ),
    ]);

    let outcome = ToolCallDispatcher::new(SelectionPolicy::All)
        .dispatch(&response, &registry())
        .unwrap();
    let texts: Vec<_> = outcome
        .items()
        .unwrap()
        .iter()
        .map(|item| item.text.clone().unwrap())
        .collect();
    assert_eq!(texts, vec!["one", "two"]);
}

#[test]
fn malformed_arguments_are_rejected() {
    let response = GenerationResponse::with_calls(vec![FunctionCall::new(
        "set_timecodes",
        json!({ "timecodes": "00:01 hello" }),
    )]);

    let err = ToolCallDispatcher::default()
        .dispatch(&response, &registry())
        .unwrap_err();
    assert!(matches!(err, ClipsightError::InvalidToolArguments { ref tool, .. } if tool == "set_timecodes"));
}

struct UppercaseHandler;

impl ToolHandler for UppercaseHandler {
    fn kind(&self) -> ToolKind {
        ToolKind::SetTimecodes
    }

    fn handle(&self, invocation: &ToolInvocation) -> clipsight::Result<Vec<ResultItem>> {
        let text = invocation.args["text"].as_str().unwrap_or_default().to_uppercase();
        Ok(vec![ResultItem::new("00:00").with_text(text)])
    }
}

#[test]
fn duplicate_declarations_fail_fast() {
    let err = ToolRegistry::declare(vec![
        Arc::new(TimecodeHandler::new(ToolKind::SetTimecodes)) as Arc<dyn ToolHandler>,
        Arc::new(UppercaseHandler) as Arc<dyn ToolHandler>,
    ])
    .err()
    .expect("duplicate should fail");
    assert!(matches!(err, ClipsightError::DuplicateTool(ref name) if name == "set_timecodes"));
}

#[test]
fn custom_handler_is_bound_by_kind() {
    let registry =
        ToolRegistry::declare(vec![Arc::new(UppercaseHandler) as Arc<dyn ToolHandler>]).unwrap();
    let declarations = registry.declarations();
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].name, "set_timecodes");
    assert_eq!(declarations[0].kind(), Some(ToolKind::SetTimecodes));

    let response = GenerationResponse::with_calls(vec![FunctionCall::new(
        "set_timecodes",
        json!({ "text": "loud" }),
    )]);
    let outcome = ToolCallDispatcher::default().dispatch(&response, &registry).unwrap();
    assert_eq!(outcome.items().unwrap()[0].text.as_deref(), Some("LOUD"));
}

#[test]
fn declarations_follow_registration_order() {
    let names: Vec<_> = registry()
        .declarations()
        .into_iter()
        .map(|declaration| declaration.name)
        .collect();
    assert_eq!(
        names,
        vec![
            "set_timecodes",
            "set_timecodes_with_objects",
            "set_timecodes_with_numeric_values"
        ]
    );
}
