// Integration tests for trace ingestion and option loading

use serde_json::{json, Value as Json};
use std::io::Write;
use tracevis::config::{Lang, Options};
use tracevis::errors::VisualizerError;
use tracevis::memory::heap::HeapObject;
use tracevis::memory::value::{HeapId, Value};
use tracevis::parser::ingest::{encode_data_uri, TraceSource};
use tracevis::snapshot::{EventKind, Trace};

fn sample_payload() -> Json {
    json!({
        "code": "x = [1, 2]\nprint(x)\n",
        "trace": [
            {
                "event": "step_line",
                "line": 1,
                "func_name": "<module>",
                "globals": {},
                "ordered_globals": [],
                "stack_to_render": [],
                "heap": {},
                "stdout": ""
            },
            {
                "event": "step_line",
                "line": 2,
                "func_name": "<module>",
                "globals": { "x": ["REF", 1] },
                "ordered_globals": ["x"],
                "stack_to_render": [],
                "heap": { "1": ["LIST", 1, 2] },
                "stdout": ""
            },
            {
                "event": "return",
                "line": 2,
                "func_name": "<module>",
                "globals": { "x": ["REF", 1] },
                "ordered_globals": ["x"],
                "stack_to_render": [],
                "heap": { "1": ["LIST", 1, 2] },
                "stdout": "[1, 2]\n"
            }
        ]
    })
}

#[test]
fn test_all_sources_produce_equal_traces() {
    let payload = sample_payload();
    let text = payload.to_string();

    let from_value = Trace::load(payload.clone()).expect("value source failed");
    let from_json = Trace::load(text.as_str()).expect("JSON source failed");
    let from_uri = Trace::load(encode_data_uri(&text)).expect("data URI source failed");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let from_file = Trace::load(file.path()).expect("file source failed");
    let url = format!("file://{}", file.path().display());
    let from_url = Trace::load(url.as_str()).expect("file URL source failed");

    assert_eq!(from_value, from_json);
    assert_eq!(from_value, from_uri);
    assert_eq!(from_value, from_file);
    assert_eq!(from_value, from_url);
    assert_eq!(from_value.len(), 3);
}

#[test]
fn test_decoded_step_contents() {
    let trace = Trace::load(sample_payload()).unwrap();
    let step = &trace.steps()[1];

    assert_eq!(step.line, Some(2));
    assert_eq!(step.event, EventKind::StepLine);
    assert_eq!(step.stack.len(), 1);
    assert!(step.stack[0].is_global);
    assert_eq!(step.stack[0].slots[0].name, "x");
    assert_eq!(step.stack[0].slots[0].value, Value::Reference(HeapId(1)));
    assert!(matches!(
        step.heap.get(HeapId(1)),
        Some(HeapObject::Sequence { elements, .. }) if elements.len() == 2
    ));
    assert_eq!(trace.code(), Some("x = [1, 2]\nprint(x)\n"));
}

#[test]
fn test_main_return_discards_cleanup_steps() {
    let trace = Trace::load(json!([
        { "event": "call", "line": 1, "func_name": "main", "stack_to_render": [], "heap": {} },
        { "event": "return", "line": 5, "func_name": "main", "stack_to_render": [], "heap": {} },
        { "event": "step_line", "line": 9, "func_name": "exit", "stack_to_render": [], "heap": {} }
    ]))
    .unwrap();

    assert_eq!(trace.len(), 2);
    assert_eq!(trace.steps()[1].event, EventKind::Return);
}

#[test]
fn test_malformed_payloads() {
    let cases = [
        json!({ "trace": [] }),
        json!({ "code": "x" }),
        json!(42),
        json!([{ "line": 1, "stack_to_render": [], "heap": {} }]),
        json!([{ "event": "step_line", "line": 1, "stack_to_render": [], "heap": { "a": ["LIST"] } }]),
    ];

    for payload in cases {
        let result = Trace::load(payload.clone());
        assert!(
            matches!(result, Err(VisualizerError::MalformedTrace { .. })),
            "Expected MalformedTrace for {}, got {:?}",
            payload,
            result
        );
    }
}

#[test]
fn test_garbage_data_uri_is_malformed() {
    let result = Trace::load(TraceSource::DataUri(
        "data:application/json;base64,@@@".to_string(),
    ));
    assert!(matches!(result, Err(VisualizerError::MalformedTrace { .. })));
}

#[test]
fn test_uncaught_exception_marks_failed_run() {
    let trace = Trace::load(json!([
        { "event": "step_line", "line": 1, "stack_to_render": [], "heap": {}, "stdout": "hi\n" },
        { "event": "uncaught_exception", "exception_msg": "ZeroDivisionError: division by zero" }
    ]))
    .unwrap();

    assert!(trace.is_failed());
    assert_eq!(
        trace.failure_message(),
        Some("ZeroDivisionError: division by zero")
    );
}

#[test]
fn test_non_cumulative_output_is_the_increment() {
    let trace = Trace::load(json!([
        { "event": "step_line", "line": 1, "stack_to_render": [], "heap": {}, "stdout": "a\n" },
        { "event": "step_line", "line": 2, "stack_to_render": [], "heap": {}, "stdout": "a\nb\n" }
    ]))
    .unwrap();

    assert_eq!(trace.output_at(1, true), "a\nb\n");
    assert_eq!(trace.output_at(1, false), "b\n");
    assert_eq!(trace.output_at(0, false), "a\n");
}

#[test]
fn test_options_reject_unknown_keys() {
    let err = Options::from_json(r#"{ "lang": "py3", "colourScheme": "dark" }"#).unwrap_err();
    assert!(matches!(err, VisualizerError::InvalidOption { .. }));
}

#[test]
fn test_parent_pointers_require_flat_heap() {
    let err = Options::from_value(json!({ "drawParentPointers": true })).unwrap_err();
    assert!(matches!(err, VisualizerError::InvalidOption { .. }));

    let options = Options::from_value(json!({
        "drawParentPointers": true,
        "disableHeapNesting": true
    }))
    .unwrap();
    assert!(options.draw_parent_pointers);
}

#[test]
fn test_options_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "lang = \"py3\"\njumpToEnd = true\nstripTypePrefixes = [\"java.util.\"]").unwrap();

    let options = Options::from_file(file.path()).unwrap();
    assert_eq!(options.lang, Lang::Py3);
    assert!(options.jump_to_end);
    assert!(options.include_types);
    assert_eq!(options.strip_type_prefixes, vec!["java.util.".to_string()]);
}
