// Integration tests for stepping, resolution and connector drawing

use serde_json::{json, Value as Json};
use tracevis::backend::{BackendRequest, CommandBackend, ExecutionBackend};
use tracevis::config::{Lang, Options};
use tracevis::errors::VisualizerError;
use tracevis::graph::{EdgeSource, EdgeStyle, EdgeTarget, Placement, RenderValue};
use tracevis::memory::heap::HeapKind;
use tracevis::memory::value::HeapId;
use tracevis::ui::layout::ElementKey;
use tracevis::ui::theme::DEFAULT_THEME;
use tracevis::{Container, Trace, Visualizer};

fn step(line: u32, globals: Json, heap: Json, stdout: &str) -> Json {
    let order: Vec<String> = globals
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();
    json!({
        "event": "step_line",
        "line": line,
        "func_name": "main",
        "globals": globals,
        "ordered_globals": order,
        "stack_to_render": [],
        "heap": heap,
        "stdout": stdout
    })
}

fn linked_list_trace() -> Trace {
    Trace::load(json!({
        "code": "a = [5]\nb = [a]\nc = b\n",
        "trace": [
            step(1, json!({}), json!({}), ""),
            step(2, json!({ "a": ["REF", 1] }), json!({ "1": ["LIST", 5] }), ""),
            step(
                3,
                json!({ "a": ["REF", 1], "b": ["REF", 2] }),
                json!({ "1": ["LIST", 5], "2": ["LIST", ["REF", 1]] }),
                "",
            ),
            step(
                4,
                json!({ "a": ["REF", 1], "b": ["REF", 2], "c": ["REF", 2] }),
                json!({ "1": ["LIST", 5], "2": ["LIST", ["REF", 1]] }),
                "done\n",
            ),
        ]
    }))
    .expect("fixture trace should load")
}

fn flat() -> Options {
    Options {
        lang: Lang::Py3,
        disable_heap_nesting: true,
        ..Options::default()
    }
}

fn visualizer(trace: Trace, options: Options) -> Visualizer {
    Visualizer::from_trace(Container::new("test", 120, 40), trace, options)
        .expect("visualizer should construct")
}

#[test]
fn test_current_step_stays_in_bounds() {
    let mut viz = visualizer(linked_list_trace(), flat());
    let n = viz.step_count();
    assert_eq!(n, 4);

    let _ = viz.prev();
    assert_eq!(viz.current_step(), 0);
    for _ in 0..10 {
        let _ = viz.next();
        assert!(viz.current_step() < n);
    }
    assert_eq!(viz.current_step(), n - 1);
    assert!(matches!(viz.next(), Err(VisualizerError::OutOfRange { .. })));
    viz.jump_to_start().unwrap();
    assert_eq!(viz.current_step(), 0);
    viz.jump_to_end().unwrap();
    assert!(viz.is_at_end());
}

#[test]
fn test_jump_out_of_range_leaves_step_unchanged() {
    let mut viz = visualizer(linked_list_trace(), flat());
    viz.jump_to(2).unwrap();

    let err = viz.jump_to(4).unwrap_err();
    match err {
        VisualizerError::OutOfRange { requested, len } => {
            assert_eq!(requested, 4);
            assert_eq!(len, 4);
        }
        other => panic!("Expected OutOfRange, got {:?}", other),
    }
    assert!(err_is_recoverable(4));
    assert_eq!(viz.current_step(), 2);
}

fn err_is_recoverable(len: usize) -> bool {
    VisualizerError::OutOfRange {
        requested: len as i64,
        len,
    }
    .is_recoverable()
}

#[test]
fn test_redraw_connectors_is_idempotent() {
    let mut viz = visualizer(linked_list_trace(), flat());
    viz.jump_to_end().unwrap();
    assert!(!viz.connectors().connectors().is_empty());

    viz.redraw_connectors();
    let first = viz.connectors().endpoints();
    let text = viz.container().to_text();
    viz.redraw_connectors();

    assert_eq!(viz.connectors().endpoints(), first);
    assert_eq!(viz.container().to_text(), text);
}

#[test]
fn test_references_resolve_within_their_step() {
    let mut viz = visualizer(linked_list_trace(), flat());
    loop {
        let graph = viz.render_graph();
        let step = viz.current();
        for render_box in &graph.boxes {
            assert!(step.heap.contains(render_box.id));
        }
        for edge in &graph.edges {
            if let EdgeTarget::Heap(id) = edge.target {
                assert!(graph.contains(id), "edge to {} has no box", id);
                assert!(step.heap.contains(id));
            }
        }
        if viz.next().is_err() {
            break;
        }
    }
}

#[test]
fn test_step_back_drops_later_boxes() {
    let mut viz = visualizer(linked_list_trace(), flat());
    viz.jump_to_end().unwrap();
    assert_eq!(viz.render_graph().boxes.len(), 2);

    viz.jump_to(1).unwrap();
    let graph = viz.render_graph();
    assert_eq!(graph.boxes.len(), 1);
    assert!(graph.contains(HeapId(1)));
    assert!(!graph.contains(HeapId(2)));
}

#[test]
fn test_aliases_share_one_box() {
    let viz = visualizer(linked_list_trace(), Options {
        starting_instruction: 3,
        ..flat()
    });
    let graph = viz.render_graph();
    assert_eq!(graph.boxes.len(), 2);

    let into_two = graph
        .edges
        .iter()
        .filter(|edge| edge.target == EdgeTarget::Heap(HeapId(2)))
        .count();
    assert_eq!(into_two, 2);
}

#[test]
fn test_cycles_resolve_once_per_object() {
    let trace = Trace::load(json!([step(
        1,
        json!({ "a": ["REF", 1] }),
        json!({ "1": ["LIST", ["REF", 2]], "2": ["LIST", ["REF", 1]] }),
        "",
    )]))
    .unwrap();

    for options in [Options::default(), flat()] {
        let viz = visualizer(trace.clone(), options);
        let graph = viz.render_graph();
        let mut ids: Vec<HeapId> = graph.boxes.iter().map(|b| b.id).collect();
        ids.sort();
        assert_eq!(ids, vec![HeapId(1), HeapId(2)]);
    }
}

#[test]
fn test_single_uncaught_step_fails_construction() {
    let trace = Trace::load(json!([{
        "event": "uncaught_exception",
        "exception_msg": "SyntaxError: invalid syntax"
    }]))
    .unwrap();

    let result = Visualizer::from_trace(Container::new("test", 80, 24), trace, Options::default());
    match result {
        Err(VisualizerError::UncaughtExecutionFailure { message }) => {
            assert_eq!(message, "SyntaxError: invalid syntax");
        }
        Err(other) => panic!("Expected UncaughtExecutionFailure, got {:?}", other),
        Ok(_) => panic!("Expected UncaughtExecutionFailure, got a visualizer"),
    }
}

#[test]
fn test_failed_run_hides_failing_step() {
    let trace = Trace::load(json!([
        step(1, json!({ "x": 1 }), json!({}), ""),
        step(2, json!({ "x": 0 }), json!({}), ""),
        { "event": "uncaught_exception", "exception_msg": "ZeroDivisionError" }
    ]))
    .unwrap();

    let mut viz = visualizer(trace, Options::default());
    assert_eq!(viz.step_count(), 2);
    assert_eq!(viz.failure(), Some("ZeroDivisionError"));
    assert!(viz.jump_to(2).is_err());
    viz.jump_to_end().unwrap();
    assert_eq!(viz.current_step(), 1);
}

#[test]
fn test_steps_after_main_return_are_not_navigable() {
    let trace = Trace::load(json!([
        { "event": "call", "line": 1, "func_name": "main", "stack_to_render": [], "heap": {} },
        { "event": "return", "line": 3, "func_name": "main", "stack_to_render": [], "heap": {} },
        { "event": "step_line", "line": 7, "func_name": "exit", "stack_to_render": [], "heap": {} }
    ]))
    .unwrap();

    let mut viz = visualizer(trace, Options::default());
    assert_eq!(viz.step_count(), 2);
    viz.jump_to_end().unwrap();
    assert_eq!(viz.current().line, Some(3));
}

#[test]
fn test_nesting_versus_flat_boxes() {
    let trace = Trace::load(json!([step(
        1,
        json!({ "outer": ["REF", 1] }),
        json!({ "1": ["LIST", ["REF", 2]], "2": ["LIST", 5, 6] }),
        "",
    )]))
    .unwrap();

    let nested = visualizer(trace.clone(), Options::default());
    let graph = nested.render_graph();
    assert_eq!(
        graph.get(HeapId(2)).map(|b| b.placement),
        Some(Placement::Nested { parent: HeapId(1) })
    );
    assert!(graph
        .edges
        .iter()
        .all(|edge| !matches!(edge.source, EdgeSource::Field { .. })));
    assert_eq!(graph.top_level, vec![HeapId(1)]);

    let flat = visualizer(trace, flat());
    let graph = flat.render_graph();
    assert_eq!(
        graph.get(HeapId(2)).map(|b| b.placement),
        Some(Placement::TopLevel { depth: 1 })
    );
    assert!(graph.edges.iter().any(|edge| {
        edge.source == EdgeSource::Field { owner: HeapId(1), field: 0 }
            && edge.target == EdgeTarget::Heap(HeapId(2))
    }));
    assert_eq!(graph.top_level, vec![HeapId(1), HeapId(2)]);
}

#[test]
fn test_starting_instruction_fallback() {
    let viz = visualizer(linked_list_trace(), Options {
        starting_instruction: 4,
        ..flat()
    });
    assert_eq!(viz.current_step(), 0);

    let viz = visualizer(linked_list_trace(), Options {
        starting_instruction: 2,
        ..flat()
    });
    assert_eq!(viz.current_step(), 2);

    let viz = visualizer(linked_list_trace(), Options {
        jump_to_end: true,
        ..flat()
    });
    assert_eq!(viz.current_step(), 3);
}

#[test]
fn test_heap_primitives_box_strings() {
    let trace = Trace::load(json!([step(
        1,
        json!({ "s": ["REF", 1] }),
        json!({ "1": ["INSTANCE", "java.lang.String", ["value", "hi"]] }),
        "",
    )]))
    .unwrap();

    let viz = visualizer(trace.clone(), Options::default());
    let graph = viz.render_graph();
    assert!(graph.boxes.is_empty());
    assert_eq!(
        graph.frames[0].slots[0].value,
        RenderValue::Inline {
            target: HeapId(1),
            text: "\"hi\"".to_string()
        }
    );

    let viz = visualizer(trace, Options {
        heap_primitives: true,
        ..Options::default()
    });
    let graph = viz.render_graph();
    assert_eq!(graph.boxes.len(), 1);
    assert_eq!(graph.boxes[0].kind, HeapKind::String);
}

#[test]
fn test_textual_labels_draw_no_connectors() {
    let viz = visualizer(linked_list_trace(), Options {
        textual_memory_labels: true,
        starting_instruction: 3,
        ..flat()
    });

    let graph = viz.render_graph();
    assert!(!graph.edges.is_empty());
    assert!(graph.edges.iter().all(|edge| edge.style == EdgeStyle::Label));
    assert!(viz.connectors().connectors().is_empty());
    assert!(viz.container().to_text().contains("id2"));
}

#[test]
fn test_show_only_outputs_renders_output() {
    let viz = visualizer(linked_list_trace(), Options {
        show_only_outputs: true,
        jump_to_end: true,
        ..flat()
    });

    assert!(viz.render_graph().is_empty());
    assert!(viz.connectors().connectors().is_empty());
    assert_eq!(viz.output(), "done\n");
    assert!(viz.container().to_text().contains("done"));
}

#[test]
fn test_cumulative_output() {
    let trace = Trace::load(json!([
        step(1, json!({}), json!({}), "a\n"),
        step(2, json!({}), json!({}), "a\nb\n"),
    ]))
    .unwrap();

    let mut viz = visualizer(trace.clone(), Options::default());
    viz.next().unwrap();
    assert_eq!(viz.output(), "b\n");

    let mut viz = visualizer(trace, Options {
        cumulative_mode: true,
        ..Options::default()
    });
    viz.next().unwrap();
    assert_eq!(viz.output(), "a\nb\n");
}

#[test]
fn test_resize_then_redraw_stays_in_bounds() {
    let mut viz = visualizer(linked_list_trace(), flat());
    viz.jump_to_end().unwrap();

    viz.container_mut().resize(90, 30);
    viz.redraw_connectors();
    assert!(!viz.container().is_stale());

    let area = viz.container().area();
    for (start, end) in viz.connectors().endpoints() {
        assert!(start.x < area.width && start.y < area.height);
        assert!(end.x < area.width && end.y < area.height);
    }
}

#[test]
fn test_hide_code_drops_code_pane() {
    let viz = visualizer(linked_list_trace(), flat());
    assert!(viz.container().position(&ElementKey::CodePane).is_some());

    let viz = visualizer(linked_list_trace(), Options {
        hide_code: true,
        ..flat()
    });
    assert!(viz.trace().code().is_some());
    assert!(viz.container().position(&ElementKey::CodePane).is_none());
    assert!(viz.container().position(&ElementKey::StackPane).is_some());
}

#[test]
fn test_embedded_mode_drops_status_bar() {
    let viz = visualizer(linked_list_trace(), flat());
    assert!(viz.container().position(&ElementKey::StatusBar).is_some());

    let viz = visualizer(linked_list_trace(), Options {
        embedded_mode: true,
        ..flat()
    });
    assert!(viz.container().position(&ElementKey::StatusBar).is_none());
}

#[test]
fn test_highlight_lines_marks_only_current_line() {
    // Text starts after the border, the marker and the line number
    let text_cell = |viz: &Visualizer, line: u16| {
        let code = viz.container().position(&ElementKey::CodePane).unwrap();
        viz.container()
            .buffer()
            .cell((code.x + 7, code.y + line))
            .unwrap()
            .clone()
    };

    let viz = visualizer(linked_list_trace(), Options {
        highlight_lines: true,
        ..flat()
    });
    assert_eq!(viz.current().line, Some(1));
    let current = text_cell(&viz, 1);
    assert_eq!(current.symbol(), "a");
    assert_eq!(current.bg, DEFAULT_THEME.current_line_bg);
    let other = text_cell(&viz, 2);
    assert_eq!(other.symbol(), "b");
    assert_ne!(other.bg, DEFAULT_THEME.current_line_bg);

    let viz = visualizer(linked_list_trace(), flat());
    assert_ne!(text_cell(&viz, 1).bg, DEFAULT_THEME.current_line_bg);
}

#[test]
fn test_deep_stack_content_height_saturates() {
    let frames: Vec<Json> = (0..20_000)
        .map(|i| {
            json!({
                "func_name": "recurse",
                "encoded_locals": { "n": i },
                "ordered_varnames": ["n"],
                "frame_id": i,
                "is_highlighted": false
            })
        })
        .collect();
    let trace = Trace::load(json!([{
        "event": "step_line",
        "line": 1,
        "func_name": "recurse",
        "globals": {},
        "ordered_globals": [],
        "stack_to_render": frames,
        "heap": {},
        "stdout": ""
    }]))
    .unwrap();

    let viz = visualizer(trace, Options::default());
    assert_eq!(viz.content_height(), u16::MAX);
}

#[test]
fn test_failing_step_output_shows_on_last_step() {
    let trace = Trace::load(json!([
        step(1, json!({ "x": 1 }), json!({}), "a\n"),
        step(2, json!({ "x": 0 }), json!({}), "a\n"),
        { "event": "uncaught_exception", "exception_msg": "ZeroDivisionError", "stdout": "a\nboom\n" }
    ]))
    .unwrap();

    let mut viz = visualizer(trace.clone(), Options::default());
    assert_eq!(viz.output(), "a\n");
    viz.jump_to_end().unwrap();
    assert_eq!(viz.output(), "boom\n");
    let text = viz.container().to_text();
    assert!(text.contains("boom"));
    assert!(text.contains("ZeroDivisionError"));

    let mut viz = visualizer(trace, Options {
        cumulative_mode: true,
        ..Options::default()
    });
    viz.jump_to_end().unwrap();
    assert_eq!(viz.output(), "a\nboom\n");
}

#[test]
fn test_dangling_reference_fails_loading() {
    let result = Trace::load(json!([
        step(1, json!({ "x": 1 }), json!({}), ""),
        step(2, json!({ "x": ["REF", 9] }), json!({}), ""),
    ]));
    match result {
        Err(VisualizerError::MalformedTrace { reason }) => {
            assert!(reason.contains("step 1"), "{}", reason);
            assert!(reason.contains("heap object 9"), "{}", reason);
        }
        other => panic!("Expected MalformedTrace, got {:?}", other),
    }
}

#[test]
fn test_reload_swaps_trace() {
    let mut viz = visualizer(linked_list_trace(), flat());
    viz.jump_to_end().unwrap();

    let replacement = Trace::load(json!([step(1, json!({ "y": 2 }), json!({}), "")])).unwrap();
    viz.reload(replacement).unwrap();
    assert_eq!(viz.step_count(), 1);
    assert_eq!(viz.current_step(), 0);
    assert_eq!(viz.render_graph().frames[0].slots[0].name, "y");
}

#[test]
fn test_missing_tracer_is_backend_unavailable() {
    let backend = CommandBackend::new("tracevis-no-such-tracer");
    let request = BackendRequest::new("print(1)", &Options::default());
    let err = backend.execute(&request).unwrap_err();
    assert!(matches!(err, VisualizerError::BackendUnavailable { .. }));
    assert!(err.is_recoverable());
}

#[cfg(unix)]
#[test]
fn test_command_backend_reads_trace_from_stdout() {
    // `cat` echoes the source back, so the source is the trace itself
    let payload = json!([step(1, json!({ "x": 1 }), json!({}), "")]).to_string();
    let backend = CommandBackend::new("cat");
    let request = BackendRequest::new(payload, &Options::default());

    let trace = backend.execute(&request).unwrap();
    assert_eq!(trace.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_tracer_error_payload_is_reported() {
    let backend = CommandBackend::new("cat");
    let request = BackendRequest::new(r#"{"error": "compile failed"}"#, &Options::default());
    match backend.execute(&request) {
        Err(VisualizerError::BackendUnavailable { reason }) => assert_eq!(reason, "compile failed"),
        other => panic!("Expected BackendUnavailable, got {:?}", other),
    }
}
