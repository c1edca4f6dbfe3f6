//! Decoding of steps, frames, values and heap objects
//!
//! Errors are returned as plain messages; [`super::load`] prefixes them with
//! the step index and wraps them in a `MalformedTrace`.

use crate::memory::{
    heap::{Heap, HeapObject, SequenceKind},
    stack::{Frame, Slot},
    value::{HeapId, Primitive, Value},
};
use crate::snapshot::{EventKind, Step};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use tracing::warn;

/// Class names decoded as string instances
const STRING_CLASSES: [&str; 2] = ["String", "java.lang.String"];

#[derive(Debug, Deserialize)]
struct RawStep {
    event: Option<String>,
    line: Option<u32>,
    func_name: Option<String>,
    stack_to_render: Option<Vec<RawFrame>>,
    #[serde(default)]
    globals: Map<String, Json>,
    #[serde(default)]
    ordered_globals: Vec<String>,
    heap: Option<Map<String, Json>>,
    #[serde(default)]
    stdout: String,
    exception_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    func_name: String,
    #[serde(default)]
    encoded_locals: Map<String, Json>,
    ordered_varnames: Option<Vec<String>>,
    frame_id: Option<u64>,
    #[serde(default)]
    is_highlighted: bool,
}

/// Decode one step of the wire format
pub fn decode_step(raw: Json) -> Result<Step, String> {
    let raw: RawStep = serde_json::from_value(raw).map_err(|e| e.to_string())?;

    let event = match raw.event.as_deref() {
        Some(event) => EventKind::parse(event),
        None => return Err("missing `event`".to_string()),
    };
    if let EventKind::Other(name) = &event {
        warn!(event = %name, "unrecognized step event");
    }

    // Error steps emitted by the backend may carry nothing but a message
    let lenient = event == EventKind::UncaughtException;

    if raw.line.is_none() && !lenient {
        return Err("missing `line`".to_string());
    }

    let raw_frames = match raw.stack_to_render {
        Some(frames) => frames,
        None if lenient => Vec::new(),
        None => return Err("missing `stack_to_render`".to_string()),
    };

    let raw_heap = match raw.heap {
        Some(heap) => heap,
        None if lenient => Map::new(),
        None => return Err("missing `heap`".to_string()),
    };

    let mut stack = Vec::with_capacity(raw_frames.len() + 1);

    let global_slots = decode_slots(&raw.globals, Some(&raw.ordered_globals))
        .map_err(|e| format!("global frame: {}", e))?;
    if !global_slots.is_empty() {
        stack.push(Frame::global(global_slots));
    }

    for raw_frame in raw_frames {
        let slots = decode_slots(&raw_frame.encoded_locals, raw_frame.ordered_varnames.as_ref())
            .map_err(|e| format!("frame `{}`: {}", raw_frame.func_name, e))?;
        let mut frame = Frame::new(raw_frame.func_name, slots);
        frame.frame_id = raw_frame.frame_id;
        frame.is_highlighted = raw_frame.is_highlighted;
        stack.push(frame);
    }

    let mut heap = Heap::new();
    for (key, encoded) in &raw_heap {
        let id = key
            .parse::<u64>()
            .map(HeapId)
            .map_err(|_| format!("heap key `{}` is not a numeric id", key))?;
        let object = decode_object(encoded).map_err(|e| format!("heap object {}: {}", key, e))?;
        heap.insert(id, object);
    }

    Ok(Step {
        line: raw.line,
        event,
        func_name: raw.func_name,
        stack,
        heap,
        stdout: raw.stdout,
        exception_msg: raw.exception_msg,
    })
}

/// Decode slots in their declared order
///
/// With no explicit order (or an empty one alongside non-empty locals) the
/// key order of the encoded map is used.
fn decode_slots(
    locals: &Map<String, Json>,
    order: Option<&Vec<String>>,
) -> Result<Vec<Slot>, String> {
    let names: Vec<&String> = match order {
        Some(order) if !(order.is_empty() && !locals.is_empty()) => order.iter().collect(),
        _ => locals.keys().collect(),
    };

    names
        .into_iter()
        .map(|name| -> Result<Slot, String> {
            let encoded = locals
                .get(name)
                .ok_or_else(|| format!("ordered name `{}` has no encoded value", name))?;
            let value = decode_value(encoded).map_err(|e| format!("slot `{}`: {}", name, e))?;
            Ok(Slot::new(name.clone(), value))
        })
        .collect()
}

/// Decode an encoded slot or field value
pub fn decode_value(encoded: &Json) -> Result<Value, String> {
    match encoded {
        Json::Null => Ok(Primitive::Null.into()),
        Json::Bool(b) => Ok(Primitive::Bool(*b).into()),
        Json::Number(n) => Ok(Primitive::Number(n.to_string()).into()),
        Json::String(s) => Ok(Primitive::Str(s.clone()).into()),
        Json::Array(items) => {
            let (tag, rest) = split_tag(items)?;
            match tag {
                "REF" => Ok(Value::Reference(decode_id(rest.first())?)),
                "SPECIAL_FLOAT" => Ok(Primitive::SpecialFloat(text_arg(rest, tag)?).into()),
                "NUMBER-LITERAL" => Ok(Primitive::NumberLiteral(text_arg(rest, tag)?).into()),
                "CHAR-LITERAL" => Ok(Primitive::Char(text_arg(rest, tag)?).into()),
                "VOID" => Ok(Primitive::Void.into()),
                "ELIDE" => {
                    let count = rest.first().and_then(Json::as_u64).unwrap_or(0);
                    Ok(Primitive::Elided(count).into())
                }
                other => Err(format!("unknown value tag `{}`", other)),
            }
        }
        Json::Object(_) => Err("objects are not valid encoded values".to_string()),
    }
}

/// Decode an encoded heap object
pub fn decode_object(encoded: &Json) -> Result<HeapObject, String> {
    let items = encoded
        .as_array()
        .ok_or_else(|| "heap objects must be tagged arrays".to_string())?;
    let (tag, rest) = split_tag(items)?;

    if let Some(kind) = SequenceKind::from_tag(tag) {
        let elements = rest
            .iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(HeapObject::Sequence { kind, elements });
    }

    match tag {
        "DICT" => {
            let entries = rest
                .iter()
                .map(|entry| -> Result<(Value, Value), String> {
                    let pair = entry
                        .as_array()
                        .filter(|pair| pair.len() == 2)
                        .ok_or_else(|| "dict entries must be [key, value] pairs".to_string())?;
                    Ok((decode_value(&pair[0])?, decode_value(&pair[1])?))
                })
                .collect::<Result<Vec<_>, String>>()?;
            Ok(HeapObject::Mapping { entries })
        }
        "INSTANCE" => {
            let class_name = text_arg(rest, tag)?;
            let fields = decode_fields(&rest[1..])?;
            if STRING_CLASSES.contains(&class_name.as_str()) {
                if let Some(text) = string_text(&fields) {
                    return Ok(HeapObject::StringInstance { class_name, text });
                }
            }
            Ok(HeapObject::Instance { class_name, fields })
        }
        "INSTANCE_PPRINT" => {
            let class_name = text_arg(rest, tag)?;
            let text = rest
                .get(1)
                .and_then(Json::as_str)
                .ok_or_else(|| "INSTANCE_PPRINT needs a text".to_string())?
                .to_string();
            Ok(HeapObject::Pretty { class_name, text })
        }
        "CLASS" => {
            let name = text_arg(rest, tag)?;
            let superclasses = rest
                .get(1)
                .and_then(Json::as_array)
                .map(|supers| {
                    supers
                        .iter()
                        .filter_map(Json::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let fields = decode_fields(rest.get(2..).unwrap_or(&[]))?;
            Ok(HeapObject::Class {
                name,
                superclasses,
                fields,
            })
        }
        "FUNCTION" => {
            let name = text_arg(rest, tag)?;
            let parent_frame_id = rest.get(1).and_then(Json::as_u64);
            Ok(HeapObject::Function {
                name,
                parent_frame_id,
            })
        }
        "HEAP_PRIMITIVE" => {
            let type_name = text_arg(rest, tag)?;
            let value = match rest.get(1).map(decode_value).transpose()? {
                Some(Value::Primitive(p)) => p,
                Some(Value::Reference(_)) => {
                    return Err("HEAP_PRIMITIVE cannot hold a reference".to_string())
                }
                None => return Err("HEAP_PRIMITIVE needs a value".to_string()),
            };
            Ok(HeapObject::Boxed { type_name, value })
        }
        "module" => Ok(HeapObject::Module {
            name: text_arg(rest, tag)?,
        }),
        other => Err(format!("unknown heap object tag `{}`", other)),
    }
}

fn decode_fields(encoded: &[Json]) -> Result<Vec<(String, Value)>, String> {
    encoded
        .iter()
        .map(|field| -> Result<(String, Value), String> {
            let pair = field
                .as_array()
                .filter(|pair| pair.len() == 2)
                .ok_or_else(|| "fields must be [name, value] pairs".to_string())?;
            let name = match &pair[0] {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            };
            Ok((name, decode_value(&pair[1])?))
        })
        .collect()
}

/// Text of a string instance: its first string-valued field
fn string_text(fields: &[(String, Value)]) -> Option<String> {
    fields.iter().find_map(|(_, value)| match value {
        Value::Primitive(Primitive::Str(s)) => Some(s.clone()),
        _ => None,
    })
}

fn split_tag(items: &[Json]) -> Result<(&str, &[Json]), String> {
    match items.split_first() {
        Some((Json::String(tag), rest)) => Ok((tag.as_str(), rest)),
        Some(_) => Err("tagged array must start with a string tag".to_string()),
        None => Err("empty tagged array".to_string()),
    }
}

fn text_arg(rest: &[Json], tag: &str) -> Result<String, String> {
    rest.first()
        .and_then(Json::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("`{}` needs a text argument", tag))
}

fn decode_id(encoded: Option<&Json>) -> Result<HeapId, String> {
    match encoded {
        Some(Json::Number(n)) => n
            .as_u64()
            .map(HeapId)
            .ok_or_else(|| format!("heap id {} is not a non-negative integer", n)),
        Some(Json::String(s)) => s
            .parse::<u64>()
            .map(HeapId)
            .map_err(|_| format!("heap id `{}` is not numeric", s)),
        _ => Err("REF needs a heap id".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_primitives() {
        assert_eq!(
            decode_value(&json!(5)).unwrap(),
            Value::from(Primitive::Number("5".into()))
        );
        assert_eq!(decode_value(&json!(null)).unwrap(), Value::from(Primitive::Null));
        assert_eq!(
            decode_value(&json!(["CHAR-LITERAL", "a"])).unwrap(),
            Value::from(Primitive::Char("a".into()))
        );
        assert_eq!(decode_value(&json!(["REF", 7])).unwrap(), Value::Reference(HeapId(7)));
        assert!(decode_value(&json!(["BOGUS"])).is_err());
    }

    #[test]
    fn test_string_instance_is_tagged() {
        let object = decode_object(&json!(["INSTANCE", "String", ["value", "hi"]])).unwrap();
        assert_eq!(
            object,
            HeapObject::StringInstance {
                class_name: "String".into(),
                text: "hi".into()
            }
        );
        let object = decode_object(&json!(["INSTANCE", "Point", ["x", 1]])).unwrap();
        assert!(matches!(object, HeapObject::Instance { .. }));
    }

    #[test]
    fn test_ordered_names_must_exist() {
        let err = decode_step(json!({
            "event": "step_line",
            "line": 1,
            "stack_to_render": [{
                "func_name": "main",
                "encoded_locals": { "x": 1 },
                "ordered_varnames": ["x", "y"]
            }],
            "heap": {}
        }))
        .unwrap_err();
        assert!(err.contains("`y`"), "{}", err);
    }

    #[test]
    fn test_uncaught_exception_step_may_be_bare() {
        let step = decode_step(json!({
            "event": "uncaught_exception",
            "exception_msg": "boom"
        }))
        .unwrap();
        assert!(step.is_uncaught_exception());
        assert!(step.stack.is_empty());
        assert_eq!(step.exception_msg.as_deref(), Some("boom"));
    }

    #[test]
    fn test_globals_become_frame_zero() {
        let step = decode_step(json!({
            "event": "step_line",
            "line": 2,
            "globals": { "count": 3 },
            "ordered_globals": ["count"],
            "stack_to_render": [{ "func_name": "main", "encoded_locals": {} }],
            "heap": {}
        }))
        .unwrap();
        assert_eq!(step.stack.len(), 2);
        assert!(step.stack[0].is_global);
        assert_eq!(step.stack[1].function_name, "main");
    }
}
