//! Heap snapshot for a single step
//!
//! The [`Heap`] maps each [`HeapId`] to a [`HeapObject`]. Every object carries
//! an explicit [`HeapKind`] decided when the trace is decoded, so renderers
//! never have to guess what an object is from its label.

use super::value::{HeapId, Primitive, Value};
use crate::config::Lang;
use rustc_hash::FxHashMap;

/// Flavor of an ordered container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Tuple,
    Set,
    Stack,
    Queue,
}

impl SequenceKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "LIST" => Some(SequenceKind::List),
            "TUPLE" => Some(SequenceKind::Tuple),
            "SET" => Some(SequenceKind::Set),
            "STACK" => Some(SequenceKind::Stack),
            "QUEUE" => Some(SequenceKind::Queue),
            _ => None,
        }
    }

    fn label(self, lang: Lang) -> &'static str {
        match self {
            SequenceKind::List if lang == Lang::Java => "array",
            SequenceKind::List => "list",
            SequenceKind::Tuple => "tuple",
            SequenceKind::Set => "set",
            SequenceKind::Stack => "stack",
            SequenceKind::Queue => "queue",
        }
    }
}

/// Rendering-relevant category of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapKind {
    /// Has fields or elements that may hold references
    Composite,
    /// String instance, rendered as its text without a field key
    String,
    /// Primitive value that lives on the heap (boxed or immutable instance)
    PrimitiveBoxed,
    Function,
    /// Instance the tracer already pretty-printed
    Pretty,
    Module,
}

/// A heap object as recorded by the tracer
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    Sequence {
        kind: SequenceKind,
        elements: Vec<Value>,
    },
    Mapping {
        entries: Vec<(Value, Value)>,
    },
    Instance {
        class_name: String,
        fields: Vec<(String, Value)>,
    },
    StringInstance {
        class_name: String,
        text: String,
    },
    Pretty {
        class_name: String,
        text: String,
    },
    Class {
        name: String,
        superclasses: Vec<String>,
        fields: Vec<(String, Value)>,
    },
    Function {
        name: String,
        parent_frame_id: Option<u64>,
    },
    Boxed {
        type_name: String,
        value: Primitive,
    },
    Module {
        name: String,
    },
}

impl HeapObject {
    pub fn kind(&self) -> HeapKind {
        match self {
            HeapObject::Sequence { .. }
            | HeapObject::Mapping { .. }
            | HeapObject::Instance { .. }
            | HeapObject::Class { .. } => HeapKind::Composite,
            HeapObject::StringInstance { .. } => HeapKind::String,
            HeapObject::Pretty { .. } => HeapKind::Pretty,
            HeapObject::Function { .. } => HeapKind::Function,
            HeapObject::Boxed { .. } => HeapKind::PrimitiveBoxed,
            HeapObject::Module { .. } => HeapKind::Module,
        }
    }

    /// Type label shown on the object's box, with the given prefixes removed
    pub fn type_label(&self, lang: Lang, strip_prefixes: &[String]) -> String {
        match self {
            HeapObject::Sequence { kind, .. } => kind.label(lang).to_string(),
            HeapObject::Mapping { .. } => match lang {
                Lang::Java => "map".to_string(),
                _ => "dict".to_string(),
            },
            HeapObject::Instance { class_name, .. } | HeapObject::Pretty { class_name, .. } => {
                format!("{} instance", strip_type_prefix(class_name, strip_prefixes))
            }
            HeapObject::StringInstance { class_name, .. } => {
                strip_type_prefix(class_name, strip_prefixes).to_string()
            }
            HeapObject::Class { name, .. } => {
                format!("{} class", strip_type_prefix(name, strip_prefixes))
            }
            HeapObject::Function { .. } => "function".to_string(),
            HeapObject::Boxed { type_name, .. } => {
                strip_type_prefix(type_name, strip_prefixes).to_string()
            }
            HeapObject::Module { .. } => "module".to_string(),
        }
    }

    /// Every heap reference held by this object, keys included
    pub fn references(&self) -> Vec<HeapId> {
        let values: Vec<&Value> = match self {
            HeapObject::Sequence { elements, .. } => elements.iter().collect(),
            HeapObject::Mapping { entries } => {
                entries.iter().flat_map(|(k, v)| [k, v]).collect()
            }
            HeapObject::Instance { fields, .. } | HeapObject::Class { fields, .. } => {
                fields.iter().map(|(_, v)| v).collect()
            }
            _ => Vec::new(),
        };
        values.into_iter().filter_map(Value::as_reference).collect()
    }
}

/// Remove the first matching prefix from a type name
pub fn strip_type_prefix<'a>(name: &'a str, prefixes: &[String]) -> &'a str {
    prefixes
        .iter()
        .find_map(|p| name.strip_prefix(p.as_str()))
        .unwrap_or(name)
}

/// The heap of one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heap {
    objects: FxHashMap<HeapId, HeapObject>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: HeapId, object: HeapObject) {
        self.objects.insert(id, object);
    }

    pub fn get(&self, id: HeapId) -> Option<&HeapObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: HeapId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeapId, &HeapObject)> {
        self.objects.iter()
    }
}

impl FromIterator<(HeapId, HeapObject)> for Heap {
    fn from_iter<I: IntoIterator<Item = (HeapId, HeapObject)>>(iter: I) -> Self {
        Heap {
            objects: iter.into_iter().collect(),
        }
    }
}
