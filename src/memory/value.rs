//! Slot and field values
//!
//! A [`Value`] is what a frame slot or a heap-object field holds: either a
//! [`Primitive`] literal or a [`Value::Reference`] naming a heap object in the
//! same step. Two references with the same [`HeapId`] denote the same object.

use crate::config::Lang;
use std::fmt;

/// Identity of a heap object, stable across steps for the same logical object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(pub u64);

impl HeapId {
    /// Short textual memory label, e.g. `id42`
    pub fn label(&self) -> String {
        format!("id{}", self.0)
    }
}

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literal values rendered as text
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    /// Numbers keep their wire spelling so `1.0` stays `1.0`
    Number(String),
    Str(String),
    Char(String),
    NumberLiteral(String),
    SpecialFloat(String),
    Void,
    /// Elements the tracer omitted from a long collection
    Elided(u64),
}

impl Primitive {
    /// Render the literal the way the traced language spells it
    pub fn literal(&self, lang: Lang) -> String {
        match self {
            Primitive::Null => match lang {
                Lang::Py2 | Lang::Py3 => "None".to_string(),
                Lang::Ruby => "nil".to_string(),
                _ => "null".to_string(),
            },
            Primitive::Bool(b) => match (lang, b) {
                (Lang::Py2 | Lang::Py3, true) => "True".to_string(),
                (Lang::Py2 | Lang::Py3, false) => "False".to_string(),
                (_, b) => b.to_string(),
            },
            Primitive::Number(n) | Primitive::NumberLiteral(n) | Primitive::SpecialFloat(n) => {
                n.clone()
            }
            Primitive::Str(s) => quote(s),
            Primitive::Char(c) => format!("'{}'", c),
            Primitive::Void => "void".to_string(),
            Primitive::Elided(n) => format!("... ({} more)", n),
        }
    }
}

/// Quote a string literal, escaping line breaks so it stays on one row
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Value held by a slot or a field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Primitive(Primitive),
    Reference(HeapId),
}

impl Value {
    /// Get the referenced heap id, returns None for primitives
    pub fn as_reference(&self) -> Option<HeapId> {
        match self {
            Value::Reference(id) => Some(*id),
            Value::Primitive(_) => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Reference(_))
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}
