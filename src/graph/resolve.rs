//! Step → render graph resolution
//!
//! Frames are walked in index order and slots in slot order. The first
//! reference to an object claims its box; every later reference (aliases and
//! cycles included) reuses that box and becomes an edge. The walk uses an
//! explicit work list, so heap depth never turns into call-stack depth.

use super::{
    Edge, EdgeKind, EdgeSource, EdgeStyle, EdgeTarget, Placement, RenderBox, RenderField,
    RenderFrame, RenderGraph, RenderSlot, RenderValue,
};
use crate::config::Options;
use crate::errors::{Result, VisualizerError};
use crate::memory::heap::{Heap, HeapKind, HeapObject};
use crate::memory::value::{quote, HeapId, Primitive, Value};
use crate::snapshot::Step;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Resolve one step into the graph the panes paint
///
/// `previous` is the graph of the step shown before this one; top-level boxes
/// it already had keep their relative order so the diagram does not shuffle
/// while stepping.
pub fn resolve(
    step_index: usize,
    step: &Step,
    options: &Options,
    previous: Option<&RenderGraph>,
) -> Result<RenderGraph> {
    if options.show_only_outputs {
        return Ok(RenderGraph::empty(step_index));
    }
    if let Some(id) = step.dangling_reference() {
        return Err(VisualizerError::DanglingReference {
            step: step_index,
            id,
        });
    }

    let mut resolver = Resolver::new(step_index, &step.heap, options);
    let mut frames = Vec::with_capacity(step.stack.len());

    for (frame_index, frame) in step.stack.iter().enumerate() {
        let mut slots = Vec::with_capacity(frame.slots.len());
        for (slot_index, slot) in frame.slots.iter().enumerate() {
            let source = EdgeSource::Slot {
                frame: frame_index,
                slot: slot_index,
            };
            let value = resolver.value(&slot.value, source, None)?;
            slots.push(RenderSlot {
                name: slot.display_name().to_string(),
                value,
            });
            resolver.expand_pending()?;
        }
        frames.push(RenderFrame {
            index: frame_index,
            title: frame.function_name.clone(),
            is_global: frame.is_global,
            is_highlighted: frame.is_highlighted,
            frame_id: frame.frame_id,
            slots,
        });
    }

    let graph = resolver.finish(frames, previous);
    debug!(
        step = step_index,
        boxes = graph.boxes.len(),
        edges = graph.edges.len(),
        "resolved step"
    );
    Ok(graph)
}

struct Resolver<'a> {
    step_index: usize,
    heap: &'a Heap,
    options: &'a Options,
    boxes: Vec<RenderBox>,
    claimed: FxHashMap<HeapId, usize>,
    /// Claimed boxes whose fields are not built yet, next on top
    pending: Vec<HeapId>,
    slot_edges: Vec<Edge>,
    field_edges: Vec<Edge>,
}

impl<'a> Resolver<'a> {
    fn new(step_index: usize, heap: &'a Heap, options: &'a Options) -> Self {
        Resolver {
            step_index,
            heap,
            options,
            boxes: Vec::new(),
            claimed: FxHashMap::default(),
            pending: Vec::new(),
            slot_edges: Vec::new(),
            field_edges: Vec::new(),
        }
    }

    fn lookup(&self, id: HeapId) -> Result<&'a HeapObject> {
        self.heap
            .get(id)
            .ok_or(VisualizerError::DanglingReference {
                step: self.step_index,
                id,
            })
    }

    fn edge_style(&self) -> EdgeStyle {
        if self.options.textual_memory_labels {
            EdgeStyle::Label
        } else {
            EdgeStyle::Arrow
        }
    }

    fn push_edge(&mut self, source: EdgeSource, target: EdgeTarget) {
        let edge = Edge {
            source,
            target,
            kind: EdgeKind::Reference,
            style: self.edge_style(),
        };
        match source {
            EdgeSource::Slot { .. } => self.slot_edges.push(edge),
            _ => self.field_edges.push(edge),
        }
    }

    /// Resolve a slot or field value; `owner` is the box holding a field
    fn value(
        &mut self,
        value: &Value,
        source: EdgeSource,
        owner: Option<HeapId>,
    ) -> Result<RenderValue> {
        match value {
            Value::Primitive(p) => Ok(RenderValue::Literal(p.literal(self.options.lang))),
            Value::Reference(id) => self.reference(*id, source, owner),
        }
    }

    fn reference(
        &mut self,
        id: HeapId,
        source: EdgeSource,
        owner: Option<HeapId>,
    ) -> Result<RenderValue> {
        let object = self.lookup(id)?;

        if !self.options.heap_primitives {
            if let Some(text) = self.inline_text(object) {
                return Ok(RenderValue::Inline { target: id, text });
            }
        }

        if self.claimed.contains_key(&id) {
            self.push_edge(source, EdgeTarget::Heap(id));
            return Ok(RenderValue::Reference {
                target: id,
                nested: false,
            });
        }

        let placement = match owner {
            None => Placement::TopLevel { depth: 0 },
            Some(parent) if !self.options.disable_heap_nesting => Placement::Nested { parent },
            Some(parent) => Placement::TopLevel {
                depth: self.depth_of(parent) + 1,
            },
        };
        let nested = matches!(placement, Placement::Nested { .. });

        self.claimed.insert(id, self.boxes.len());
        self.boxes.push(RenderBox {
            id,
            kind: object.kind(),
            label: self.type_label(object),
            placement,
            first_referrer: owner,
            fields: Vec::new(),
        });
        self.pending.push(id);

        if !nested {
            self.push_edge(source, EdgeTarget::Heap(id));
        }
        Ok(RenderValue::Reference { target: id, nested })
    }

    /// Column of the top-level box that (transitively) holds `id`
    fn depth_of(&self, mut id: HeapId) -> usize {
        loop {
            let Some(&index) = self.claimed.get(&id) else {
                return 0;
            };
            match self.boxes[index].placement {
                Placement::TopLevel { depth } => return depth,
                Placement::Nested { parent } => id = parent,
            }
        }
    }

    /// Text shown in place of a reference to an unboxed primitive
    fn inline_text(&self, object: &HeapObject) -> Option<String> {
        match object {
            HeapObject::StringInstance { text, .. } => Some(quote(text)),
            HeapObject::Boxed { value, .. } => Some(value.literal(self.options.lang)),
            _ => None,
        }
    }

    fn type_label(&self, object: &HeapObject) -> Option<String> {
        if !self.options.include_types {
            return None;
        }
        let label = object.type_label(self.options.lang, &self.options.strip_type_prefixes);
        match object {
            HeapObject::Class { superclasses, .. } if !superclasses.is_empty() => {
                Some(format!("{} [extends {}]", label, superclasses.join(", ")))
            }
            _ => Some(label),
        }
    }

    /// Build fields for every pending box, depth-first
    fn expand_pending(&mut self) -> Result<()> {
        while let Some(id) = self.pending.pop() {
            let object = self.lookup(id)?;
            let before = self.pending.len();
            let fields = self.fields(id, object)?;
            // Children were pushed in field order; expand the first one next
            self.pending[before..].reverse();
            if let Some(&index) = self.claimed.get(&id) {
                self.boxes[index].fields = fields;
            }
        }
        Ok(())
    }

    fn fields(&mut self, owner: HeapId, object: &HeapObject) -> Result<Vec<RenderField>> {
        let lang = self.options.lang;
        let text_field = |text: String| {
            vec![RenderField {
                key: None,
                value: RenderValue::Literal(text),
            }]
        };

        match object {
            HeapObject::Sequence { elements, .. } => {
                let mut fields = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let key = match element {
                        Value::Primitive(Primitive::Elided(_)) => None,
                        _ => Some(i.to_string()),
                    };
                    let source = EdgeSource::Field { owner, field: i };
                    let value = self.value(element, source, Some(owner))?;
                    fields.push(RenderField { key, value });
                }
                Ok(fields)
            }
            HeapObject::Mapping { entries } => {
                let mut fields = Vec::with_capacity(entries.len());
                for (i, (key, value)) in entries.iter().enumerate() {
                    let key = self.mapping_key(key)?;
                    let source = EdgeSource::Field { owner, field: i };
                    let value = self.value(value, source, Some(owner))?;
                    fields.push(RenderField {
                        key: Some(key),
                        value,
                    });
                }
                Ok(fields)
            }
            HeapObject::Instance { fields: named, .. } | HeapObject::Class { fields: named, .. } => {
                let mut fields = Vec::with_capacity(named.len());
                for (i, (name, value)) in named.iter().enumerate() {
                    let source = EdgeSource::Field { owner, field: i };
                    let value = self.value(value, source, Some(owner))?;
                    fields.push(RenderField {
                        key: Some(name.clone()),
                        value,
                    });
                }
                Ok(fields)
            }
            HeapObject::StringInstance { text, .. } => Ok(text_field(quote(text))),
            HeapObject::Pretty { text, .. } => Ok(text_field(text.clone())),
            HeapObject::Function { name, .. } => Ok(text_field(format!("{}(...)", name))),
            HeapObject::Boxed { value, .. } => Ok(text_field(value.literal(lang))),
            HeapObject::Module { name } => Ok(text_field(name.clone())),
        }
    }

    /// Mapping keys are shown as text; reference keys are not traversed
    fn mapping_key(&self, key: &Value) -> Result<String> {
        match key {
            Value::Primitive(p) => Ok(p.literal(self.options.lang)),
            Value::Reference(id) => {
                let object = self.lookup(*id)?;
                Ok(self.inline_text(object).unwrap_or_else(|| id.label()))
            }
        }
    }

    fn parent_pointers(&self, frames: &[RenderFrame]) -> Vec<Edge> {
        if !self.options.draw_parent_pointers {
            return Vec::new();
        }
        self.boxes
            .iter()
            .filter(|b| b.kind == HeapKind::Function)
            .filter_map(|b| {
                let Some(HeapObject::Function {
                    parent_frame_id: Some(parent),
                    ..
                }) = self.heap.get(b.id)
                else {
                    return None;
                };
                let frame = frames
                    .iter()
                    .position(|f| f.frame_id == Some(*parent))?;
                Some(Edge {
                    source: EdgeSource::Heap(b.id),
                    target: EdgeTarget::Frame(frame),
                    kind: EdgeKind::ParentPointer,
                    style: self.edge_style(),
                })
            })
            .collect()
    }

    fn finish(mut self, frames: Vec<RenderFrame>, previous: Option<&RenderGraph>) -> RenderGraph {
        let discovered: Vec<HeapId> = self
            .boxes
            .iter()
            .filter(|b| b.is_top_level())
            .map(|b| b.id)
            .collect();

        let mut top_level = Vec::with_capacity(discovered.len());
        let mut placed = FxHashSet::default();
        if let Some(previous) = previous {
            let current: FxHashSet<HeapId> = discovered.iter().copied().collect();
            for id in &previous.top_level {
                if current.contains(id) && placed.insert(*id) {
                    top_level.push(*id);
                }
            }
        }
        for id in discovered {
            if placed.insert(id) {
                top_level.push(id);
            }
        }

        let claimed = &self.claimed;
        self.field_edges.sort_by_key(|edge| match edge.source {
            EdgeSource::Field { owner, field } => {
                (claimed.get(&owner).copied().unwrap_or(usize::MAX), field)
            }
            _ => (usize::MAX, 0),
        });

        let parent_pointers = self.parent_pointers(&frames);
        let mut edges = self.slot_edges;
        edges.append(&mut self.field_edges);
        edges.extend(parent_pointers);

        RenderGraph::from_parts(self.step_index, frames, self.boxes, top_level, edges)
    }
}
