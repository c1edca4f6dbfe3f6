//! Per-step render graph
//!
//! A [`RenderGraph`] is what the panes paint for one step: the visible frames,
//! one [`RenderBox`] per reachable heap object and the [`Edge`]s between
//! them. It is rebuilt from scratch by [`resolve::resolve`] on every step
//! change and never patched in place.
//!
//! # Placement
//!
//! A box is either [`Placement::TopLevel`] (its own box in the heap area, at a
//! column given by `depth`) or [`Placement::Nested`] inside the box that first
//! referenced it. Nested boxes are drawn in place and need no connector from
//! that first referrer; any further reference to them still becomes an edge.

pub mod resolve;

pub use resolve::resolve;

use crate::memory::heap::HeapKind;
use crate::memory::value::HeapId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopLevel { depth: usize },
    Nested { parent: HeapId },
}

/// What a slot or field cell shows
#[derive(Debug, Clone, PartialEq)]
pub enum RenderValue {
    /// Primitive literal spelled for the trace's language
    Literal(String),
    /// String or boxed primitive drawn in place of its reference
    Inline { target: HeapId, text: String },
    /// Reference to a box; `nested` when the target is drawn inside this cell's box
    Reference { target: HeapId, nested: bool },
}

impl RenderValue {
    pub fn target(&self) -> Option<HeapId> {
        match self {
            RenderValue::Reference { target, .. } => Some(*target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderField {
    /// Field name, element index or rendered mapping key; None for texty boxes
    pub key: Option<String>,
    pub value: RenderValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBox {
    pub id: HeapId,
    pub kind: HeapKind,
    /// Type label, present when types are shown
    pub label: Option<String>,
    pub placement: Placement,
    /// Box holding the reference that claimed this box, None for stack-rooted boxes
    pub first_referrer: Option<HeapId>,
    pub fields: Vec<RenderField>,
}

impl RenderBox {
    pub fn is_top_level(&self) -> bool {
        matches!(self.placement, Placement::TopLevel { .. })
    }

    pub fn depth(&self) -> Option<usize> {
        match self.placement {
            Placement::TopLevel { depth } => Some(depth),
            Placement::Nested { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSlot {
    pub name: String,
    pub value: RenderValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Index into the step's stack
    pub index: usize,
    pub title: String,
    pub is_global: bool,
    pub is_highlighted: bool,
    pub frame_id: Option<u64>,
    pub slots: Vec<RenderSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSource {
    Slot { frame: usize, slot: usize },
    Field { owner: HeapId, field: usize },
    /// Whole box, used by parent pointers
    Heap(HeapId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeTarget {
    Heap(HeapId),
    Frame(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Reference,
    ParentPointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeStyle {
    Arrow,
    /// Drawn as an `idN` label at the source, no connector
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: EdgeSource,
    pub target: EdgeTarget,
    pub kind: EdgeKind,
    pub style: EdgeStyle,
}

/// Everything painted for one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderGraph {
    pub step: usize,
    pub frames: Vec<RenderFrame>,
    /// Boxes in claim order
    pub boxes: Vec<RenderBox>,
    /// Top-level box ids in display order
    pub top_level: Vec<HeapId>,
    pub edges: Vec<Edge>,
    index: FxHashMap<HeapId, usize>,
}

impl RenderGraph {
    /// Graph with no frames and no boxes, used when only output is shown
    pub fn empty(step: usize) -> Self {
        RenderGraph {
            step,
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(
        step: usize,
        frames: Vec<RenderFrame>,
        boxes: Vec<RenderBox>,
        top_level: Vec<HeapId>,
        edges: Vec<Edge>,
    ) -> Self {
        let index = boxes
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();
        RenderGraph {
            step,
            frames,
            boxes,
            top_level,
            edges,
            index,
        }
    }

    pub fn get(&self, id: HeapId) -> Option<&RenderBox> {
        self.index.get(&id).map(|&i| &self.boxes[i])
    }

    pub fn contains(&self, id: HeapId) -> bool {
        self.index.contains_key(&id)
    }

    /// Position of a box in claim order
    pub fn claim_order(&self, id: HeapId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Top-level boxes in display order
    pub fn top_level_boxes(&self) -> impl Iterator<Item = &RenderBox> {
        self.top_level.iter().filter_map(|id| self.get(*id))
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.boxes.is_empty()
    }

    /// Edges that get a drawn connector
    pub fn arrows(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.style == EdgeStyle::Arrow)
    }
}
