//! Laid-out diagram elements
//!
//! Panes register every element they paint under an [`ElementKey`]. The
//! connector layer later looks those rectangles up instead of recomputing
//! layout, so a position is only ever what the last paint pass produced.

use crate::memory::value::HeapId;
use ratatui::layout::Rect;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKey {
    /// Frame box by stack index
    Frame(usize),
    /// Value cell of a frame slot
    Slot { frame: usize, slot: usize },
    HeapBox(HeapId),
    /// Value cell of a heap box field
    Field { owner: HeapId, field: usize },
    StackPane,
    HeapPane,
    CodePane,
    OutputPane,
    StatusBar,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    rects: FxHashMap<ElementKey, Rect>,
    /// Registration order, for deterministic iteration
    order: Vec<ElementKey>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where an element was painted; a later registration wins
    pub fn register(&mut self, key: ElementKey, rect: Rect) {
        if self.rects.insert(key, rect).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &ElementKey) -> Option<Rect> {
        self.rects.get(key).copied()
    }

    pub fn contains(&self, key: &ElementKey) -> bool {
        self.rects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
        self.order.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementKey, Rect)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.rects.get(key).map(|rect| (*key, *rect)))
    }
}
